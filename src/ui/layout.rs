use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::core::message::Message;

/// Flatten the transcript into styled lines: one `Sender: text` block per
/// bubble followed by a blank separator line.
pub fn build_transcript_lines(messages: &[Message], theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in messages {
        let (prefix_style, text_style) = if message.is_user() {
            (theme.user_prefix_style, theme.user_text_style)
        } else if message.is_pending() {
            (theme.assistant_prefix_style, theme.pending_text_style)
        } else {
            (theme.assistant_prefix_style, theme.assistant_text_style)
        };

        let mut content_lines = message.content.split('\n');
        let first = content_lines.next().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", message.sender), prefix_style),
            Span::styled(first.to_string(), text_style),
        ]));
        for rest in content_lines {
            lines.push(Line::from(Span::styled(rest.to_string(), text_style)));
        }
        lines.push(Line::from(""));
    }
    lines
}

/// Wrap `lines` to `width` columns at word boundaries, keeping span styles.
///
/// Words wider than the line are broken between graphemes. The result is
/// drawn without ratatui's own wrapping, so the line count is the row count.
pub fn prewrap_lines(lines: &[Line<'_>], width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width);
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if width == 0 || line.spans.is_empty() {
            out.push(owned_line(line));
            continue;
        }
        let mut wrapper = LineWrapper::new(width);
        for span in &line.spans {
            for grapheme in span.content.graphemes(true) {
                if grapheme == " " {
                    wrapper.push_space(span.style);
                } else {
                    wrapper.push_word_grapheme(grapheme, span.style);
                }
            }
        }
        wrapper.finish(&mut out);
    }
    out
}

fn owned_line(line: &Line<'_>) -> Line<'static> {
    Line::from(
        line.spans
            .iter()
            .map(|span| Span::styled(span.content.to_string(), span.style))
            .collect::<Vec<_>>(),
    )
}

struct LineWrapper {
    width: usize,
    rows: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    current_width: usize,
    word: Vec<(String, Style, usize)>,
    word_width: usize,
}

impl LineWrapper {
    fn new(width: usize) -> Self {
        Self {
            width,
            rows: Vec::new(),
            current: Vec::new(),
            current_width: 0,
            word: Vec::new(),
            word_width: 0,
        }
    }

    fn push_word_grapheme(&mut self, grapheme: &str, style: Style) {
        let grapheme_width = UnicodeWidthStr::width(grapheme);
        self.word.push((grapheme.to_string(), style, grapheme_width));
        self.word_width += grapheme_width;
    }

    fn push_space(&mut self, style: Style) {
        self.flush_word();
        if self.current_width < self.width {
            self.append(" ", style, 1);
        } else {
            // A space that lands on the break is dropped.
            self.break_row();
        }
    }

    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        if self.current_width > 0 && self.current_width + self.word_width > self.width {
            self.break_row();
        }
        for (grapheme, style, grapheme_width) in std::mem::take(&mut self.word) {
            if self.current_width > 0 && self.current_width + grapheme_width > self.width {
                self.break_row();
            }
            self.append(&grapheme, style, grapheme_width);
        }
        self.word_width = 0;
    }

    fn append(&mut self, text: &str, style: Style, text_width: usize) {
        match self.current.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(text),
            _ => self.current.push(Span::styled(text.to_string(), style)),
        }
        self.current_width += text_width;
    }

    fn break_row(&mut self) {
        self.rows.push(Line::from(std::mem::take(&mut self.current)));
        self.current_width = 0;
    }

    fn finish(mut self, out: &mut Vec<Line<'static>>) {
        self.flush_word();
        if !self.current.is_empty() || self.rows.is_empty() {
            self.break_row();
        }
        out.append(&mut self.rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn each_bubble_gets_sender_prefix_and_separator() {
        let theme = Theme::default();
        let messages = vec![Message::user("hola"), Message::assistant("Hola\nqué tal")];
        let lines = build_transcript_lines(&messages, &theme);

        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(
            text,
            vec!["Tú: hola", "", "Chatbot IA: Hola", "qué tal", ""]
        );
    }

    #[test]
    fn pending_bubble_uses_pending_style() {
        let theme = Theme::default();
        let lines = build_transcript_lines(&[Message::pending()], &theme);
        assert_eq!(lines[0].spans[1].style, theme.pending_text_style);
        assert_eq!(lines[0].spans[1].content, "Analizando...");
    }

    #[test]
    fn prewrap_breaks_at_word_boundaries() {
        let lines = vec![Line::from("uno dos tres cuatro")];
        let wrapped: Vec<String> = prewrap_lines(&lines, 9).iter().map(plain).collect();
        assert_eq!(wrapped, vec!["uno dos ", "tres ", "cuatro"]);
    }

    #[test]
    fn prewrap_splits_words_longer_than_the_width() {
        let lines = vec![Line::from("a".repeat(25)), Line::from("")];
        let wrapped: Vec<String> = prewrap_lines(&lines, 10).iter().map(plain).collect();
        assert_eq!(wrapped, vec!["a".repeat(10), "a".repeat(10), "a".repeat(5), String::new()]);
    }

    #[test]
    fn prewrap_counts_wide_graphemes_and_keeps_styles() {
        let theme = Theme::default();
        let lines = build_transcript_lines(&[Message::assistant("👍👍👍 ñandú")], &theme);
        let wrapped = prewrap_lines(&lines, 14);
        let text: Vec<String> = wrapped.iter().map(plain).collect();
        assert_eq!(text, vec!["Chatbot IA: ", "👍👍👍 ñandú", ""]);
        assert_eq!(wrapped[0].spans[0].style, theme.assistant_prefix_style);
        assert_eq!(wrapped[1].spans[0].style, theme.assistant_text_style);
    }
}
