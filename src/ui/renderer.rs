use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::core::controller::ChatController;
use crate::core::session::{Affordance, OperationKind};
use crate::ui::chat_loop::ChatApp;
use crate::ui::layout::{build_transcript_lines, prewrap_lines};

const MAX_INPUT_LINES: u16 = 5;

/// Hint shown in the input title for the current session state.
pub fn input_title(controller: &ChatController) -> &'static str {
    match controller.session().operation().map(|op| &op.kind) {
        Some(OperationKind::Send) => "Waiting for the reply (Ctrl+S to stop, Ctrl+C to quit)",
        Some(OperationKind::Upload { .. }) => "Analyzing the document (Ctrl+C to quit)",
        None => "Type your message (Enter to send, Ctrl+O to attach a file, Ctrl+C to quit)",
    }
}

/// Label of the send/stop button.
pub fn button_label(affordance: Affordance) -> &'static str {
    match affordance {
        Affordance::Send => " ➤ Send ",
        Affordance::Stop => " ■ Stop ",
    }
}

pub fn ui(f: &mut Frame, app: &ChatApp) {
    let theme = &app.theme;
    let input_lines = u16::try_from(app.textarea.lines().len()).unwrap_or(u16::MAX);
    let input_area_height = input_lines.min(MAX_INPUT_LINES);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(input_area_height + 2), // +2 for borders
        ])
        .split(f.area());

    let lines = prewrap_lines(
        &build_transcript_lines(app.controller.messages(), theme),
        chunks[0].width,
    );

    // Scroll is kept relative to the bottom so new text stays in view.
    let available_height = chunks[0].height.saturating_sub(1); // Account for title
    let total_wrapped_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_offset = total_wrapped_lines.saturating_sub(available_height);
    let scroll_offset = max_offset - app.scroll_from_bottom.min(max_offset);

    let title = format!("Charla v{} - {}", env!("CARGO_PKG_VERSION"), app.base_url);
    let messages_paragraph = Paragraph::new(lines)
        .block(Block::default().title(Span::styled(title, theme.title_style)))
        .scroll((scroll_offset, 0));
    f.render_widget(messages_paragraph, chunks[0]);

    if let Some(notice) = app.controller.notice() {
        f.render_widget(
            Paragraph::new(Span::styled(notice.to_string(), theme.notice_style)),
            chunks[1],
        );
    }

    let affordance = app.controller.affordance();
    let button_style = if affordance == Affordance::Stop {
        theme.busy_indicator_style
    } else {
        theme.input_title_style
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.input_border_style)
        .title(Span::styled(
            input_title(&app.controller),
            theme.input_title_style,
        ))
        .title(Line::from(Span::styled(button_label(affordance), button_style)).right_aligned());
    let input_inner = input_block.inner(chunks[2]);
    f.render_widget(input_block, chunks[2]);
    f.render_widget(&app.textarea, input_inner);

    if let Some(prompt) = &app.attach_prompt {
        let area = centered_rect(f.area(), 70, 3);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.input_border_style)
            .title(Span::styled(
                "Attach a file (Enter to upload, Esc to cancel)",
                theme.input_title_style,
            ));
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);
        f.render_widget(prompt, inner);
    }
}

/// A rectangle `percent_x` wide and `height` rows tall in the middle of `area`.
fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = area.width.saturating_mul(percent_x) / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
