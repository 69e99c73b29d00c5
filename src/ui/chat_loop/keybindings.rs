//! Key to action mapping for the chat loop

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Enter: send the typed message.
    Submit,
    /// The send/stop button.
    ToggleButton,
    Newline,
    OpenAttach,
    CloseAttach,
    ConfirmAttach,
    EditAttach,
    ScrollUp,
    ScrollDown,
    Edit,
    Ignore,
}

/// Map a key press to an action. `attach_open` routes editing keys to the
/// attach prompt instead of the message input.
pub fn key_action(key: &KeyEvent, attach_open: bool) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::PageUp => return KeyAction::ScrollUp,
        KeyCode::PageDown => return KeyAction::ScrollDown,
        _ => {}
    }

    if attach_open {
        return match key.code {
            KeyCode::Esc => KeyAction::CloseAttach,
            KeyCode::Enter => KeyAction::ConfirmAttach,
            _ => KeyAction::EditAttach,
        };
    }

    match key.code {
        KeyCode::Enter if alt => KeyAction::Newline,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Char('s') if ctrl => KeyAction::ToggleButton,
        KeyCode::Char('o') if ctrl => KeyAction::OpenAttach,
        KeyCode::Esc => KeyAction::Ignore,
        _ => KeyAction::Edit,
    }
}
