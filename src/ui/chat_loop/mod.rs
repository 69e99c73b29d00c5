//! Interactive chat loop.
//!
//! Terminal events and controller events are drained on every iteration; the
//! frame is redrawn at most 60 times a second and only when something changed.

mod keybindings;
mod lifecycle;

use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use directories::UserDirs;
use ratatui::crossterm::event::{self, Event, KeyEvent};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tui_textarea::{Input as TAInput, TextArea};

use crate::core::backend::BackendClient;
use crate::core::config::Config;
use crate::core::controller::{ChatController, ControllerEvent, Dispatch};
use crate::core::executor::CommandExecutor;
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;

pub use keybindings::{key_action, KeyAction};
use lifecycle::{restore_terminal, setup_terminal, ChatTerminal};

const SCROLL_STEP: u16 = 10;

pub struct ChatApp {
    pub controller: ChatController,
    pub textarea: TextArea<'static>,
    /// One-line path input shown while choosing a file to upload.
    pub attach_prompt: Option<TextArea<'static>>,
    /// Rows scrolled up from the bottom of the transcript.
    pub scroll_from_bottom: u16,
    pub exit_requested: bool,
    pub base_url: String,
    pub theme: Theme,
}

impl ChatApp {
    pub fn new(controller: ChatController, base_url: String) -> Self {
        let theme = Theme::default();
        Self {
            controller,
            textarea: styled_textarea(&theme),
            attach_prompt: None,
            scroll_from_bottom: 0,
            exit_requested: false,
            base_url,
            theme,
        }
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn open_attach_prompt(&mut self) {
        if self.controller.is_busy() {
            debug!("attach prompt not opened while busy");
            return;
        }
        self.attach_prompt = Some(styled_textarea(&self.theme));
    }

    pub fn handle_terminal_event(&mut self, event: Event) -> Dispatch {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Paste(text) => {
                let target = self.attach_prompt.as_mut().unwrap_or(&mut self.textarea);
                target.insert_str(text);
                Dispatch::Ignored
            }
            _ => Dispatch::Ignored,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Dispatch {
        match key_action(&key, self.attach_prompt.is_some()) {
            KeyAction::Quit => {
                self.exit_requested = true;
                Dispatch::Ignored
            }
            KeyAction::Submit => {
                let dispatch = self.controller.submit(&self.input_text());
                self.after_dispatch(dispatch)
            }
            KeyAction::ToggleButton => {
                let dispatch = self.controller.press_button(&self.input_text());
                self.after_dispatch(dispatch)
            }
            KeyAction::Newline => {
                self.textarea.insert_newline();
                Dispatch::Ignored
            }
            KeyAction::OpenAttach => {
                self.open_attach_prompt();
                Dispatch::Ignored
            }
            KeyAction::CloseAttach => {
                self.attach_prompt = None;
                Dispatch::Ignored
            }
            KeyAction::ConfirmAttach => {
                let path = self
                    .attach_prompt
                    .take()
                    .and_then(|prompt| resolve_attach_path(&prompt.lines().join("")));
                let dispatch = self.controller.pick_file(path);
                self.after_dispatch(dispatch)
            }
            KeyAction::EditAttach => {
                if let Some(prompt) = self.attach_prompt.as_mut() {
                    prompt.input(TAInput::from(key));
                }
                Dispatch::Ignored
            }
            KeyAction::ScrollUp => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(SCROLL_STEP);
                Dispatch::Ignored
            }
            KeyAction::ScrollDown => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(SCROLL_STEP);
                Dispatch::Ignored
            }
            KeyAction::Edit => {
                self.textarea.input(TAInput::from(key));
                Dispatch::Ignored
            }
            KeyAction::Ignore => Dispatch::Ignored,
        }
    }

    /// A started operation clears the input and jumps back to the bottom.
    fn after_dispatch(&mut self, dispatch: Dispatch) -> Dispatch {
        if let Dispatch::Started(command) = dispatch {
            self.textarea = styled_textarea(&self.theme);
            self.scroll_from_bottom = 0;
            return Dispatch::Started(command);
        }
        dispatch
    }
}

fn styled_textarea(theme: &Theme) -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_style(theme.input_text_style);
    textarea.set_cursor_style(theme.input_cursor_style);
    textarea.set_cursor_line_style(theme.input_cursor_line_style);
    textarea
}

/// Blank input means no file was chosen; `~/` expands to the home directory.
fn resolve_attach_path(input: &str) -> Option<PathBuf> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(dirs) = UserDirs::new() {
            return Some(dirs.home_dir().join(rest));
        }
    }
    Some(PathBuf::from(input))
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<Event>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(config: &Config) -> Result<(), Box<dyn Error>> {
    let backend = BackendClient::new(config.base_url(), config.request_timeout())?;
    let (executor, mut controller_rx) =
        CommandExecutor::new(backend, config.reveal_interval(), config.download_dir());
    let mut app = ChatApp::new(
        ChatController::new(config.cancel_scope()),
        config.base_url().to_string(),
    );
    info!(base_url = %app.base_url, "starting chat session");

    let mut terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let event_reader_handle = spawn_event_reader(event_tx);

    let result = event_loop(
        &mut app,
        &mut terminal,
        &executor,
        &mut event_rx,
        &mut controller_rx,
    )
    .await;

    event_reader_handle.abort();
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    app: &mut ChatApp,
    terminal: &mut ChatTerminal,
    executor: &CommandExecutor,
    event_rx: &mut mpsc::UnboundedReceiver<Event>,
    controller_rx: &mut mpsc::UnboundedReceiver<ControllerEvent>,
) -> Result<(), Box<dyn Error>> {
    const MAX_FPS: u64 = 60;
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    loop {
        if app.exit_requested {
            return Ok(());
        }

        if request_redraw && last_draw.elapsed() >= frame_duration {
            terminal.draw(|f| ui(f, app))?;
            last_draw = Instant::now();
            request_redraw = false;
        }

        let mut handled = false;
        while let Ok(event) = event_rx.try_recv() {
            handled = true;
            let dispatch = app.handle_terminal_event(event);
            executor.dispatch(dispatch);
        }
        while let Ok(event) = controller_rx.try_recv() {
            handled = true;
            let commands = app.controller.handle_event(event);
            executor.execute_all(commands);
        }

        if handled {
            request_redraw = true;
        } else {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    }
}
