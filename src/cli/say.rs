//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::core::backend::BackendClient;
use crate::core::config::Config;
use crate::core::controller::{ChatController, ControllerEvent, OperationStatus};
use crate::core::executor::{run_until_settled, CommandExecutor};
use crate::core::message::Message;

/// Prints a bubble's revealed text incrementally.
///
/// Only text produced by the reveal is printed; the provisional pending text
/// never reaches the output.
#[derive(Debug, Default)]
pub struct RevealPrinter {
    printed: String,
}

impl RevealPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<W: Write>(
        &mut self,
        message: &Message,
        revealing: bool,
        out: &mut W,
    ) -> io::Result<()> {
        if message.is_pending() && !revealing {
            return Ok(());
        }
        let Some(delta) = message.content.strip_prefix(self.printed.as_str()) else {
            return Ok(());
        };
        if delta.is_empty() {
            return Ok(());
        }
        out.write_all(delta.as_bytes())?;
        out.flush()?;
        self.printed.push_str(delta);
        Ok(())
    }
}

/// Drive one operation to completion, printing the assistant bubble as it is
/// revealed. Returns the controller for inspection.
pub(crate) async fn reveal_to_stdout(
    mut controller: ChatController,
    executor: CommandExecutor,
    mut rx: mpsc::UnboundedReceiver<ControllerEvent>,
) -> Result<ChatController, Box<dyn Error>> {
    let mut printer = RevealPrinter::new();
    let mut stdout = io::stdout();
    let mut write_error = None;

    run_until_settled(&mut controller, &executor, &mut rx, |controller| {
        let revealing = controller.session().is_revealing();
        if let Some(message) = controller.messages().last() {
            if write_error.is_none() {
                write_error = printer.update(message, revealing, &mut stdout).err();
            }
        }
    })
    .await;

    if let Some(err) = write_error {
        return Err(err.into());
    }
    println!();
    Ok(controller)
}

pub async fn run_say(
    prompt: Vec<String>,
    no_animate: bool,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: charla say <message>");
        std::process::exit(1);
    }

    let backend = BackendClient::new(config.base_url(), config.request_timeout())?;
    let reveal_interval = if no_animate {
        Duration::ZERO
    } else {
        config.reveal_interval()
    };
    let (executor, rx) = CommandExecutor::new(backend, reveal_interval, config.download_dir());
    let mut controller = ChatController::new(config.cancel_scope());

    executor.dispatch(controller.submit(&prompt));
    let controller = reveal_to_stdout(controller, executor, rx).await?;

    if controller
        .last_result()
        .is_some_and(|result| result.status == OperationStatus::Failed)
    {
        std::process::exit(1);
    }
    Ok(())
}
