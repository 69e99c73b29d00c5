//! Runs [`ControllerCommand`]s on tokio tasks.
//!
//! Every task reports back through one unbounded channel, tagged with the
//! operation or reveal id it was started for. The controller decides whether
//! the event is still current.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::core::backend::BackendClient;
use crate::core::controller::{ChatController, ControllerCommand, ControllerEvent, Dispatch};
use crate::core::download::save_summary;
use crate::core::reveal::run_reveal;

pub struct CommandExecutor {
    backend: BackendClient,
    reveal_interval: Duration,
    download_dir: PathBuf,
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl CommandExecutor {
    pub fn new(
        backend: BackendClient,
        reveal_interval: Duration,
        download_dir: PathBuf,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                backend,
                reveal_interval,
                download_dir,
                tx,
            },
            rx,
        )
    }

    /// Run the command started by a user action, if any.
    pub fn dispatch(&self, dispatch: Dispatch) {
        if let Dispatch::Started(command) = dispatch {
            self.execute(command);
        }
    }

    pub fn execute_all(&self, commands: Vec<ControllerCommand>) {
        for command in commands {
            self.execute(command);
        }
    }

    pub fn execute(&self, command: ControllerCommand) {
        let tx = self.tx.clone();
        match command {
            ControllerCommand::SendChat {
                operation_id,
                message,
                cancel_token,
            } => {
                let backend = self.backend.clone();
                tokio::spawn(async move {
                    let result = backend.send_chat(&message, &cancel_token).await;
                    let _ = tx.send(ControllerEvent::ChatFinished {
                        operation_id,
                        result,
                    });
                });
            }
            ControllerCommand::UploadFile { operation_id, path } => {
                let backend = self.backend.clone();
                tokio::spawn(async move {
                    let result = backend.upload_file(&path).await;
                    let _ = tx.send(ControllerEvent::UploadFinished {
                        operation_id,
                        result,
                    });
                });
            }
            ControllerCommand::StartReveal {
                reveal_id,
                text,
                cancel_token,
            } => {
                tokio::spawn(run_reveal(
                    reveal_id,
                    text,
                    self.reveal_interval,
                    cancel_token,
                    tx,
                ));
            }
            ControllerCommand::SaveDownload { file_name, payload } => {
                let dir = self.download_dir.clone();
                tokio::spawn(async move {
                    let name = file_name.clone();
                    let saved =
                        tokio::task::spawn_blocking(move || save_summary(&dir, &name, &payload))
                            .await;
                    let event = match saved {
                        Ok(Ok(path)) => ControllerEvent::DownloadSaved { path },
                        Ok(Err(err)) => ControllerEvent::DownloadFailed {
                            file_name,
                            error: err.to_string(),
                        },
                        Err(join_err) => {
                            error!(error = %join_err, "download task failed");
                            ControllerEvent::DownloadFailed {
                                file_name,
                                error: join_err.to_string(),
                            }
                        }
                    };
                    let _ = tx.send(event);
                });
            }
        }
    }
}

/// Drive the controller until nothing is outstanding.
///
/// `on_update` sees the controller after every handled event.
pub async fn run_until_settled(
    controller: &mut ChatController,
    executor: &CommandExecutor,
    rx: &mut mpsc::UnboundedReceiver<ControllerEvent>,
    mut on_update: impl FnMut(&ChatController),
) {
    while !controller.is_settled() {
        let Some(event) = rx.recv().await else {
            debug!("event channel closed before the session settled");
            return;
        };
        let commands = controller.handle_event(event);
        executor.execute_all(commands);
        on_update(controller);
    }
}
