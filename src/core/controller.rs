//! The chat session controller.
//!
//! [`ChatController`] owns the transcript and the [`SessionState`]. It never
//! performs I/O: user actions return a [`Dispatch`] carrying the
//! [`ControllerCommand`] to run, and the results of those commands come back
//! as [`ControllerEvent`]s through [`ChatController::handle_event`]. Events
//! tagged with an operation or reveal id that is no longer current are
//! dropped, which is what keeps a cancelled request or reveal from touching
//! the transcript again.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ChatReply;
use crate::core::backend::RequestError;
use crate::core::config::CancelScope;
use crate::core::constants::{
    CANCELLED_NOTICE, CHAT_FAILED, REPLY_UNAVAILABLE, UPLOAD_FAILED, UPLOAD_SUCCEEDED,
};
use crate::core::download::{summary_file_name, upload_file_name};
use crate::core::message::Message;
use crate::core::session::{Affordance, OperationKind, SessionState};


/// Work the controller asks its executor to perform.
#[derive(Debug)]
pub enum ControllerCommand {
    SendChat {
        operation_id: u64,
        message: String,
        cancel_token: CancellationToken,
    },
    UploadFile {
        operation_id: u64,
        path: PathBuf,
    },
    StartReveal {
        reveal_id: u64,
        text: String,
        cancel_token: CancellationToken,
    },
    SaveDownload {
        file_name: String,
        payload: Vec<u8>,
    },
}

/// Results reported back by the executor.
#[derive(Debug)]
pub enum ControllerEvent {
    ChatFinished {
        operation_id: u64,
        result: Result<ChatReply, RequestError>,
    },
    UploadFinished {
        operation_id: u64,
        result: Result<Vec<u8>, RequestError>,
    },
    RevealFrame {
        reveal_id: u64,
        prefix: String,
    },
    RevealFinished {
        reveal_id: u64,
    },
    DownloadSaved {
        path: PathBuf,
    },
    DownloadFailed {
        file_name: String,
        error: String,
    },
}

/// Outcome of a user action.
#[derive(Debug)]
pub enum Dispatch {
    /// A new operation started; the input field should be cleared.
    Started(ControllerCommand),
    /// The in-flight send was cancelled.
    Cancelled,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Completed,
    Cancelled,
    Failed,
}

/// Final text and status of one send or upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub operation_id: u64,
    pub status: OperationStatus,
    pub content: String,
}

impl OperationResult {
    fn new(operation_id: u64, status: OperationStatus, content: impl Into<String>) -> Self {
        Self {
            operation_id,
            status,
            content: content.into(),
        }
    }
}

/// Map a `/chat` outcome to the text the assistant bubble ends with.
pub fn chat_result(operation_id: u64, result: Result<ChatReply, RequestError>) -> OperationResult {
    match result {
        Ok(reply) => OperationResult::new(
            operation_id,
            OperationStatus::Completed,
            reply
                .into_text()
                .unwrap_or_else(|| REPLY_UNAVAILABLE.to_string()),
        ),
        Err(err) if err.is_cancelled() => {
            OperationResult::new(operation_id, OperationStatus::Cancelled, CANCELLED_NOTICE)
        }
        Err(_) => OperationResult::new(operation_id, OperationStatus::Failed, CHAT_FAILED),
    }
}

/// Map a `/process-file/` outcome to the text the assistant bubble ends with.
pub fn upload_result(operation_id: u64, result: &Result<Vec<u8>, RequestError>) -> OperationResult {
    match result {
        Ok(_) => OperationResult::new(operation_id, OperationStatus::Completed, UPLOAD_SUCCEEDED),
        Err(_) => OperationResult::new(operation_id, OperationStatus::Failed, UPLOAD_FAILED),
    }
}

pub struct ChatController {
    messages: Vec<Message>,
    session: SessionState,
    cancel_scope: CancelScope,
    last_result: Option<OperationResult>,
    downloads_in_flight: usize,
    saved_downloads: Vec<PathBuf>,
    notice: Option<String>,
}

impl ChatController {
    pub fn new(cancel_scope: CancelScope) -> Self {
        Self {
            messages: Vec::new(),
            session: SessionState::new(),
            cancel_scope,
            last_result: None,
            downloads_in_flight: 0,
            saved_downloads: Vec::new(),
            notice: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    pub fn affordance(&self) -> Affordance {
        self.session.affordance()
    }

    /// No request, reveal, or download is outstanding.
    pub fn is_settled(&self) -> bool {
        !self.session.is_busy() && !self.session.is_revealing() && self.downloads_in_flight == 0
    }

    pub fn last_result(&self) -> Option<&OperationResult> {
        self.last_result.as_ref()
    }

    pub fn saved_downloads(&self) -> &[PathBuf] {
        &self.saved_downloads
    }

    /// Latest app notice (download saved or failed), not part of the transcript.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Enter key: start a send if idle and the text is not blank.
    pub fn submit(&mut self, text: &str) -> Dispatch {
        if self.session.is_busy() {
            debug!("submit rejected while busy");
            return Dispatch::Ignored;
        }
        let message = text.trim();
        if message.is_empty() {
            return Dispatch::Ignored;
        }

        self.settle_active_reveal();
        self.messages.push(Message::user(message));
        self.messages.push(Message::pending());
        let message_index = self.messages.len() - 1;

        let (operation_id, cancel_token) = self.session.begin_send(message_index);
        debug!(operation_id, "send started");

        Dispatch::Started(ControllerCommand::SendChat {
            operation_id,
            message: message.to_string(),
            cancel_token,
        })
    }

    /// The send/stop button: cancels a running send, otherwise submits.
    pub fn press_button(&mut self, text: &str) -> Dispatch {
        if !self.session.is_busy() {
            return self.submit(text);
        }
        if self.cancel() {
            Dispatch::Cancelled
        } else {
            Dispatch::Ignored
        }
    }

    /// File picker change: start an upload if idle and a file was chosen.
    pub fn pick_file(&mut self, path: Option<PathBuf>) -> Dispatch {
        if self.session.is_busy() {
            debug!("upload rejected while busy");
            return Dispatch::Ignored;
        }
        let Some(path) = path.filter(|path| !path.as_os_str().is_empty()) else {
            return Dispatch::Ignored;
        };

        let file_name = upload_file_name(&path);
        self.settle_active_reveal();
        self.messages.push(Message::attachment(&file_name));
        self.messages.push(Message::pending());
        let message_index = self.messages.len() - 1;

        let operation_id = self.session.begin_upload(message_index, file_name);
        debug!(operation_id, path = %path.display(), "upload started");

        Dispatch::Started(ControllerCommand::UploadFile { operation_id, path })
    }

    /// Abort the running send and its reveal.
    ///
    /// Rewrites assistant bubbles to the cancellation notice according to the
    /// configured [`CancelScope`]. Returns `false` and changes nothing when no
    /// send or reveal is active, or while an upload is in flight.
    pub fn cancel(&mut self) -> bool {
        let operation = self.session.cancel_operation();
        if operation.is_none() && self.session.is_busy() {
            return false;
        }
        let reveal = self.session.stop_reveal();
        if operation.is_none() && reveal.is_none() {
            return false;
        }

        let scope = self.cancel_scope;
        for message in self.messages.iter_mut().filter(|m| scope.covers(m)) {
            message.settle(CANCELLED_NOTICE);
        }

        if let Some(operation) = operation {
            info!(operation_id = operation.id, "send cancelled");
            self.last_result = Some(OperationResult::new(
                operation.id,
                OperationStatus::Cancelled,
                CANCELLED_NOTICE,
            ));
        }
        true
    }

    pub fn handle_event(&mut self, event: ControllerEvent) -> Vec<ControllerCommand> {
        match event {
            ControllerEvent::ChatFinished {
                operation_id,
                result,
            } => self.handle_chat_finished(operation_id, result),
            ControllerEvent::UploadFinished {
                operation_id,
                result,
            } => self.handle_upload_finished(operation_id, result),
            ControllerEvent::RevealFrame { reveal_id, prefix } => {
                if let Some(reveal) = self.session.reveal().filter(|r| r.id == reveal_id) {
                    let index = reveal.message_index;
                    if let Some(message) = self.messages.get_mut(index) {
                        message.content = prefix;
                    }
                }
                Vec::new()
            }
            ControllerEvent::RevealFinished { reveal_id } => {
                if let Some(reveal) = self.session.finish_reveal(reveal_id) {
                    if let Some(message) = self.messages.get_mut(reveal.message_index) {
                        message.settle(reveal.final_text);
                    }
                    if let Some(operation_id) = reveal.completes_operation {
                        self.session.finish_operation(operation_id);
                    }
                }
                Vec::new()
            }
            ControllerEvent::DownloadSaved { path } => {
                self.downloads_in_flight = self.downloads_in_flight.saturating_sub(1);
                info!(path = %path.display(), "summary saved");
                self.notice = Some(format!("Summary saved to {}", path.display()));
                self.saved_downloads.push(path);
                Vec::new()
            }
            ControllerEvent::DownloadFailed { file_name, error } => {
                self.downloads_in_flight = self.downloads_in_flight.saturating_sub(1);
                warn!(%file_name, %error, "failed to save summary");
                self.notice = Some(format!("Could not save {file_name}: {error}"));
                Vec::new()
            }
        }
    }

    fn handle_chat_finished(
        &mut self,
        operation_id: u64,
        result: Result<ChatReply, RequestError>,
    ) -> Vec<ControllerCommand> {
        let Some(index) = self.current_message_index(operation_id) else {
            debug!(operation_id, "ignoring result of stale chat request");
            return Vec::new();
        };

        if let Err(err) = &result {
            if !err.is_cancelled() {
                warn!(operation_id, error = %err, "chat request failed");
            }
        }

        let outcome = chat_result(operation_id, result);
        let commands = match outcome.status {
            OperationStatus::Completed => {
                // Stays busy until the reply is fully revealed.
                vec![self.start_reveal(index, outcome.content.clone(), Some(operation_id))]
            }
            OperationStatus::Cancelled => {
                self.session.finish_operation(operation_id);
                if let Some(message) = self.messages.get_mut(index) {
                    message.settle(CANCELLED_NOTICE);
                }
                Vec::new()
            }
            OperationStatus::Failed => {
                self.session.finish_operation(operation_id);
                vec![self.start_reveal(index, outcome.content.clone(), None)]
            }
        };
        self.last_result = Some(outcome);
        commands
    }

    fn handle_upload_finished(
        &mut self,
        operation_id: u64,
        result: Result<Vec<u8>, RequestError>,
    ) -> Vec<ControllerCommand> {
        let Some(index) = self.current_message_index(operation_id) else {
            debug!(operation_id, "ignoring result of stale upload");
            return Vec::new();
        };
        let Some(operation) = self.session.finish_operation(operation_id) else {
            return Vec::new();
        };

        let outcome = upload_result(operation_id, &result);
        let mut commands = vec![self.start_reveal(index, outcome.content.clone(), None)];
        match result {
            Ok(payload) => {
                if let OperationKind::Upload { file_name } = operation.kind {
                    self.downloads_in_flight += 1;
                    commands.push(ControllerCommand::SaveDownload {
                        file_name: summary_file_name(&file_name),
                        payload,
                    });
                }
            }
            Err(err) => warn!(operation_id, error = %err, "upload failed"),
        }
        self.last_result = Some(outcome);
        commands
    }

    fn current_message_index(&self, operation_id: u64) -> Option<usize> {
        self.session
            .operation()
            .filter(|op| op.id == operation_id)
            .map(|op| op.message_index)
    }

    fn start_reveal(
        &mut self,
        message_index: usize,
        text: String,
        completes_operation: Option<u64>,
    ) -> ControllerCommand {
        let (reveal_id, cancel_token, superseded) =
            self.session
                .begin_reveal(message_index, text.clone(), completes_operation);
        if let Some(previous) = superseded {
            debug!(reveal_id = previous.id, "reveal superseded");
            if let Some(message) = self.messages.get_mut(previous.message_index) {
                message.settle(previous.final_text);
            }
        }
        if let Some(message) = self.messages.get_mut(message_index) {
            message.content.clear();
        }
        ControllerCommand::StartReveal {
            reveal_id,
            text,
            cancel_token,
        }
    }

    /// Stop a reveal that is still running and show its full text, so a new
    /// operation never leaves two bubbles pending.
    fn settle_active_reveal(&mut self) {
        if let Some(reveal) = self.session.stop_reveal() {
            if let Some(message) = self.messages.get_mut(reveal.message_index) {
                message.settle(reveal.final_text);
            }
        }
    }
}
