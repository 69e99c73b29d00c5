//! Mutable session state owned by the chat controller.
//!
//! The session tracks at most one in-flight operation and at most one active
//! reveal. Both carry monotonically increasing ids so that late events from a
//! cancelled or superseded task can be recognised and dropped.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Send,
    Upload { file_name: String },
}

#[derive(Debug)]
pub struct ActiveOperation {
    pub id: u64,
    pub kind: OperationKind,
    /// Index of the pending assistant bubble this operation will fill.
    pub message_index: usize,
    /// Only send operations can be cancelled.
    pub cancel_token: Option<CancellationToken>,
}

#[derive(Debug)]
pub struct ActiveReveal {
    pub id: u64,
    pub message_index: usize,
    pub final_text: String,
    pub cancel_token: CancellationToken,
    /// Operation that stays busy until this reveal finishes.
    pub completes_operation: Option<u64>,
}

/// What the send button does when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Send,
    Stop,
}

#[derive(Debug, Default)]
pub struct SessionState {
    operation: Option<ActiveOperation>,
    reveal: Option<ActiveReveal>,
    last_operation_id: u64,
    last_reveal_id: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.operation.is_some()
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    pub fn operation(&self) -> Option<&ActiveOperation> {
        self.operation.as_ref()
    }

    pub fn reveal(&self) -> Option<&ActiveReveal> {
        self.reveal.as_ref()
    }

    pub fn affordance(&self) -> Affordance {
        match self.operation.as_ref().map(|op| &op.kind) {
            Some(OperationKind::Send) => Affordance::Stop,
            _ => Affordance::Send,
        }
    }

    /// Mark the session busy with a send and create a cancellation token
    /// bound to this request only.
    pub fn begin_send(&mut self, message_index: usize) -> (u64, CancellationToken) {
        let cancel_token = CancellationToken::new();
        let id = self.begin(OperationKind::Send, message_index, Some(cancel_token.clone()));
        (id, cancel_token)
    }

    /// Mark the session busy with an upload. Uploads carry no cancellation
    /// token.
    pub fn begin_upload(&mut self, message_index: usize, file_name: String) -> u64 {
        self.begin(OperationKind::Upload { file_name }, message_index, None)
    }

    fn begin(
        &mut self,
        kind: OperationKind,
        message_index: usize,
        cancel_token: Option<CancellationToken>,
    ) -> u64 {
        debug_assert!(self.operation.is_none(), "operation already in flight");
        self.last_operation_id += 1;
        self.operation = Some(ActiveOperation {
            id: self.last_operation_id,
            kind,
            message_index,
            cancel_token,
        });
        self.last_operation_id
    }

    pub fn is_current_operation(&self, id: u64) -> bool {
        self.operation.as_ref().is_some_and(|op| op.id == id)
    }

    /// Clear the busy state if `id` is still the active operation.
    pub fn finish_operation(&mut self, id: u64) -> Option<ActiveOperation> {
        if self.is_current_operation(id) {
            self.operation.take()
        } else {
            None
        }
    }

    /// Abort the active send, signalling its cancellation token.
    ///
    /// Uploads are not cancellable and are left untouched.
    pub fn cancel_operation(&mut self) -> Option<ActiveOperation> {
        let cancellable = self
            .operation
            .as_ref()
            .is_some_and(|op| op.cancel_token.is_some());
        if !cancellable {
            return None;
        }
        let operation = self.operation.take()?;
        if let Some(token) = &operation.cancel_token {
            token.cancel();
        }
        Some(operation)
    }

    /// Start a reveal, stopping any reveal that is still running.
    ///
    /// Returns the new reveal id, its token, and the superseded reveal if any.
    pub fn begin_reveal(
        &mut self,
        message_index: usize,
        final_text: String,
        completes_operation: Option<u64>,
    ) -> (u64, CancellationToken, Option<ActiveReveal>) {
        let superseded = self.stop_reveal();
        self.last_reveal_id += 1;
        let cancel_token = CancellationToken::new();
        self.reveal = Some(ActiveReveal {
            id: self.last_reveal_id,
            message_index,
            final_text,
            cancel_token: cancel_token.clone(),
            completes_operation,
        });
        (self.last_reveal_id, cancel_token, superseded)
    }

    pub fn is_current_reveal(&self, id: u64) -> bool {
        self.reveal.as_ref().is_some_and(|reveal| reveal.id == id)
    }

    pub fn finish_reveal(&mut self, id: u64) -> Option<ActiveReveal> {
        if self.is_current_reveal(id) {
            self.reveal.take()
        } else {
            None
        }
    }

    /// Signal the running reveal to stop and forget it.
    pub fn stop_reveal(&mut self) -> Option<ActiveReveal> {
        let reveal = self.reveal.take()?;
        reveal.cancel_token.cancel();
        Some(reveal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_operation_gets_fresh_token_and_stop_affordance() {
        let mut session = SessionState::new();
        assert_eq!(session.affordance(), Affordance::Send);

        let (first_id, first_token) = session.begin_send(1);
        assert!(session.is_busy());
        assert_eq!(session.affordance(), Affordance::Stop);

        session.finish_operation(first_id).expect("active operation");
        first_token.cancel();
        let (second_id, second_token) = session.begin_send(3);
        assert!(second_id > first_id);
        assert!(!second_token.is_cancelled());
    }

    #[test]
    fn upload_is_busy_but_not_cancellable() {
        let mut session = SessionState::new();
        let id = session.begin_upload(1, "a.pdf".into());
        assert!(session.operation().is_some_and(|op| op.cancel_token.is_none()));
        assert_eq!(session.affordance(), Affordance::Send);
        assert!(session.cancel_operation().is_none());
        assert!(session.is_current_operation(id));
    }

    #[test]
    fn cancel_operation_signals_token() {
        let mut session = SessionState::new();
        let (_, token) = session.begin_send(1);

        let cancelled = session.cancel_operation().expect("cancelled operation");
        assert!(token.is_cancelled());
        assert!(!session.is_busy());
        assert!(!session.is_current_operation(cancelled.id));
        assert!(session.cancel_operation().is_none());
    }

    #[test]
    fn finishing_a_stale_operation_is_ignored() {
        let mut session = SessionState::new();
        let (id, _) = session.begin_send(1);
        session.cancel_operation();
        assert!(session.finish_operation(id).is_none());
    }

    #[test]
    fn new_reveal_supersedes_previous() {
        let mut session = SessionState::new();
        let (first_id, first_token, none) = session.begin_reveal(1, "uno".into(), None);
        assert!(none.is_none());

        let (second_id, second_token, superseded) = session.begin_reveal(3, "dos".into(), None);
        let superseded = superseded.expect("previous reveal");
        assert_eq!(superseded.id, first_id);
        assert!(first_token.is_cancelled());
        assert!(!second_token.is_cancelled());
        assert!(!session.is_current_reveal(first_id));
        assert!(session.is_current_reveal(second_id));
    }
}
