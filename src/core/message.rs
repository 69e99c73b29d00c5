use crate::core::constants::{ASSISTANT_SENDER, ATTACHMENT_PREFIX, PENDING_TEXT, USER_SENDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptRole {
    User,
    Assistant,
}

impl TranscriptRole {
    pub fn sender(self) -> &'static str {
        match self {
            TranscriptRole::User => USER_SENDER,
            TranscriptRole::Assistant => ASSISTANT_SENDER,
        }
    }
}

/// Whether a bubble still waits for its final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    #[default]
    Normal,
    Pending,
}

/// One bubble in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: String,
    pub content: String,
    pub role: TranscriptRole,
    pub kind: MessageKind,
}

impl Message {
    pub fn new(role: TranscriptRole, content: impl Into<String>) -> Self {
        Self {
            sender: role.sender().to_string(),
            content: content.into(),
            role,
            kind: MessageKind::Normal,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::User, content)
    }

    pub fn attachment(file_name: &str) -> Self {
        Self::user(format!("{ATTACHMENT_PREFIX}{file_name}"))
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::Assistant, content)
    }

    /// Placeholder bubble shown while a request is in flight.
    pub fn pending() -> Self {
        Self {
            kind: MessageKind::Pending,
            ..Self::assistant(PENDING_TEXT)
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == TranscriptRole::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == TranscriptRole::Assistant
    }

    pub fn is_pending(&self) -> bool {
        self.kind == MessageKind::Pending
    }

    /// Replace the text and leave the pending state.
    pub fn settle(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.kind = MessageKind::Normal;
    }
}
