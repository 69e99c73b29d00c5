use serde::Serialize;
use serde_json::Value;

/// Body of `POST {base}/chat`.
#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Decoded reply from `POST {base}/chat`.
///
/// The backend is expected to answer with `{"response": "..."}`, but any JSON
/// document is accepted: a missing, empty, or non-string `response` simply
/// yields no text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub response: Option<String>,
}

impl ChatReply {
    pub fn from_value(value: &Value) -> Self {
        let response = value
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_owned);
        Self { response }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
        }
    }

    /// The reply text, or `None` when the backend sent nothing usable.
    pub fn into_text(self) -> Option<String> {
        self.response.filter(|text| !text.is_empty())
    }
}
