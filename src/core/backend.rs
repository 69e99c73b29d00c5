//! HTTP client for the two backend endpoints.

use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ChatReply, ChatRequest};
use crate::core::constants::{CHAT_ENDPOINT, PROCESS_FILE_ENDPOINT, UPLOAD_FIELD_NAME};
use crate::core::download::upload_file_name;
use crate::utils::url::endpoint_url;

const BODY_EXCERPT_CHARS: usize = 200;

/// Errors that can end a backend request.
#[derive(Debug)]
pub enum RequestError {
    /// The user aborted the request.
    Cancelled,

    /// The server answered with a non-2xx status.
    Status {
        status: StatusCode,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// Connection, TLS, timeout, or body transfer failure.
    Transport(reqwest::Error),

    /// The `/chat` body was not valid JSON.
    Decode(serde_json::Error),

    /// The file to upload could not be read.
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RequestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Cancelled => write!(f, "request cancelled"),
            RequestError::Status { status, body } => {
                let excerpt = body_excerpt(body);
                if excerpt.is_empty() {
                    write!(f, "server responded with {status}")
                } else {
                    write!(f, "server responded with {status}: {excerpt}")
                }
            }
            RequestError::Transport(source) => write!(f, "request failed: {source}"),
            RequestError::Decode(source) => write!(f, "invalid JSON response: {source}"),
            RequestError::File { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for RequestError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RequestError::Cancelled | RequestError::Status { .. } => None,
            RequestError::Transport(source) => Some(source),
            RequestError::Decode(source) => Some(source),
            RequestError::File { source, .. } => Some(source),
        }
    }
}

fn body_excerpt(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= BODY_EXCERPT_CHARS {
        return collapsed;
    }
    let mut excerpt: String = collapsed.chars().take(BODY_EXCERPT_CHARS).collect();
    excerpt.push('…');
    excerpt
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, RequestError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(RequestError::Transport)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// `POST {base}/chat` with `{"message": ...}`.
    ///
    /// Resolves to [`RequestError::Cancelled`] as soon as `cancel_token` fires,
    /// dropping the in-flight request.
    pub async fn send_chat(
        &self,
        message: &str,
        cancel_token: &CancellationToken,
    ) -> Result<ChatReply, RequestError> {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => Err(RequestError::Cancelled),
            result = self.post_chat(message) => result,
        }
    }

    async fn post_chat(&self, message: &str) -> Result<ChatReply, RequestError> {
        let url = endpoint_url(&self.base_url, CHAT_ENDPOINT);
        debug!(%url, chars = message.chars().count(), "sending chat message");

        let response = self
            .client
            .post(url)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(RequestError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(RequestError::Status { status, body });
        }

        let body = response.bytes().await.map_err(RequestError::Transport)?;
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(RequestError::Decode)?;
        Ok(ChatReply::from_value(&value))
    }

    /// `POST {base}/process-file/` with the file as a multipart part.
    ///
    /// Returns the raw response payload. Not cancellable.
    pub async fn upload_file(&self, path: &Path) -> Result<Vec<u8>, RequestError> {
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| RequestError::File {
                path: path.to_path_buf(),
                source,
            })?;

        let url = endpoint_url(&self.base_url, PROCESS_FILE_ENDPOINT);
        debug!(%url, bytes = contents.len(), "uploading file");

        let part = Part::bytes(contents).file_name(upload_file_name(path));
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(RequestError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(RequestError::Status { status, body });
        }

        let payload = response.bytes().await.map_err(RequestError::Transport)?;
        Ok(payload.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{spawn_stub_server, StubResponse};
    use tempfile::TempDir;

    #[tokio::test]
    async fn chat_posts_json_message_and_reads_response() {
        let server = spawn_stub_server(vec![StubResponse::json(200, r#"{"response":"Hola"}"#)]).await;
        let backend = BackendClient::new(server.base_url(), None).unwrap();

        let reply = backend
            .send_chat("¿Qué tal?", &CancellationToken::new())
            .await
            .expect("chat should succeed");
        assert_eq!(reply.into_text().as_deref(), Some("Hola"));

        let requests = server.finish().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].request_line, "POST /chat HTTP/1.1");
        assert!(requests[0]
            .header("content-type")
            .is_some_and(|value| value.starts_with("application/json")));
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "¿Qué tal?" }));
    }

    #[tokio::test]
    async fn chat_maps_server_error_status() {
        let server = spawn_stub_server(vec![StubResponse::text(500, "boom")]).await;
        let backend = BackendClient::new(server.base_url(), None).unwrap();

        let err = backend
            .send_chat("hola", &CancellationToken::new())
            .await
            .expect_err("500 should fail");
        match &err {
            RequestError::Status { status, body } => {
                assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(!err.is_cancelled());
        server.finish().await;
    }

    #[tokio::test]
    async fn chat_rejects_malformed_json() {
        let server = spawn_stub_server(vec![StubResponse::json(200, "{not json")]).await;
        let backend = BackendClient::new(server.base_url(), None).unwrap();

        let err = backend
            .send_chat("hola", &CancellationToken::new())
            .await
            .expect_err("bad JSON should fail");
        assert!(matches!(err, RequestError::Decode(_)));
        server.finish().await;
    }

    #[tokio::test]
    async fn cancelled_chat_resolves_without_response() {
        let server = spawn_stub_server(vec![StubResponse::Hang]).await;
        let backend = BackendClient::new(server.base_url(), None).unwrap();
        let token = CancellationToken::new();

        let pending = {
            let backend = backend.clone();
            let token = token.clone();
            tokio::spawn(async move { backend.send_chat("hola", &token).await })
        };
        token.cancel();

        let err = pending
            .await
            .unwrap()
            .expect_err("cancelled chat should fail");
        assert!(err.is_cancelled());
        server.abort();
    }

    #[tokio::test]
    async fn upload_sends_multipart_file_and_returns_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("informe.pdf");
        std::fs::write(&path, b"%PDF-1.4 contenido").unwrap();

        let server =
            spawn_stub_server(vec![StubResponse::bytes(200, b"resumen del documento".to_vec())])
                .await;
        let backend = BackendClient::new(server.base_url(), None).unwrap();

        let payload = backend.upload_file(&path).await.expect("upload succeeds");
        assert_eq!(payload, b"resumen del documento");

        let requests = server.finish().await;
        assert_eq!(requests[0].request_line, "POST /process-file/ HTTP/1.1");
        assert!(requests[0]
            .header("content-type")
            .is_some_and(|value| value.starts_with("multipart/form-data")));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains(r#"name="file""#));
        assert!(body.contains(r#"filename="informe.pdf""#));
        assert!(body.contains("%PDF-1.4 contenido"));
    }

    #[tokio::test]
    async fn upload_of_missing_file_fails_before_any_request() {
        let dir = TempDir::new().unwrap();
        let backend = BackendClient::new("http://127.0.0.1:9", None).unwrap();

        let err = backend
            .upload_file(&dir.path().join("missing.txt"))
            .await
            .expect_err("missing file should fail");
        assert!(matches!(err, RequestError::File { .. }));
    }

    #[test]
    fn status_error_display_collapses_and_truncates_body() {
        let err = RequestError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: format!("line one\n  line two {}", "x".repeat(400)),
        };
        let text = err.to_string();
        assert!(text.starts_with("server responded with 502 Bad Gateway: line one line two "));
        assert!(text.ends_with('…'));
    }
}
