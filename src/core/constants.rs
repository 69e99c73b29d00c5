//! Shared constants used across the application

/// Sender label shown on bubbles typed by the user.
pub const USER_SENDER: &str = "Tú";
/// Sender label shown on bubbles written by the backend.
pub const ASSISTANT_SENDER: &str = "Chatbot IA";

/// Provisional text of a pending assistant bubble.
pub const PENDING_TEXT: &str = "Analizando...";
/// Prefix of the user bubble created for an upload.
pub const ATTACHMENT_PREFIX: &str = "Archivo adjuntado: ";

pub const REPLY_UNAVAILABLE: &str = "Respuesta no disponible.";
pub const CANCELLED_NOTICE: &str = "El proceso ha sido cancelado.";
pub const CHAT_FAILED: &str = "Error al conectar con el servidor.";
pub const UPLOAD_SUCCEEDED: &str = "Descarga exitosa.";
pub const UPLOAD_FAILED: &str = "Hubo un problema al analizar el documento.";

pub const CHAT_ENDPOINT: &str = "chat";
/// The backend routes this path with its trailing slash.
pub const PROCESS_FILE_ENDPOINT: &str = "process-file/";
pub const UPLOAD_FIELD_NAME: &str = "file";
pub const SUMMARY_SUFFIX: &str = "_resumen.txt";

pub const DEFAULT_BASE_URL: &str = "https://staticfunctiondeepseek.azurewebsites.net";
pub const DEFAULT_REVEAL_INTERVAL_MS: u64 = 50;

/// Environment variable that overrides the configured base URL.
pub const BASE_URL_ENV: &str = "CHARLA_BASE_URL";
