//! Diagnostic logging setup.
//!
//! The full-screen chat UI owns the terminal, so it only logs when a file is
//! given. The one-shot commands log to stderr unless redirected.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "charla=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Disabled,
}

impl LogTarget {
    /// Pick the target for a command: an explicit file always wins.
    pub fn resolve(log_file: Option<PathBuf>, terminal_ui: bool) -> Self {
        match log_file {
            Some(path) => LogTarget::File(path),
            None if terminal_ui => LogTarget::Disabled,
            None => LogTarget::Stderr,
        }
    }
}

/// `RUST_LOG` when set and valid, otherwise `charla=info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_logging(target: LogTarget) -> Result<(), Box<dyn Error>> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    let result = match target {
        LogTarget::Disabled => return Ok(()),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|err| format!("Failed to open log file {}: {}", path.display(), err))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    result.map_err(|err| format!("Failed to initialize logging: {err}").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_log_file_wins() {
        let path = PathBuf::from("/tmp/charla.log");
        assert_eq!(
            LogTarget::resolve(Some(path.clone()), true),
            LogTarget::File(path.clone())
        );
        assert_eq!(LogTarget::resolve(Some(path.clone()), false), LogTarget::File(path));
    }

    #[test]
    fn terminal_ui_stays_quiet_without_file() {
        assert_eq!(LogTarget::resolve(None, true), LogTarget::Disabled);
        assert_eq!(LogTarget::resolve(None, false), LogTarget::Stderr);
    }

    #[test]
    fn disabled_target_installs_nothing() {
        assert!(init_logging(LogTarget::Disabled).is_ok());
    }
}
