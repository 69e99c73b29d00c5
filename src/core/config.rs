use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::core::constants::{DEFAULT_BASE_URL, DEFAULT_REVEAL_INTERVAL_MS};
use crate::core::message::Message;

/// Which bubbles a cancellation rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CancelScope {
    /// Every assistant bubble, finished or not.
    #[default]
    AllAssistant,
    /// Only bubbles still waiting for their text.
    Pending,
}

impl CancelScope {
    pub fn covers(self, message: &Message) -> bool {
        match self {
            CancelScope::AllAssistant => message.is_assistant(),
            CancelScope::Pending => message.is_assistant() && message.is_pending(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CancelScope::AllAssistant => "all-assistant",
            CancelScope::Pending => "pending",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL; `/chat` and `/process-file/` are joined onto it
    pub base_url: Option<String>,
    /// Milliseconds between revealed characters; 0 disables the animation
    pub reveal_interval_ms: Option<u64>,
    /// Where uploaded document summaries are saved
    pub download_dir: Option<PathBuf>,
    /// Which bubbles a cancellation rewrites
    pub cancel_scope: Option<CancelScope>,
    /// Give up on a request after this many seconds
    pub request_timeout_secs: Option<u64>,
}

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        /// Path to the configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        /// Path to the configuration file with invalid TOML.
        path: PathBuf,
        /// The TOML deserialization error.
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

impl Config {
    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn StdError>> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(config_path)
            .map_err(|err| -> Box<dyn StdError> { Box::new(err) })?;
        Ok(())
    }

    /// `config.toml` in the platform config directory, or in the working
    /// directory when no home directory can be determined.
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("org", "charla", "charla")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("charla.toml"))
    }

    /// Apply command-line and environment overrides on top of the file values.
    ///
    /// A flag wins over the environment, which wins over the file.
    pub fn apply_overrides(
        &mut self,
        base_url_flag: Option<String>,
        base_url_env: Option<String>,
        download_dir: Option<PathBuf>,
    ) {
        let non_blank = |value: &String| !value.trim().is_empty();
        if let Some(base_url) = base_url_flag
            .filter(non_blank)
            .or_else(|| base_url_env.filter(non_blank))
        {
            self.base_url = Some(base_url);
        }
        if let Some(dir) = download_dir {
            self.download_dir = Some(dir);
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(
            self.reveal_interval_ms
                .unwrap_or(DEFAULT_REVEAL_INTERVAL_MS),
        )
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(|| UserDirs::new().and_then(|dirs| dirs.download_dir().map(Path::to_path_buf)))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn cancel_scope(&self) -> CancelScope {
        self.cancel_scope.unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn print_all(&self, config_path: &Path) {
        println!("Configuration file: {}", config_path.display());
        println!("Current configuration:");
        println!("  base-url: {}", self.base_url());
        println!(
            "  reveal-interval-ms: {}",
            self.reveal_interval().as_millis()
        );
        println!("  download-dir: {}", self.download_dir().display());
        println!("  cancel-scope: {}", self.cancel_scope().as_str());
        match self.request_timeout_secs {
            Some(secs) if secs > 0 => println!("  request-timeout-secs: {secs}"),
            _ => println!("  request-timeout-secs: (none)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("nonexistent_config.toml");

        let config = Config::load_from_path(&config_path).expect("Failed to load config");

        assert_eq!(config, Config::default());
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.reveal_interval(), Duration::from_millis(50));
        assert_eq!(config.cancel_scope(), CancelScope::AllAssistant);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            base_url: Some("http://localhost:8000".to_string()),
            reveal_interval_ms: Some(0),
            download_dir: Some(temp_dir.path().join("out")),
            cancel_scope: Some(CancelScope::Pending),
            request_timeout_secs: Some(30),
        };
        config
            .save_to_path(&config_path)
            .expect("Failed to save config");

        let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
        assert_eq!(loaded, config);
        assert_eq!(loaded.reveal_interval(), Duration::ZERO);
        assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_cancel_scope_from_toml() {
        let config: Config = toml::from_str(
            r#"
base_url = "https://example.test/api/"
cancel_scope = "pending"
"#,
        )
        .expect("valid config");
        assert_eq!(config.cancel_scope(), CancelScope::Pending);
        assert_eq!(config.base_url(), "https://example.test/api/");
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "cancel_scope = \"everything\"").unwrap();

        let err = Config::load_from_path(&config_path).expect_err("invalid scope");
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err
            .to_string()
            .starts_with(&format!("Failed to parse config at {}", config_path.display())));
    }

    #[test]
    fn test_override_precedence() {
        let mut config = Config {
            base_url: Some("http://file".to_string()),
            ..Default::default()
        };
        config.apply_overrides(None, Some("http://env".to_string()), None);
        assert_eq!(config.base_url(), "http://env");

        config.apply_overrides(
            Some("http://flag".to_string()),
            Some("http://env2".to_string()),
            Some(PathBuf::from("/tmp/resumenes")),
        );
        assert_eq!(config.base_url(), "http://flag");
        assert_eq!(config.download_dir(), PathBuf::from("/tmp/resumenes"));

        config.apply_overrides(Some("  ".to_string()), Some(String::new()), None);
        assert_eq!(config.base_url(), "http://flag");
    }

    #[test]
    fn test_blank_base_url_falls_back_to_default() {
        let config = Config {
            base_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_cancel_scope_coverage() {
        let mut finished = Message::assistant("Hola");
        let pending = Message::pending();
        let user = Message::user("hola");

        assert!(CancelScope::AllAssistant.covers(&finished));
        assert!(CancelScope::AllAssistant.covers(&pending));
        assert!(!CancelScope::AllAssistant.covers(&user));

        assert!(!CancelScope::Pending.covers(&finished));
        assert!(CancelScope::Pending.covers(&pending));
        finished.kind = crate::core::message::MessageKind::Pending;
        assert!(CancelScope::Pending.covers(&finished));
    }
}
