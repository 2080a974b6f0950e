//! Configuration management for authgate.
//!
//! Loads configuration from ${AUTHGATE_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding `backend.url`.
pub const BACKEND_URL_ENV: &str = "AUTHGATE_BACKEND_URL";
/// Environment variable used when `backend.anon_key` is not set.
pub const ANON_KEY_ENV: &str = "AUTHGATE_ANON_KEY";

pub mod paths {
    //! Path resolution for authgate configuration and data directories.
    //!
    //! AUTHGATE_HOME resolution order:
    //! 1. AUTHGATE_HOME environment variable (if set)
    //! 2. ~/.config/authgate (default)

    use std::path::PathBuf;

    /// Returns the authgate home directory.
    pub fn authgate_home() -> PathBuf {
        if let Ok(home) = std::env::var("AUTHGATE_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".config")
            .join("authgate")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        authgate_home().join("config.toml")
    }

    /// Returns the path to the local session store file.
    pub fn session_store_path() -> PathBuf {
        authgate_home().join("session.json")
    }

    /// Returns the directory that receives log files.
    pub fn logs_dir() -> PathBuf {
        authgate_home().join("logs")
    }
}

/// Identity backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the identity backend.
    pub url: Option<String>,
    /// Public anon key sent as the `apikey` header.
    pub anon_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Resolves the backend URL with precedence: env > config.
    pub fn resolve_url(&self) -> Result<String> {
        if let Ok(env_url) = std::env::var(BACKEND_URL_ENV) {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        if let Some(config_url) = self.url.as_deref() {
            let trimmed = config_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        anyhow::bail!("No backend URL configured. Set {BACKEND_URL_ENV} or url in [backend].")
    }

    /// Resolves the anon key with precedence: config > env.
    pub fn resolve_anon_key(&self) -> Result<String> {
        if let Some(key) = self.anon_key.as_deref() {
            let trimmed = key.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }

        std::env::var(ANON_KEY_ENV).context(format!(
            "No anon key available. Set {ANON_KEY_ENV} or anon_key in [backend]."
        ))
    }
}

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid backend URL: {url}"))?;
    Ok(())
}

/// Local session store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Case-sensitive substrings selecting keys purged before sign-in.
    pub cleanup_markers: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cleanup_markers: crate::cleanup::DEFAULT_MARKERS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Consent gate policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    /// Treat an unreadable consent profile as accepted.
    pub fail_open: bool,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self { fail_open: true }
    }
}

/// Language used for notice titles and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

/// Screen behaviour settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Return to the login view when the backend reports a sign-out.
    pub reset_on_sign_out: bool,
    /// Notice wording.
    pub locale: Locale,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub consent: ConsentConfig,
    pub screen: ScreenConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default template to `path`.
    ///
    /// Fails if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert!(config.consent.fail_open);
        assert!(!config.screen.reset_on_sign_out);
        assert_eq!(config.screen.locale, Locale::En);
        assert_eq!(
            config.session.cleanup_markers,
            vec!["supabase", "auth", "session"]
        );
        assert_eq!(config.backend.timeout_secs, 30);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[consent]\nfail_open = false\n\n[screen]\nlocale = \"fr\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.consent.fail_open);
        assert_eq!(config.screen.locale, Locale::Fr);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        assert!(config.consent.fail_open);
        assert_eq!(config.session.cleanup_markers.len(), 3);
        assert!(config.backend.url.is_none());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::init(&path).unwrap();
        assert!(path.exists());

        let err = Config::init(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_config_url_is_validated() {
        let backend = BackendConfig {
            url: Some("not a url".to_string()),
            ..BackendConfig::default()
        };
        // Only meaningful when the env override is absent.
        if std::env::var(BACKEND_URL_ENV).is_err() {
            assert!(backend.resolve_url().is_err());
        }
    }

    #[test]
    fn test_config_url_trailing_slash_trimmed() {
        let backend = BackendConfig {
            url: Some("https://abc.supabase.co/".to_string()),
            ..BackendConfig::default()
        };
        if std::env::var(BACKEND_URL_ENV).is_err() {
            assert_eq!(backend.resolve_url().unwrap(), "https://abc.supabase.co");
        }
    }
}
