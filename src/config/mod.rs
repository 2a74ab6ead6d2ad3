//! Configuration management for jira-tui.
//!
//! Settings are layered: built-in defaults, then the optional TOML file
//! (`<config dir>/jira-tui/config.toml` or `--config PATH`), then the
//! `JIRA_*` / `TEMPO_*` environment variables. Tokens missing from the
//! environment are looked up in the OS keyring.

mod credentials;
mod settings;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub use credentials::Credentials;
pub use settings::Settings;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform configuration directory could not be determined.
    #[error("could not determine configuration directory")]
    NoConfigDir,

    /// The config file exists but could not be read.
    #[error("failed to read config file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A required setting is absent from every source.
    #[error("missing required setting {0}")]
    Missing(String),

    /// A setting is present but invalid.
    #[error("{0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The `[jira]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JiraTable {
    url: Option<String>,
    email: Option<String>,
}

/// The `[tempo]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TempoTable {
    url: Option<String>,
}

/// On-disk shape of `config.toml`. Every table is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    jira: JiraTable,
    tempo: TempoTable,
    settings: Settings,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub settings: Settings,
}

impl Config {
    /// Load configuration from the file, the process environment and the keyring.
    ///
    /// `path` overrides the default file location. A missing default file is
    /// not an error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => read_file(p)?,
            None => {
                let default = Self::default_path()?;
                if default.exists() {
                    read_file(&default)?
                } else {
                    debug!(path = %default.display(), "No config file, using defaults");
                    FileConfig::default()
                }
            }
        };

        resolve(
            file,
            |name| std::env::var(name).ok(),
            |account| crate::api::get_token(account).ok(),
        )
    }

    /// Get the default path of the config file.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("jira-tui").join("config.toml"))
    }
}

fn read_file(path: &Path) -> Result<FileConfig> {
    info!(path = %path.display(), "Reading config file");
    let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
    Ok(toml::from_str(&contents)?)
}

/// Merge file values with environment overrides and keyring fallbacks.
fn resolve(
    file: FileConfig,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let required = |name: &str, file_value: Option<String>| {
        non_empty(env(name))
            .or_else(|| non_empty(file_value))
            .ok_or_else(|| ConfigError::Missing(name.to_string()))
    };

    let token = |name: &str, account: &str| {
        non_empty(env(name))
            .or_else(|| non_empty(keyring(account)))
            .ok_or_else(|| ConfigError::Missing(name.to_string()))
    };

    let credentials = Credentials {
        jira_url: required("JIRA_URL", file.jira.url)?,
        jira_email: required("JIRA_EMAIL", file.jira.email)?,
        jira_token: token("JIRA_TOKEN", "jira")?,
        tempo_url: required("TEMPO_URL", file.tempo.url)?,
        tempo_token: token("TEMPO_TOKEN", "tempo")?,
    };
    credentials.validate()?;
    file.settings.validate()?;

    Ok(Config {
        credentials,
        settings: file.settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("JIRA_URL", "https://env.atlassian.net"),
            ("JIRA_EMAIL", "env@company.com"),
            ("JIRA_TOKEN", "jira-token"),
            ("TEMPO_URL", "https://api.tempo.io"),
            ("TEMPO_TOKEN", "tempo-token"),
        ])
    }

    fn lookup(map: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
        move |name| map.get(name).map(|v| v.to_string())
    }

    fn no_keyring(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_from_environment_only() {
        let config = resolve(FileConfig::default(), lookup(full_env()), no_keyring).unwrap();

        assert_eq!(config.credentials.jira_url, "https://env.atlassian.net");
        assert_eq!(config.credentials.tempo_token, "tempo-token");
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_each_missing_variable_is_reported() {
        for name in ["JIRA_URL", "JIRA_EMAIL", "JIRA_TOKEN", "TEMPO_URL", "TEMPO_TOKEN"] {
            let mut env = full_env();
            env.remove(name);

            let err = resolve(FileConfig::default(), lookup(env), no_keyring).unwrap_err();
            match err {
                ConfigError::Missing(missing) => assert_eq!(missing, name),
                other => panic!("expected Missing({}), got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_environment_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            [jira]
            url = "https://file.atlassian.net"
            email = "file@company.com"
            "#,
        )
        .unwrap();

        let config = resolve(file, lookup(full_env()), no_keyring).unwrap();
        assert_eq!(config.credentials.jira_url, "https://env.atlassian.net");
        assert_eq!(config.credentials.jira_email, "env@company.com");
    }

    #[test]
    fn test_tokens_fall_back_to_keyring() {
        let mut env = full_env();
        env.remove("JIRA_TOKEN");
        env.remove("TEMPO_TOKEN");
        let keyring = |account: &str| Some(format!("{}-from-keyring", account));

        let config = resolve(FileConfig::default(), lookup(env), keyring).unwrap();
        assert_eq!(config.credentials.jira_token, "jira-from-keyring");
        assert_eq!(config.credentials.tempo_token, "tempo-from-keyring");
    }

    #[test]
    fn test_blank_environment_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("JIRA_URL", "   ");

        let err = resolve(FileConfig::default(), lookup(env), no_keyring).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ref n) if n == "JIRA_URL"));
    }

    #[test]
    fn test_invalid_url_is_validation_error() {
        let mut env = full_env();
        env.insert("TEMPO_URL", "api.tempo.io");

        let err = resolve(FileConfig::default(), lookup(env), no_keyring).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_load_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [jira]
            url = "https://company.atlassian.net"

            [settings]
            cancel_patterns = ["cancel", "abandon"]
            change_issue_key = "OPS-42"
            worklog_concurrency = 3
            "#
        )
        .unwrap();

        let parsed = read_file(file.path()).unwrap();
        let config = resolve(parsed, lookup(full_env()), no_keyring).unwrap();

        assert_eq!(config.settings.cancel_patterns, vec!["cancel", "abandon"]);
        assert_eq!(config.settings.change_issue_key.as_deref(), Some("OPS-42"));
        assert_eq!(config.settings.worklog_concurrency, 3);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[settings\nworklog_concurrency = ").unwrap();

        assert!(matches!(read_file(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::ReadError(_))
        ));
    }

    #[test]
    fn test_default_path_layout() {
        let path = Config::default_path().unwrap();
        assert!(path.ends_with("jira-tui/config.toml"));
    }
}
