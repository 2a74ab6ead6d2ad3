//! Connection details for Jira and Tempo.

use super::{ConfigError, Result};

/// Resolved connection details.
///
/// URLs and email come from the config file or environment; tokens come from
/// the environment or the OS keyring and are never written to disk.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The Jira instance URL (e.g., "https://company.atlassian.net").
    pub jira_url: String,
    /// The user's email address, used with the Jira API token.
    pub jira_email: String,
    pub jira_token: String,
    /// The Tempo API base URL (e.g., "https://api.tempo.io").
    pub tempo_url: String,
    pub tempo_token: String,
}

impl Credentials {
    /// Validate these credentials.
    ///
    /// Checks that:
    /// - Both URLs are non-empty and use http:// or https://
    /// - The email is non-empty and looks like an address
    /// - Both tokens are non-empty
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        validate_url("JIRA_URL", &self.jira_url)?;
        validate_url("TEMPO_URL", &self.tempo_url)?;

        if self.jira_email.is_empty() {
            return Err(ConfigError::ValidationError(
                "JIRA_EMAIL cannot be empty".to_string(),
            ));
        }

        if !self.jira_email.contains('@') {
            return Err(ConfigError::ValidationError(format!(
                "'{}' does not appear to be a valid email address",
                self.jira_email
            )));
        }

        if self.jira_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "JIRA_TOKEN cannot be empty".to_string(),
            ));
        }

        if self.tempo_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "TEMPO_TOKEN cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_url(name: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{} cannot be empty",
            name
        )));
    }

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ConfigError::ValidationError(format!(
            "{} must start with http:// or https://",
            name
        )));
    }

    Ok(())
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("jira_url", &self.jira_url)
            .field("jira_email", &self.jira_email)
            .field("tempo_url", &self.tempo_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Credentials {
        Credentials {
            jira_url: "https://company.atlassian.net".to_string(),
            jira_email: "user@company.com".to_string(),
            jira_token: "jira-secret".to_string(),
            tempo_url: "https://api.tempo.io".to_string(),
            tempo_token: "tempo-secret".to_string(),
        }
    }

    #[test]
    fn test_valid_credentials() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_url_without_scheme_rejected() {
        let creds = Credentials {
            jira_url: "company.atlassian.net".to_string(),
            ..valid()
        };
        let err = creds.validate().unwrap_err();
        assert!(err.to_string().contains("JIRA_URL must start with"));
    }

    #[test]
    fn test_invalid_email_rejected() {
        let creds = Credentials {
            jira_email: "not-an-email".to_string(),
            ..valid()
        };
        let err = creds.validate().unwrap_err();
        assert!(err.to_string().contains("valid email"));
    }

    #[test]
    fn test_blank_tempo_token_rejected() {
        let creds = Credentials {
            tempo_token: "  ".to_string(),
            ..valid()
        };
        assert!(creds.validate().is_err());
    }

    #[test]
    fn test_debug_hides_tokens() {
        let output = format!("{:?}", valid());
        assert!(!output.contains("jira-secret"));
        assert!(!output.contains("tempo-secret"));
        assert!(output.contains("company.atlassian.net"));
    }
}
