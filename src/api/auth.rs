//! Authentication for the Jira and Tempo APIs.
//!
//! Jira uses Basic Auth (email + API token); Tempo uses a Bearer token.
//! Tokens that are not supplied through the environment are looked up in
//! the OS keyring.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::error::{ApiError, Result};

/// The keyring service name for jira-tui tokens.
pub const KEYRING_SERVICE: &str = "jira-tui";

/// A prebuilt `Authorization` header value.
///
/// The raw token is never stored.
#[derive(Clone)]
pub struct Auth {
    header: String,
}

impl Auth {
    /// Basic credentials for Jira.
    pub fn basic(email: &str, token: &str) -> Self {
        let credentials = format!("{}:{}", email, token);
        Self {
            header: format!("Basic {}", BASE64.encode(credentials.as_bytes())),
        }
    }

    /// Bearer credentials for Tempo.
    pub fn bearer(token: &str) -> Self {
        Self {
            header: format!("Bearer {}", token),
        }
    }

    /// Get the authorization header value for HTTP requests.
    pub fn header_value(&self) -> &str {
        &self.header
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = self.header.split(' ').next().unwrap_or_default();
        f.debug_struct("Auth").field("scheme", &scheme).finish()
    }
}

/// Retrieve a token from the OS keyring.
///
/// `account` is `"jira"` or `"tempo"`.
///
/// # Errors
///
/// Returns `ApiError::Keyring` if no entry exists or the keyring is unavailable.
pub fn get_token(account: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve {} token: {}", account, e)))
}
