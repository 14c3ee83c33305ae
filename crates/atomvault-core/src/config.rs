//! Account credentials and the immutable request context
//!
//! Credentials are resolved once before any network call and threaded into
//! the API client by value, never read from ambient globals mid-run. This
//! keeps the pipeline testable against fake accounts.

use crate::error::{Error, Result};

/// Environment variable holding the account identifier
pub const ACCOUNT_ID_VAR: &str = "BOOMI_ACCOUNT_ID";

/// Environment variable holding the username
pub const USERNAME_VAR: &str = "BOOMI_USERNAME";

/// Environment variable holding the API token
pub const API_TOKEN_VAR: &str = "BOOMI_API_TOKEN";

/// AtomSphere account credentials
///
/// Authentication uses token-based basic auth: the basic-auth user is
/// `BOOMI_TOKEN.{username}` and the password is the API token.
#[derive(Debug, Clone)]
pub struct Credentials {
    account_id: String,
    username: String,
    api_token: String,
}

impl Credentials {
    /// Build credentials from values that may each be absent
    ///
    /// Every value is typically an optional CLI flag with an environment
    /// fallback. The first missing value is a pre-flight configuration
    /// error naming the variable to set.
    pub fn new(
        account_id: Option<String>,
        username: Option<String>,
        api_token: Option<String>,
    ) -> Result<Self> {
        let account_id = require(account_id, "account id", ACCOUNT_ID_VAR)?;
        let username = require(username, "username", USERNAME_VAR)?;
        let api_token = require(api_token, "API token", API_TOKEN_VAR)?;

        Ok(Self {
            account_id,
            username,
            api_token,
        })
    }

    /// The account identifier, used as a URL path segment
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// The basic-auth user for token authentication
    pub fn auth_user(&self) -> String {
        format!("BOOMI_TOKEN.{}", self.username)
    }

    /// The basic-auth password
    pub fn auth_password(&self) -> &str {
        &self.api_token
    }
}

fn require(value: Option<String>, name: &str, env_var: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::missing_credential(name, env_var)),
    }
}
