//! Account credentials and login.

use std::path::Path;

use crate::client::BlueskyApi;
use crate::error::{AppError, Result};

/// Identifier (handle or email) and app password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Parse a credentials file: identifier on the first line, password on the second.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().map(str::trim);
        let identifier = lines.next().unwrap_or_default();
        let password = lines.next().unwrap_or_default();

        if identifier.is_empty() || password.is_empty() {
            return Err(AppError::auth(
                "credentials file needs the identifier on line 1 and the password on line 2",
            ));
        }
        Ok(Self::new(identifier, password))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::auth(format!(
                "cannot read credentials file {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&content)
    }
}

/// Open a session; rejected credentials are an error.
pub async fn login(api: &dyn BlueskyApi, credentials: &Credentials) -> Result<()> {
    log::info!("Logging in as {}", credentials.identifier);
    let accepted = api
        .login(&credentials.identifier, &credentials.password)
        .await?;
    if accepted {
        Ok(())
    } else {
        Err(AppError::auth(format!(
            "login rejected for {}",
            credentials.identifier
        )))
    }
}
