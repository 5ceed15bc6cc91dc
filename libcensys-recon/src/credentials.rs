use std::fmt;
use thiserror::Error;

pub const API_ID_ENV: &str = "CENSYS_API_ID";
pub const API_SECRET_ENV: &str = "CENSYS_API_SECRET";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("Censys API ID is not set")]
    MissingApiId,
    #[error("Censys API secret is not set")]
    MissingApiSecret,
}

/// Login/password pair sent as HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_id: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_id: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// A source of API secrets. Each half is looked up independently so sources
/// can be layered.
pub trait CredentialProvider {
    fn api_id(&self) -> Option<String>;
    fn api_secret(&self) -> Option<String>;

    fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let api_id = present(self.api_id()).ok_or(CredentialsError::MissingApiId)?;
        let api_secret = present(self.api_secret()).ok_or(CredentialsError::MissingApiSecret)?;
        Ok(Credentials { api_id, api_secret })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Reads the secrets from environment variables.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    id_var: String,
    secret_var: String,
}

impl EnvCredentials {
    pub fn new(id_var: impl Into<String>, secret_var: impl Into<String>) -> Self {
        Self {
            id_var: id_var.into(),
            secret_var: secret_var.into(),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(API_ID_ENV, API_SECRET_ENV)
    }
}

impl CredentialProvider for EnvCredentials {
    fn api_id(&self) -> Option<String> {
        std::env::var(&self.id_var).ok()
    }

    fn api_secret(&self) -> Option<String> {
        std::env::var(&self.secret_var).ok()
    }
}

impl CredentialProvider for Credentials {
    fn api_id(&self) -> Option<String> {
        Some(self.api_id.clone())
    }

    fn api_secret(&self) -> Option<String> {
        Some(self.api_secret.clone())
    }
}

/// Tries each provider in order; the first non-empty value wins per field.
#[derive(Default)]
pub struct ChainedCredentials {
    providers: Vec<Box<dyn CredentialProvider + Send + Sync>>,
}

impl ChainedCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<P>(mut self, provider: P) -> Self
    where
        P: CredentialProvider + Send + Sync + 'static,
    {
        self.providers.push(Box::new(provider));
        self
    }
}

impl CredentialProvider for ChainedCredentials {
    fn api_id(&self) -> Option<String> {
        self.providers.iter().find_map(|p| present(p.api_id()))
    }

    fn api_secret(&self) -> Option<String> {
        self.providers.iter().find_map(|p| present(p.api_secret()))
    }
}
