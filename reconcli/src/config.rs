use libcensys_recon::{CredentialProvider, ReconConfig};
use serde::{Deserialize, Serialize};
use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub censys: CensysConfig,
    #[serde(default)]
    pub recon: RunConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct CensysConfig {
    #[serde(default)]
    pub api_id: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RunConfig {
    #[serde(default)]
    pub max_concurrent: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_rate_per_second: Option<u32>,
    #[serde(default)]
    pub doh_url: Option<String>,
}

impl CredentialProvider for CensysConfig {
    fn api_id(&self) -> Option<String> {
        self.api_id.clone()
    }

    fn api_secret(&self) -> Option<String> {
        self.api_secret.clone()
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub max_concurrent: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_rate_per_second: Option<u32>,
}

impl Config {
    pub fn recon_config(&self, overrides: &Overrides) -> ReconConfig {
        let defaults = ReconConfig::default();

        let timeout = overrides
            .timeout_secs
            .or(self.recon.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let rate = overrides
            .max_rate_per_second
            .or(self.recon.max_rate_per_second)
            .and_then(NonZeroU32::new);

        ReconConfig {
            api_base_url: self.censys.api_url.clone().unwrap_or(defaults.api_base_url),
            doh_url: self.recon.doh_url.clone().unwrap_or(defaults.doh_url),
            timeout,
            max_concurrent: overrides
                .max_concurrent
                .or(self.recon.max_concurrent)
                .unwrap_or(defaults.max_concurrent),
            max_rate_per_second: rate,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("censys-recon").join("config.toml"))
}

/// A missing file is an empty config; an unreadable or malformed one is an
/// error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path.map(Path::to_path_buf).or_else(config_path) {
        Some(p) => p,
        None => return Ok(Config::default()),
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    parse_config(&content).map_err(|source| ConfigError::Parse { path, source })
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

pub fn get_default_config_toml() -> String {
    r#"# censys-recon configuration

[censys]
# API credentials from https://search.censys.io/account/api
# CENSYS_API_ID / CENSYS_API_SECRET in the environment take precedence.
# api_id = ""
# api_secret = ""
# api_url = "https://search.censys.io/api/v2/hosts"

[recon]
# Simultaneous host lookups
max_concurrent = 5
# Per-request timeout in seconds
timeout_secs = 10
# Requests per second per endpoint; 0 disables pacing
max_rate_per_second = 0
# doh_url = "https://dns.google/resolve"
"#
    .to_string()
}
