use crate::{censys::FetchError, report::HostRecord};
use serde::Serialize;
use std::{num::NonZeroU32, time::Duration};

pub const DEFAULT_API_BASE_URL: &str = "https://search.censys.io/api/v2/hosts";
pub const DEFAULT_DOH_URL: &str = "https://dns.google/resolve";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Found { data: Box<HostRecord> },
    Failed { error: FetchError },
}

impl Outcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Outcome::Failed { error } => Some(error),
            Outcome::Found { .. } => None,
        }
    }
}

/// One rendered line of work: a target, the address it was queried as, and
/// what came back.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub input: String,
    pub ip: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl FetchResult {
    pub fn found(input: impl Into<String>, ip: impl Into<String>, data: HostRecord) -> Self {
        Self {
            input: input.into(),
            ip: Some(ip.into()),
            outcome: Outcome::Found { data: Box::new(data) },
        }
    }

    pub fn failed(input: impl Into<String>, ip: Option<String>, error: FetchError) -> Self {
        Self {
            input: input.into(),
            ip,
            outcome: Outcome::Failed { error },
        }
    }
}

/// A unit of planned work, produced before any API call is made.
#[derive(Debug, Clone)]
pub enum Lookup {
    Fetch { input: String, ip: String },
    Settled(FetchResult),
}

#[derive(Debug, Clone)]
pub struct ReconConfig {
    pub api_base_url: String,
    pub doh_url: String,
    pub timeout: Duration,
    pub max_concurrent: usize,
    pub max_rate_per_second: Option<NonZeroU32>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            doh_url: DEFAULT_DOH_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_concurrent: 5,
            max_rate_per_second: None,
        }
    }
}
