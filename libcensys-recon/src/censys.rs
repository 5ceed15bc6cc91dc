use crate::{credentials::Credentials, report::HostResponse};
use reqwest::{Client, StatusCode};
use serde::{Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Invalid IP")]
    InvalidIp,
    #[error("Domain resolution failed")]
    ResolutionFailed,
    #[error("No data found")]
    NotFound,
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Status code {0}")]
    Status(u16),
    #[error("Timeout")]
    Timeout,
    #[error("{0}")]
    Request(String),
}

impl FetchError {
    /// Short advisory shown next to the error, if the failure has one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FetchError::RateLimited => Some("Try again later."),
            FetchError::Unauthorized => Some("Check your Censys API credentials."),
            _ => None,
        }
    }
}

impl Serialize for FetchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn host_url(base_url: &str, ip: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), ip)
}

pub async fn fetch_host(
    client: &Client,
    base_url: &str,
    ip: &str,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<HostResponse, FetchError> {
    let url = host_url(base_url, ip);
    tracing::debug!(%url, "querying host");

    let request = async {
        let response = client
            .get(&url)
            .basic_auth(&credentials.api_id, Some(&credentials.api_secret))
            .send()
            .await?;

        let outcome = match response.status() {
            StatusCode::OK => Ok(response.json::<HostResponse>().await?),
            StatusCode::NOT_FOUND => Err(FetchError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(FetchError::Unauthorized),
            status => Err(FetchError::Status(status.as_u16())),
        };

        Ok::<_, reqwest::Error>(outcome)
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => Err(request_error(e)),
        Err(_) => Err(FetchError::Timeout),
    }
}

fn request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Request(e.to_string())
    }
}
