use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const A_RECORD: u16 = 1;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("DNS-over-HTTPS request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("DNS-over-HTTPS request timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type", default)]
    record_type: Option<u16>,
    #[serde(default)]
    data: Option<String>,
}

/// Look up A records for `domain` through a JSON DNS-over-HTTPS resolver.
///
/// Answers of any other type (CNAME chains, etc.) are skipped. Duplicates are
/// returned as the resolver sent them.
pub async fn resolve_a(
    client: &Client,
    doh_url: &str,
    domain: &str,
    timeout: Duration,
) -> Result<Vec<String>, DnsError> {
    tracing::debug!(domain, doh_url, "resolving A records");

    let request = async {
        let response: DohResponse = client
            .get(doh_url)
            .query(&[("name", domain), ("type", "A")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok::<_, reqwest::Error>(response)
    };

    let response = tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| DnsError::Timeout(timeout))??;

    Ok(response
        .answer
        .into_iter()
        .filter(|a| a.record_type == Some(A_RECORD))
        .filter_map(|a| a.data)
        .collect())
}
