use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to create HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

pub fn create_http_pool(timeout: Duration) -> Result<Client, ClientError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("censys-recon/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(16)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .use_rustls_tls()
        .build()?;
    Ok(client)
}
