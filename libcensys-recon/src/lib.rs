mod censys;
mod credentials;
mod dns;
mod gate;
mod http;
mod ratelimit;
mod recon;
pub mod report;
pub mod target;
mod types;

pub use censys::FetchError;
pub use credentials::{
    ChainedCredentials, CredentialProvider, Credentials, CredentialsError, EnvCredentials,
    API_ID_ENV, API_SECRET_ENV,
};
pub use gate::ConcurrencyGate;
pub use http::ClientError;
pub use recon::Recon;
pub use report::{HostRecord, HostStats};
pub use types::{FetchResult, Lookup, Outcome, ReconConfig, DEFAULT_API_BASE_URL, DEFAULT_DOH_URL};

use futures::StreamExt;

pub async fn lookup(credentials: Credentials, target: &str) -> Result<Vec<FetchResult>, ClientError> {
    lookup_many(credentials, vec![target.to_string()]).await
}

pub async fn lookup_many<I>(credentials: Credentials, targets: I) -> Result<Vec<FetchResult>, ClientError>
where
    I: IntoIterator<Item = String> + 'static,
{
    let recon = Recon::new(credentials)?;
    let results = recon.recon_stream(targets).collect().await;
    Ok(results)
}
