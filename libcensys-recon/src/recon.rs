use crate::{
    censys::{fetch_host, FetchError},
    credentials::Credentials,
    dns::resolve_a,
    gate::ConcurrencyGate,
    http::{create_http_pool, ClientError},
    ratelimit::EndpointRateLimiters,
    target::{classify, is_valid_ipv4, normalize, TargetKind},
    types::{FetchResult, Lookup, ReconConfig},
};
use futures::{
    future::join_all,
    stream::{self, Stream, StreamExt},
};
use reqwest::Client;
use std::sync::Arc;

pub struct Recon {
    client: Client,
    credentials: Arc<Credentials>,
    gate: Arc<ConcurrencyGate>,
    rate_limiters: Arc<EndpointRateLimiters>,
    config: ReconConfig,
}

impl Recon {
    pub fn new(credentials: Credentials) -> Result<Self, ClientError> {
        Self::with_config(credentials, ReconConfig::default())
    }

    pub fn with_config(credentials: Credentials, config: ReconConfig) -> Result<Self, ClientError> {
        let client = create_http_pool(config.timeout)?;
        Ok(Self {
            client,
            credentials: Arc::new(credentials),
            gate: Arc::new(ConcurrencyGate::new(config.max_concurrent)),
            rate_limiters: Arc::new(EndpointRateLimiters::new(config.max_rate_per_second)),
            config,
        })
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// A records for `domain`, or nothing if the lookup failed for any reason.
    pub async fn resolve(&self, domain: &str) -> Vec<String> {
        self.rate_limiters.acquire(&self.config.doh_url).await;

        match resolve_a(&self.client, &self.config.doh_url, domain, self.config.timeout).await {
            Ok(ips) => ips,
            Err(e) => {
                tracing::error!(domain, error = %e, "error resolving domain");
                Vec::new()
            }
        }
    }

    /// Turn one user-supplied target into the fetches it needs.
    ///
    /// IPs are fetched as-is, dotted quads with an out-of-range octet settle
    /// as `Invalid IP` without touching the network, and everything else is
    /// resolved first.
    pub async fn plan_one(&self, input: &str) -> Vec<Lookup> {
        let target = normalize(input);

        match classify(&target) {
            TargetKind::Ip => vec![Lookup::Fetch {
                input: target.clone(),
                ip: target,
            }],
            TargetKind::MalformedIp => {
                tracing::warn!(input = %target, "invalid IP address");
                vec![Lookup::Settled(FetchResult::failed(
                    target.clone(),
                    Some(target),
                    FetchError::InvalidIp,
                ))]
            }
            TargetKind::Domain => {
                let ips = self.resolve(&target).await;
                if ips.is_empty() {
                    tracing::warn!(domain = %target, "unable to resolve domain");
                    return vec![Lookup::Settled(FetchResult::failed(
                        target,
                        None,
                        FetchError::ResolutionFailed,
                    ))];
                }

                tracing::debug!(domain = %target, count = ips.len(), "resolved domain");
                ips.into_iter()
                    .map(|ip| Lookup::Fetch {
                        input: target.clone(),
                        ip,
                    })
                    .collect()
            }
        }
    }

    /// Plan every input. Resolution runs concurrently; the plan keeps input
    /// order.
    pub async fn plan<I, S>(&self, inputs: I) -> Vec<Lookup>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let inputs: Vec<String> = inputs.into_iter().map(|s| s.as_ref().to_string()).collect();

        join_all(inputs.iter().map(|input| self.plan_one(input)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Fetch one host while holding a gate slot.
    pub async fn lookup_one(&self, input: &str, ip: &str) -> FetchResult {
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return FetchResult::failed(input, Some(ip.to_string()), FetchError::Request(e.to_string()));
            }
        };

        if !is_valid_ipv4(ip) {
            tracing::warn!(ip, "invalid IP address");
            return FetchResult::failed(input, Some(ip.to_string()), FetchError::InvalidIp);
        }

        self.rate_limiters.acquire(&self.config.api_base_url).await;

        match fetch_host(
            &self.client,
            &self.config.api_base_url,
            ip,
            &self.credentials,
            self.config.timeout,
        )
        .await
        {
            Ok(response) => {
                tracing::info!(ip, services = response.result.services.len(), "host data retrieved");
                FetchResult::found(input, ip, response.result)
            }
            Err(error) => {
                tracing::warn!(ip, %error, "host lookup failed");
                FetchResult::failed(input, Some(ip.to_string()), error)
            }
        }
    }

    async fn run(&self, lookup: Lookup) -> FetchResult {
        match lookup {
            Lookup::Fetch { input, ip } => self.lookup_one(&input, &ip).await,
            Lookup::Settled(result) => result,
        }
    }

    /// Start every planned lookup at once and yield results as they finish.
    /// The gate, not the stream, bounds how many requests are in flight.
    pub fn run_stream(&self, lookups: Vec<Lookup>) -> impl Stream<Item = FetchResult> + '_ {
        let width = lookups.len().max(1);

        stream::iter(lookups)
            .map(move |lookup| self.run(lookup))
            .buffer_unordered(width)
    }

    pub fn recon_stream<I>(&self, inputs: I) -> impl Stream<Item = FetchResult> + '_
    where
        I: IntoIterator<Item = String> + 'static,
    {
        let inputs: Vec<String> = inputs.into_iter().collect();

        stream::once(async move { self.plan(inputs).await })
            .flat_map(move |lookups| self.run_stream(lookups))
    }
}

impl Clone for Recon {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            credentials: Arc::clone(&self.credentials),
            gate: Arc::clone(&self.gate),
            rate_limiters: Arc::clone(&self.rate_limiters),
            config: self.config.clone(),
        }
    }
}
