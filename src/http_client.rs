use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Proxy};

use crate::config::ScanConfig;
use crate::error::NetworkError;
use crate::probe::response::{headers_from_reqwest, ProbeResponse};

/// Blocking-per-call HTTP GET used by every engine. Each call is awaited
/// before the next one is issued.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ProbeResponse, NetworkError>;
}

/// Default fetcher backed by reqwest. Agent and proxy come from the run's `ScanConfig`.
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &ScanConfig) -> anyhow::Result<Self> {
        Ok(Self { client: create_scan_client(config)? })
    }
}

/// Create the HTTP client for a scan run
pub fn create_scan_client(config: &ScanConfig) -> anyhow::Result<Client> {
    let mut builder = ClientBuilder::new()
        .http1_only() // Some WAFs answer differently over HTTP/2
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .use_rustls_tls()
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(config.agent.as_str())
        // Targets under test routinely have broken certificates
        .danger_accept_invalid_certs(true);

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    Ok(builder.build()?)
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<ProbeResponse, NetworkError> {
        let response = self.client.get(url).send().await.map_err(|e| classify(url, e))?;
        let status = response.status().as_u16();
        let headers = headers_from_reqwest(response.headers());
        let body = response.text().await.map_err(|e| classify(url, e))?;
        Ok(ProbeResponse { status, body, headers })
    }
}

/// Walk the error chain looking for a connection reset.
fn classify(url: &str, err: reqwest::Error) -> NetworkError {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if matches!(io.kind(), std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted) {
                return NetworkError::reset(url, err.to_string());
            }
        }
        source = cause.source();
    }
    let message = err.to_string();
    if message.to_ascii_lowercase().contains("connection reset") {
        return NetworkError::reset(url, message);
    }
    NetworkError::other(url, message)
}
