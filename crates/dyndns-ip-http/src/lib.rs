// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the dyndns reconciler.
//
// ## Architecture
//
// Asks an external "what is my address" service (e.g., api.ipify.org,
// icanhazip.com) once per run. The service must answer with the bare
// address as plain text; surrounding whitespace is ignored.

use dyndns_core::config::IpSourceConfig;
use dyndns_core::error::{Error, Operation, Result};
use dyndns_core::traits::{IpSource, IpVersion};

use std::net::IpAddr;
use std::time::Duration;

/// HTTP timeout for the address lookup
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based IP source
#[derive(Debug)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// Only accept addresses of this version (None = both)
    version: Option<IpVersion>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "https://api.ipify.org")
    /// - `version`: IP version to accept (None = both)
    pub fn new(url: impl Into<String>, version: Option<IpVersion>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            version,
            client,
        })
    }

    /// Create an IPv4-only source from configuration
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        Self::new(config.url.clone(), Some(IpVersion::V4))
    }

    /// Fetch current IP from HTTP service
    async fn fetch_ip(&self) -> Result<IpAddr> {
        tracing::debug!("Fetching public address from {}", self.url);

        let response =
            self.client.get(&self.url).send().await.map_err(|e| {
                Error::transport(Operation::IpLookup, format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        let ip_text = response.text().await.map_err(|e| {
            Error::transport(Operation::IpLookup, format!("Failed to read response: {}", e))
        })?;

        parse_address(&ip_text, self.version)
    }
}

/// Error for a non-2xx answer from the address service
fn status_error(status: u16, body: &str) -> Error {
    Error::transport(
        Operation::IpLookup,
        format!("HTTP error: {} {}", status, body.trim()),
    )
}

/// Parse a plain-text address answer and apply the version filter
fn parse_address(text: &str, version: Option<IpVersion>) -> Result<IpAddr> {
    let text = text.trim();
    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::ip_source(format!("Invalid IP address: {:?}", text)))?;

    match version {
        Some(expected) if IpVersion::of(&ip) != expected => Err(Error::ip_source(format!(
            "Expected {:?} address, got: {}",
            expected, ip
        ))),
        _ => Ok(ip),
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.fetch_ip().await
    }

    fn version(&self) -> Option<IpVersion> {
        self.version
    }
}
