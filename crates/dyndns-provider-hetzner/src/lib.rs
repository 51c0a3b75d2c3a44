// # Hetzner DNS Directory
//
// This crate provides the Hetzner DNS implementation of `DnsDirectory`.
//
// ## Behavior
//
// - One HTTP request per trait call, no retry and no caching (both owned by
//   dyndns-core)
// - HTTP timeout configured (30 seconds)
// - Network and decode failures map to `Error::Transport`
// - Any non-2xx status maps to `Error::Rejected` with the status and body
// - Record listings keep only address records of the requested zone
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails if the token is empty
//
// ## API Reference
//
// - List zones: GET `/zones`
// - List records: GET `/records?zone_id=...`
// - Create record: POST `/records`
// - Update record: PUT `/records/:record_id`
//
// Every request carries the token in the `Auth-API-Token` header.

use async_trait::async_trait;
use dyndns_core::config::RunConfig;
use dyndns_core::error::{Error, Operation, Result};
use dyndns_core::traits::{
    DesiredRecord, DnsDirectory, RECORD_TYPE, RecordDescriptor, ZoneDescriptor,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication header expected by the Hetzner DNS API
const AUTH_HEADER: &str = "Auth-API-Token";

/// Hetzner DNS directory
///
/// Stateless apart from the HTTP connection pool. The Debug implementation
/// does NOT expose the API token.
pub struct HetznerDirectory {
    /// Zone listing endpoint
    zones_url: String,

    /// Record endpoint; updates go to `{records_url}/{id}`
    records_url: String,

    /// Hetzner DNS API token
    /// ⚠️ NEVER log this value
    access_token: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for HetznerDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HetznerDirectory")
            .field("zones_url", &self.zones_url)
            .field("records_url", &self.records_url)
            .field("access_token", &"<REDACTED>")
            .finish()
    }
}

impl HetznerDirectory {
    /// Create a directory client for explicit endpoints
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the token is empty or the HTTP client cannot be built
    pub fn new(
        zones_url: impl Into<String>,
        records_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(Error::config("Hetzner API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            zones_url: trim_slash(zones_url.into()),
            records_url: trim_slash(records_url.into()),
            access_token,
            client,
        })
    }

    /// Create a directory client from the run configuration
    pub fn from_config(config: &RunConfig) -> Result<Self> {
        Self::new(
            config.zones_api_url.clone(),
            config.records_api_url.clone(),
            config.access_token.clone(),
        )
    }

    fn record_url(&self, record_id: &str) -> String {
        format!("{}/{}", self.records_url, record_id)
    }

    /// Send `request` and decode a successful JSON body
    async fn send<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .header(AUTH_HEADER, &self.access_token)
            .send()
            .await
            .map_err(|e| Error::transport(operation, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            tracing::debug!("Hetzner {} answered {}: {}", operation, status, body);
            return Err(Error::rejected(operation, status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::transport(operation, format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl DnsDirectory for HetznerDirectory {
    /// ```http
    /// GET /zones
    /// Auth-API-Token: <token>
    /// ```
    async fn list_zones(&self) -> Result<Vec<ZoneDescriptor>> {
        tracing::debug!("GET {}", self.zones_url);
        let body: ZonesResponse = self
            .send(Operation::ZoneLookup, self.client.get(&self.zones_url))
            .await?;
        Ok(body.zones.into_iter().map(ZoneDescriptor::from).collect())
    }

    /// ```http
    /// GET /records?zone_id=:zone_id
    /// Auth-API-Token: <token>
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RecordDescriptor>> {
        tracing::debug!("GET {}?zone_id={}", self.records_url, zone_id);
        let request = self
            .client
            .get(&self.records_url)
            .query(&[("zone_id", zone_id)]);
        let body: RecordsResponse = self.send(Operation::RecordLookup, request).await?;
        Ok(address_records(body, zone_id))
    }

    /// ```http
    /// POST /records
    /// {"name": "home", "value": "1.2.3.4", "ttl": 60, "type": "A", "zone_id": "..."}
    /// ```
    async fn create_record(&self, desired: &DesiredRecord) -> Result<RecordDescriptor> {
        tracing::debug!("POST {}", self.records_url);
        let request = self
            .client
            .post(&self.records_url)
            .json(&RecordPayload::from(desired));
        let body: RecordResponse = self.send(Operation::RecordCreate, request).await?;
        Ok(body.record.into())
    }

    /// ```http
    /// PUT /records/:record_id
    /// {"name": "home", "value": "1.2.3.4", "ttl": 60, "type": "A", "zone_id": "..."}
    /// ```
    async fn update_record(
        &self,
        record_id: &str,
        desired: &DesiredRecord,
    ) -> Result<RecordDescriptor> {
        let url = self.record_url(record_id);
        tracing::debug!("PUT {}", url);
        let request = self.client.put(&url).json(&RecordPayload::from(desired));
        let body: RecordResponse = self.send(Operation::RecordUpdate, request).await?;
        Ok(body.record.into())
    }

    fn provider_name(&self) -> &'static str {
        "hetzner"
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Address records of `zone_id`, in the order the API returned them
///
/// The query already filters by zone; the check is repeated so that a
/// record from another zone can never be resolved.
fn address_records(body: RecordsResponse, zone_id: &str) -> Vec<RecordDescriptor> {
    body.records
        .into_iter()
        .filter(|r| r.record_type == RECORD_TYPE && r.zone_id == zone_id)
        .map(RecordDescriptor::from)
        .collect()
}

#[derive(Debug, Deserialize)]
struct ZonesResponse {
    #[serde(default)]
    zones: Vec<WireZone>,
}

#[derive(Debug, Deserialize)]
struct WireZone {
    id: String,
    name: String,
}

impl From<WireZone> for ZoneDescriptor {
    fn from(zone: WireZone) -> Self {
        ZoneDescriptor::new(zone.id, zone.name)
    }
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<WireRecord>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    record: WireRecord,
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    value: String,
    zone_id: String,
    #[serde(default)]
    ttl: Option<u32>,
}

impl From<WireRecord> for RecordDescriptor {
    fn from(record: WireRecord) -> Self {
        RecordDescriptor {
            id: record.id,
            name: record.name,
            value: record.value,
            zone_id: record.zone_id,
            ttl: record.ttl,
        }
    }
}

/// Request body for create and update
#[derive(Debug, Serialize)]
struct RecordPayload<'a> {
    name: &'a str,
    value: &'a str,
    ttl: u32,
    #[serde(rename = "type")]
    record_type: &'static str,
    zone_id: &'a str,
}

impl<'a> From<&'a DesiredRecord> for RecordPayload<'a> {
    fn from(desired: &'a DesiredRecord) -> Self {
        Self {
            name: &desired.name,
            value: &desired.value,
            ttl: desired.ttl,
            record_type: RECORD_TYPE,
            zone_id: &desired.zone_id,
        }
    }
}
