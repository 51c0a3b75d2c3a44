// # DNS Directory Trait
//
// Defines the interface to the authoritative DNS API: listing zones and
// records, creating and updating the managed address record.
//
// ## Implementations
//
// - Hetzner DNS: `dyndns-provider-hetzner` crate
//
// ## Matching Policy
//
// Lookups are "list everything, scan by name". The scan is linear, exact,
// case-sensitive and keeps the first match in the order the remote returned.
// Zone and record lists are small (tens of entries), so no index is built.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The only record type this system manages
pub const RECORD_TYPE: &str = "A";

/// An authoritative DNS zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDescriptor {
    /// Opaque zone identifier
    pub id: String,
    /// Zone name (e.g., "example.com")
    pub name: String,
}

impl ZoneDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A single address record inside a zone
///
/// Identity is the pair `(name, zone_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    /// Opaque record identifier
    pub id: String,
    /// Record name relative to the zone (e.g., "home")
    pub name: String,
    /// Address literal currently stored in the record
    pub value: String,
    /// Identifier of the owning zone
    pub zone_id: String,
    /// TTL in seconds; `None` when the record inherits the zone default
    pub ttl: Option<u32>,
}

/// Desired content of the managed record, sent on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredRecord {
    pub zone_id: String,
    pub name: String,
    pub value: String,
    pub ttl: u32,
}

/// First zone named exactly `name`
pub fn find_zone<'a>(zones: &'a [ZoneDescriptor], name: &str) -> Option<&'a ZoneDescriptor> {
    zones.iter().find(|zone| zone.name == name)
}

/// First record named exactly `name`
pub fn find_record<'a>(
    records: &'a [RecordDescriptor],
    name: &str,
) -> Option<&'a RecordDescriptor> {
    records.iter().find(|record| record.name == name)
}

/// Trait for DNS directory implementations
///
/// Implementations own the transport: URLs, authentication, status handling
/// and body decoding. They do not cache, retry, or decide whether a mutation
/// is needed; that is owned by the resolver and the reconciler.
///
/// # Errors
///
/// - Network failures and undecodable responses: [`Error::Transport`](crate::Error::Transport)
/// - Non-success HTTP status: [`Error::Rejected`](crate::Error::Rejected) with status and body
#[async_trait]
pub trait DnsDirectory: Send + Sync {
    /// List every zone visible to the token, in remote order
    async fn list_zones(&self) -> Result<Vec<ZoneDescriptor>, crate::Error>;

    /// List the address records of `zone_id`, in remote order
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RecordDescriptor>, crate::Error>;

    /// Create a record and return it as stored by the remote
    async fn create_record(
        &self,
        desired: &DesiredRecord,
    ) -> Result<RecordDescriptor, crate::Error>;

    /// Replace the content of `record_id` and return it as stored by the remote
    async fn update_record(
        &self,
        record_id: &str,
        desired: &DesiredRecord,
    ) -> Result<RecordDescriptor, crate::Error>;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
