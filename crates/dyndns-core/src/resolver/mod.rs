//! Identifier resolution
//!
//! Turns the configured zone and record names into the remote's opaque
//! identifiers, using the cache when an entry is provably about the current
//! target and falling back to the remote otherwise.
//!
//! ## Trust Rules
//!
//! - A cached zone is used only if its name equals the configured zone name.
//! - A cached record is used only if its name equals the configured record
//!   name AND its zone id equals the zone id resolved in this run.
//! - Missing, unreadable or mismatched entries all mean "go to the remote".
//! - A failed remote lookup is fatal. There is no fallback to a cache entry
//!   that already failed validation.
//! - Cache writes follow successful lookups only, and are best-effort.
//!
//! ## Ordering
//!
//! [`IdentifierResolver::resolve_record`] takes a [`ResolvedZone`], which
//! only [`IdentifierResolver::resolve_zone`] can produce, so the record
//! cache cannot be judged before the zone of the current run is known.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{EventSink, ReconcileEvent};
use crate::traits::{
    CacheEntry, CacheKind, CacheLookup, CacheStore, DnsDirectory, RecordDescriptor,
    ZoneDescriptor, find_record, find_zone,
};

/// Where a resolved descriptor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Remote,
}

/// A zone resolved for the current run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedZone {
    zone: ZoneDescriptor,
    source: Source,
}

impl ResolvedZone {
    pub fn id(&self) -> &str {
        &self.zone.id
    }

    pub fn name(&self) -> &str {
        &self.zone.name
    }

    pub fn source(&self) -> Source {
        self.source
    }
}

/// Outcome of record resolution
///
/// `Absent` is a successful result: the zone simply has no such record yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordResolution {
    Found {
        record: RecordDescriptor,
        source: Source,
    },
    Absent,
}

impl RecordResolution {
    pub fn record(&self) -> Option<&RecordDescriptor> {
        match self {
            RecordResolution::Found { record, .. } => Some(record),
            RecordResolution::Absent => None,
        }
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record().map(|record| record.id.as_str())
    }

    pub fn value(&self) -> Option<&str> {
        self.record().map(|record| record.value.as_str())
    }

    pub fn source(&self) -> Option<Source> {
        match self {
            RecordResolution::Found { source, .. } => Some(*source),
            RecordResolution::Absent => None,
        }
    }
}

/// Resolves zone and record identifiers through the cache and the remote
pub struct IdentifierResolver<'a> {
    directory: &'a dyn DnsDirectory,
    cache: &'a dyn CacheStore,
    events: &'a EventSink,
}

impl<'a> IdentifierResolver<'a> {
    pub fn new(
        directory: &'a dyn DnsDirectory,
        cache: &'a dyn CacheStore,
        events: &'a EventSink,
    ) -> Self {
        Self {
            directory,
            cache,
            events,
        }
    }

    /// Resolve the zone named `zone_name`
    ///
    /// # Errors
    ///
    /// - Remote lookup failures, unchanged
    /// - [`Error::ZoneNotFound`] if no remote zone has that name
    pub async fn resolve_zone(&self, zone_name: &str) -> Result<ResolvedZone> {
        let cached = self.cache.read_zone().await;
        if let Some(zone) = self.accept(CacheKind::Zone, cached, |zone| {
            check_zone(zone, zone_name)
        }) {
            info!("Zone {} resolved from cache: {}", zone.name, zone.id);
            self.events.emit(ReconcileEvent::ZoneResolved {
                zone_id: zone.id.clone(),
                zone_name: zone.name.clone(),
                from_cache: true,
            });
            return Ok(ResolvedZone {
                zone,
                source: Source::Cache,
            });
        }

        debug!("Listing zones from {}", self.directory.provider_name());
        let zones = self
            .directory
            .list_zones()
            .await?;
        debug!("Remote returned {} zone(s)", zones.len());

        let zone = find_zone(&zones, zone_name)
            .cloned()
            .ok_or_else(|| Error::zone_not_found(zone_name))?;

        self.store(zone.clone().into()).await;

        info!("Zone {} resolved from remote: {}", zone.name, zone.id);
        self.events.emit(ReconcileEvent::ZoneResolved {
            zone_id: zone.id.clone(),
            zone_name: zone.name.clone(),
            from_cache: false,
        });
        Ok(ResolvedZone {
            zone,
            source: Source::Remote,
        })
    }

    /// Resolve the record named `record_name` inside `zone`
    ///
    /// # Errors
    ///
    /// Remote lookup failures, unchanged. A missing record is
    /// `Ok(RecordResolution::Absent)`.
    pub async fn resolve_record(
        &self,
        record_name: &str,
        zone: &ResolvedZone,
    ) -> Result<RecordResolution> {
        let cached = self.cache.read_record().await;
        if let Some(record) = self.accept(CacheKind::Record, cached, |record| {
            check_record(record, record_name, zone.id())
        }) {
            info!(
                "Record {} resolved from cache: {} = {}",
                record.name, record.id, record.value
            );
            self.emit_record_resolved(&record, true);
            return Ok(RecordResolution::Found {
                record,
                source: Source::Cache,
            });
        }

        debug!("Listing records of zone {}", zone.id());
        let records = self
            .directory
            .list_records(zone.id())
            .await?;
        debug!("Remote returned {} record(s)", records.len());

        let Some(record) = find_record(&records, record_name).cloned() else {
            info!("Record {} does not exist in zone {}", record_name, zone.name());
            self.events.emit(ReconcileEvent::RecordAbsent {
                record_name: record_name.to_string(),
                zone_id: zone.id().to_string(),
            });
            return Ok(RecordResolution::Absent);
        };

        self.store(record.clone().into()).await;

        info!(
            "Record {} resolved from remote: {} = {}",
            record.name, record.id, record.value
        );
        self.emit_record_resolved(&record, false);
        Ok(RecordResolution::Found {
            record,
            source: Source::Remote,
        })
    }

    /// Take a cache lookup and keep it only if `check` accepts the entry
    fn accept<T>(
        &self,
        kind: CacheKind,
        lookup: CacheLookup<T>,
        check: impl FnOnce(&T) -> std::result::Result<(), String>,
    ) -> Option<T> {
        let reason = match lookup {
            CacheLookup::Hit(entry) => match check(&entry) {
                Ok(()) => {
                    debug!("Cached {} entry is valid", kind);
                    self.events.emit(ReconcileEvent::CacheHit { kind });
                    return Some(entry);
                }
                Err(reason) => reason,
            },
            CacheLookup::Miss => {
                debug!("No cached {} entry", kind);
                self.events.emit(ReconcileEvent::CacheMiss { kind });
                return None;
            }
            CacheLookup::Invalid(reason) => reason,
        };

        warn!("Cached {} entry is stale: {}", kind, reason);
        self.events.emit(ReconcileEvent::CacheStale { kind, reason });
        None
    }

    /// Best-effort cache write
    async fn store(&self, entry: CacheEntry) {
        let kind = entry.kind();
        if let Err(e) = self.cache.write(&entry).await {
            warn!("Failed to cache {} entry: {}", kind, e);
            self.events.emit(ReconcileEvent::CacheWriteFailed {
                kind,
                error: e.to_string(),
            });
        }
    }

    fn emit_record_resolved(&self, record: &RecordDescriptor, from_cache: bool) {
        self.events.emit(ReconcileEvent::RecordResolved {
            record_id: record.id.clone(),
            value: record.value.clone(),
            from_cache,
        });
    }
}

fn check_zone(cached: &ZoneDescriptor, zone_name: &str) -> std::result::Result<(), String> {
    if cached.name != zone_name {
        return Err(format!(
            "cached zone '{}' does not match configured zone '{}'",
            cached.name, zone_name
        ));
    }
    Ok(())
}

fn check_record(
    cached: &RecordDescriptor,
    record_name: &str,
    zone_id: &str,
) -> std::result::Result<(), String> {
    if cached.name != record_name {
        return Err(format!(
            "cached record '{}' does not match configured record '{}'",
            cached.name, record_name
        ));
    }
    if cached.zone_id != zone_id {
        return Err(format!(
            "cached record belongs to zone '{}', resolved zone is '{}'",
            cached.zone_id, zone_id
        ));
    }
    Ok(())
}
