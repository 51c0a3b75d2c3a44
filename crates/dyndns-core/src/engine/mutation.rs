//! Mutation executor
//!
//! Applies an [`Action`] through the directory. One call per run, no retry:
//! a rejection is returned to the caller with its status and body.
//!
//! A 404 answer means an identifier taken from the cache is dead. Every
//! cached identifier the call relied on is dropped so the next run looks
//! it up again.

use tracing::{info, warn};

use crate::decision::Action;
use crate::error::{Error, Result};
use crate::events::{EventSink, ReconcileEvent};
use crate::resolver::{RecordResolution, ResolvedZone, Source};
use crate::traits::{
    CacheEntry, CacheKind, CacheStore, DesiredRecord, DnsDirectory, RecordDescriptor,
};

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The record already had the current address
    Unchanged { record_id: String, value: String },

    /// The record was updated
    Updated {
        record: RecordDescriptor,
        previous_value: String,
    },

    /// The record was created
    Created { record: RecordDescriptor },

    /// Dry-run mode: `action` was decided but not sent
    DryRun { action: Action },
}

/// Performs the create/update call for a decided action
pub struct MutationExecutor<'a> {
    directory: &'a dyn DnsDirectory,
    cache: &'a dyn CacheStore,
    events: &'a EventSink,
}

impl<'a> MutationExecutor<'a> {
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

    /// Apply `action`
    ///
    /// `desired` is the desired record; `zone` and `resolution` are what was
    /// observed before deciding.
    pub async fn execute(
        &self,
        action: Action,
        desired: &DesiredRecord,
        zone: &ResolvedZone,
        resolution: &RecordResolution,
    ) -> Result<Outcome> {
        match action {
            Action::NoOp => {
                let record_id = resolution.record_id().unwrap_or_default().to_string();
                info!(
                    "DNS record already has correct IP: {} -> {}",
                    desired.name, desired.value
                );
                Ok(Outcome::Unchanged {
                    record_id,
                    value: desired.value.clone(),
                })
            }
            Action::Update(record_id) => {
                self.update(&record_id, desired, zone, resolution).await
            }
            Action::Create => self.create(desired, zone).await,
        }
    }

    async fn update(
        &self,
        record_id: &str,
        desired: &DesiredRecord,
        zone: &ResolvedZone,
        resolution: &RecordResolution,
    ) -> Result<Outcome> {
        let previous_value = resolution.value().unwrap_or_default().to_string();
        info!(
            "Updating DNS record: {} -> {} (was: {})",
            desired.name, desired.value, previous_value
        );

        let record = match self.directory.update_record(record_id, desired).await {
            Ok(record) => record,
            Err(e) => {
                if e.rejection_status() == Some(404) {
                    if resolution.source() == Some(Source::Cache) {
                        self.forget(CacheKind::Record).await;
                    }
                    self.forget_zone_if_cached(zone).await;
                }
                return Err(e);
            }
        };

        info!("DNS record updated successfully: {} -> {}", record.name, record.value);
        self.remember(&record).await;
        self.events.emit(ReconcileEvent::RecordUpdated {
            record_id: record.id.clone(),
            previous_value: previous_value.clone(),
            new_value: record.value.clone(),
        });

        Ok(Outcome::Updated {
            record,
            previous_value,
        })
    }

    async fn create(&self, desired: &DesiredRecord, zone: &ResolvedZone) -> Result<Outcome> {
        info!("Creating DNS record: {} -> {}", desired.name, desired.value);

        let record = match self.directory.create_record(desired).await {
            Ok(record) => record,
            Err(e) => {
                if e.rejection_status() == Some(404) {
                    self.forget_zone_if_cached(zone).await;
                }
                return Err(e);
            }
        };

        info!("DNS record created: {} ({}) -> {}", record.name, record.id, record.value);
        self.remember(&record).await;
        self.events.emit(ReconcileEvent::RecordCreated {
            record_id: record.id.clone(),
            value: record.value.clone(),
        });

        Ok(Outcome::Created { record })
    }

    async fn remember(&self, record: &RecordDescriptor) {
        if let Err(e) = self.cache.write(&CacheEntry::from(record.clone())).await {
            self.soft_failure(CacheKind::Record, e);
        }
    }

    async fn forget_zone_if_cached(&self, zone: &ResolvedZone) {
        if zone.source() == Source::Cache {
            self.forget(CacheKind::Zone).await;
        }
    }

    async fn forget(&self, kind: CacheKind) {
        warn!("Cached {} id is unknown to the remote; dropping it", kind);
        if let Err(e) = self.cache.invalidate(kind).await {
            self.soft_failure(kind, e);
        }
    }

    fn soft_failure(&self, kind: CacheKind, e: Error) {
        warn!("Cache for {} not updated: {}", kind, e);
        self.events.emit(ReconcileEvent::CacheWriteFailed {
            kind,
            error: e.to_string(),
        });
    }
}
