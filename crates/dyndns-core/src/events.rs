//! Structured events emitted during a run
//!
//! Resolution and reconciliation report what they did as [`ReconcileEvent`]s
//! on a bounded channel. Consumers (a logger, a status file, a test) read
//! the receiver half; the decision logic never formats anything itself.

use std::net::IpAddr;
use tokio::sync::mpsc;
use tracing::warn;

use crate::decision::Action;
use crate::traits::CacheKind;

/// Events emitted by the resolver and the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// The public address was determined
    IpObserved { ip: IpAddr },

    /// A cache entry matched the configured target
    CacheHit { kind: CacheKind },

    /// No cache entry existed
    CacheMiss { kind: CacheKind },

    /// A cache entry existed but could not be trusted
    CacheStale { kind: CacheKind, reason: String },

    /// The zone identifier is known
    ZoneResolved {
        zone_id: String,
        zone_name: String,
        from_cache: bool,
    },

    /// The record identifier and value are known
    RecordResolved {
        record_id: String,
        value: String,
        from_cache: bool,
    },

    /// The zone holds no record with the configured name
    RecordAbsent { record_name: String, zone_id: String },

    /// The reconciliation decision was taken
    Decided { action: Action },

    /// Dry-run mode: the mutation was not sent
    MutationSkipped { action: Action },

    /// The record was updated
    RecordUpdated {
        record_id: String,
        previous_value: String,
        new_value: String,
    },

    /// The record was created
    RecordCreated { record_id: String, value: String },

    /// A cache write (or removal) failed; the run continues
    CacheWriteFailed { kind: CacheKind, error: String },
}

/// Sending half of the event channel
///
/// Emission never blocks: when the channel is full the event is dropped
/// with a warning.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<mpsc::Sender<ReconcileEvent>>,
}

impl EventSink {
    /// Create a sink and the receiver that observes it
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ReconcileEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event
    pub fn emit(&self, event: ReconcileEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(
                    "Event channel full, dropping event {:?}. Consider increasing event_channel_capacity.",
                    event
                );
            }
            // Nobody listens any more; events are optional
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
