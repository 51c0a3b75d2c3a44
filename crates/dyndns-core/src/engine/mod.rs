//! Single-shot reconciler
//!
//! The Reconciler is responsible for:
//! - Determining the current public address via IpSource
//! - Resolving the zone, then the record, via IdentifierResolver
//! - Deciding the corrective action
//! - Executing it via MutationExecutor
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │──── current IP ─────┐
//! └─────────────┘                     │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │  Reconciler  │
//!                            └──────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌───────────────┐           ┌──────────────┐           ┌──────────────┐
//! │   Resolver    │           │   decide()   │           │   Mutation   │
//! │ (cache+remote)│           │    (pure)    │           │   Executor   │
//! └───────────────┘           └──────────────┘           └──────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Ensure the cache location exists (soft)
//! 2. Fetch the current IP
//! 3. Resolve the zone (cache, else remote)
//! 4. Resolve the record inside that zone (cache, else remote)
//! 5. Decide NoOp / Update / Create
//! 6. Execute, unless in dry-run mode
//!
//! Every step completes before the next begins. Any fatal error ends the
//! run immediately.

pub mod mutation;

pub use mutation::{MutationExecutor, Outcome};

use std::net::IpAddr;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::decision::{Action, decide};
use crate::error::{Error, Result};
use crate::events::{EventSink, ReconcileEvent};
use crate::resolver::{IdentifierResolver, RecordResolution, ResolvedZone};
use crate::traits::{CacheStore, DesiredRecord, DnsDirectory, IpSource};

/// Single-shot reconciler
///
/// Owns its collaborators and an immutable [`RunConfig`]. Each call to
/// [`Reconciler::run_once`] is one complete reconciliation pass.
pub struct Reconciler {
    /// Source of the current public address
    ip_source: Box<dyn IpSource>,

    /// Authoritative DNS API
    directory: Box<dyn DnsDirectory>,

    /// Descriptor cache
    cache: Box<dyn CacheStore>,

    /// Run configuration
    config: RunConfig,

    /// Decide but do not mutate
    dry_run: bool,

    /// Event sender for external monitoring
    events: EventSink,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// the events of every run
    pub fn new(
        ip_source: Box<dyn IpSource>,
        directory: Box<dyn DnsDirectory>,
        cache: Box<dyn CacheStore>,
        config: RunConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (events, rx) = EventSink::channel(config.event_channel_capacity);

        let reconciler = Self {
            ip_source,
            directory,
            cache,
            config,
            dry_run: false,
            events,
        };

        Ok((reconciler, rx))
    }

    /// Enable or disable dry-run mode
    ///
    /// In dry-run mode every lookup is performed, but the create/update call
    /// is only logged.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome)`: The record matches the current address (or would, in dry-run mode)
    /// - `Err(Error)`: Fatal error; nothing after the failing step was attempted
    pub async fn run_once(&self) -> Result<Outcome> {
        if let Err(e) = self.cache.ensure_ready().await {
            warn!("Cache unavailable, continuing without it: {}", e);
        }

        let current_ip = self.current_ip().await?;
        info!("Current IP: {}", current_ip);
        self.events.emit(ReconcileEvent::IpObserved { ip: current_ip });

        let resolver = IdentifierResolver::new(&*self.directory, &*self.cache, &self.events);
        let zone = resolver.resolve_zone(&self.config.zone_name).await?;
        let resolution = resolver
            .resolve_record(&self.config.record_name, &zone)
            .await?;

        let action = decide(current_ip, &resolution);
        info!("Decision for {}: {:?}", self.config.record_name, action);
        self.events.emit(ReconcileEvent::Decided {
            action: action.clone(),
        });

        if self.dry_run {
            return Ok(self.skip(action, &zone, &resolution, current_ip));
        }

        let desired = self.desired_record(&zone, current_ip);
        MutationExecutor::new(&*self.directory, &*self.cache, &self.events)
            .execute(action, &desired, &zone, &resolution)
            .await
    }

    async fn current_ip(&self) -> Result<IpAddr> {
        let ip = self.ip_source.current().await?;

        if !ip.is_ipv4() {
            return Err(Error::ip_source(format!(
                "Address record needs an IPv4 address, IP source returned {}",
                ip
            )));
        }
        Ok(ip)
    }

    fn desired_record(&self, zone: &ResolvedZone, current_ip: IpAddr) -> DesiredRecord {
        DesiredRecord {
            zone_id: zone.id().to_string(),
            name: self.config.record_name.clone(),
            value: current_ip.to_string(),
            ttl: self.config.record_ttl,
        }
    }

    fn skip(
        &self,
        action: Action,
        zone: &ResolvedZone,
        resolution: &RecordResolution,
        current_ip: IpAddr,
    ) -> Outcome {
        match &action {
            Action::NoOp => debug!("[DRY-RUN] Nothing to do"),
            Action::Update(record_id) => info!(
                "[DRY-RUN] Would update record {} in zone {}: {} -> {}",
                record_id,
                zone.name(),
                resolution.value().unwrap_or_default(),
                current_ip
            ),
            Action::Create => info!(
                "[DRY-RUN] Would create record {} in zone {} with payload: {}",
                self.config.record_name,
                zone.name(),
                serde_json::json!(self.desired_record(zone, current_ip))
            ),
        }

        self.events.emit(ReconcileEvent::MutationSkipped {
            action: action.clone(),
        });
        Outcome::DryRun { action }
    }
}
