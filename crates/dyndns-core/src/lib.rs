// # dyndns-core
//
// Core library for single-shot dynamic DNS reconciliation.
//
// ## Architecture Overview
//
// - **DnsDirectory**: Trait for listing zones/records and mutating the managed record
// - **CacheStore**: Trait for the zone/record descriptor cache
// - **IpSource**: Trait for determining the current public address
// - **IdentifierResolver**: Cache-validated resolution of zone and record identifiers
// - **decide**: Pure NoOp / Update / Create decision
// - **Reconciler**: Orchestrates one IP → resolve → decide → mutate pass
//
// ## Design Principles
//
// 1. **Cache is an optimization**: every cached entry is re-validated against the configured target
// 2. **Zone before record**: record validity depends on the zone id resolved in the same run
// 3. **Fail fast**: remote failures end the run; only cache failures are soft
// 4. **Library-First**: the binary only loads configuration and maps outcomes to exit codes

pub mod cache;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod events;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use cache::{FileCacheStore, MemoryCacheStore};
pub use config::{IpSourceConfig, RunConfig};
pub use decision::{Action, decide};
pub use engine::{Outcome, Reconciler};
pub use error::{Error, Operation, Result};
pub use events::{EventSink, ReconcileEvent};
pub use resolver::{IdentifierResolver, RecordResolution, ResolvedZone, Source};
pub use traits::{CacheStore, DnsDirectory, IpSource};
