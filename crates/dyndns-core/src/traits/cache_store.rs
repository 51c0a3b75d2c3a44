// # Cache Store Trait
//
// Defines the interface for the descriptor cache.
//
// ## Purpose
//
// The cache remembers the last zone and record descriptors fetched from the
// remote so that a run whose configuration has not changed can skip the
// listing calls. It is an optimization, never a source of truth: entries
// carry no timestamp and are re-validated against the configured names on
// every read (see `resolver`).
//
// ## Failure Semantics
//
// - Reads never fail. A missing document is `Miss`; an unreadable or
//   malformed one is `Invalid`.
// - Writes report errors, and callers treat them as soft.
//
// ## Implementations
//
// - File-based: one JSON document per kind (`cache::FileCacheStore`)
// - In-memory: for embedding and tests (`cache::MemoryCacheStore`)

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::traits::dns_directory::{RecordDescriptor, ZoneDescriptor};

/// The two documents the cache holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Zone,
    Record,
}

impl CacheKind {
    /// File name of the document for this kind
    pub fn file_name(&self) -> &'static str {
        match self {
            CacheKind::Zone => "zone.json",
            CacheKind::Record => "record.json",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Zone => f.write_str("zone"),
            CacheKind::Record => f.write_str("record"),
        }
    }
}

/// A persisted descriptor
///
/// Serializes as the bare descriptor; the kind is implied by the document
/// it is stored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CacheEntry {
    Record(RecordDescriptor),
    Zone(ZoneDescriptor),
}

impl CacheEntry {
    /// Which document this entry belongs to
    pub fn kind(&self) -> CacheKind {
        match self {
            CacheEntry::Zone(_) => CacheKind::Zone,
            CacheEntry::Record(_) => CacheKind::Record,
        }
    }
}

impl From<ZoneDescriptor> for CacheEntry {
    fn from(zone: ZoneDescriptor) -> Self {
        CacheEntry::Zone(zone)
    }
}

impl From<RecordDescriptor> for CacheEntry {
    fn from(record: RecordDescriptor) -> Self {
        CacheEntry::Record(record)
    }
}

/// Outcome of a cache read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    /// A well-formed document was found
    Hit(T),
    /// No document exists
    Miss,
    /// A document exists but cannot be used
    Invalid(String),
}

impl<T> CacheLookup<T> {
    /// Transform the hit value
    pub fn and_then<U>(self, f: impl FnOnce(T) -> CacheLookup<U>) -> CacheLookup<U> {
        match self {
            CacheLookup::Hit(value) => f(value),
            CacheLookup::Miss => CacheLookup::Miss,
            CacheLookup::Invalid(reason) => CacheLookup::Invalid(reason),
        }
    }
}

/// Trait for cache store implementations
///
/// A store holds at most one entry per [`CacheKind`]; a write replaces the
/// previous entry of the same kind wholesale. A write must be atomic with
/// respect to later reads: a reader sees the old document or the new one,
/// never a partial one.
///
/// There is no locking across processes. Two runs sharing one store are
/// not supported.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the entry of `kind`
    async fn read(&self, kind: CacheKind) -> CacheLookup<CacheEntry>;

    /// Persist `entry`, replacing any prior entry of the same kind
    async fn write(&self, entry: &CacheEntry) -> Result<(), crate::Error>;

    /// Make sure the storage location exists and is usable
    ///
    /// Idempotent: succeeds when the location already exists.
    async fn ensure_ready(&self) -> Result<(), crate::Error>;

    /// Drop the entry of `kind`
    ///
    /// Idempotent: succeeds when no entry exists.
    async fn invalidate(&self, kind: CacheKind) -> Result<(), crate::Error>;

    /// Read the zone entry
    async fn read_zone(&self) -> CacheLookup<ZoneDescriptor> {
        self.read(CacheKind::Zone).await.and_then(|entry| match entry {
            CacheEntry::Zone(zone) => CacheLookup::Hit(zone),
            CacheEntry::Record(_) => {
                CacheLookup::Invalid("zone document holds a record".to_string())
            }
        })
    }

    /// Read the record entry
    async fn read_record(&self) -> CacheLookup<RecordDescriptor> {
        self.read(CacheKind::Record).await.and_then(|entry| match entry {
            CacheEntry::Record(record) => CacheLookup::Hit(record),
            CacheEntry::Zone(_) => {
                CacheLookup::Invalid("record document holds a zone".to_string())
            }
        })
    }
}
