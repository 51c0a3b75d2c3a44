//! Test doubles and common utilities for the contract tests
//!
//! The doubles are cheap to clone and share their state, so a test can hand
//! one clone to the reconciler and keep another to inspect calls afterwards.

#![allow(dead_code)]

use dyndns_core::error::{Error, Operation, Result};
use dyndns_core::traits::{
    CacheEntry, CacheKind, CacheLookup, CacheStore, DesiredRecord, DnsDirectory, IpSource,
    RecordDescriptor, ZoneDescriptor,
};
use dyndns_core::{MemoryCacheStore, ReconcileEvent, RunConfig};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A call observed by [`ScriptedDirectory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    ListZones,
    ListRecords(String),
    Create(DesiredRecord),
    Update(String, DesiredRecord),
}

/// How a scripted call fails
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transport,
    Rejected(u16),
}

impl Failure {
    fn into_error(self, operation: Operation) -> Error {
        match self {
            Failure::Transport => Error::transport(operation, "connection refused"),
            Failure::Rejected(status) => {
                Error::rejected(operation, status, "{\"error\":{\"message\":\"rejected\"}}")
            }
        }
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    zones: Vec<ZoneDescriptor>,
    records: Vec<RecordDescriptor>,
    calls: Vec<DirectoryCall>,
    fail_list_zones: Option<Failure>,
    fail_list_records: Option<Failure>,
    fail_create: Option<Failure>,
    fail_update: Option<Failure>,
    next_id: usize,
}

/// An in-memory remote that records every call
#[derive(Debug, Clone, Default)]
pub struct ScriptedDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zones(self, zones: Vec<ZoneDescriptor>) -> Self {
        self.state.lock().unwrap().zones = zones;
        self
    }

    pub fn with_records(self, records: Vec<RecordDescriptor>) -> Self {
        self.state.lock().unwrap().records = records;
        self
    }

    pub fn failing_list_zones(self, failure: Failure) -> Self {
        self.state.lock().unwrap().fail_list_zones = Some(failure);
        self
    }

    pub fn failing_list_records(self, failure: Failure) -> Self {
        self.state.lock().unwrap().fail_list_records = Some(failure);
        self
    }

    pub fn failing_create(self, failure: Failure) -> Self {
        self.state.lock().unwrap().fail_create = Some(failure);
        self
    }

    pub fn failing_update(self, failure: Failure) -> Self {
        self.state.lock().unwrap().fail_update = Some(failure);
        self
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn list_zones_calls(&self) -> usize {
        self.count(|call| matches!(call, DirectoryCall::ListZones))
    }

    pub fn list_records_calls(&self) -> usize {
        self.count(|call| matches!(call, DirectoryCall::ListRecords(_)))
    }

    pub fn mutation_calls(&self) -> usize {
        self.count(|call| matches!(call, DirectoryCall::Create(_) | DirectoryCall::Update(..)))
    }

    /// Records currently held by the remote
    pub fn records(&self) -> Vec<RecordDescriptor> {
        self.state.lock().unwrap().records.clone()
    }

    fn count(&self, f: impl Fn(&DirectoryCall) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| f(c)).count()
    }
}

#[async_trait::async_trait]
impl DnsDirectory for ScriptedDirectory {
    async fn list_zones(&self) -> Result<Vec<ZoneDescriptor>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DirectoryCall::ListZones);
        if let Some(failure) = state.fail_list_zones {
            return Err(failure.into_error(Operation::ZoneLookup));
        }
        Ok(state.zones.clone())
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<RecordDescriptor>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DirectoryCall::ListRecords(zone_id.to_string()));
        if let Some(failure) = state.fail_list_records {
            return Err(failure.into_error(Operation::RecordLookup));
        }
        Ok(state
            .records
            .iter()
            .filter(|r| r.zone_id == zone_id)
            .cloned()
            .collect())
    }

    async fn create_record(&self, desired: &DesiredRecord) -> Result<RecordDescriptor> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DirectoryCall::Create(desired.clone()));
        if let Some(failure) = state.fail_create {
            return Err(failure.into_error(Operation::RecordCreate));
        }
        if !state.zones.iter().any(|z| z.id == desired.zone_id) {
            return Err(Error::rejected(Operation::RecordCreate, 404, "zone not found"));
        }
        state.next_id += 1;
        let record = RecordDescriptor {
            id: format!("created{}", state.next_id),
            name: desired.name.clone(),
            value: desired.value.clone(),
            zone_id: desired.zone_id.clone(),
            ttl: Some(desired.ttl),
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        record_id: &str,
        desired: &DesiredRecord,
    ) -> Result<RecordDescriptor> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(DirectoryCall::Update(record_id.to_string(), desired.clone()));
        if let Some(failure) = state.fail_update {
            return Err(failure.into_error(Operation::RecordUpdate));
        }
        let Some(record) = state.records.iter_mut().find(|r| r.id == record_id) else {
            return Err(Error::rejected(Operation::RecordUpdate, 404, "record not found"));
        };
        record.value = desired.value.clone();
        record.ttl = Some(desired.ttl);
        Ok(record.clone())
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// A cache store that counts calls and can be told to fail
#[derive(Debug, Clone, Default)]
pub struct CountingCache {
    inner: MemoryCacheStore,
    invalid: Arc<Mutex<Vec<CacheKind>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
    fail_ready: Arc<AtomicBool>,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = CacheEntry>) -> Self {
        Self {
            inner: MemoryCacheStore::with_entries(entries),
            ..Self::default()
        }
    }

    /// Make reads of `kind` report a malformed document
    pub fn corrupt(self, kind: CacheKind) -> Self {
        self.invalid.lock().unwrap().push(kind);
        self
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    /// Make `ensure_ready` fail, as for a read-only cache location
    pub fn failing_ready(self) -> Self {
        self.fail_ready.store(true, Ordering::SeqCst);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn zone(&self) -> Option<ZoneDescriptor> {
        match self.inner.get(CacheKind::Zone).await {
            Some(CacheEntry::Zone(zone)) => Some(zone),
            _ => None,
        }
    }

    pub async fn record(&self) -> Option<RecordDescriptor> {
        match self.inner.get(CacheKind::Record).await {
            Some(CacheEntry::Record(record)) => Some(record),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for CountingCache {
    async fn read(&self, kind: CacheKind) -> CacheLookup<CacheEntry> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.invalid.lock().unwrap().contains(&kind) {
            return CacheLookup::Invalid("expected value at line 1 column 1".to_string());
        }
        self.inner.read(kind).await
    }

    async fn write(&self, entry: &CacheEntry) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::cache_write("disk full"));
        }
        self.invalid.lock().unwrap().retain(|k| *k != entry.kind());
        self.inner.write(entry).await
    }

    async fn ensure_ready(&self) -> Result<()> {
        if self.fail_ready.load(Ordering::SeqCst) {
            return Err(Error::cache_write("read-only file system"));
        }
        Ok(())
    }

    async fn invalidate(&self, kind: CacheKind) -> Result<()> {
        self.invalid.lock().unwrap().retain(|k| *k != kind);
        self.inner.invalidate(kind).await
    }
}

/// An IP source that always reports the same address
#[derive(Debug, Clone)]
pub struct FixedIpSource {
    ip: Option<IpAddr>,
    calls: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: Some(ip.parse().expect("valid test address")),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that cannot determine the address
    pub fn unavailable() -> Self {
        Self {
            ip: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ip
            .ok_or_else(|| Error::transport(Operation::IpLookup, "service unreachable"))
    }
}

pub fn zone(id: &str, name: &str) -> ZoneDescriptor {
    ZoneDescriptor::new(id, name)
}

pub fn record(id: &str, name: &str, value: &str, zone_id: &str) -> RecordDescriptor {
    RecordDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        value: value.to_string(),
        zone_id: zone_id.to_string(),
        ttl: Some(60),
    }
}

/// Configuration for zone "example.com", record "home"
pub fn test_config() -> RunConfig {
    RunConfig::new("example.com", "home", "test-token")
}

/// Drain every event emitted so far
pub fn drain(rx: &mut mpsc::Receiver<ReconcileEvent>) -> Vec<ReconcileEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
