//! Core traits for the reconciler
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsDirectory`]: List zones/records and mutate the managed record
//! - [`CacheStore`]: Persist the last known zone and record descriptors
//! - [`IpSource`]: Determine the current public address

pub mod cache_store;
pub mod dns_directory;
pub mod ip_source;

pub use cache_store::{CacheEntry, CacheKind, CacheLookup, CacheStore};
pub use dns_directory::{
    DesiredRecord, DnsDirectory, RECORD_TYPE, RecordDescriptor, ZoneDescriptor, find_record,
    find_zone,
};
pub use ip_source::{IpSource, IpVersion};
