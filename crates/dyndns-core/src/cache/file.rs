// # File Cache Store
//
// File-based implementation of CacheStore.
//
// ## Layout
//
// One pretty-printed JSON document per kind, under the cache directory:
//
// ```text
// <cache_directory>/
// ├── zone.json     {"id": "z1", "name": "example.com"}
// └── record.json   {"id": "rec1", "name": "home", "value": "1.2.3.4", "zone_id": "z1", "ttl": 60}
// ```
//
// ## Atomicity
//
// Writes go to `<file>.tmp` first and are renamed over the document, so a
// read observes either the previous document or the new one.
//
// ## Corruption
//
// A document that fails to parse is reported as `Invalid` and simply gets
// replaced by the next successful remote lookup. No backup is kept: the
// remote is always able to rebuild the cache.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::cache_store::{CacheEntry, CacheKind, CacheLookup, CacheStore};
use crate::traits::dns_directory::{RecordDescriptor, ZoneDescriptor};

/// Directory-backed descriptor cache
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::cache::FileCacheStore;
/// use dyndns_core::traits::{CacheLookup, CacheStore, ZoneDescriptor};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileCacheStore::new("/var/cache/dyndns");
///     store.ensure_ready().await?;
///
///     store.write(&ZoneDescriptor::new("z1", "example.com").into()).await?;
///     assert!(matches!(store.read_zone().await, CacheLookup::Hit(_)));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    /// Create a store rooted at `dir`
    ///
    /// Nothing touches the filesystem until [`CacheStore::ensure_ready`] or
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `kind`
    pub fn document_path(&self, kind: CacheKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    fn temp_path(&self, kind: CacheKind) -> PathBuf {
        self.dir.join(format!("{}.tmp", kind.file_name()))
    }

    fn parse(kind: CacheKind, content: &str) -> Result<CacheEntry, serde_json::Error> {
        match kind {
            CacheKind::Zone => {
                serde_json::from_str::<ZoneDescriptor>(content).map(CacheEntry::Zone)
            }
            CacheKind::Record => {
                serde_json::from_str::<RecordDescriptor>(content).map(CacheEntry::Record)
            }
        }
    }

    async fn write_document(&self, kind: CacheKind, json: &str) -> Result<(), Error> {
        let temp_path = self.temp_path(kind);
        let path = self.document_path(kind);

        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::cache_write(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::cache_write(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::cache_write(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &path).await.map_err(|e| {
            Error::cache_write(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("Cache document written: {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn read(&self, kind: CacheKind) -> CacheLookup<CacheEntry> {
        let path = self.document_path(kind);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No cached {} document at {}", kind, path.display());
                return CacheLookup::Miss;
            }
            Err(e) => {
                return CacheLookup::Invalid(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ));
            }
        };

        match Self::parse(kind, &content) {
            Ok(entry) => CacheLookup::Hit(entry),
            Err(e) => CacheLookup::Invalid(format!(
                "Failed to parse {}: {}",
                path.display(),
                e
            )),
        }
    }

    async fn write(&self, entry: &CacheEntry) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(entry).map_err(|e| {
            Error::cache_write(format!("Failed to serialize {}: {}", entry.kind(), e))
        })?;
        self.write_document(entry.kind(), &json).await
    }

    async fn ensure_ready(&self) -> Result<(), Error> {
        match fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(Error::cache_write(format!(
                    "Cache path {} exists but is not a directory",
                    self.dir.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::cache_write(format!(
                    "Failed to inspect cache directory {}: {}",
                    self.dir.display(),
                    e
                )));
            }
        }

        fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::cache_write(format!(
                "Failed to create cache directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(0o700))
                .await
                .map_err(|e| {
                    Error::cache_write(format!(
                        "Failed to restrict cache directory {}: {}",
                        self.dir.display(),
                        e
                    ))
                })?;
        }

        tracing::debug!("Created cache directory {}", self.dir.display());
        Ok(())
    }

    async fn invalidate(&self, kind: CacheKind) -> Result<(), Error> {
        let path = self.document_path(kind);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Removed cache document {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::cache_write(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
