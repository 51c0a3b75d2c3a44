//! Configuration types for the reconciler
//!
//! A run is driven by one immutable [`RunConfig`], usually loaded from a
//! YAML file:
//!
//! ```yaml
//! zone_name: example.com
//! record_name: home
//! record_ttl: 60
//! access_token: 0123456789abcdef
//! cache_directory: /var/cache/dyndns
//! ip_source:
//!   url: https://api.ipify.org
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Hetzner DNS zone listing endpoint
pub const DEFAULT_ZONES_API_URL: &str = "https://dns.hetzner.com/api/v1/zones";

/// Hetzner DNS record endpoint
pub const DEFAULT_RECORDS_API_URL: &str = "https://dns.hetzner.com/api/v1/records";

/// Configuration of a single reconciliation run
#[derive(Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Zone that owns the record (e.g., "example.com")
    pub zone_name: String,

    /// Record name relative to the zone (e.g., "home")
    pub record_name: String,

    /// TTL used when creating or updating the record
    #[serde(default = "default_record_ttl")]
    pub record_ttl: u32,

    /// API token sent with every remote call
    ///
    /// May be left out of the file and supplied through the environment.
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub access_token: String,

    /// Zone listing endpoint
    #[serde(default = "default_zones_api_url")]
    pub zones_api_url: String,

    /// Record listing/creation endpoint; updates go to `{records_api_url}/{id}`
    #[serde(default = "default_records_api_url")]
    pub records_api_url: String,

    /// Directory holding the zone and record cache documents
    #[serde(default = "default_cache_directory")]
    pub cache_directory: PathBuf,

    /// Where the public address is looked up
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Capacity of the reconcile event channel
    ///
    /// When full, further events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

// Custom Debug implementation that hides the access token
impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("zone_name", &self.zone_name)
            .field("record_name", &self.record_name)
            .field("record_ttl", &self.record_ttl)
            .field("access_token", &"<REDACTED>")
            .field("zones_api_url", &self.zones_api_url)
            .field("records_api_url", &self.records_api_url)
            .field("cache_directory", &self.cache_directory)
            .field("ip_source", &self.ip_source)
            .field("event_channel_capacity", &self.event_channel_capacity)
            .finish()
    }
}

impl RunConfig {
    /// Create a configuration with default endpoints and cache location
    pub fn new(
        zone_name: impl Into<String>,
        record_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            zone_name: zone_name.into(),
            record_name: record_name.into(),
            record_ttl: default_record_ttl(),
            access_token: access_token.into(),
            zones_api_url: default_zones_api_url(),
            records_api_url: default_records_api_url(),
            cache_directory: default_cache_directory(),
            ip_source: IpSourceConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Parse a configuration from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::config(format!("Invalid YAML: {}", e)))
    }

    /// Read and parse a YAML configuration file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Set the cache directory
    pub fn with_cache_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_directory = dir.into();
        self
    }

    /// Set the record TTL
    pub fn with_record_ttl(mut self, ttl: u32) -> Self {
        self.record_ttl = ttl;
        self
    }

    /// Replace the access token (e.g., from an environment variable)
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.zone_name.is_empty() {
            return Err(Error::config("zone_name cannot be empty"));
        }
        if self.record_name.is_empty() {
            return Err(Error::config("record_name cannot be empty"));
        }
        if self.access_token.is_empty() {
            return Err(Error::config("access_token cannot be empty"));
        }
        if self.record_ttl == 0 {
            return Err(Error::config("record_ttl must be > 0"));
        }
        if self.cache_directory.as_os_str().is_empty() {
            return Err(Error::config("cache_directory cannot be empty"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("event_channel_capacity must be > 0"));
        }

        validate_url("zones_api_url", &self.zones_api_url)?;
        validate_url("records_api_url", &self.records_api_url)?;
        self.ip_source.validate()?;

        Ok(())
    }
}

/// Public address lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL answering with the caller's address as plain text
    #[serde(default = "default_ip_source_url")]
    pub url: String,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<()> {
        validate_url("ip_source.url", &self.url)
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_source_url(),
        }
    }
}

fn validate_url(field: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::config(format!("{} cannot be empty", field)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            field, url
        )));
    }
    Ok(())
}

fn default_record_ttl() -> u32 {
    60
}

fn default_zones_api_url() -> String {
    DEFAULT_ZONES_API_URL.to_string()
}

fn default_records_api_url() -> String {
    DEFAULT_RECORDS_API_URL.to_string()
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from(".cache")
}

fn default_ip_source_url() -> String {
    "https://api.ipify.org".to_string()
}

fn default_event_channel_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_gets_defaults() {
        let config = RunConfig::from_yaml_str(
            "zone_name: example.com\nrecord_name: home\naccess_token: secret\n",
        )
        .unwrap();

        assert_eq!(config.zone_name, "example.com");
        assert_eq!(config.record_name, "home");
        assert_eq!(config.record_ttl, 60);
        assert_eq!(config.zones_api_url, DEFAULT_ZONES_API_URL);
        assert_eq!(config.records_api_url, DEFAULT_RECORDS_API_URL);
        assert_eq!(config.cache_directory, PathBuf::from(".cache"));
        assert_eq!(config.ip_source.url, "https://api.ipify.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_yaml_overrides_defaults() {
        let yaml = r#"
zone_name: example.com
record_name: home
record_ttl: 300
access_token: secret
zones_api_url: http://localhost:8080/zones
records_api_url: http://localhost:8080/records
cache_directory: /tmp/dyndns-cache
ip_source:
  url: https://ifconfig.me/ip
event_channel_capacity: 8
"#;
        let config = RunConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.record_ttl, 300);
        assert_eq!(config.zones_api_url, "http://localhost:8080/zones");
        assert_eq!(config.cache_directory, PathBuf::from("/tmp/dyndns-cache"));
        assert_eq!(config.ip_source.url, "https://ifconfig.me/ip");
        assert_eq!(config.event_channel_capacity, 8);
    }

    #[test]
    fn missing_required_field_is_config_error() {
        let err = RunConfig::from_yaml_str("zone_name: example.com\n").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn token_may_come_from_elsewhere() {
        let config =
            RunConfig::from_yaml_str("zone_name: example.com\nrecord_name: home\n").unwrap();
        assert!(config.access_token.is_empty());
        assert!(config.validate().unwrap_err().is_config());

        let config = config.with_access_token("from-env");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = RunConfig::new("example.com", "home", "secret");
        assert!(base.validate().is_ok());

        assert!(base.clone().with_record_ttl(0).validate().is_err());
        assert!(base.clone().with_access_token("").validate().is_err());

        let mut bad_url = base.clone();
        bad_url.records_api_url = "ftp://example.com/records".to_string();
        assert!(bad_url.validate().is_err());

        let mut empty_zone = base;
        empty_zone.zone_name.clear();
        assert!(empty_zone.validate().is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunConfig::from_yaml_file(dir.path().join("absent.yml")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn access_token_not_exposed_in_debug() {
        let config = RunConfig::new("example.com", "home", "secret_token_12345");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("RunConfig"));
    }
}
