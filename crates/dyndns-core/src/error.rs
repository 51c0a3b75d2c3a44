//! Error types for the dynamic DNS reconciler
//!
//! Every fatal condition of a run is one variant of [`Error`]. Soft cache
//! failures are not represented here when reading: they surface as
//! [`CacheLookup::Invalid`](crate::traits::CacheLookup) instead.

use std::fmt;
use thiserror::Error;

/// Result type alias for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// The remote call an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Listing zones
    ZoneLookup,
    /// Listing records of a zone
    RecordLookup,
    /// Creating a record
    RecordCreate,
    /// Updating a record
    RecordUpdate,
    /// Asking the IP service for the public address
    IpLookup,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ZoneLookup => "zone lookup",
            Operation::RecordLookup => "record lookup",
            Operation::RecordCreate => "record create",
            Operation::RecordUpdate => "record update",
            Operation::IpLookup => "IP lookup",
        };
        f.write_str(name)
    }
}

/// Core error type for the reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// Missing, unreadable or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote could not be reached, or its answer could not be decoded
    #[error("Transport failure during {operation}: {message}")]
    Transport {
        /// Which call failed
        operation: Operation,
        /// Underlying cause
        message: String,
    },

    /// The remote answered with a non-success status
    #[error("Server rejected {operation} with status {status}: {body}")]
    Rejected {
        /// Which call was rejected
        operation: Operation,
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// No zone with the configured name exists
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// The public address could not be determined or is unusable
    #[error("IP source error: {0}")]
    IpSource(String),

    /// A cache document could not be persisted
    #[error("Cache write failed: {0}")]
    CacheWrite(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport failure for `operation`
    pub fn transport(operation: Operation, msg: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: msg.into(),
        }
    }

    /// Create a server rejection for `operation`
    pub fn rejected(operation: Operation, status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            status,
            body: body.into(),
        }
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(zone_name: impl Into<String>) -> Self {
        Self::ZoneNotFound(zone_name.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a cache write error
    pub fn cache_write(msg: impl Into<String>) -> Self {
        Self::CacheWrite(msg.into())
    }

    /// The HTTP status carried by a server rejection, if any
    pub fn rejection_status(&self) -> Option<u16> {
        match self {
            Error::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error belongs to the configuration layer
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_names_the_failing_call() {
        let err = Error::transport(Operation::RecordLookup, "connection reset");
        assert_eq!(
            err.to_string(),
            "Transport failure during record lookup: connection reset"
        );
    }

    #[test]
    fn rejection_status_only_for_rejections() {
        let rejected = Error::rejected(Operation::RecordCreate, 422, "{\"error\":\"invalid\"}");
        assert_eq!(rejected.rejection_status(), Some(422));
        assert_eq!(Error::zone_not_found("example.com").rejection_status(), None);
    }
}
