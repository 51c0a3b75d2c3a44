// # IP Source Trait
//
// Defines the interface for determining the machine's current public
// address.
//
// ## Implementations
//
// - HTTP-based: `dyndns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//     let current_ip = source.current().await?;
//     println!("public address: {}", current_ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Version of `ip`
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

/// Trait for IP source implementations
///
/// An IP source answers one question: what is the public address right now.
/// It is queried once per run and does not watch, poll or cache.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error)`: If unable to determine the current IP
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the IP version this source reports
    ///
    /// Returns `None` if the implementation may report either version.
    fn version(&self) -> Option<IpVersion> {
        None
    }
}
