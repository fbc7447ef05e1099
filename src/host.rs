use std::fmt;
use std::net::IpAddr;
use tokio::net::lookup_host;
use tracing::debug;

use crate::error::PingErrorKind;

/// A host string the user typed that resolved to at least one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAddress {
    pub name: String,
    pub addrs: Vec<IpAddr>,
}

impl TargetAddress {
    pub fn new(name: String, addrs: Vec<IpAddr>) -> Self {
        Self { name, addrs }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Everything observed from one completed run of the `ping` utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub target: String,
}

impl ProbeOutcome {
    pub fn new(exit_code: i32, stdout: String, stderr: String, target: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            target,
        }
    }
}

/// Accepts the input only if the system resolver returns at least one record.
///
/// Literal IPv4/IPv6 addresses and DNS names both pass. Any resolver failure is
/// reported as [`PingErrorKind::InvalidIPAddress`].
pub async fn validate(raw: &str) -> Result<TargetAddress, PingErrorKind> {
    let host = raw.trim();
    if host.is_empty() {
        return Err(PingErrorKind::InvalidIPAddress);
    }

    if let Ok(addr) = host.parse::<IpAddr>() {
        return Ok(TargetAddress::new(host.to_string(), vec![addr]));
    }

    match lookup_host((host, 0)).await {
        Ok(addrs) => {
            let addrs: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
            if addrs.is_empty() {
                debug!(host, "resolver returned no records");
                return Err(PingErrorKind::InvalidIPAddress);
            }
            debug!(host, ?addrs, "resolved");
            Ok(TargetAddress::new(host.to_string(), addrs))
        }
        Err(e) => {
            debug!(host, error = %e, "failed to resolve");
            Err(PingErrorKind::InvalidIPAddress)
        }
    }
}
