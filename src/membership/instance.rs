//! Instance identity and network endpoints
//!
//! Both are opaque to the quorum logic: an `InstanceId` is only compared,
//! hashed and ordered, and an `EndPoint` is only carried along for the
//! coordinator that performs the actual broadcast.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::MembershipError;

/// Identifier of a storage instance holding a segment replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Wrap a raw numeric id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw numeric id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl From<u64> for InstanceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InstanceId {
    type Err = MembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(InstanceId)
            .map_err(|e| MembershipError::malformed_content(format!("bad instance id {:?}: {}", s, e)))
    }
}

/// Network address (host and port) of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndPoint {
    pub host: String,
    pub port: u16,
}

impl EndPoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for EndPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for EndPoint {
    type Err = MembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| MembershipError::malformed_content(format!("endpoint {:?} has no port", s)))?;
        if host.is_empty() {
            return Err(MembershipError::malformed_content(format!(
                "endpoint {:?} has no host",
                s
            )));
        }
        let port = port.parse::<u16>().map_err(|e| {
            MembershipError::malformed_content(format!("endpoint {:?} has bad port: {}", s, e))
        })?;
        Ok(EndPoint::new(host, port))
    }
}
