//! Device-protocol seam.
//!
//! The polling engine talks to devices only through [`DeviceConnector`] and
//! [`DeviceSession`]. Wire encoding lives behind these traits; the production
//! implementation is [`crate::snmp::Snmp2Connector`].

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    V1,
    V2c,
    V3,
}

impl ProtocolVersion {
    /// Maps the request's version string. Anything unknown is rejected, never defaulted.
    pub fn parse(raw: &str) -> std::result::Result<Self, GatewayError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" => Ok(ProtocolVersion::V1),
            "2" | "2c" => Ok(ProtocolVersion::V2c),
            "3" => Ok(ProtocolVersion::V3),
            _ => Err(GatewayError::UnsupportedVersion(raw.to_string())),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V1 => write!(f, "v1"),
            ProtocolVersion::V2c => write!(f, "v2c"),
            ProtocolVersion::V3 => write!(f, "v3"),
        }
    }
}

/// Everything needed to open one session. Timeout and retry budget are fixed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub host: String,
    pub port: u16,
    pub credential: String,
    pub version: ProtocolVersion,
    /// Per-call timeout
    pub timeout: Duration,
    /// Extra attempts after the first one
    pub retries: u32,
}

impl SessionParams {
    /// `host:port`, with IPv6 literals bracketed.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Owned, library-independent view of a returned variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarValue {
    /// OCTET STRING / Opaque payload
    Text(Vec<u8>),
    Integer(i64),
    /// Counter32, Gauge32/Unsigned32, Counter64
    Unsigned(u64),
    /// Hundredths of a second
    Timeticks(u32),
    ObjectId(String),
    IpAddress([u8; 4]),
    Boolean(bool),
    /// NULL, noSuchObject, noSuchInstance, endOfMibView
    Absent,
    Other(String),
}

impl ScalarValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, ScalarValue::Absent)
    }
}

/// A live connection to one device.
///
/// Implementations must tolerate concurrent calls on `&self`: the interface
/// collector issues several fetches at once against a single session. Releasing
/// the session's resources happens on drop.
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Batched GET. Values come back positionally, one per requested OID, in request order.
    async fn get(&self, oids: &[String]) -> Result<Vec<ScalarValue>>;

    /// Subtree walk under `root`, in the order the device returns rows.
    async fn walk(&self, root: &str) -> Result<Vec<(String, ScalarValue)>>;
}

#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn connect(&self, params: &SessionParams) -> Result<Box<dyn DeviceSession>>;
}
