pub mod client;
pub mod oid;
pub mod session;
pub mod v3;

pub use client::{Snmp2Connector, SnmpClient};
pub use oid::{INTERFACE_OIDS, OidEntry, SYSTEM_OIDS, parse_oid};
pub use session::{DeviceConnector, DeviceSession, ProtocolVersion, ScalarValue, SessionParams};
