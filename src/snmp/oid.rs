use anyhow::{Context, Result};
use snmp2::Oid;

/// One row of an OID table: identifier and the field name it is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OidEntry {
    pub oid: &'static str,
    pub field: &'static str,
}

const fn entry(oid: &'static str, field: &'static str) -> OidEntry {
    OidEntry { oid, field }
}

pub const SYS_NAME_OID: &str = "1.3.6.1.2.1.1.5.0";

/// ifName column, walked to discover interface indices.
pub const IF_NAME_COLUMN: &str = "1.3.6.1.2.1.31.1.1.1.1";

pub const FIELD_SYSTEM_NAME: &str = "systemName";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_LOCATION: &str = "location";
pub const FIELD_OBJECT_ID: &str = "objectId";
pub const FIELD_UPTIME: &str = "uptime";
pub const FIELD_REPORTED_INTERFACES: &str = "reportedInterfaceCount";

pub const FIELD_PHYSICAL_ADDRESS: &str = "physicalAddress";

/// Device-wide scalars, fetched in one batched GET. Order is the request order.
pub static SYSTEM_OIDS: [OidEntry; 6] = [
    entry(SYS_NAME_OID, FIELD_SYSTEM_NAME),
    entry("1.3.6.1.2.1.1.1.0", FIELD_DESCRIPTION),
    entry("1.3.6.1.2.1.1.6.0", FIELD_LOCATION),
    entry("1.3.6.1.2.1.1.2.0", FIELD_OBJECT_ID),
    entry("1.3.6.1.2.1.1.3.0", FIELD_UPTIME),
    entry("1.3.6.1.2.1.2.1.0", FIELD_REPORTED_INTERFACES),
];

/// Per-interface columns; each is suffixed with the interface index before fetching.
pub static INTERFACE_OIDS: [OidEntry; 14] = [
    entry(IF_NAME_COLUMN, "name"),
    entry("1.3.6.1.2.1.31.1.1.1.18", "alias"),
    entry("1.3.6.1.2.1.2.2.1.2", "description"),
    entry("1.3.6.1.2.1.2.2.1.7", "adminStatus"),
    entry("1.3.6.1.2.1.2.2.1.8", "operStatus"),
    entry("1.3.6.1.2.1.2.2.1.5", "speed"),
    entry("1.3.6.1.2.1.2.2.1.6", FIELD_PHYSICAL_ADDRESS),
    entry("1.3.6.1.2.1.2.2.1.10", "inOctets"),
    entry("1.3.6.1.2.1.2.2.1.16", "outOctets"),
    entry("1.3.6.1.2.1.2.2.1.11", "inPackets"),
    entry("1.3.6.1.2.1.2.2.1.17", "outPackets"),
    entry("1.3.6.1.2.1.2.2.1.14", "inErrors"),
    entry("1.3.6.1.2.1.2.2.1.20", "outErrors"),
    entry("1.3.6.1.2.1.2.2.1.13", "inDiscards"),
];

/// OIDs of a table in request order.
pub fn table_oids(table: &[OidEntry]) -> Vec<String> {
    table.iter().map(|e| e.oid.to_string()).collect()
}

/// Full per-interface OID set for one index, in `INTERFACE_OIDS` order.
pub fn interface_oids(index: u32) -> Vec<String> {
    INTERFACE_OIDS
        .iter()
        .map(|e| format!("{}.{}", e.oid, index))
        .collect()
}

/// Trailing numeric arc of a dotted OID, accepted only when it is a positive index.
pub fn index_suffix(oid: &str) -> Option<u32> {
    oid.trim_end_matches('.')
        .rsplit('.')
        .next()
        .and_then(|last| last.parse::<u32>().ok())
        .filter(|index| *index > 0)
}

pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let parts: Result<Vec<u64>, _> = s
        .trim()
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>())
        .collect();

    let parts = parts.with_context(|| format!("invalid OID: {}", s))?;
    Oid::from(&parts).map_err(|e| anyhow::anyhow!("cannot build OID from '{}': {:?}", s, e))
}
