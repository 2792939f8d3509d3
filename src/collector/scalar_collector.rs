//! Batched scalar fetch and value decoding.

use std::collections::BTreeMap;

use crate::error::{GatewayError, Result};
use crate::snmp::oid::{FIELD_PHYSICAL_ADDRESS, OidEntry, table_oids};
use crate::snmp::{DeviceSession, ScalarValue};

use super::types::FieldValue;

/// Rendered in place of a value the device returned as nil.
pub const NIL: &str = "nil";

const SECONDS_PER_DAY: u64 = 24 * 3600;

/// Pairs each returned value with the field of the OID sent at the same position.
///
/// The device answers positionally; the response is never re-keyed by OID.
pub fn zip_values(
    table: &[OidEntry],
    values: Vec<ScalarValue>,
) -> std::result::Result<Vec<(&'static str, ScalarValue)>, String> {
    if values.len() != table.len() {
        return Err(format!(
            "device returned {} value(s) for {} requested OID(s)",
            values.len(),
            table.len()
        ));
    }
    Ok(table.iter().map(|e| e.field).zip(values).collect())
}

/// Scalar decode: text payloads become strings, nil becomes `"nil"`, the rest stays native.
pub fn decode_scalar(value: &ScalarValue) -> FieldValue {
    match value {
        ScalarValue::Text(bytes) => FieldValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ScalarValue::Absent => FieldValue::Text(NIL.to_string()),
        ScalarValue::Integer(n) => FieldValue::Integer(*n),
        ScalarValue::Unsigned(n) => FieldValue::Unsigned(*n),
        ScalarValue::Timeticks(t) => FieldValue::Unsigned(u64::from(*t)),
        ScalarValue::ObjectId(oid) => FieldValue::Text(oid.clone()),
        ScalarValue::IpAddress([a, b, c, d]) => FieldValue::Text(format!("{a}.{b}.{c}.{d}")),
        ScalarValue::Boolean(b) => FieldValue::Bool(*b),
        ScalarValue::Other(s) => FieldValue::Text(s.clone()),
    }
}

/// Interface attribute decode. `None` means the attribute is omitted.
pub fn decode_interface_field(field: &str, value: &ScalarValue) -> Option<FieldValue> {
    match value {
        ScalarValue::Absent => None,
        ScalarValue::Text(bytes) if field == FIELD_PHYSICAL_ADDRESS => {
            Some(FieldValue::Text(format_mac(bytes)))
        }
        other => Some(decode_scalar(other)),
    }
}

/// Uppercase hex byte pairs joined by `:`, e.g. `AA:BB:CC:00:11:22`.
pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Renders a tick count (1/100 s) as `D days, HH hours, MM minutes, SS seconds`.
pub fn format_uptime(ticks: u64) -> String {
    let mut seconds = ticks / 100;
    let days = seconds / SECONDS_PER_DAY;
    seconds %= SECONDS_PER_DAY;
    let hours = seconds / 3600;
    seconds %= 3600;
    let minutes = seconds / 60;
    seconds %= 60;
    format!(
        "{} days, {:02} hours, {:02} minutes, {:02} seconds",
        days, hours, minutes, seconds
    )
}

pub fn decode_uptime(value: Option<&ScalarValue>) -> Result<String> {
    let ticks = match value {
        Some(ScalarValue::Timeticks(t)) => u64::from(*t),
        Some(ScalarValue::Unsigned(n)) => *n,
        Some(ScalarValue::Integer(n)) => u64::try_from(*n)
            .map_err(|_| GatewayError::Decode(format!("negative uptime {}", n)))?,
        Some(ScalarValue::Text(bytes)) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or_else(|| GatewayError::Decode("uptime is not numeric".to_string()))?,
        Some(ScalarValue::Absent) | None => {
            return Err(GatewayError::Decode("uptime is absent".to_string()));
        }
        Some(other) => {
            return Err(GatewayError::Decode(format!(
                "uptime has unexpected shape {:?}",
                other
            )));
        }
    };
    Ok(format_uptime(ticks))
}

/// Device-wide scalars keyed by field name, raw values kept for typed decodes.
#[derive(Debug, Clone, Default)]
pub struct SystemScalars {
    values: BTreeMap<&'static str, ScalarValue>,
}

impl SystemScalars {
    pub fn raw(&self, field: &str) -> Option<&ScalarValue> {
        self.values.get(field)
    }

    /// Decoded value; a field missing from the table reads as nil.
    pub fn decoded(&self, field: &str) -> FieldValue {
        self.raw(field)
            .map(decode_scalar)
            .unwrap_or_else(|| FieldValue::Text(NIL.to_string()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// System fetcher: the whole table in one batched GET.
pub struct ScalarCollector;

impl ScalarCollector {
    pub async fn collect_system(
        session: &dyn DeviceSession,
        table: &[OidEntry],
    ) -> Result<SystemScalars> {
        if table.is_empty() {
            return Err(GatewayError::ScalarFetch("no OIDs configured".to_string()));
        }

        let values = session
            .get(&table_oids(table))
            .await
            .map_err(|e| GatewayError::ScalarFetch(format!("{:#}", e)))?;

        let values = zip_values(table, values)
            .map_err(GatewayError::ScalarFetch)?
            .into_iter()
            .collect();

        Ok(SystemScalars { values })
    }
}
