use std::collections::BTreeMap;

use serde::Serialize;

/// Decoded attribute value as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Bool(bool),
}

/// One interface row. Attributes the device reported as nil are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceRecord {
    pub index: u32,
    #[serde(flatten)]
    pub attributes: BTreeMap<&'static str, FieldValue>,
}

/// An interface that was enumerated but could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceFailure {
    pub index: u32,
    pub error: &'static str,
    pub details: String,
}

/// Enumeration itself failed; the job still reports system attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumerationFailure {
    pub error: &'static str,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResult {
    pub system_name: FieldValue,
    pub description: FieldValue,
    pub location: FieldValue,
    pub object_id: FieldValue,
    pub uptime: String,
    pub reported_interface_count: FieldValue,
    /// Number of indices found by enumeration
    pub interface_count: usize,
    /// Ascending by index
    pub interfaces: Vec<InterfaceRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interface_errors: Vec<InterfaceFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces_error: Option<EnumerationFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    pub system_name: String,
}
