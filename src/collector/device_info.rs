use crate::error::{GatewayError, Result};
use crate::snmp::oid::SYS_NAME_OID;
use crate::snmp::{DeviceSession, ScalarValue};

use super::types::DiscoveryResult;

/// Lightweight identification: just the device name.
pub struct DeviceInfo;

impl DeviceInfo {
    /// Reads sysName. Succeeds only when it decodes as non-empty text.
    pub async fn get_system_name(session: &dyn DeviceSession) -> Result<DiscoveryResult> {
        let values = session
            .get(&[SYS_NAME_OID.to_string()])
            .await
            .map_err(|e| GatewayError::ScalarFetch(format!("{:#}", e)))?;

        match values.into_iter().next() {
            Some(ScalarValue::Text(bytes)) => {
                let system_name = String::from_utf8(bytes)
                    .map_err(|_| GatewayError::NameNotFound)?
                    .trim()
                    .to_string();
                if system_name.is_empty() {
                    return Err(GatewayError::NameNotFound);
                }
                Ok(DiscoveryResult { system_name })
            }
            _ => Err(GatewayError::NameNotFound),
        }
    }
}
