//! Interface enumeration and per-interface collection.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::{GatewayError, Result};
use crate::snmp::oid::{IF_NAME_COLUMN, INTERFACE_OIDS, index_suffix, interface_oids};
use crate::snmp::DeviceSession;

use super::scalar_collector::{decode_interface_field, zip_values};
use super::types::{InterfaceFailure, InterfaceRecord};

/// Outcome of collecting every enumerated interface.
#[derive(Debug, Default)]
pub struct InterfaceTable {
    /// Ascending by index
    pub records: Vec<InterfaceRecord>,
    pub failures: Vec<InterfaceFailure>,
}

pub struct TableCollector;

impl TableCollector {
    /// Walks the ifName column and returns the row indices, ascending and unique.
    ///
    /// Index spaces are often sparse, so the device-reported interface count is not used.
    pub async fn enumerate_indices(session: &dyn DeviceSession) -> Result<Vec<u32>> {
        let rows = session
            .walk(IF_NAME_COLUMN)
            .await
            .map_err(|e| GatewayError::ScalarFetch(format!("interface walk failed: {:#}", e)))?;

        let mut indices: Vec<u32> = rows
            .iter()
            .filter_map(|(oid, _)| {
                let index = index_suffix(oid);
                if index.is_none() {
                    warn!(oid = %oid, "skipping walk row without a usable index");
                }
                index
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();

        debug!(count = indices.len(), "interfaces enumerated");
        Ok(indices)
    }

    /// Fetches one interface row with a single batched GET.
    pub async fn collect_interface(
        session: &dyn DeviceSession,
        index: u32,
    ) -> Result<InterfaceRecord> {
        let values = session
            .get(&interface_oids(index))
            .await
            .map_err(|e| GatewayError::InterfaceFetch {
                index,
                detail: format!("{:#}", e),
            })?;

        let attributes: BTreeMap<_, _> = zip_values(&INTERFACE_OIDS, values)
            .map_err(|detail| GatewayError::InterfaceFetch { index, detail })?
            .into_iter()
            .filter_map(|(field, value)| {
                decode_interface_field(field, &value).map(|decoded| (field, decoded))
            })
            .collect();

        Ok(InterfaceRecord { index, attributes })
    }

    /// Collects every index with at most `max_in_flight` fetches outstanding.
    ///
    /// Each fetch writes into the slot of its index position, so output order
    /// follows `indices` whatever order the fetches complete in. A failed
    /// interface is reported in `failures` and left out of `records`.
    pub async fn collect_interfaces(
        session: &dyn DeviceSession,
        indices: &[u32],
        max_in_flight: usize,
    ) -> InterfaceTable {
        let mut slots: Vec<Option<Result<InterfaceRecord>>> =
            std::iter::repeat_with(|| None).take(indices.len()).collect();

        let mut fetches = stream::iter(indices.iter().copied().enumerate())
            .map(|(slot, index)| async move {
                (slot, Self::collect_interface(session, index).await)
            })
            .buffer_unordered(max_in_flight.max(1));

        while let Some((slot, outcome)) = fetches.next().await {
            slots[slot] = Some(outcome);
        }

        let mut table = InterfaceTable {
            records: Vec::with_capacity(indices.len()),
            failures: Vec::new(),
        };
        for (slot, index) in slots.into_iter().zip(indices.iter().copied()) {
            match slot {
                Some(Ok(record)) => table.records.push(record),
                Some(Err(e)) => {
                    warn!(index, error = %e, "interface fetch failed, excluding it");
                    table.failures.push(InterfaceFailure {
                        index,
                        error: e.code(),
                        details: e.to_string(),
                    });
                }
                None => table.failures.push(InterfaceFailure {
                    index,
                    error: "internal error",
                    details: "fetch did not complete".to_string(),
                }),
            }
        }
        table
    }
}
