//! Scripted in-memory device used by the integration suites.

#![allow(dead_code)]

pub mod agent;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use snmp_poll_gateway::collector::{PollerSettings, SnmpCollector};
use snmp_poll_gateway::config::SessionTiming;
use snmp_poll_gateway::models::{Job, JobClass};
use snmp_poll_gateway::snmp::oid::{IF_NAME_COLUMN, INTERFACE_OIDS, SYSTEM_OIDS};
use snmp_poll_gateway::snmp::{DeviceConnector, DeviceSession, ScalarValue, SessionParams};

/// What the fake device answers.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    pub values: HashMap<String, ScalarValue>,
    pub walk_rows: Vec<(String, ScalarValue)>,
    /// A GET that includes one of these OIDs fails
    pub failing_oids: HashSet<String>,
    /// A GET that includes one of these OIDs panics
    pub panicking_oids: HashSet<String>,
    /// Extra latency for a GET that includes the OID
    pub delays: HashMap<String, Duration>,
    pub walk_error: Option<String>,
    pub connect_error: Option<String>,
    /// connect never resolves
    pub hang_connect: bool,
    /// connect panics for these hosts
    pub panicking_hosts: HashSet<String>,
}

impl MockDevice {
    /// A healthy device exposing the given interface indices.
    pub fn with_interfaces(indices: &[u32]) -> Self {
        let mut device = MockDevice::default();
        device.set_system(
            "core-sw1",
            ScalarValue::Timeticks(864_000_000),
            indices.len() as u64,
        );
        for &index in indices {
            device.add_interface(index);
        }
        device
    }

    pub fn set_system(&mut self, name: &str, uptime: ScalarValue, if_number: u64) {
        let values = [
            ScalarValue::Text(name.as_bytes().to_vec()),
            ScalarValue::Text(b"Linux core-sw1 6.1.0".to_vec()),
            ScalarValue::Text(b"rack 4".to_vec()),
            ScalarValue::ObjectId("1.3.6.1.4.1.8072.3.2.10".to_string()),
            uptime,
            ScalarValue::Integer(if_number as i64),
        ];
        for (entry, value) in SYSTEM_OIDS.iter().zip(values) {
            self.values.insert(entry.oid.to_string(), value);
        }
    }

    pub fn add_interface(&mut self, index: u32) {
        for entry in INTERFACE_OIDS.iter() {
            let value = match entry.field {
                "name" => ScalarValue::Text(format!("eth{}", index).into_bytes()),
                "alias" => ScalarValue::Absent,
                "description" => ScalarValue::Text(format!("port {}", index).into_bytes()),
                "adminStatus" | "operStatus" => ScalarValue::Integer(1),
                "speed" => ScalarValue::Unsigned(1_000_000_000),
                "physicalAddress" => {
                    ScalarValue::Text(vec![0xAA, 0xBB, 0xCC, 0x00, 0x11, index as u8])
                }
                _ => ScalarValue::Unsigned(u64::from(index) * 100),
            };
            self.values.insert(format!("{}.{}", entry.oid, index), value);
        }
        self.walk_rows.push((
            format!("{}.{}", IF_NAME_COLUMN, index),
            ScalarValue::Text(format!("eth{}", index).into_bytes()),
        ));
    }

    pub fn if_name_oid(index: u32) -> String {
        format!("{}.{}", IF_NAME_COLUMN, index)
    }
}

/// Call accounting shared by a connector and every session it opened.
#[derive(Debug, Default)]
pub struct Counters {
    pub connects: AtomicUsize,
    pub gets: AtomicUsize,
    pub walks: AtomicUsize,
    pub closed: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Counters {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

pub struct MockConnector {
    pub device: Arc<MockDevice>,
    pub counters: Arc<Counters>,
}

impl MockConnector {
    pub fn new(device: MockDevice) -> Arc<Self> {
        Arc::new(Self {
            device: Arc::new(device),
            counters: Arc::new(Counters::default()),
        })
    }
}

#[async_trait]
impl DeviceConnector for MockConnector {
    async fn connect(&self, params: &SessionParams) -> Result<Box<dyn DeviceSession>> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        if self.device.panicking_hosts.contains(&params.host) {
            panic!("agent at {} crashed the decoder", params.host);
        }
        if self.device.hang_connect {
            std::future::pending::<()>().await;
        }
        if let Some(detail) = &self.device.connect_error {
            return Err(anyhow!("{}", detail.clone()));
        }
        Ok(Box::new(MockSession {
            device: Arc::clone(&self.device),
            counters: Arc::clone(&self.counters),
        }))
    }
}

pub struct MockSession {
    device: Arc<MockDevice>,
    counters: Arc<Counters>,
}

#[async_trait]
impl DeviceSession for MockSession {
    async fn get(&self, oids: &[String]) -> Result<Vec<ScalarValue>> {
        self.counters.gets.fetch_add(1, Ordering::SeqCst);
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = oids
            .iter()
            .filter_map(|oid| self.device.delays.get(oid))
            .max()
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);

        if oids.iter().any(|oid| self.device.panicking_oids.contains(oid)) {
            panic!("device sent a malformed packet");
        }
        if let Some(oid) = oids.iter().find(|oid| self.device.failing_oids.contains(*oid)) {
            return Err(anyhow!("request timed out ({})", oid));
        }

        Ok(oids
            .iter()
            .map(|oid| {
                self.device
                    .values
                    .get(oid)
                    .cloned()
                    .unwrap_or(ScalarValue::Absent)
            })
            .collect())
    }

    async fn walk(&self, root: &str) -> Result<Vec<(String, ScalarValue)>> {
        self.counters.walks.fetch_add(1, Ordering::SeqCst);
        if let Some(detail) = &self.device.walk_error {
            return Err(anyhow!("{}", detail.clone()));
        }
        Ok(self
            .device
            .walk_rows
            .iter()
            .filter(|(oid, _)| oid.starts_with(root))
            .cloned()
            .collect())
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn poller_settings(max_in_flight: usize) -> PollerSettings {
    PollerSettings {
        discovery: SessionTiming {
            timeout_ms: 500,
            retries: 0,
        },
        polling: SessionTiming {
            timeout_ms: 2000,
            retries: 2,
        },
        max_in_flight,
    }
}

pub fn collector(connector: &Arc<MockConnector>, max_in_flight: usize) -> SnmpCollector {
    let connector: Arc<dyn DeviceConnector> = connector.clone();
    SnmpCollector::new(connector, poller_settings(max_in_flight))
}

pub fn job(id: &str, class: JobClass) -> Job {
    Job {
        id: id.to_string(),
        class,
        host: "192.0.2.10".to_string(),
        credential: "public".to_string(),
        protocol_version: "2c".to_string(),
        port: 161,
    }
}
