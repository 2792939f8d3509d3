//! Device polling pipelines.
//!
//! A pipeline owns one [`DeviceSession`] for the duration of a job. The
//! session is a local value, so it is dropped (and its socket released) on
//! every exit path, including early returns via `?`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{SessionTiming, Settings};
use crate::error::{GatewayError, Result};
use crate::models::{Job, JobClass};
use crate::snmp::oid::{FIELD_DESCRIPTION, FIELD_LOCATION, FIELD_OBJECT_ID, FIELD_REPORTED_INTERFACES, FIELD_SYSTEM_NAME, FIELD_UPTIME};
use crate::snmp::{DeviceConnector, DeviceSession, ProtocolVersion, SYSTEM_OIDS, SessionParams};

pub mod device_info;
pub mod scalar_collector;
pub mod table_collector;
pub mod types;

pub use device_info::DeviceInfo;
pub use scalar_collector::{ScalarCollector, SystemScalars, format_mac, format_uptime};
pub use table_collector::{InterfaceTable, TableCollector};
pub use types::{
    DiscoveryResult, EnumerationFailure, FieldValue, InterfaceFailure, InterfaceRecord, PollResult,
};

/// Timing and fan-out knobs for the pipelines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerSettings {
    pub discovery: SessionTiming,
    pub polling: SessionTiming,
    pub max_in_flight: usize,
}

impl From<&Settings> for PollerSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            discovery: settings.sessions.discovery,
            polling: settings.sessions.polling,
            max_in_flight: settings.interfaces.max_in_flight,
        }
    }
}

/// Runs discovery and polling jobs against devices.
pub struct SnmpCollector {
    connector: Arc<dyn DeviceConnector>,
    settings: PollerSettings,
}

impl SnmpCollector {
    pub fn new(connector: Arc<dyn DeviceConnector>, settings: PollerSettings) -> Self {
        Self {
            connector,
            settings,
        }
    }

    /// Checks preconditions and builds session parameters. No network I/O.
    pub fn session_params(&self, job: &Job) -> Result<SessionParams> {
        let missing = job.missing_fields();
        if !missing.is_empty() {
            return Err(GatewayError::MissingFields(missing));
        }

        let version = ProtocolVersion::parse(&job.protocol_version)?;
        let timing = match job.class {
            JobClass::Discovery => self.settings.discovery,
            JobClass::Polling => self.settings.polling,
        };

        Ok(SessionParams {
            host: job.host.clone(),
            port: job.port,
            credential: job.credential.clone(),
            version,
            timeout: timing.timeout(),
            retries: timing.retries,
        })
    }

    async fn open_session(&self, job: &Job) -> Result<Box<dyn DeviceSession>> {
        let params = self.session_params(job)?;
        self.connector.connect(&params).await.map_err(|e| {
            let detail = format!("{:#}", e);
            warn!(job_id = %job.id, target = %params.address(), error = %detail, "connect failed");
            GatewayError::Connect(detail)
        })
    }

    /// Discovery pipeline: device name only.
    pub async fn discover(&self, job: &Job) -> Result<DiscoveryResult> {
        let session = self.open_session(job).await?;
        DeviceInfo::get_system_name(session.as_ref()).await
    }

    /// Polling pipeline: system scalars, interface enumeration, interface rows.
    pub async fn poll(&self, job: &Job) -> Result<PollResult> {
        let session = self.open_session(job).await?;
        let session = session.as_ref();

        let system = ScalarCollector::collect_system(session, &SYSTEM_OIDS).await?;
        let uptime = scalar_collector::decode_uptime(system.raw(FIELD_UPTIME))?;

        let (table, interfaces_error) = match TableCollector::enumerate_indices(session).await {
            Ok(indices) => {
                let table = TableCollector::collect_interfaces(
                    session,
                    &indices,
                    self.settings.max_in_flight,
                )
                .await;
                (table, None)
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "interface enumeration failed");
                let failure = EnumerationFailure {
                    error: e.code(),
                    details: e.to_string(),
                };
                (InterfaceTable::default(), Some(failure))
            }
        };

        let interface_count = table.records.len() + table.failures.len();
        debug!(
            job_id = %job.id,
            interfaces = interface_count,
            failed = table.failures.len(),
            "poll collected"
        );

        Ok(PollResult {
            system_name: system.decoded(FIELD_SYSTEM_NAME),
            description: system.decoded(FIELD_DESCRIPTION),
            location: system.decoded(FIELD_LOCATION),
            object_id: system.decoded(FIELD_OBJECT_ID),
            uptime,
            reported_interface_count: system.decoded(FIELD_REPORTED_INTERFACES),
            interface_count,
            interfaces: table.records,
            interface_errors: table.failures,
            interfaces_error,
        })
    }
}
