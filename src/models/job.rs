use std::fmt;

use serde::Deserialize;

use crate::error::GatewayError;

/// Literal token of a liveness probe; its reply is [`HEALTH_REPLY`].
pub const HEALTH_CHECK: &str = "health_check";
pub const HEALTH_REPLY: &str = "ok";

/// The only device protocol this gateway speaks.
pub const PLUGIN_TYPE: &str = "snmp";

/// Job classes that are queued and executed by a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobClass {
    Discovery,
    Polling,
}

impl JobClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobClass::Discovery => "discovery",
            JobClass::Polling => "polling",
        }
    }
}

impl fmt::Display for JobClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated job. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub class: JobClass,
    pub host: String,
    pub credential: String,
    pub protocol_version: String,
    pub port: u16,
}

impl Job {
    /// Required fields that are empty. Pipelines re-check this before any I/O.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("jobId", &self.id),
            ("host", &self.host),
            ("credential", &self.credential),
            ("protocolVersion", &self.protocol_version),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

/// Text that may arrive as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Text(String),
    Integer(i64),
}

impl Loose {
    fn into_text(self) -> String {
        match self {
            Loose::Text(s) => s,
            Loose::Integer(n) => n.to_string(),
        }
    }
}

/// Request as parsed from the wire, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub job_id: Option<Loose>,
    pub job_type: Option<String>,
    pub plugin_type: Option<String>,
    pub host: Option<String>,
    pub credential: Option<String>,
    pub protocol_version: Option<Loose>,
    pub port: Option<Loose>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl JobRequest {
    pub fn is_health_check(&self) -> bool {
        self.job_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(HEALTH_CHECK))
    }

    /// Job id as far as it can be recovered, for correlating failures.
    pub fn job_id(&self) -> String {
        self.job_id
            .clone()
            .map(Loose::into_text)
            .unwrap_or_default()
    }

    /// Validates once at the boundary and produces a typed job.
    pub fn into_job(self, default_port: u16) -> Result<Job, GatewayError> {
        let id = present(self.job_id.map(Loose::into_text));
        let job_type = present(self.job_type);
        let host = present(self.host);
        let credential = present(self.credential);
        let protocol_version = present(self.protocol_version.map(Loose::into_text));

        let missing: Vec<String> = [
            ("jobId", id.is_none()),
            ("jobType", job_type.is_none()),
            ("host", host.is_none()),
            ("credential", credential.is_none()),
            ("protocolVersion", protocol_version.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name.to_string())
        .collect();

        let (Some(id), Some(job_type), Some(host), Some(credential), Some(protocol_version)) =
            (id, job_type, host, credential, protocol_version)
        else {
            return Err(GatewayError::MissingFields(missing));
        };

        if let Some(plugin) = present(self.plugin_type) {
            if !plugin.eq_ignore_ascii_case(PLUGIN_TYPE) {
                return Err(GatewayError::UnsupportedPlugin(plugin));
            }
        }

        let class = match job_type.to_ascii_lowercase().as_str() {
            "discovery" => JobClass::Discovery,
            "polling" => JobClass::Polling,
            _ => return Err(GatewayError::UnsupportedJobType(job_type)),
        };

        let port = match self.port {
            None => default_port,
            Some(raw) => parse_port(raw)?,
        };

        Ok(Job {
            id,
            class,
            host,
            credential,
            protocol_version,
            port,
        })
    }
}

fn parse_port(raw: Loose) -> Result<u16, GatewayError> {
    let text = raw.into_text();
    match text.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(GatewayError::InvalidPort(text)),
    }
}
