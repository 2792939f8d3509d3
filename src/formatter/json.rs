use serde::Serialize;
use tracing::error;

use crate::collector::{DiscoveryResult, PollResult};
use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// Payload of a successful job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Discovery(DiscoveryResult),
    Polling(PollResult),
}

/// Reply paired with a job. `data` is set only on success, `error`/`details` only on fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub job_id: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Envelope {
    pub fn success(job_id: impl Into<String>, data: ResponseData) -> Self {
        Self {
            job_id: job_id.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn failure(job_id: impl Into<String>, err: &GatewayError) -> Self {
        Self {
            job_id: job_id.into(),
            status: Status::Fail,
            data: None,
            error: Some(err.code()),
            details: Some(err.to_string()),
        }
    }

    pub fn from_result(
        job_id: impl Into<String>,
        result: Result<ResponseData, GatewayError>,
    ) -> Self {
        match result {
            Ok(data) => Self::success(job_id, data),
            Err(e) => Self::failure(job_id, &e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Serializes envelopes to the wire schema.
pub struct JsonFormatter;

impl JsonFormatter {
    /// Compact JSON. Never fails: a serialization fault degrades to a fail envelope.
    pub fn to_json_string(envelope: &Envelope) -> String {
        match serde_json::to_string(envelope) {
            Ok(json) => json,
            Err(e) => {
                error!(job_id = %envelope.job_id, error = %e, "envelope serialization failed");
                let fallback = Envelope::failure(
                    envelope.job_id.clone(),
                    &GatewayError::Internal(format!("serialization failed: {}", e)),
                );
                serde_json::to_string(&fallback).unwrap_or_else(|_| {
                    serde_json::json!({
                        "jobId": envelope.job_id,
                        "status": "fail",
                        "error": "internal error",
                    })
                    .to_string()
                })
            }
        }
    }
}
