//! Error taxonomy for the gateway.
//!
//! Every variant maps to a stable `code()` that downstream consumers match on;
//! the `Display` text is free-form detail and may change between releases.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// One or more required request fields are absent or empty
    #[error("missing or empty field(s): {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// The payload could not be parsed as a job request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unsupported job type: {0}")]
    UnsupportedJobType(String),

    #[error("unsupported plugin type: {0}")]
    UnsupportedPlugin(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    /// Another job with the same id is still in flight
    #[error("job id already in flight: {0}")]
    DuplicateJob(String),

    #[error("unsupported SNMP version: {0}")]
    UnsupportedVersion(String),

    /// Session could not be established; carries the library detail
    #[error("connection failed: {0}")]
    Connect(String),

    /// Whole-job scalar fetch failed
    #[error("scalar fetch failed: {0}")]
    ScalarFetch(String),

    /// Fetch for a single interface row failed (non-fatal for the job)
    #[error("interface {index} fetch failed: {detail}")]
    InterfaceFetch { index: u32, detail: String },

    #[error("system name not found")]
    NameNotFound,

    /// Value had an unexpected shape
    #[error("decode error: {0}")]
    Decode(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable error code written to the envelope `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MissingFields(_) => "missing field",
            GatewayError::InvalidRequest(_) => "invalid request",
            GatewayError::UnsupportedJobType(_) => "unsupported job type",
            GatewayError::UnsupportedPlugin(_) => "unsupported plugin type",
            GatewayError::InvalidPort(_) => "invalid port",
            GatewayError::DuplicateJob(_) => "duplicate job id",
            GatewayError::UnsupportedVersion(_) => "unsupported version",
            GatewayError::Connect(_) => "connection failed",
            GatewayError::ScalarFetch(_) => "fetch failed",
            GatewayError::InterfaceFetch { .. } => "interface fetch failed",
            GatewayError::NameNotFound => "name not found",
            GatewayError::Decode(_) => "decode error",
            GatewayError::Internal(_) => "internal error",
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
