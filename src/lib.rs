//! Telemetry-polling gateway.
//!
//! Jobs arrive as opaque payloads, are validated and queued per class by the
//! [`dispatch::Dispatcher`], executed by bounded worker pools, and answered
//! with one [`formatter::Envelope`] each, correlated by job id.

pub mod collector;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod snmp;

pub use dispatch::{Dispatcher, Gateway, Submission};
pub use error::{GatewayError, Result};
pub use formatter::{Envelope, JsonFormatter};
