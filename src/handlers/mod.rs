use std::sync::Arc;

use crate::dispatch::Dispatcher;

pub mod health;
pub mod jobs;

pub use health::health;
pub use jobs::submit_job;

/// Shared state of the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}
