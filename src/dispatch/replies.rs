use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::GatewayError;
use crate::formatter::Envelope;

/// Correlates envelopes with their waiting submitters by job id.
///
/// Workers finish in any order, so replies are routed by `jobId`, never by
/// arrival order.
#[derive(Debug, Default)]
pub struct ReplyRegistry {
    pending: DashMap<String, oneshot::Sender<Envelope>>,
}

impl ReplyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `job_id`. Fails while another job with the same id is in flight.
    pub fn register(&self, job_id: &str) -> Result<oneshot::Receiver<Envelope>, GatewayError> {
        match self.pending.entry(job_id.to_string()) {
            Entry::Occupied(_) => Err(GatewayError::DuplicateJob(job_id.to_string())),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(tx);
                Ok(rx)
            }
        }
    }

    /// Drops a reservation whose job never reached a queue.
    pub fn cancel(&self, job_id: &str) {
        self.pending.remove(job_id);
    }

    /// Hands the envelope to whoever submitted its job.
    pub fn deliver(&self, envelope: Envelope) {
        match self.pending.remove(&envelope.job_id) {
            Some((_, waiter)) => {
                if let Err(envelope) = waiter.send(envelope) {
                    warn!(job_id = %envelope.job_id, "submitter went away before the reply");
                }
            }
            None => warn!(job_id = %envelope.job_id, "no submitter waiting for reply"),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}
