//! Request router: classify, validate, enqueue, correlate.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::formatter::{Envelope, JsonFormatter};
use crate::models::{HEALTH_CHECK, HEALTH_REPLY, Job, JobClass, JobRequest};

use super::replies::ReplyRegistry;

/// What the router did with a payload.
#[derive(Debug)]
pub enum Submission {
    /// Answered without touching a queue (health probes, rejected requests)
    Immediate(String),
    /// Enqueued; the envelope arrives on `reply`
    Pending {
        job_id: String,
        reply: oneshot::Receiver<Envelope>,
    },
}

#[derive(Debug, Clone)]
struct Queues {
    discovery: mpsc::Sender<Job>,
    polling: mpsc::Sender<Job>,
}

impl Queues {
    fn for_class(&self, class: JobClass) -> &mpsc::Sender<Job> {
        match class {
            JobClass::Discovery => &self.discovery,
            JobClass::Polling => &self.polling,
        }
    }
}

/// Queue occupancy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueDepths {
    pub discovery: usize,
    pub polling: usize,
    pub in_flight: usize,
}

pub struct Dispatcher {
    queues: RwLock<Option<Queues>>,
    replies: Arc<ReplyRegistry>,
    default_port: u16,
}

impl Dispatcher {
    pub fn new(
        discovery: mpsc::Sender<Job>,
        polling: mpsc::Sender<Job>,
        replies: Arc<ReplyRegistry>,
        default_port: u16,
    ) -> Self {
        Self {
            queues: RwLock::new(Some(Queues { discovery, polling })),
            replies,
            default_port,
        }
    }

    /// Routes one opaque payload.
    ///
    /// Health probes return before any parsing so their latency does not depend
    /// on queue depth. When a queue is full this waits for room rather than
    /// dropping the job. Dropping the returned future while it waits is safe.
    pub async fn submit(&self, payload: &str) -> Submission {
        let payload = payload.trim();
        if payload == HEALTH_CHECK {
            return Submission::Immediate(HEALTH_REPLY.to_string());
        }

        let request: JobRequest = match serde_json::from_str(payload) {
            Ok(request) => request,
            Err(e) => {
                return reject(String::new(), GatewayError::InvalidRequest(e.to_string()));
            }
        };
        if request.is_health_check() {
            return Submission::Immediate(HEALTH_REPLY.to_string());
        }

        let fallback_id = request.job_id();
        let job = match request.into_job(self.default_port) {
            Ok(job) => job,
            Err(e) => return reject(fallback_id, e),
        };

        let Some(queue) = self.queue_for(job.class) else {
            return reject(
                job.id,
                GatewayError::Internal("gateway is shutting down".to_string()),
            );
        };

        let class = job.class;
        // Waiting for room happens before the id is registered, so a caller that
        // gives up here leaves nothing behind in the reply registry.
        let Ok(permit) = queue.reserve().await else {
            return reject(
                job.id,
                GatewayError::Internal(format!("{} queue is closed", class)),
            );
        };

        let reply = match self.replies.register(&job.id) {
            Ok(reply) => reply,
            Err(e) => return reject(job.id, e),
        };

        let job_id = job.id.clone();
        permit.send(job);

        debug!(job_id = %job_id, class = %class, "job enqueued");
        Submission::Pending { job_id, reply }
    }

    /// Routes a payload and waits for its reply payload.
    pub async fn handle(&self, payload: &str) -> String {
        match self.submit(payload).await {
            Submission::Immediate(reply) => reply,
            Submission::Pending { job_id, reply } => match reply.await {
                Ok(envelope) => JsonFormatter::to_json_string(&envelope),
                Err(_) => {
                    warn!(job_id = %job_id, "job dropped without a reply");
                    JsonFormatter::to_json_string(&Envelope::failure(
                        job_id,
                        &GatewayError::Internal("job dropped without a reply".to_string()),
                    ))
                }
            },
        }
    }

    /// Stops accepting jobs. Queued jobs still drain.
    pub fn close(&self) {
        let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
        queues.take();
    }

    pub fn is_accepting(&self) -> bool {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn depths(&self) -> QueueDepths {
        let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
        let depth = |tx: &mpsc::Sender<Job>| tx.max_capacity() - tx.capacity();
        QueueDepths {
            discovery: queues.as_ref().map(|q| depth(&q.discovery)).unwrap_or(0),
            polling: queues.as_ref().map(|q| depth(&q.polling)).unwrap_or(0),
            in_flight: self.replies.in_flight(),
        }
    }

    fn queue_for(&self, class: JobClass) -> Option<mpsc::Sender<Job>> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|q| q.for_class(class).clone())
    }
}

fn reject(job_id: String, err: GatewayError) -> Submission {
    debug!(job_id = %job_id, error = %err, "request rejected");
    Submission::Immediate(JsonFormatter::to_json_string(&Envelope::failure(job_id, &err)))
}
