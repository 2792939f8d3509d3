//! Fixed-size worker pools over bounded job queues.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::collector::SnmpCollector;
use crate::error::GatewayError;
use crate::formatter::{Envelope, ResponseData};
use crate::models::{Job, JobClass};

use super::replies::ReplyRegistry;

/// Workers of one job class sharing one queue.
pub struct WorkerPool {
    class: JobClass,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers` consumers. They exit once the queue is closed and drained.
    pub fn spawn(
        class: JobClass,
        workers: usize,
        queue: mpsc::Receiver<Job>,
        collector: Arc<SnmpCollector>,
        replies: Arc<ReplyRegistry>,
    ) -> Self {
        let queue = Arc::new(Mutex::new(queue));
        let handles = (1..=workers)
            .map(|worker| {
                let queue = Arc::clone(&queue);
                let collector = Arc::clone(&collector);
                let replies = Arc::clone(&replies);
                tokio::spawn(async move {
                    run_worker(class, worker, queue, collector, replies).await;
                })
            })
            .collect();

        Self { class, handles }
    }

    pub fn class(&self) -> JobClass {
        self.class
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for every worker to finish.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(pool = %self.class, error = %e, "worker task ended abnormally");
            }
        }
    }
}

async fn run_worker(
    class: JobClass,
    worker: usize,
    queue: Arc<Mutex<mpsc::Receiver<Job>>>,
    collector: Arc<SnmpCollector>,
    replies: Arc<ReplyRegistry>,
) {
    info!(pool = %class, worker, "worker started");

    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        let started = Instant::now();
        let envelope = execute(&collector, &job).await;
        info!(
            pool = %class,
            worker,
            job_id = %job.id,
            host = %job.host,
            success = envelope.is_success(),
            elapsed_ms = whole_millis(started.elapsed()),
            "job finished"
        );
        replies.deliver(envelope);
    }

    info!(pool = %class, worker, "worker stopped");
}

/// Runs the job's pipeline; any failure, panics included, becomes a fail envelope.
pub async fn execute(collector: &SnmpCollector, job: &Job) -> Envelope {
    let pipeline = async {
        match job.class {
            JobClass::Discovery => collector.discover(job).await.map(ResponseData::Discovery),
            JobClass::Polling => collector.poll(job).await.map(ResponseData::Polling),
        }
    };

    match AssertUnwindSafe(pipeline).catch_unwind().await {
        Ok(result) => Envelope::from_result(job.id.clone(), result),
        Err(panic) => {
            let detail = panic_message(panic.as_ref());
            error!(job_id = %job.id, panic = %detail, "pipeline panicked");
            Envelope::failure(job.id.clone(), &GatewayError::Internal(detail))
        }
    }
}

/// Saturating millisecond count for log fields.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "pipeline panicked".to_string()
    }
}
