//! Job dispatch: router, worker pools, reply correlation.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::collector::{PollerSettings, SnmpCollector};
use crate::config::AppConfig;
use crate::models::JobClass;
use crate::snmp::DeviceConnector;

pub mod pool;
pub mod replies;
pub mod router;

pub use pool::WorkerPool;
pub use replies::ReplyRegistry;
pub use router::{Dispatcher, QueueDepths, Submission};

/// The running engine: one router feeding one pool per job class.
pub struct Gateway {
    dispatcher: Arc<Dispatcher>,
    pools: Vec<WorkerPool>,
}

impl Gateway {
    /// Spawns the worker pools. Must run inside a tokio runtime.
    pub fn start(config: &AppConfig, connector: Arc<dyn DeviceConnector>) -> Self {
        let settings = &config.settings;
        let collector = Arc::new(SnmpCollector::new(connector, PollerSettings::from(settings)));
        let replies = Arc::new(ReplyRegistry::new());

        let (discovery_tx, discovery_rx) = mpsc::channel(settings.pools.discovery.queue_capacity);
        let (polling_tx, polling_rx) = mpsc::channel(settings.pools.polling.queue_capacity);

        let pools = vec![
            WorkerPool::spawn(
                JobClass::Discovery,
                settings.pools.discovery.workers,
                discovery_rx,
                Arc::clone(&collector),
                Arc::clone(&replies),
            ),
            WorkerPool::spawn(
                JobClass::Polling,
                settings.pools.polling.workers,
                polling_rx,
                collector,
                Arc::clone(&replies),
            ),
        ];
        for pool in &pools {
            info!(pool = %pool.class(), workers = pool.size(), "worker pool ready");
        }

        let dispatcher = Arc::new(Dispatcher::new(
            discovery_tx,
            polling_tx,
            replies,
            settings.default_port.0,
        ));

        Self { dispatcher, pools }
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Stops intake, lets queued and in-flight jobs finish, then joins the workers.
    pub async fn shutdown(self) {
        self.dispatcher.close();
        for pool in self.pools {
            let class = pool.class();
            pool.join().await;
            info!(pool = %class, "worker pool drained");
        }
    }
}
