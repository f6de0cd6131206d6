//! The scheduling and aggregation engine.
//!
//! [`MasterOrchestrator`] owns the three long-running loops — dispatch,
//! collector, sweeper — and the shared state they coordinate through: the
//! broker, the store, the in-flight table, and the batch progress
//! projector. [`EnqueueFacade`] is the only way work enters the system;
//! everything else reacts to what it queued.

mod collector;
mod dispatch;
pub mod enqueue;
pub mod inflight;
pub mod progress;
mod sweeper;
pub mod weights;


pub use enqueue::{EnqueueFacade, RequeueOutcome};
pub use progress::BatchProgressProjector;

use crate::broker::QueueBroker;
use crate::config::SchedulingConfig;
use crate::models::Weights;
use crate::store::Store;
use inflight::InFlightTable;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct MasterOrchestrator {
    pub(crate) broker: Arc<dyn QueueBroker>,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) scheduling: SchedulingConfig,
    pub(crate) weights: Weights,
    pub(crate) inflight: Arc<InFlightTable>,
    pub(crate) progress: Arc<BatchProgressProjector>,
    shutting_down: Arc<AtomicBool>,
}

impl MasterOrchestrator {
    pub fn new(
        broker: Arc<dyn QueueBroker>,
        store: Arc<dyn Store>,
        scheduling: SchedulingConfig,
        weights: Weights,
    ) -> Self {
        let progress = Arc::new(BatchProgressProjector::new(broker.clone(), store.clone()));
        Self {
            broker,
            store,
            scheduling,
            weights,
            inflight: Arc::new(InFlightTable::new()),
            progress,
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn enqueue_facade(&self) -> EnqueueFacade {
        EnqueueFacade::new(
            self.broker.clone(),
            self.store.clone(),
            self.progress.clone(),
            self.scheduling.max_retries,
        )
    }

    pub fn progress(&self) -> Arc<BatchProgressProjector> {
        self.progress.clone()
    }

    /// Runs the dispatch, collector, and sweeper loops concurrently.
    /// None of them return under normal operation; this resolves only if
    /// one of them panics or returns an unrecoverable error, at which
    /// point the others are dropped along with it.
    pub async fn run(self: Arc<Self>) -> crate::Result<()> {
        info!("starting master orchestrator");

        let dispatch = {
            let orchestrator = self.clone();
            tokio::spawn(async move { orchestrator.dispatch_loop().await })
        };
        let collector = {
            let orchestrator = self.clone();
            tokio::spawn(async move { orchestrator.collector_loop().await })
        };
        let sweeper = { tokio::spawn(async move { self.sweeper_loop().await }) };

        tokio::select! {
            result = dispatch => report_loop_exit("dispatch", result),
            result = collector => report_loop_exit("collector", result),
            result = sweeper => report_loop_exit("sweeper", result),
        }

        Ok(())
    }

    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Relaxed)
    }

    /// Stops the dispatch loop from popping new work off the main queue
    /// and waits up to `self.scheduling.hard_shutdown_deadline` for
    /// in-flight tasks to finish. Tasks still in flight past the deadline
    /// are left for the sweeper to fail on its next pass.
    pub async fn shutdown(&self) {
        info!("graceful shutdown requested");
        self.shutting_down.store(true, Ordering::Relaxed);

        let deadline = tokio::time::Instant::now() + self.scheduling.hard_shutdown_deadline;
        while self.inflight.len().await > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        if self.inflight.len().await > 0 {
            warn!(
                remaining = self.inflight.len().await,
                "hard shutdown deadline reached with tasks still in flight"
            );
        }
    }
}

fn report_loop_exit(name: &str, result: Result<crate::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => info!(loop_name = name, "loop exited"),
        Ok(Err(e)) => warn!(loop_name = name, error = %e, "loop exited with error"),
        Err(e) => warn!(loop_name = name, error = %e, "loop panicked"),
    }
}
