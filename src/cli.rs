//! Operator CLI surface: `start`, `stop`, `status`.

use crate::broker::QueueBroker;
use crate::constants::{dimension_queue_name, MAIN_QUEUE, RESULTS_QUEUE};
use crate::models::ALL_DIMENSIONS;
use crate::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "eval-orchestrator", about = "AI response evaluation scheduling engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to the broker and store, and start the dispatch/collector/sweeper loops.
    Start,
    /// Initiate graceful shutdown of a running orchestrator.
    Stop,
    /// Print per-queue lengths and in-flight count.
    Status,
}

/// Snapshot printed by `status`. Built without consulting the in-flight
/// table — it scans `task:*:results` keys in the broker instead, so the
/// count stays meaningful even against a freshly started process that
/// lost its in-memory table on restart.
pub async fn print_status(broker: Arc<dyn QueueBroker>) -> Result<()> {
    let main_queue_len = broker.length(MAIN_QUEUE).await?;
    let results_queue_len = broker.length(RESULTS_QUEUE).await?;

    println!("main queue:    {main_queue_len}");
    println!("results queue: {results_queue_len}");

    for dimension in ALL_DIMENSIONS {
        let len = broker.length(&dimension_queue_name(dimension)).await?;
        println!("{:<14} {len}", format!("{dimension} queue:"));
    }

    let inflight_keys = broker.scan_keys("task:*:results").await?;
    println!("in-flight (approx, by partial-result hash): {}", inflight_keys.len());

    let live_workers = broker.scan_keys("worker:*:status").await?;
    println!("workers reporting liveness: {}", live_workers.len());

    Ok(())
}
