//! # Eval Orchestrator
//!
//! A scheduling and aggregation engine for multi-dimension AI response
//! evaluation. Records (prompt/response pairs) are submitted in batches;
//! each one is scored independently along five quality dimensions by
//! worker pools outside this crate, and the results are aggregated into
//! a single weighted evaluation.
//!
//! ## Architecture
//!
//! - **Enqueue facade**: the only entry point — persists records and
//!   pushes tasks onto the main queue.
//! - **Dispatch loop**: pops tasks and fans each one out to five
//!   dimension queues under a concurrency cap.
//! - **Collector loop**: drains dimension results, accumulates them per
//!   task, and finalises once all five have arrived.
//! - **Sweeper**: fails tasks that have been in flight longer than the
//!   configured timeout.
//!
//! The broker (queue/hash/kv substrate) and store (records/evaluations)
//! are both trait boundaries; [`broker::InMemoryBroker`] and
//! [`store::InMemoryStore`] back every test in this crate, and
//! [`broker::RedisBroker`] is the production implementation.

/// Operator CLI: start/stop/status.
pub mod cli;
/// Runtime configuration, loaded from the environment.
pub mod config;
/// System-wide constants and queue/key naming.
pub mod constants;
/// Error types and handling.
pub mod error;
/// Core data models (Record, Task, DimensionResult, Evaluation, ...).
pub mod models;
/// The scheduling and aggregation engine: dispatch, collector, sweeper.
pub mod orchestrator;
/// Queue broker boundary and implementations.
pub mod broker;
/// Persistent store boundary and implementations.
pub mod store;

pub use error::{OrchestratorError, Result};
