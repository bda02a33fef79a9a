//! # Delay Queue Client
//!
//! Client library for a delay queue service reachable over HTTP/JSON.
//!
//! This crate provides:
//! - [`DelayQueueClient`] to push, pop, finish and delete jobs
//! - [`HandlerRegistry`] to validate handler identifiers before a job is sent
//! - [`Worker`] to dispatch popped jobs to in-process [`JobHandler`]s
//!
//! The queue engine itself (storage, expiry, re-delivery) lives in the
//! server; this crate performs no retries and keeps no local buffer.
//!
//! # Examples
//!
//! ```rust,no_run
//! use delay_queue_client::{DelayQueueClient, HandlerName, HandlerRegistry, Job, Topic};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = HandlerRegistry::new();
//! registry.register_name(HandlerName::new("CloseUnpaidOrder")?);
//!
//! let client = DelayQueueClient::new("http://127.0.0.1:9277", Arc::new(registry))?;
//!
//! let job = Job::new(Topic::new("order")?)
//!     .with_delay(Duration::from_secs(15 * 60))
//!     .with_value("order_id", 1001);
//! client.enqueue("CloseUnpaidOrder", &job).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod handler;
pub mod job;
pub mod worker;

pub use client::{
    ClientConfig, ClientConfigBuilder, DelayQueueClient, DelayQueueClientBuilder, DEFAULT_TIMEOUT,
};
pub use error::{DelayQueueError, ValidationError};
pub use handler::{
    Capability, HandlerDescriptor, HandlerError, HandlerName, HandlerRegistry, JobHandler,
};
pub use job::{Job, JobBody, JobId, PoppedJob, Topic, DEFAULT_TTR, HANDLER_KEY};
pub use worker::{WorkOutcome, Worker, WorkerStats, DEFAULT_POLL_INTERVAL};
