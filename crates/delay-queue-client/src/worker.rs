//! Consume loop that dispatches popped jobs to registered handlers.
//!
//! A [`Worker`] runs on the caller's task. It pops one job at a time, hands
//! it to the [`JobHandler`](crate::JobHandler) registered under the job's
//! handler identifier, and acknowledges it with `finish` when the handler
//! succeeds. Jobs whose handler fails or is missing are left alone; the
//! server re-delivers them once their time-to-run expires.

use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::client::DelayQueueClient;
use crate::error::DelayQueueError;
use crate::job::{JobId, Topic};

/// Pause after a poll that found no job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Result of a single [`Worker::run_once`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOutcome {
    /// No job was ready.
    Idle,
    /// The handler succeeded and the job was finished.
    Finished { id: JobId, handler: String },
    /// No in-process handler is registered for the job.
    HandlerMissing { id: JobId, handler: String },
    /// The handler returned an error.
    Failed {
        id: JobId,
        handler: String,
        error: String,
    },
}

/// Counters collected by [`Worker::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub finished: u64,
    pub failed: u64,
    pub handler_missing: u64,
    pub idle_polls: u64,
    pub errors: u64,
}

/// Pops jobs from a fixed set of topics and runs their handlers.
#[derive(Debug, Clone)]
pub struct Worker {
    client: DelayQueueClient,
    topics: Vec<Topic>,
    poll_interval: Duration,
}

impl Worker {
    /// Create a worker. Handlers are taken from the client's registry.
    pub fn new(client: DelayQueueClient, topics: Vec<Topic>) -> Self {
        Self {
            client,
            topics,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Pop and process at most one job.
    ///
    /// # Errors
    ///
    /// Returns `DelayQueueError` if popping or finishing the job fails.
    /// Handler failures are reported through [`WorkOutcome::Failed`].
    pub async fn run_once(&self) -> Result<WorkOutcome, DelayQueueError> {
        let Some(job) = self.client.dequeue(&self.topics).await? else {
            return Ok(WorkOutcome::Idle);
        };

        let Some(handler) = self.client.registry().handler_for(&job.handler) else {
            warn!(
                job_id = %job.id,
                handler = %job.handler,
                "No handler registered for job; leaving it for redelivery"
            );
            return Ok(WorkOutcome::HandlerMissing {
                id: job.id,
                handler: job.handler,
            });
        };

        if let Err(e) = handler.perform(&job).await {
            warn!(
                job_id = %job.id,
                handler = %job.handler,
                error = %e,
                "Job handler failed; leaving job for redelivery"
            );
            return Ok(WorkOutcome::Failed {
                id: job.id,
                handler: job.handler,
                error: e.message,
            });
        }

        self.client.finish(&job.id).await?;
        info!(job_id = %job.id, handler = %job.handler, "Job processed");

        Ok(WorkOutcome::Finished {
            id: job.id,
            handler: job.handler,
        })
    }

    /// Process jobs until `shutdown` turns `true` or its sender is dropped.
    ///
    /// The worker pauses for the poll interval after an idle poll or a client
    /// error and otherwise polls again immediately.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> WorkerStats {
        let mut stats = WorkerStats::default();
        info!(
            topics = ?self.topics.iter().map(Topic::as_str).collect::<Vec<_>>(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Worker started"
        );

        // `has_changed` errors once the sender is gone, even while jobs keep
        // the loop from reaching the pause below
        while !*shutdown.borrow() && shutdown.has_changed().is_ok() {
            let pause = match self.run_once().await {
                Ok(WorkOutcome::Idle) => {
                    stats.idle_polls += 1;
                    true
                }
                Ok(WorkOutcome::Finished { .. }) => {
                    stats.finished += 1;
                    false
                }
                Ok(WorkOutcome::HandlerMissing { .. }) => {
                    stats.handler_missing += 1;
                    false
                }
                Ok(WorkOutcome::Failed { .. }) => {
                    stats.failed += 1;
                    false
                }
                Err(e) => {
                    stats.errors += 1;
                    error!(error = %e, "Delay queue poll failed");
                    true
                }
            };

            if pause {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        info!(
            finished = stats.finished,
            failed = stats.failed,
            handler_missing = stats.handler_missing,
            errors = stats.errors,
            "Worker stopped"
        );
        stats
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
