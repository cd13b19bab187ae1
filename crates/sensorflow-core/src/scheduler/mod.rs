//! # SensorFlow Scheduler
//!
//! A single cooperative loop that runs every due [`ConnectionTask`] in wired
//! order, then sleeps until the earliest next due time or until cancelled.
//!
//! Tasks never run concurrently with each other. A task that overruns its
//! interval is found due again on the next pass and fires back-to-back until
//! it has caught up. Missed runs are never skipped.
pub mod task;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub use task::ConnectionTask;

/// Owns the connection tasks while they run
#[derive(Debug)]
pub struct Scheduler {
    tasks: Vec<ConnectionTask>,
}

impl Scheduler {
    pub fn new(tasks: Vec<ConnectionTask>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every due task once and return how long to wait before the next pass.
    ///
    /// `None` means there is nothing to schedule: no tasks, or all of them parked.
    pub async fn run_pass(&mut self, now: Instant) -> Option<Duration> {
        let mut wait: Option<Duration> = None;
        for task in self.tasks.iter_mut() {
            if task.is_due(now) {
                task.run().await;
            }
            if let Some(remaining) = task.remaining(now) {
                wait = Some(wait.map_or(remaining, |w| w.min(remaining)));
            }
        }
        wait
    }

    /// Loop until `cancel` fires, then hand the tasks back for closing.
    pub async fn run(mut self, cancel: CancellationToken) -> Vec<ConnectionTask> {
        log::info!("Scheduler started with {} connection(s)", self.tasks.len());
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let wait = self.run_pass(Instant::now()).await;
            match wait {
                Some(wait) => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
                None => {
                    cancel.cancelled().await;
                    break;
                }
            }
        }
        log::info!("Scheduler stopped");
        self.tasks
    }

    /// Spawn [`run`](Scheduler::run) on the tokio runtime
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Vec<ConnectionTask>> {
        tokio::spawn(self.run(cancel))
    }
}
