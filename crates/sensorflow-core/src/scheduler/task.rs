use std::time::Duration;

use tokio::time::Instant;

use crate::plugin_system::adapter::{Bound, BoundSink, BoundSource};

/// One source bound to an interval and an ordered list of outputs
#[derive(Debug)]
pub struct ConnectionTask {
    interval: Duration,
    next_run: Instant,
    input: Bound<dyn BoundSource>,
    outputs: Vec<Bound<dyn BoundSink>>,
    /// Set once `next_run` can no longer advance; a parked task never runs again
    parked: bool,
}

impl ConnectionTask {
    /// A new task is due immediately.
    pub fn new(
        interval: Duration,
        input: Bound<dyn BoundSource>,
        outputs: Vec<Bound<dyn BoundSink>>,
    ) -> Self {
        Self::starting_at(Instant::now(), interval, input, outputs)
    }

    pub fn starting_at(
        next_run: Instant,
        interval: Duration,
        input: Bound<dyn BoundSource>,
        outputs: Vec<Bound<dyn BoundSink>>,
    ) -> Self {
        Self {
            interval,
            next_run,
            input,
            outputs,
            parked: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_run(&self) -> Instant {
        self.next_run
    }

    pub fn input_plugin(&self) -> &str {
        self.input.plugin()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_parked(&self) -> bool {
        self.parked
    }

    pub fn is_due(&self, now: Instant) -> bool {
        !self.parked && self.next_run <= now
    }

    /// Time left until the task is due, zero if overdue, `None` once parked
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if self.parked {
            return None;
        }
        Some(self.next_run.saturating_duration_since(now))
    }

    /// Read once and fan the value out, then advance `next_run` by exactly one
    /// interval. Failures are logged, never returned.
    ///
    /// If the next due time is past what the clock can represent the task is
    /// parked: its contexts stay open for closing but it is never due again.
    pub async fn run(&mut self) {
        match self.input.read().await {
            Ok(value) => {
                log::debug!("read {} from {}", value, self.input.plugin());
                for output in self.outputs.iter_mut() {
                    if let Err(e) = output.write(value).await {
                        log::error!(
                            "Failed to write {} from '{}' to '{}': {}",
                            value,
                            self.input.plugin(),
                            output.plugin(),
                            e
                        );
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to read from '{}': {}", self.input.plugin(), e);
            }
        }
        match self.next_run.checked_add(self.interval) {
            Some(next_run) => self.next_run = next_run,
            None => {
                log::error!(
                    "Interval {:?} for connection from '{}' overflows the clock, parking it",
                    self.interval,
                    self.input.plugin()
                );
                self.parked = true;
            }
        }
    }

    /// Close the input and every output context.
    pub async fn close(&mut self) {
        self.input.close().await;
        for output in self.outputs.iter_mut() {
            output.close().await;
        }
    }
}
