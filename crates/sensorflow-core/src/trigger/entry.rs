use tokio_util::sync::CancellationToken;

use crate::plugin_system::adapter::{Bound, BoundSink, BoundWatcher};

/// One watcher bound to an ordered list of actions
#[derive(Debug)]
pub struct TriggerEntry {
    watch: Bound<dyn BoundWatcher>,
    actions: Vec<Bound<dyn BoundSink>>,
}

impl TriggerEntry {
    pub fn new(watch: Bound<dyn BoundWatcher>, actions: Vec<Bound<dyn BoundSink>>) -> Self {
        Self { watch, actions }
    }

    pub fn watch_plugin(&self) -> &str {
        self.watch.plugin()
    }

    /// Watch until cancelled, writing every event value to the actions in order.
    ///
    /// Watch failures other than cancellation are logged and the watch is
    /// retried straight away.
    pub async fn run(&mut self, cancel: &CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.watch.watch(cancel).await {
                Ok(value) => {
                    log::debug!("triggered {} from {}", value, self.watch.plugin());
                    self.fire(value).await;
                }
                Err(e) if e.is_cancelled() => break,
                Err(e) => {
                    log::error!("Watch on '{}' failed: {}", self.watch.plugin(), e);
                    // Keep an always-failing watcher from starving the runtime
                    tokio::task::yield_now().await;
                }
            }
        }
        log::debug!("Watcher '{}' stopped", self.watch.plugin());
    }

    async fn fire(&mut self, value: f64) {
        for action in self.actions.iter_mut() {
            if let Err(e) = action.write(value).await {
                log::error!(
                    "Failed to write {} from '{}' to '{}': {}",
                    value,
                    self.watch.plugin(),
                    action.plugin(),
                    e
                );
            }
        }
    }

    /// Close the watch context and every action context.
    pub async fn close(&mut self) {
        self.watch.close().await;
        for action in self.actions.iter_mut() {
            action.close().await;
        }
    }
}
