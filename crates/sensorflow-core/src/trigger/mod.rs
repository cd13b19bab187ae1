//! # SensorFlow Trigger Dispatcher
//!
//! Runs one tokio task per [`TriggerEntry`]. Watchers are independent of each
//! other and of the scheduler; a slow or failing trigger never holds up
//! another. All of them share one cancellation token and are joined together
//! on shutdown.
pub mod entry;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::kernel::error::{Error, Result};

pub use entry::TriggerEntry;

/// Running watchers and the token that stops them
#[derive(Debug)]
pub struct TriggerDispatcher {
    cancel: CancellationToken,
    watchers: Vec<(String, JoinHandle<TriggerEntry>)>,
}

impl TriggerDispatcher {
    /// Spawn one watcher per entry
    pub fn start(entries: Vec<TriggerEntry>, cancel: CancellationToken) -> Self {
        let watchers = entries
            .into_iter()
            .map(|mut entry| {
                let name = entry.watch_plugin().to_string();
                let token = cancel.clone();
                let handle = tokio::spawn(async move {
                    entry.run(&token).await;
                    entry
                });
                (name, handle)
            })
            .collect::<Vec<_>>();
        if !watchers.is_empty() {
            log::info!("Trigger dispatcher started with {} watcher(s)", watchers.len());
        }
        Self { cancel, watchers }
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Cancel every watcher, wait for all of them, and close their contexts.
    ///
    /// Every watcher is joined even if one panicked; the first such failure is
    /// reported after all the others are closed.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        let mut first_error = None;
        for (name, handle) in self.watchers {
            match handle.await {
                Ok(mut entry) => entry.close().await,
                Err(e) => {
                    log::warn!(
                        "Watcher '{}' failed, its trigger contexts were not released: {}",
                        name,
                        e
                    );
                    first_error.get_or_insert(Error::Join {
                        worker: format!("trigger '{}'", name),
                        message: e.to_string(),
                    });
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
