//! Cancellable delayed work owned by the host process.
//!
//! Transient messages (pre-intake reminders and similar) are deleted a
//! while after sending. Instead of fire-and-forget timers, the host owns a
//! single queue it can join or deliberately abandon at shutdown, so pending
//! timers never leak.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Default)]
pub struct DelayQueue {
    tasks: Mutex<JoinSet<()>>,
}

impl DelayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` after `delay`. The future must tolerate never running
    /// (shutdown may abandon it).
    pub async fn run_after<F>(&self, delay: Duration, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.lock().await.spawn(async move {
            tokio::time::sleep(delay).await;
            fut.await;
        });
    }

    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Wait for every pending timer to fire and its work to finish.
    pub async fn drain(&self) {
        let mut tasks = self.tasks.lock().await;
        while tasks.join_next().await.is_some() {}
        debug!("Delay queue drained");
    }

    /// Drop every pending timer without running it.
    pub async fn abandon_all(&self) {
        let mut tasks = self.tasks.lock().await;
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        debug!("Delay queue abandoned");
    }
}
