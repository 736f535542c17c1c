use crate::infrastructure::cache::CodeCache;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Owns the periodic sweep task; the task stops when the handle is dropped.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn spawn_sweeper<C>(cache: C, every: Duration) -> SweeperHandle
where
    C: CodeCache + 'static,
{
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match cache.sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "swept expired verification codes"),
                Err(e) => warn!(error = %e, "verification code sweep failed"),
            }
        }
    });
    SweeperHandle { task }
}
