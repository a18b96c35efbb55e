use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::model::UserId;
use crate::registry::TaskRegistry;

/// Shared handle to the live registry. The scheduler re-reads it on every
/// tick, so tasks started after the scheduler keep accruing time.
pub type SharedRegistry = Arc<Mutex<TaskRegistry>>;

/// Fixed-rate driver for elapsed-time accounting. Ticks are purely local;
/// accrued seconds only reach the backend on the next explicit sync.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    handle: Option<JoinHandle<()>>,
}

impl TimerScheduler {
    pub const TICK_PERIOD: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns the 1 Hz tick task. A previous run is torn down first.
    pub fn start(&mut self, registry: SharedRegistry, owner: UserId) {
        self.stop();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Self::TICK_PERIOD);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                registry.lock().expect("registry lock poisoned").tick(owner);
            }
        });

        self.handle = Some(handle);
        tracing::debug!("timer scheduler started for user {}", owner);
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("timer scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
