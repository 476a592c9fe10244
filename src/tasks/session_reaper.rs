use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::editor::EditorManager;
use crate::metrics::ReaperMetrics;

/// Background task expiring idle editor sessions
pub struct SessionReaperTask {
    manager: Arc<EditorManager>,
    sweep_interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl SessionReaperTask {
    pub fn new(
        manager: Arc<EditorManager>,
        sweep_interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            manager,
            sweep_interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut timer = tokio::time::interval(self.sweep_interval);

        // Skip immediate first tick
        timer.tick().await;

        tracing::info!(
            sweep_interval_secs = self.sweep_interval.as_secs(),
            session_timeout_secs = self.manager.session_timeout().as_secs(),
            "Session reaper started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Session reaper received shutdown signal");
                    break;
                }
                _ = timer.tick() => {
                    self.sweep();
                }
            }
        }

        tracing::info!("Session reaper stopped");
    }

    fn sweep(&self) {
        let start = Instant::now();
        let result = self.manager.expire_idle();
        ReaperMetrics::record_duration_ms(start.elapsed().as_secs_f64() * 1000.0);

        if result.expired > 0 || result.tombstones_evicted > 0 {
            tracing::info!(
                expired = result.expired,
                tombstones_evicted = result.tombstones_evicted,
                active = self.manager.active_sessions(),
                "Session reaper sweep completed"
            );
        }
    }
}
