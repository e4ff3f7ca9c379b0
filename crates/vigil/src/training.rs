//! Simulated training job
//!
//! Explicitly not real ML: one background task advances an epoch counter
//! on a fixed delay and synthesizes decaying-loss / rising-accuracy
//! numbers around a deterministic trend. At most one job runs
//! process-wide; stopping is cooperative via a cancellation token, so an
//! epoch advance is never interrupted halfway.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::TrainingError;

/// Simulated epoch duration in the real server.
const DEFAULT_EPOCH_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_KIND: &str = "detection";
const DEFAULT_EPOCHS: u32 = 10;

/// Snapshot of the job state, serialized as-is by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingStatus {
    pub is_training: bool,
    pub progress: u32,
    pub epoch: u32,
    pub total_epochs: u32,
    pub loss: f64,
    pub accuracy: f64,
    pub message: String,
}

impl Default for TrainingStatus {
    fn default() -> Self {
        Self {
            is_training: false,
            progress: 0,
            epoch: 0,
            total_epochs: 0,
            loss: 0.0,
            accuracy: 0.0,
            message: "Not started".into(),
        }
    }
}

struct TrainingInner {
    status: Mutex<TrainingStatus>,
    /// Cancellation token of the running job, if any. The async mutex
    /// serializes start/stop so two starts cannot both win.
    active: AsyncMutex<Option<CancellationToken>>,
    epoch_delay: Duration,
}

impl TrainingInner {
    fn status_mut(&self) -> MutexGuard<'_, TrainingStatus> {
        // Status writes are whole-field updates; recover from poisoning.
        match self.status.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Handle to the process-wide training simulator. Clones share state.
#[derive(Clone)]
pub struct TrainingManager {
    inner: Arc<TrainingInner>,
}

impl TrainingManager {
    pub fn new() -> Self {
        Self::with_epoch_delay(DEFAULT_EPOCH_DELAY)
    }

    /// Same simulator with a custom epoch delay (tests use milliseconds).
    pub fn with_epoch_delay(epoch_delay: Duration) -> Self {
        Self {
            inner: Arc::new(TrainingInner {
                status: Mutex::new(TrainingStatus::default()),
                active: AsyncMutex::new(None),
                epoch_delay,
            }),
        }
    }

    /// Start a job. Rejected while one is running; the running job's
    /// progress is untouched by a rejected start.
    pub async fn start(&self, kind: Option<&str>, epochs: Option<u32>) -> Result<(), TrainingError> {
        let mut active = self.inner.active.lock().await;
        if self.inner.status_mut().is_training {
            return Err(TrainingError::AlreadyRunning);
        }

        let kind = kind.unwrap_or(DEFAULT_KIND).to_string();
        let epochs = epochs.unwrap_or(DEFAULT_EPOCHS).max(1);

        *self.inner.status_mut() = TrainingStatus {
            is_training: true,
            total_epochs: epochs,
            message: "Starting training...".into(),
            ..TrainingStatus::default()
        };

        let cancel = CancellationToken::new();
        *active = Some(cancel.clone());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_job(inner, kind, epochs, cancel));
        Ok(())
    }

    /// Signal the running job to stop at its current epoch boundary.
    /// No-op when idle.
    pub async fn stop(&self) {
        let mut active = self.inner.active.lock().await;
        if let Some(cancel) = active.take() {
            cancel.cancel();
        }
    }

    pub fn status(&self) -> TrainingStatus {
        self.inner.status_mut().clone()
    }
}

impl Default for TrainingManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_job(inner: Arc<TrainingInner>, kind: String, epochs: u32, cancel: CancellationToken) {
    info!(kind = %kind, epochs, "training job started");
    let mut stopped = false;

    for epoch in 1..=epochs {
        tokio::select! {
            _ = cancel.cancelled() => {
                stopped = true;
                break;
            }
            _ = tokio::time::sleep(inner.epoch_delay) => {}
        }

        // Placeholder signal generator: deterministic trend + jitter.
        let (loss, accuracy) = {
            let mut rng = rand::rng();
            (
                2.5 - 0.2 * f64::from(epoch) + rng.random_range(0.0..0.1),
                50.0 + 4.0 * f64::from(epoch) + rng.random_range(0.0..2.0),
            )
        };

        let mut status = inner.status_mut();
        status.epoch = epoch;
        status.progress = epoch * 100 / epochs;
        status.loss = loss;
        status.accuracy = accuracy;
        status.message = format!("Epoch {epoch}/{epochs} - Loss: {loss:.4}");
    }

    // Clear this job's token before flipping `is_training`: while the flag
    // is still true no new start can win, so `active` holds our token (or
    // nothing, if stop already took it), never a successor's.
    {
        let mut active = inner.active.lock().await;
        *active = None;

        let mut status = inner.status_mut();
        status.is_training = false;
        status.message = if stopped {
            "Training stopped by user".into()
        } else {
            "Training completed".into()
        };
    }
    info!(kind = %kind, stopped, "training job finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(20);

    fn fast_manager() -> TrainingManager {
        TrainingManager::with_epoch_delay(TICK)
    }

    async fn wait_until_idle(manager: &TrainingManager) {
        for _ in 0..200 {
            if !manager.status().is_training {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("training never finished");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn job_runs_all_epochs_to_completion() {
        let manager = fast_manager();
        manager.start(Some("detection"), Some(3)).await.unwrap();
        wait_until_idle(&manager).await;

        let status = manager.status();
        assert_eq!(status.epoch, 3);
        assert_eq!(status.progress, 100);
        assert_eq!(status.message, "Training completed");
        assert!(status.loss < 2.5);
        assert!(status.accuracy > 50.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_while_running_is_rejected_and_preserves_progress() {
        let manager = fast_manager();
        manager.start(None, Some(50)).await.unwrap();

        // Let at least one epoch land.
        tokio::time::sleep(TICK * 3).await;
        let before = manager.status();
        assert!(before.is_training);

        let err = manager.start(None, Some(2)).await.unwrap_err();
        assert!(matches!(err, TrainingError::AlreadyRunning));

        let after = manager.status();
        assert_eq!(after.total_epochs, 50, "rejected start must not reset the job");
        assert!(after.epoch >= before.epoch);

        manager.stop().await;
        wait_until_idle(&manager).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_halts_job_with_no_further_advances() {
        let manager = fast_manager();
        manager.start(None, Some(1000)).await.unwrap();
        tokio::time::sleep(TICK * 3).await;

        manager.stop().await;
        wait_until_idle(&manager).await;

        let at_stop = manager.status();
        assert_eq!(at_stop.message, "Training stopped by user");
        assert!(at_stop.epoch < 1000);

        // No epoch advances after the job reported itself stopped.
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(manager.status().epoch, at_stop.epoch);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn job_can_be_restarted_after_completion() {
        let manager = fast_manager();
        manager.start(None, Some(2)).await.unwrap();
        wait_until_idle(&manager).await;

        manager.start(Some("classification"), Some(4)).await.unwrap();
        wait_until_idle(&manager).await;

        let status = manager.status();
        assert_eq!(status.total_epochs, 4);
        assert_eq!(status.progress, 100);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_when_idle_is_a_no_op() {
        let manager = fast_manager();
        manager.stop().await;
        let status = manager.status();
        assert!(!status.is_training);
        assert_eq!(status.message, "Not started");
    }
}
