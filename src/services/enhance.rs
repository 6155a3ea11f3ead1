use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::models::task::{phase_from_state, EnhancementTask, TaskPhase, TaskResult};
use crate::services::remote::{EnhanceBackend, EnhanceError, ImageUpload};

/// Polling policy for the status loop. Bounds total wall-clock wait to
/// `max_attempts * poll_interval` plus round-trip latency.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            max_attempts: 20,
        }
    }
}

/// Injectable suspension between poll attempts, so tests run without
/// real waiting.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, period: Duration);
}

/// Production delay backed by the tokio timer.
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// Create a linked cancel handle/signal pair. The signal is checked at
/// each suspension point of the poll loop; an in-flight status request is
/// not interrupted.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires, for callers without a cancel path.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle dropped without firing; this task is not cancellable.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Drives the two-phase enhancement workflow: upload the source image to
/// obtain a task id, then poll that task at a fixed interval until it
/// reaches a terminal state or the retry budget runs out.
pub struct Enhancer {
    backend: Arc<dyn EnhanceBackend>,
    delay: Arc<dyn Delay>,
    config: PollConfig,
}

impl Enhancer {
    pub fn new(backend: Arc<dyn EnhanceBackend>, config: PollConfig) -> Self {
        Self::with_delay(backend, config, Arc::new(TokioDelay))
    }

    pub fn with_delay(
        backend: Arc<dyn EnhanceBackend>,
        config: PollConfig,
        delay: Arc<dyn Delay>,
    ) -> Self {
        Self {
            backend,
            delay,
            config,
        }
    }

    /// Upload the source image and return the task id. Single attempt; any
    /// retry policy belongs to the caller.
    pub async fn submit(&self, upload: &ImageUpload) -> Result<String, EnhanceError> {
        let task_id = self.backend.submit(upload).await?;
        metrics::counter!("enhancement_jobs_total").increment(1);
        tracing::info!(
            task_id = %task_id,
            bytes = upload.bytes.len(),
            content_type = %upload.content_type,
            "Image uploaded, task created"
        );
        Ok(task_id)
    }

    /// Poll a task until it succeeds, the remote reports failure, or
    /// `max_attempts` status queries have all reported a non-terminal state.
    pub async fn poll(
        &self,
        task_id: &str,
        mut cancel: CancelSignal,
    ) -> Result<TaskResult, EnhanceError> {
        let mut task = EnhancementTask::new(task_id.to_string());

        // A zero budget means no queries at all, not one free attempt.
        if self.config.max_attempts == 0 {
            return Err(EnhanceError::PollTimeout {
                task_id: task.id,
                attempts: 0,
            });
        }

        loop {
            if cancel.is_cancelled() {
                return Err(EnhanceError::Cancelled);
            }

            let data = self.backend.fetch_status(&task.id).await?;
            metrics::counter!("enhancement_poll_attempts_total").increment(1);

            let phase = phase_from_state(data.state).ok_or(EnhanceError::UnknownRemoteState {
                task_id: task.id.clone(),
                state: data.state,
            })?;
            task.phase = phase;

            match phase {
                TaskPhase::Succeeded => {
                    let image = data.image.ok_or(EnhanceError::MissingImage {
                        task_id: task.id.clone(),
                    })?;
                    tracing::info!(
                        task_id = %task.id,
                        attempts = task.attempts,
                        "Enhancement succeeded"
                    );
                    return Ok(TaskResult {
                        task_id: task.id,
                        image,
                        extra: data.extra,
                    });
                }
                TaskPhase::Failed => {
                    tracing::warn!(
                        task_id = %task.id,
                        state = data.state,
                        "Remote service reported failure"
                    );
                    return Err(EnhanceError::RemoteFailure {
                        task_id: task.id,
                        state: data.state,
                    });
                }
                TaskPhase::Pending | TaskPhase::Processing => {
                    task.attempts += 1;
                    tracing::debug!(
                        task_id = %task.id,
                        attempt = task.attempts,
                        state = data.state,
                        "Task still processing"
                    );
                    if task.attempts >= self.config.max_attempts {
                        return Err(EnhanceError::PollTimeout {
                            task_id: task.id,
                            attempts: task.attempts,
                        });
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(EnhanceError::Cancelled),
                        _ = self.delay.sleep(self.config.poll_interval) => {}
                    }
                }
            }
        }
    }

    /// Full pipeline: submit, then poll to a terminal state. Error kinds
    /// from either stage pass through unchanged.
    pub async fn enhance(&self, upload: &ImageUpload) -> Result<TaskResult, EnhanceError> {
        self.enhance_with_cancel(upload, CancelSignal::never()).await
    }

    pub async fn enhance_with_cancel(
        &self,
        upload: &ImageUpload,
        cancel: CancelSignal,
    ) -> Result<TaskResult, EnhanceError> {
        let start = std::time::Instant::now();
        let task_id = self.submit(upload).await?;

        let result = self.poll(&task_id, cancel).await;
        match &result {
            Ok(_) => {
                metrics::counter!("enhancement_jobs_completed").increment(1);
                metrics::histogram!("enhancement_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
            }
            Err(e) => {
                metrics::counter!("enhancement_jobs_failed").increment(1);
                tracing::error!(task_id = %task_id, error = %e, "Enhancement failed");
            }
        }
        result
    }
}
