use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of an enhancement task, as seen by the poller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Pending,
    Processing,
    Succeeded,
    Failed,
}

impl TaskPhase {
    /// Terminal phases are never polled again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskPhase::Succeeded | TaskPhase::Failed)
    }
}

/// An in-flight enhancement task. The id is assigned by the remote service
/// at upload time and never changes; the poller is the only mutator.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancementTask {
    pub id: String,
    pub phase: TaskPhase,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl EnhancementTask {
    pub fn new(id: String) -> Self {
        Self {
            id,
            phase: TaskPhase::Pending,
            attempts: 0,
            created_at: Utc::now(),
        }
    }
}

/// Raw task payload returned by the status endpoint. Everything besides the
/// numeric state and the image reference is remote-service metadata we pass
/// through untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTaskData {
    pub state: i64,
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Terminal payload of a successful enhancement.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub task_id: String,
    /// URL of the enhanced image hosted by the remote service.
    pub image: String,
    /// Opaque remote-service metadata (dimensions, processing parameters).
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Mapping of the service's numeric `state` codes onto the task phases.
///
/// Observed contract: `4` means still processing and `1` carries the
/// finished image. The service also reports `0` before a worker picks the
/// task up, `2`/`3` while queued, and negative codes on failure. Anything
/// else is unrecognized and must not be treated as success.
pub fn phase_from_state(state: i64) -> Option<TaskPhase> {
    match state {
        1 => Some(TaskPhase::Succeeded),
        0 => Some(TaskPhase::Pending),
        2..=4 => Some(TaskPhase::Processing),
        s if s < 0 => Some(TaskPhase::Failed),
        _ => None,
    }
}
