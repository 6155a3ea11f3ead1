use serde::Serialize;

/// Response after a completed enhancement.
#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub task_id: String,
    /// URL of the enhanced image hosted by the remote service.
    pub image: String,
    pub file_name: String,
    /// Opaque remote-service metadata passed through unchanged.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Error payload for failed enhancements.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
