use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;

use crate::models::task::RemoteTaskData;

/// Source image handed to the submitter. No local validation beyond what
/// the remote service performs.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

/// Errors surfaced by the enhancement pipeline. Callers can distinguish a
/// submission failure from a poll timeout from an explicit remote failure;
/// nothing upstream collapses these.
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("upload request failed: {0}")]
    Submit(#[source] reqwest::Error),

    #[error("upload response did not contain a task id")]
    MissingTaskId,

    #[error("status request failed: {0}")]
    PollTransport(#[source] reqwest::Error),

    #[error("task {task_id} still processing after {attempts} attempts")]
    PollTimeout { task_id: String, attempts: u32 },

    #[error("remote service reported failure for task {task_id} (state {state})")]
    RemoteFailure { task_id: String, state: i64 },

    #[error("remote service reported unrecognized state {state} for task {task_id}")]
    UnknownRemoteState { task_id: String, state: i64 },

    #[error("task {task_id} finished without an enhanced image reference")]
    MissingImage { task_id: String },

    #[error("enhancement cancelled")]
    Cancelled,
}

/// Seam between the poller and the wire. Production uses [`PicwishClient`];
/// tests script responses without a network.
#[async_trait]
pub trait EnhanceBackend: Send + Sync {
    /// Upload the image, returning the task id issued by the service.
    async fn submit(&self, upload: &ImageUpload) -> Result<String, EnhanceError>;

    /// Fetch the current raw status of a task.
    async fn fetch_status(&self, task_id: &str) -> Result<RemoteTaskData, EnhanceError>;
}

/// Client for the PicWish visual-scale API (techhk.aoscdn.com).
pub struct PicwishClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SubmitEnvelope {
    data: Option<SubmitData>,
}

#[derive(Deserialize)]
struct SubmitData {
    task_id: Option<String>,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    data: RemoteTaskData,
}

impl PicwishClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl EnhanceBackend for PicwishClient {
    async fn submit(&self, upload: &ImageUpload) -> Result<String, EnhanceError> {
        let url = format!("{}/api/tasks/visual/scale", self.base_url);

        let part = multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(EnhanceError::Submit)?;
        let form = multipart::Form::new().part("image_file", part);

        let envelope: SubmitEnvelope = self
            .http
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(EnhanceError::Submit)?
            .error_for_status()
            .map_err(EnhanceError::Submit)?
            .json()
            .await
            .map_err(EnhanceError::Submit)?;

        match envelope.data.and_then(|d| d.task_id) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(EnhanceError::MissingTaskId),
        }
    }

    async fn fetch_status(&self, task_id: &str) -> Result<RemoteTaskData, EnhanceError> {
        let url = format!("{}/api/tasks/visual/scale/{}", self.base_url, task_id);

        let envelope: StatusEnvelope = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(EnhanceError::PollTransport)?
            .error_for_status()
            .map_err(EnhanceError::PollTransport)?
            .json()
            .await
            .map_err(EnhanceError::PollTransport)?;

        Ok(envelope.data)
    }
}
