use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::api::{EnhanceResponse, ErrorResponse};
use crate::services::remote::{EnhanceError, ImageUpload};

/// POST /api/v1/enhance — Upload an image and run it through the remote
/// enhancement pipeline. The response carries the hosted URL of the
/// enhanced image once the remote task completes.
pub async fn enhance_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<EnhanceResponse>, (StatusCode, Json<ErrorResponse>)> {
    // Extract the image file from the multipart upload
    let mut upload: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("malformed multipart body"))?
    {
        if field.name() == Some("image") {
            let file_name = field
                .file_name()
                .unwrap_or("enhanced-image")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| bad_request("failed to read image field"))?;

            // Sniff the format; the remote service only accepts real images
            let format = image::guess_format(&data).map_err(|_| {
                (
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    Json(ErrorResponse {
                        error: "unrecognized image format".to_string(),
                    }),
                )
            })?;

            upload = Some(ImageUpload {
                bytes: data.to_vec(),
                content_type: format.to_mime_type().to_string(),
                file_name,
            });
        }
    }

    let upload = upload.ok_or_else(|| bad_request("missing image field"))?;
    let bytes_in = upload.bytes.len() as u64;

    let result = state
        .enhancer
        .enhance(&upload)
        .await
        .map_err(enhance_error_response)?;

    // History and stats are best-effort sinks; a full disk must not turn a
    // finished enhancement into an error.
    if let Err(e) = state.gallery.add(&result.image, &upload.file_name).await {
        tracing::warn!(error = %e, "Failed to record gallery entry");
    }
    if let Err(e) = state.stats.record(&upload.content_type, bytes_in).await {
        tracing::warn!(error = %e, "Failed to record usage stats");
    }

    Ok(Json(EnhanceResponse {
        task_id: result.task_id,
        image: result.image,
        file_name: upload.file_name,
        extra: result.extra,
    }))
}

fn bad_request(msg: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
}

/// Map pipeline errors onto gateway status codes without collapsing the
/// error kinds in the payload.
fn enhance_error_response(err: EnhanceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        EnhanceError::PollTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        EnhanceError::Submit(_)
        | EnhanceError::MissingTaskId
        | EnhanceError::PollTransport(_)
        | EnhanceError::RemoteFailure { .. }
        | EnhanceError::UnknownRemoteState { .. }
        | EnhanceError::MissingImage { .. } => StatusCode::BAD_GATEWAY,
        EnhanceError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
