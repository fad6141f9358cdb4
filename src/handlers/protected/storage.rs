use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, JsonOrForm};
use crate::models::non_blank;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UploadUrlRequest {
    pub filename: Option<String>,
}

/// POST /api/storage/upload-url - Signed URL for uploading one file into the caller's folder
///
/// Objects land at `{user_id}/{filename}` in the configured bucket.
pub async fn upload_url(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonOrForm(input): JsonOrForm<UploadUrlRequest>,
) -> ApiResult<serde_json::Value> {
    let filename = non_blank(&input.filename).ok_or_else(|| ApiError::missing_field("filename"))?;
    if !is_plain_filename(filename) {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let path = format!("{}/{}", current.id(), filename);
    let upload = state
        .backend
        .create_signed_upload_url(&state.config.storage.bucket, &path, &current.session)
        .await?;

    Ok(ApiResponse::success(json!({
        "bucket": upload.bucket,
        "path": upload.path,
        "signed_url": upload.signed_url,
        "token": upload.token,
    })))
}

/// A single path segment of letters, digits, spaces, `.`, `_` and `-`, with no parent references.
fn is_plain_filename(name: &str) -> bool {
    !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
}
