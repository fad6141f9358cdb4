use axum::extract::State;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, JsonOrForm};
use crate::models::{dentist, non_blank, NewDentist};
use crate::state::AppState;

/// POST /api/onboarding - Create the caller's provider profile
///
/// ```json
/// { "slug": "smile-studio", "display_name": "Dr. Lee", "city": "Austin" }
/// ```
/// The profile starts unpublished. A taken slug surfaces the store's constraint error.
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonOrForm(input): JsonOrForm<NewDentist>,
) -> ApiResult<serde_json::Value> {
    let slug = non_blank(&input.slug).ok_or_else(|| ApiError::missing_field("slug"))?;
    if !dentist::is_valid_slug(slug) {
        return Err(ApiError::bad_request(
            "Invalid slug: use lowercase letters, digits and single dashes",
        ));
    }
    if non_blank(&input.display_name).is_none() {
        return Err(ApiError::missing_field("display_name"));
    }

    let row = input.into_row(current.id());
    let dentist = state
        .backend
        .insert(dentist::COLLECTION, &row, Some(&current.session))
        .await?;

    tracing::info!("User {} onboarded a provider profile", current.id());
    Ok(ApiResponse::created(json!({ "dentist": dentist })))
}
