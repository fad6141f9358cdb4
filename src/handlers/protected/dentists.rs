use axum::extract::State;
use serde_json::json;

use super::utils::{require_id, update_owned};
use crate::backend::{string_field, Row};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, JsonOrForm};
use crate::models::{dentist, DentistProfileUpdate, PublishUpdate, SparseUpdate};
use crate::state::AppState;

/// POST /api/dentists/update - Edit the caller's provider profile
///
/// Invalidates the provider's public microsite page on success.
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonOrForm(input): JsonOrForm<DentistProfileUpdate>,
) -> ApiResult<()> {
    let id = require_id(&input.id)?;
    let updated = update_owned(&state, &current, dentist::COLLECTION, dentist::OWNER_COLUMN, &id, input.changes()).await?;
    revalidate_microsite(&state, &updated);
    Ok(ApiResponse::ack())
}

/// POST /api/dentists/publish - Show or hide the caller's microsite
///
/// ```json
/// { "id": "D1", "published": true }
/// ```
pub async fn publish(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonOrForm(input): JsonOrForm<PublishUpdate>,
) -> ApiResult<()> {
    let id = require_id(&input.id)?;
    if input.published.is_none() {
        return Err(ApiError::missing_field("published"));
    }

    let updated = update_owned(&state, &current, dentist::COLLECTION, dentist::OWNER_COLUMN, &id, input.changes()).await?;
    revalidate_microsite(&state, &updated);
    Ok(ApiResponse::ack())
}

/// GET /api/dentists/me - The caller's provider profile, or null before onboarding
pub async fn me(State(state): State<AppState>, current: CurrentUser) -> ApiResult<serde_json::Value> {
    let filter = Filter::new().eq(dentist::OWNER_COLUMN, current.id()).limit(1);
    let dentist = state
        .backend
        .select(dentist::COLLECTION, &filter, Some(&current.session))
        .await?
        .into_iter()
        .next();

    Ok(ApiResponse::success(json!({ "dentist": dentist })))
}

fn revalidate_microsite(state: &AppState, updated: &[Row]) {
    for row in updated {
        if let Some(slug) = string_field(row, "slug") {
            state.revalidator.revalidate(dentist::page_path(&slug));
        }
    }
}
