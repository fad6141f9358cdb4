use axum::extract::{Path, State};
use serde_json::json;

use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::dentist;
use crate::state::AppState;

/// GET /api/dentists/:slug - Published provider profile for a microsite
pub async fn by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<serde_json::Value> {
    if !dentist::is_valid_slug(&slug) {
        return Err(ApiError::not_found("Provider not found"));
    }

    let filter = Filter::new()
        .eq("slug", slug.as_str())
        .eq("published", true)
        .limit(1);

    let dentist = state
        .backend
        .select(dentist::COLLECTION, &filter, None)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Provider not found"))?;

    Ok(ApiResponse::success(json!({ "dentist": dentist })))
}
