use axum::extract::State;
use serde_json::json;

use super::utils::{require_id, update_owned};
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, JsonOrForm};
use crate::models::{lead, LeadUpdate, SparseUpdate};
use crate::services::TelemetryEvent;
use crate::state::AppState;

/// POST /api/leads/update - Change a lead's note and/or status
///
/// ```json
/// { "id": "L1", "note": "called back", "status": "open" }
/// ```
/// Only the provided fields are written. The update is scoped to leads the caller created.
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonOrForm(input): JsonOrForm<LeadUpdate>,
) -> ApiResult<()> {
    let id = require_id(&input.id)?;
    let changes = input.changes();

    update_owned(&state, &current, lead::COLLECTION, lead::OWNER_COLUMN, &id, changes).await?;

    if let Some(status) = input.status {
        state.telemetry.emit(
            TelemetryEvent::new("lead_status_changed")
                .lead(id.clone())
                .source(format!("dashboard:{}", status.as_str())),
        );
    }
    state.revalidator.revalidate("/dashboard");

    Ok(ApiResponse::ack())
}

/// GET /api/leads - The caller's leads, newest first
pub async fn list(State(state): State<AppState>, current: CurrentUser) -> ApiResult<serde_json::Value> {
    let filter = Filter::new()
        .eq(lead::OWNER_COLUMN, current.id())
        .order("created_at desc");

    let leads = state
        .backend
        .select(lead::COLLECTION, &filter, Some(&current.session))
        .await?;

    Ok(ApiResponse::success(json!({ "leads": leads })))
}
