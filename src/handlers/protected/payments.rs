use axum::extract::State;
use serde_json::json;

use super::utils::{require_id, update_owned};
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, JsonOrForm};
use crate::models::{payment, PaymentUpdate, SparseUpdate};
use crate::state::AppState;

/// POST /api/payments/update - Change a payment's note and/or status
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonOrForm(input): JsonOrForm<PaymentUpdate>,
) -> ApiResult<()> {
    let id = require_id(&input.id)?;
    update_owned(&state, &current, payment::COLLECTION, payment::OWNER_COLUMN, &id, input.changes()).await?;
    Ok(ApiResponse::ack())
}

/// GET /api/payments
pub async fn list(State(state): State<AppState>, current: CurrentUser) -> ApiResult<serde_json::Value> {
    let filter = Filter::new()
        .eq(payment::OWNER_COLUMN, current.id())
        .order("created_at desc");

    let payments = state
        .backend
        .select(payment::COLLECTION, &filter, Some(&current.session))
        .await?;

    Ok(ApiResponse::success(json!({ "payments": payments })))
}
