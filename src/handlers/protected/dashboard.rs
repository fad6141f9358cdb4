use axum::extract::State;
use serde_json::{json, Map, Value};

use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::models::{lead, LeadStatus};
use crate::state::AppState;

/// GET /dashboard - Page data for the signed-in provider
///
/// Reached only through the session gate, which has already resolved the caller.
pub async fn show(State(state): State<AppState>, current: CurrentUser) -> ApiResult<Value> {
    let filter = Filter::new().eq(lead::OWNER_COLUMN, current.id());
    let leads = state
        .backend
        .select(lead::COLLECTION, &filter, Some(&current.session))
        .await?;

    let mut by_status = Map::new();
    for status in LeadStatus::ALL {
        let count = leads
            .iter()
            .filter(|row| row.get("status").and_then(Value::as_str) == Some(status.as_str()))
            .count();
        by_status.insert(status.as_str().to_string(), json!(count));
    }

    Ok(ApiResponse::success(json!({
        "user": current.user,
        "leads": {
            "total": leads.len(),
            "by_status": by_status,
        }
    })))
}
