use axum::extract::State;
use serde_json::json;

use crate::backend::{string_field, Row};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, JsonOrForm};
use crate::models::{dentist, lead, non_blank, LeadCapture, LeadStatus};
use crate::services::TelemetryEvent;
use crate::state::AppState;

const DEFAULT_SOURCE: &str = "microsite";

/// POST /api/leads/capture - Contact form on a published provider microsite
///
/// ```json
/// { "provider_id": "D1", "name": "Sam", "email": "sam@example.com", "message": "Cleaning next week?" }
/// ```
/// The lead is owned by the provider's user. A `lead_created` telemetry event is
/// fired without waiting for delivery.
pub async fn capture(
    State(state): State<AppState>,
    JsonOrForm(input): JsonOrForm<LeadCapture>,
) -> ApiResult<serde_json::Value> {
    let provider_id = non_blank(&input.provider_id)
        .ok_or_else(|| ApiError::missing_field("provider_id"))?
        .to_string();
    let name = non_blank(&input.name).ok_or_else(|| ApiError::missing_field("name"))?;
    let email = non_blank(&input.email);
    let phone = non_blank(&input.phone);
    if email.is_none() && phone.is_none() {
        return Err(ApiError::missing_field("email or phone"));
    }

    let filter = Filter::new()
        .eq("id", provider_id.as_str())
        .eq("published", true)
        .limit(1);
    let provider = state
        .backend
        .select(dentist::COLLECTION, &filter, None)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Provider not found"))?;
    let owner = string_field(&provider, dentist::OWNER_COLUMN)
        .ok_or_else(|| ApiError::not_found("Provider not found"))?;

    let source = non_blank(&input.source).unwrap_or(DEFAULT_SOURCE).to_string();

    let mut row = Row::new();
    row.insert("provider_id".to_string(), json!(provider_id));
    row.insert(lead::OWNER_COLUMN.to_string(), json!(owner));
    row.insert("name".to_string(), json!(name));
    row.insert("email".to_string(), json!(email));
    row.insert("phone".to_string(), json!(phone));
    row.insert("message".to_string(), json!(input.message));
    row.insert("source".to_string(), json!(source));
    row.insert("status".to_string(), json!(LeadStatus::New));
    row.insert("payment_status".to_string(), json!("unpaid"));

    let stored = state.backend.insert(lead::COLLECTION, &row, None).await?;
    let lead_id = string_field(&stored, "id");

    let mut event = TelemetryEvent::new("lead_created").provider(provider_id).source(source);
    if let Some(lead_id) = &lead_id {
        event = event.lead(lead_id.clone());
    }
    state.telemetry.emit(event);

    Ok(ApiResponse::created(json!({ "lead_id": lead_id })))
}
