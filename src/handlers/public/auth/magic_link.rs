use axum::extract::State;
use serde::Deserialize;
use url::Url;

use super::safe_next;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonOrForm};
use crate::models::non_blank;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MagicLinkRequest {
    pub email: Option<String>,
    pub next: Option<String>,
}

/// POST /auth/magic-link - Email a sign-in link that lands on /auth/callback
pub async fn magic_link(
    State(state): State<AppState>,
    JsonOrForm(input): JsonOrForm<MagicLinkRequest>,
) -> ApiResult<()> {
    let email = non_blank(&input.email).ok_or_else(|| ApiError::missing_field("email"))?;
    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email"));
    }

    let redirect_to = callback_url(&state.config.site.base_url, safe_next(input.next.as_deref()))?;
    state.backend.send_magic_link(email, &redirect_to).await?;

    Ok(ApiResponse::ack())
}

fn callback_url(base_url: &str, next: &str) -> Result<String, ApiError> {
    let mut url = Url::parse(&format!("{}/auth/callback", base_url.trim_end_matches('/')))
        .map_err(|e| ApiError::Backend(format!("Invalid site url: {}", e)))?;
    url.query_pairs_mut().append_pair("next", next);
    Ok(url.to_string())
}
