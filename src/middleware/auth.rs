use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::auth::SessionTokens;
use crate::backend::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, resolved from the session cookies.
///
/// Rejects with 401 when no session cookie is present (no backend call is made),
/// when the backend does not recognize the session, or when the lookup itself fails.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub session: SessionTokens,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved by the session gate for page routes
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let session = SessionTokens::from_headers(&parts.headers).ok_or_else(ApiError::unauthorized)?;
        let current = resolve(state, session).await.ok_or_else(ApiError::unauthorized)?;

        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// Ask the backend who owns `session`. Lookup failures count as unauthenticated.
pub async fn resolve(state: &AppState, session: SessionTokens) -> Option<CurrentUser> {
    match state.backend.get_user(&session).await {
        Ok(Some(user)) => {
            tracing::debug!("Session resolved to user {}", user.id);
            Some(CurrentUser { user, session })
        }
        Ok(None) => {
            tracing::warn!("Session cookie present but not recognized by backend");
            None
        }
        Err(e) => {
            tracing::warn!("Session lookup failed, treating as unauthenticated: {}", e);
            None
        }
    }
}
