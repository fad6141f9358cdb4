use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::safe_next;
use crate::auth::SessionTokens;
use crate::middleware::{auth::resolve, LOGIN_PATH};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub next: Option<String>,
}

/// GET /auth/callback - Store the session handed back by the sign-in link
///
/// The tokens are checked with the backend before any cookie is written;
/// unusable tokens send the visitor back to /login.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(access_token) = query.access_token.filter(|t| !t.trim().is_empty()) else {
        return Redirect::to(LOGIN_PATH).into_response();
    };
    let session = SessionTokens::new(access_token, query.refresh_token.filter(|t| !t.is_empty()));

    match resolve(&state, session).await {
        Some(current) => {
            tracing::info!("User {} signed in", current.user.id);
            let jar = current.session.write_to(jar, state.config.security.cookie_secure);
            (jar, Redirect::to(safe_next(query.next.as_deref()))).into_response()
        }
        None => Redirect::to(LOGIN_PATH).into_response(),
    }
}
