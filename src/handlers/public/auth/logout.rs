use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::clear_session;
use crate::middleware::LOGIN_PATH;

/// POST /auth/logout - Drop the session cookies
///
/// Token revocation is left to the backend's own expiry.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (clear_session(jar), Redirect::to(LOGIN_PATH))
}
