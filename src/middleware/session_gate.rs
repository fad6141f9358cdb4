use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::auth::resolve;
use crate::auth::SessionTokens;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";

/// Path prefixes served without a session.
const PUBLIC_PREFIXES: &[&str] = &["/login", "/auth", "/api", "/static/", "/_next/", "/health"];

/// Root-level files served without a session.
const PUBLIC_FILES: &[&str] = &["/favicon.ico", "/robots.txt", "/sitemap.xml"];

const STATIC_EXTENSIONS: &[&str] = &[
    "css", "js", "map", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "woff", "woff2", "txt", "xml",
];

/// Public: login, auth callback namespace, API namespace, static assets.
/// Everything else requires a session.
pub fn is_public_path(path: &str) -> bool {
    if PUBLIC_FILES.contains(&path) {
        return true;
    }

    let prefixed = PUBLIC_PREFIXES.iter().any(|prefix| {
        if prefix.ends_with('/') {
            path.starts_with(prefix)
        } else {
            // "/auth" matches "/auth" and "/auth/..." but not "/authors"
            path == *prefix || path.starts_with(&format!("{}/", prefix))
        }
    });
    if prefixed {
        return true;
    }

    is_static_asset(path)
}

fn is_static_asset(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            STATIC_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// Gate every protected request on a backend-resolved session; otherwise redirect to `/login`.
///
/// The resolved user rides along in request extensions. Nothing is cached between requests.
pub async fn session_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if is_public_path(&path) {
        return next.run(request).await;
    }

    let Some(session) = SessionTokens::from_headers(request.headers()) else {
        tracing::debug!("No session for protected path {}, redirecting", path);
        return Redirect::temporary(LOGIN_PATH).into_response();
    };

    match resolve(&state, session).await {
        Some(current) => {
            request.extensions_mut().insert(current);
            next.run(request).await
        }
        None => {
            tracing::debug!("Unauthenticated request for {}, redirecting", path);
            Redirect::temporary(LOGIN_PATH).into_response()
        }
    }
}
