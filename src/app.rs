use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::session_gate;
use crate::state::AppState;

/// The full application: every route behind the session gate, CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/health", get(public::health::health))
        .merge(auth_public_routes())
        // Pages (gated)
        .merge(page_routes())
        // API namespace (handlers authenticate themselves)
        .merge(lead_routes())
        .merge(payment_routes())
        .merge(dentist_routes())
        .merge(storage_routes())
        // Global middleware
        .layer(from_fn_with_state(state.clone(), session_gate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/login", get(public::login::page))
        .route("/auth/magic-link", post(auth::magic_link))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
}

fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/dashboard") }))
        .route("/dashboard", get(protected::dashboard::show))
}

fn lead_routes() -> Router<AppState> {
    use protected::leads;

    Router::new()
        .route("/api/leads", get(leads::list))
        .route("/api/leads/update", post(leads::update))
        .route("/api/leads/capture", post(public::leads::capture))
}

fn payment_routes() -> Router<AppState> {
    use protected::payments;

    Router::new()
        .route("/api/payments", get(payments::list))
        .route("/api/payments/update", post(payments::update))
}

fn dentist_routes() -> Router<AppState> {
    use protected::{dentists, onboarding};

    Router::new()
        .route("/api/dentists/me", get(dentists::me))
        .route("/api/dentists/update", post(dentists::update))
        .route("/api/dentists/publish", post(dentists::publish))
        .route("/api/dentists/:slug", get(public::dentists::by_slug))
        .route("/api/onboarding", post(onboarding::create))
}

fn storage_routes() -> Router<AppState> {
    Router::new().route("/api/storage/upload-url", post(protected::storage::upload_url))
}

/// Credentialed CORS for the configured origins; disabled means no CORS headers at all.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}
