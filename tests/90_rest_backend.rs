mod common;

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, RawQuery, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use dentdir_api::auth::SessionTokens;
use dentdir_api::backend::{self, Backend, BackendError, RestBackend, Row};
use dentdir_api::config::BackendKind;
use dentdir_api::filter::{Condition, Filter};
use dentdir_api::AppState;

use common::{test_config, TestApp};

#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    path: String,
    query: Option<String>,
    bearer: Option<String>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn log(state: &Log, method: &'static str, path: String, query: Option<String>, headers: &HeaderMap) {
    state.lock().unwrap().push(Seen {
        method,
        path,
        query,
        bearer: bearer(headers),
    });
}

/// Just enough of GoTrue, PostgREST and Storage to drive the client.
async fn fake_service() -> (String, Log) {
    let seen: Log = Arc::default();

    let router = Router::new()
        .route(
            "/auth/v1/user",
            get(|headers: HeaderMap| async move {
                match bearer(&headers).as_deref() {
                    Some("good") => (StatusCode::OK, Json(json!({ "id": "u1", "email": "dr.lee@example.com", "aud": "authenticated" }))),
                    _ => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))),
                }
            }),
        )
        .route(
            "/auth/v1/otp",
            post(|State(seen): State<Log>, RawQuery(query): RawQuery, headers: HeaderMap| async move {
                log(&seen, "POST", "/auth/v1/otp".to_string(), query, &headers);
                Json(json!({}))
            }),
        )
        .route(
            "/rest/v1/:table",
            get(|State(seen): State<Log>, Path(table): Path<String>, RawQuery(query): RawQuery, headers: HeaderMap| async move {
                log(&seen, "GET", format!("/rest/v1/{}", table), query, &headers);
                Json(json!([{ "id": "L1", "created_by": "u1", "status": "new" }]))
            })
            .patch(
                |State(seen): State<Log>, Path(table): Path<String>, RawQuery(query): RawQuery, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let bad_id = query.as_deref().unwrap_or("").contains("id=eq.bad");
                    log(&seen, "PATCH", format!("/rest/v1/{}", table), query, &headers);
                    if bad_id {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "code": "22P02", "message": "invalid input syntax for type uuid: \"bad\"" })),
                        )
                            .into_response();
                    }
                    let mut row = body;
                    row["id"] = json!("L1");
                    Json(json!([row])).into_response()
                },
            )
            .post(
                |State(seen): State<Log>, Path(table): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    log(&seen, "POST", format!("/rest/v1/{}", table), None, &headers);
                    let mut row = body;
                    row["id"] = json!("new-id");
                    (StatusCode::CREATED, Json(json!([row])))
                },
            ),
        )
        .route(
            "/storage/v1/object/upload/sign/:bucket/*path",
            post(|Path((bucket, path)): Path<(String, String)>| async move {
                Json(json!({ "url": format!("/object/upload/sign/{}/{}?token=tok123", bucket, path) }))
            }),
        )
        .with_state(seen.clone());

    (common::serve(router).await.unwrap(), seen)
}

fn rest_config(url: &str) -> dentdir_api::config::BackendConfig {
    let mut config = test_config().backend;
    config.kind = BackendKind::Rest;
    config.url = url.to_string();
    config.anon_key = "anon".to_string();
    config.service_role_key = Some("service".to_string());
    config
}

#[tokio::test]
async fn resolves_users_through_auth_service() {
    let (url, _) = fake_service().await;
    let backend = RestBackend::new(&rest_config(&url)).unwrap();

    let user = backend.get_user(&SessionTokens::new("good", None)).await.unwrap();
    assert_eq!(user.unwrap().id, "u1");

    let nobody = backend.get_user(&SessionTokens::new("stale", None)).await.unwrap();
    assert!(nobody.is_none());
}

#[tokio::test]
async fn selects_with_postgrest_filters_and_user_token() {
    let (url, seen) = fake_service().await;
    let backend = RestBackend::new(&rest_config(&url)).unwrap();
    let session = SessionTokens::new("good", None);

    let rows = backend
        .select("leads", &Filter::new().eq("created_by", "u1").order("created_at desc"), Some(&session))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen[0].path, "/rest/v1/leads");
    assert_eq!(
        seen[0].query.as_deref(),
        Some("select=*&created_by=eq.u1&order=created_at.desc")
    );
    assert_eq!(seen[0].bearer.as_deref(), Some("good"));
}

#[tokio::test]
async fn public_writes_use_service_key() {
    let (url, seen) = fake_service().await;
    let backend = RestBackend::new(&rest_config(&url)).unwrap();

    let mut row = Row::new();
    row.insert("name".to_string(), json!("Sam"));
    let stored = backend.insert("leads", &row, None).await.unwrap();

    assert_eq!(stored["id"], "new-id");
    assert_eq!(seen.lock().unwrap()[0].bearer.as_deref(), Some("service"));
}

#[tokio::test]
async fn service_errors_keep_their_message() {
    let (url, _) = fake_service().await;
    let backend = RestBackend::new(&rest_config(&url)).unwrap();
    let mut changes = Row::new();
    changes.insert("status".to_string(), json!("closed"));

    let err = backend
        .update("leads", &changes, &[Condition::eq("id", "bad")], None)
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Api { status: 400, .. }));
    assert_eq!(err.to_string(), "invalid input syntax for type uuid: \"bad\"");
}

#[tokio::test]
async fn signed_upload_url_is_absolute() {
    let (url, _) = fake_service().await;
    let backend = RestBackend::new(&rest_config(&url)).unwrap();

    let upload = backend
        .create_signed_upload_url("media", "u1/logo.png", &SessionTokens::new("good", None))
        .await
        .unwrap();

    assert_eq!(upload.token, "tok123");
    assert_eq!(
        upload.signed_url,
        format!("{}/storage/v1/object/upload/sign/media/u1/logo.png?token=tok123", url)
    );
}

#[tokio::test]
async fn magic_link_passes_redirect() {
    let (url, seen) = fake_service().await;
    let backend = RestBackend::new(&rest_config(&url)).unwrap();

    backend
        .send_magic_link("dr.lee@example.com", "http://localhost:3000/auth/callback?next=%2Fdashboard")
        .await
        .unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen[0].path, "/auth/v1/otp");
    assert_eq!(
        seen[0].query.as_deref(),
        Some("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback%3Fnext%3D%252Fdashboard")
    );
    assert_eq!(seen[0].bearer.as_deref(), Some("anon"));
}

#[tokio::test]
async fn app_over_rest_backend_end_to_end() {
    let (url, _) = fake_service().await;
    let mut config = test_config();
    config.backend = rest_config(&url);
    let backend = backend::from_config(&config.backend).unwrap();
    assert_eq!(backend.name(), "rest");
    let app = TestApp::from_state(AppState::new(config, backend));

    let res = app.get("/api/leads", Some("sb-access-token=good")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["leads"][0]["id"], "L1");

    let res = app
        .post_json("/api/leads/update", json!({ "id": "bad", "status": "closed" }), Some("sb-access-token=good"))
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["error"], "invalid input syntax for type uuid: \"bad\"");

    let res = app.get("/dashboard", Some("sb-access-token=stale")).await;
    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
}
