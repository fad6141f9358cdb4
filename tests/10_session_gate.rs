mod common;

use axum::http::StatusCode;
use chrono::Duration;
use dentdir_api::backend::BackendCall;

use common::TestApp;

#[tokio::test]
async fn protected_page_without_session_redirects_to_login() {
    let app = TestApp::new();

    let res = app.get("/dashboard", None).await;

    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.location(), Some("/login"));
    assert!(app.backend.calls().await.is_empty(), "no session means no backend call");
}

#[tokio::test]
async fn unknown_session_redirects_to_login() {
    let app = TestApp::new();

    let res = app
        .get("/dashboard", Some("sb-access-token=not-a-real-token"))
        .await;

    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.location(), Some("/login"));
    assert_eq!(app.backend.calls().await, vec![BackendCall::GetUser]);
}

#[tokio::test]
async fn expired_session_redirects_to_login() {
    let app = TestApp::new();
    let user = app.backend.register_user("u1", None).await;
    let session = app.backend.issue_session_with_ttl(&user, Duration::hours(-2));

    let res = app
        .get("/dashboard", Some(&format!("sb-access-token={}", session.access_token)))
        .await;

    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn unprotected_paths_bypass_the_gate() {
    let app = TestApp::new();

    let res = app.get("/login", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.text().contains("/auth/magic-link"));

    let res = app.get("/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["backend"], "memory");

    // Static assets are not routed here, but the gate must not redirect them
    let res = app.get("/static/app.css", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app.get("/images/logo.png", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    assert!(app.backend.calls().await.is_empty());
}

#[tokio::test]
async fn api_namespace_answers_401_instead_of_redirecting() {
    let app = TestApp::new();

    let res = app.get("/api/leads", None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["ok"], false);
    assert_eq!(res.json()["error"], "Unauthorized");
}

#[tokio::test]
async fn backend_outage_during_lookup_counts_as_signed_out() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in("u1").await;
    app.backend.fail_with("auth service unavailable").await;

    let res = app.get("/dashboard", Some(&cookie)).await;

    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.location(), Some("/login"));
}

#[tokio::test]
async fn signed_in_user_reaches_dashboard_with_single_lookup() {
    let app = TestApp::new();
    let (user, cookie) = app.sign_in("u1").await;
    app.backend
        .seed(
            "leads",
            vec![
                serde_json::json!({ "id": "L1", "created_by": "u1", "status": "new" }),
                serde_json::json!({ "id": "L2", "created_by": "u1", "status": "closed" }),
                serde_json::json!({ "id": "L3", "created_by": "u2", "status": "new" }),
            ],
        )
        .await;

    let res = app.get("/dashboard", Some(&cookie)).await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["user"]["id"], user.id);
    assert_eq!(body["leads"]["total"], 2);
    assert_eq!(body["leads"]["by_status"]["new"], 1);
    assert_eq!(body["leads"]["by_status"]["closed"], 1);
    assert_eq!(body["leads"]["by_status"]["open"], 0);

    let lookups = app
        .backend
        .calls()
        .await
        .into_iter()
        .filter(|c| *c == BackendCall::GetUser)
        .count();
    assert_eq!(lookups, 1, "gate result is reused by the handler");
}

#[tokio::test]
async fn root_goes_to_dashboard_once_signed_in() {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in("u1").await;

    assert_eq!(app.get("/", None).await.location(), Some("/login"));

    let res = app.get("/", Some(&cookie)).await;
    assert_eq!(res.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.location(), Some("/dashboard"));
}

#[tokio::test]
async fn gate_over_real_listener() -> anyhow::Result<()> {
    let app = TestApp::new();
    let (_, cookie) = app.sign_in("u1").await;
    let base = common::serve(dentdir_api::app(app.state.clone())).await?;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let res = client.get(format!("{}/dashboard", base)).send().await?;
    assert_eq!(res.status(), reqwest::StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "/login");

    let res = client
        .get(format!("{}/dashboard", base))
        .header("cookie", cookie)
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["user"]["id"], "u1");
    Ok(())
}
