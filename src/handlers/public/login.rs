use axum::response::Html;

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
<form method="post" action="/auth/magic-link">
<label>Email <input type="email" name="email" required></label>
<button type="submit">Send sign-in link</button>
</form>
</body>
</html>
"#;

/// GET /login - Where the session gate sends unauthenticated visitors
pub async fn page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}
