use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Opaque token pair owned by the backend collaborator.
///
/// Only presence is checked here; resolving the tokens to a user is always
/// delegated to [`Backend::get_user`](crate::backend::Backend::get_user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// Read the session cookies. A missing or blank access token means no session.
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let access_token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().trim().to_string())
            .filter(|v| !v.is_empty())?;

        let refresh_token = jar
            .get(REFRESH_TOKEN_COOKIE)
            .map(|c| c.value().trim().to_string())
            .filter(|v| !v.is_empty());

        Some(Self {
            access_token,
            refresh_token,
        })
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        Self::from_jar(&CookieJar::from_headers(headers))
    }

    /// Store both tokens as HttpOnly cookies scoped to the whole site.
    pub fn write_to(&self, jar: CookieJar, secure: bool) -> CookieJar {
        let jar = jar.add(session_cookie(ACCESS_TOKEN_COOKIE, self.access_token.clone(), secure));
        match &self.refresh_token {
            Some(refresh) => jar.add(session_cookie(REFRESH_TOKEN_COOKIE, refresh.clone(), secure)),
            None => jar,
        }
    }
}

/// Remove both session cookies.
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/"))
}

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}
