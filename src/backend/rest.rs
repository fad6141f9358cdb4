use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{AuthUser, Backend, BackendError, Row, SignedUpload};
use crate::auth::SessionTokens;
use crate::config::BackendConfig;
use crate::filter::{validate_collection, Condition, Filter, FilterOrder, FilterWhere};

/// Client for a hosted Supabase-style service: GoTrue auth, PostgREST tables, Storage.
pub struct RestBackend {
    client: Client,
    base_url: Url,
    anon_key: String,
    service_role_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignedUploadResponse {
    url: String,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        if config.url.trim().is_empty() {
            return Err(BackendError::Config("backend url is empty (set SUPABASE_URL)".to_string()));
        }
        if config.anon_key.is_empty() {
            return Err(BackendError::Config("anon key is empty (set SUPABASE_ANON_KEY)".to_string()));
        }

        // Trailing slash so Url::join keeps the full base path
        let base = format!("{}/", config.url.trim_end_matches('/'));
        let base_url = Url::parse(&base).map_err(|e| BackendError::Config(format!("invalid backend url: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Config(format!("invalid endpoint {}: {}", path, e)))
    }

    /// PostgREST URL for a collection with filter, order and limit parameters applied.
    pub fn table_url(&self, collection: &str, filter: &Filter) -> Result<Url, BackendError> {
        validate_collection(collection)?;
        filter.validate()?;

        let mut url = self.endpoint(&format!("rest/v1/{}", collection))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (column, rendered) in FilterWhere::to_query_pairs(&filter.conditions)? {
                query.append_pair(&column, &rendered);
            }
            if let Some(order) = FilterOrder::to_query_value(&filter.order) {
                query.append_pair("order", &order);
            }
            if let Some(limit) = filter.limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    /// Storage signing endpoint for `bucket/path`. Each segment is percent-encoded,
    /// so `?`, `#` and `%` stay inside the object name.
    pub fn upload_sign_url(&self, bucket: &str, path: &str) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Config(format!("backend url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["storage", "v1", "object", "upload", "sign", bucket])
            .extend(path.split('/'));
        Ok(url)
    }

    /// Bearer for data calls: the user's token when present, else the service key, else anon.
    fn bearer<'a>(&'a self, session: Option<&'a SessionTokens>) -> &'a str {
        match session {
            Some(session) => &session.access_token,
            None => self.service_role_key.as_deref().unwrap_or(&self.anon_key),
        }
    }

    fn request(&self, method: Method, url: Url, bearer: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn rows(response: Response) -> Result<Vec<Row>, BackendError> {
        let response = Self::check(response).await?;
        let body: Value = response.json().await?;
        match body {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(BackendError::Decode(format!("expected row object, got {}", other))),
                })
                .collect(),
            Value::Object(map) => Ok(vec![map]),
            other => Err(BackendError::Decode(format!("expected row array, got {}", other))),
        }
    }

    /// Turn non-2xx responses into `BackendError::Api` carrying the service's message.
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(BackendError::api(status.as_u16(), error_message(status, &text)))
    }
}

/// Pick the human-readable message out of a PostgREST / GoTrue / Storage error body.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }
    if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("backend request failed").to_string()
    } else {
        body.trim().to_string()
    }
}

#[async_trait]
impl Backend for RestBackend {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn get_user(&self, session: &SessionTokens) -> Result<Option<AuthUser>, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self.request(Method::GET, url, &session.access_token).send().await?;

        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::debug!("Session rejected by auth service ({})", response.status());
            return Ok(None);
        }

        let user: AuthUser = Self::check(response).await?.json().await?;
        Ok(Some(user))
    }

    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        session: Option<&SessionTokens>,
    ) -> Result<Vec<Row>, BackendError> {
        let url = self.table_url(collection, filter)?;
        let response = self.request(Method::GET, url, self.bearer(session)).send().await?;
        Self::rows(response).await
    }

    async fn update(
        &self,
        collection: &str,
        changes: &Row,
        conditions: &[Condition],
        session: Option<&SessionTokens>,
    ) -> Result<Vec<Row>, BackendError> {
        let filter = Filter {
            conditions: conditions.to_vec(),
            ..Filter::default()
        };
        let url = self.table_url(collection, &filter)?;
        let response = self
            .request(Method::PATCH, url, self.bearer(session))
            .header("Prefer", "return=representation")
            .json(changes)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn insert(
        &self,
        collection: &str,
        row: &Row,
        session: Option<&SessionTokens>,
    ) -> Result<Row, BackendError> {
        validate_collection(collection)?;
        let url = self.endpoint(&format!("rest/v1/{}", collection))?;
        let response = self
            .request(Method::POST, url, self.bearer(session))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("insert returned no rows".to_string()))
    }

    async fn create_signed_upload_url(
        &self,
        bucket: &str,
        path: &str,
        session: &SessionTokens,
    ) -> Result<SignedUpload, BackendError> {
        let url = self.upload_sign_url(bucket, path)?;
        let response = self
            .request(Method::POST, url, &session.access_token)
            .json(&json!({}))
            .send()
            .await?;
        let signed: SignedUploadResponse = Self::check(response).await?.json().await?;

        // The service answers with a path relative to /storage/v1
        let signed_url = self.endpoint(&format!("storage/v1{}", signed.url))?;
        let token = signed_url
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| BackendError::Decode("signed upload url has no token".to_string()))?;

        Ok(SignedUpload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            signed_url: signed_url.to_string(),
            token,
        })
    }

    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), BackendError> {
        let mut url = self.endpoint("auth/v1/otp")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        let response = self
            .request(Method::POST, url, &self.anon_key)
            .json(&json!({ "email": email, "create_user": true }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
