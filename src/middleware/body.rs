use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Request body accepted either as JSON or as `application/x-www-form-urlencoded`.
///
/// An empty JSON body deserializes as `{}` so handlers report their own missing fields.
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            return Ok(Self(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let parsed = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_slice(b"{}")
        } else {
            serde_json::from_slice(&bytes)
        };

        parsed
            .map(Self)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Input {
        id: Option<String>,
        published: Option<bool>,
    }

    async fn parse(content_type: Option<&str>, body: &'static str) -> Result<Input, ApiError> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        let req = builder.body(Body::from(body)).unwrap();
        JsonOrForm::<Input>::from_request(req, &()).await.map(|JsonOrForm(v)| v)
    }

    #[tokio::test]
    async fn accepts_json() {
        let input = parse(Some("application/json"), r#"{"id":"L1","published":true}"#).await.unwrap();
        assert_eq!(input.id.as_deref(), Some("L1"));
        assert_eq!(input.published, Some(true));
    }

    #[tokio::test]
    async fn accepts_form() {
        let input = parse(Some("application/x-www-form-urlencoded"), "id=L1&published=false").await.unwrap();
        assert_eq!(input.id.as_deref(), Some("L1"));
        assert_eq!(input.published, Some(false));
    }

    #[tokio::test]
    async fn empty_body_is_empty_object() {
        let input = parse(None, "").await.unwrap();
        assert!(input.id.is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let err = parse(Some("application/json"), "{id:").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
