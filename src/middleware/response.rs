use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Success envelope: `{ "ok": true, ...payload }`.
///
/// Object payloads are flattened next to `ok`; `()` yields a bare acknowledgment;
/// any other value lands under `data`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
        }
    }

    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data,
            status_code: Some(status_code),
        }
    }

    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }
}

impl ApiResponse<()> {
    /// `{ "ok": true }`
    pub fn ack() -> Self {
        Self::success(())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "ok": false,
                        "error": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        (status, Json(envelope(data_value))).into_response()
    }
}

fn envelope(data: Value) -> Value {
    let mut body = Map::new();
    body.insert("ok".to_string(), Value::Bool(true));
    match data {
        Value::Null => {}
        Value::Object(fields) => {
            for (key, value) in fields {
                if key != "ok" {
                    body.insert(key, value);
                }
            }
        }
        other => {
            body.insert("data".to_string(), other);
        }
    }
    Value::Object(body)
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_object_payloads() {
        assert_eq!(
            envelope(json!({"leads": [], "ok": false})),
            json!({"ok": true, "leads": []})
        );
    }

    #[test]
    fn unit_is_bare_ack() {
        assert_eq!(envelope(Value::Null), json!({"ok": true}));
    }

    #[test]
    fn scalars_go_under_data() {
        assert_eq!(envelope(json!(3)), json!({"ok": true, "data": 3}));
    }
}
