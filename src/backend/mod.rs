//! The hosted database-as-a-service collaborator.
//!
//! Handlers never construct clients themselves: an `Arc<dyn Backend>` travels in
//! [`AppState`](crate::state::AppState) and every call carries the caller's session
//! explicitly. Every operation is a single remote call that yields data or a
//! [`BackendError`] whose display string is the collaborator's own message.

pub mod memory;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::SessionTokens;
use crate::config::{BackendConfig, BackendKind};
use crate::filter::{Condition, Filter, FilterError};

pub use memory::{BackendCall, MemoryBackend};
pub use rest::RestBackend;

/// Row payload exchanged with the store.
pub type Row = Map<String, Value>;

/// Text form of a row column; numeric ids are rendered as strings.
pub fn string_field(row: &Row, key: &str) -> Option<String> {
    match row.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// User as resolved by the collaborator from a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUpload {
    pub bucket: String,
    pub path: String,
    pub signed_url: String,
    pub token: String,
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// Error reported by the collaborator; the message is passed through verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from backend: {0}")]
    Decode(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Backend misconfigured: {0}")]
    Config(String),
}

impl BackendError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        BackendError::Api { status, message: message.into() }
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs and health output.
    fn name(&self) -> &'static str;

    /// Resolve the user behind a session. `Ok(None)` means the session is not valid.
    async fn get_user(&self, session: &SessionTokens) -> Result<Option<AuthUser>, BackendError>;

    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        session: Option<&SessionTokens>,
    ) -> Result<Vec<Row>, BackendError>;

    /// Apply `changes` to every row matching `conditions`; returns the updated rows.
    async fn update(
        &self,
        collection: &str,
        changes: &Row,
        conditions: &[Condition],
        session: Option<&SessionTokens>,
    ) -> Result<Vec<Row>, BackendError>;

    /// Insert one row; returns it as stored (with generated columns).
    async fn insert(
        &self,
        collection: &str,
        row: &Row,
        session: Option<&SessionTokens>,
    ) -> Result<Row, BackendError>;

    async fn create_signed_upload_url(
        &self,
        bucket: &str,
        path: &str,
        session: &SessionTokens,
    ) -> Result<SignedUpload, BackendError>;

    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), BackendError>;
}

/// Build the configured backend.
pub fn from_config(config: &BackendConfig) -> Result<Arc<dyn Backend>, BackendError> {
    match config.kind {
        BackendKind::Rest => Ok(Arc::new(RestBackend::new(config)?)),
        BackendKind::Memory => {
            tracing::warn!("Using in-memory backend; data is not persisted");
            Ok(Arc::new(MemoryBackend::new(config.url.clone())))
        }
    }
}
