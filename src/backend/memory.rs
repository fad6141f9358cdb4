use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{AuthUser, Backend, BackendError, Row, SignedUpload};
use crate::auth::SessionTokens;
use crate::filter::{validate_collection, Condition, Filter, FilterOrder, FilterWhere};

/// Oldest calls are dropped once the journal holds this many.
pub const JOURNAL_CAPACITY: usize = 1024;

/// Columns the hosted store keeps unique, per collection.
const UNIQUE_COLUMNS: &[(&str, &str)] = &[("dentists", "slug")];

/// Access-token claims for sessions minted by the in-memory backend
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    exp: i64,
    iat: i64,
}

/// Every call the backend received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    GetUser,
    Select { collection: String, filter: Filter },
    Update { collection: String, changes: Row, conditions: Vec<Condition> },
    Insert { collection: String, row: Row },
    SignedUpload { bucket: String, path: String },
    MagicLink { email: String, redirect_to: String },
}

impl BackendCall {
    pub fn is_write(&self) -> bool {
        matches!(self, BackendCall::Update { .. } | BackendCall::Insert { .. })
    }
}

/// In-process stand-in for the hosted service: JSON rows per collection,
/// HS256 session tokens, and a journal of received calls.
pub struct MemoryBackend {
    base_url: String,
    secret: String,
    users: RwLock<HashMap<String, AuthUser>>,
    collections: RwLock<HashMap<String, Vec<Row>>>,
    journal: Mutex<VecDeque<BackendCall>>,
    failure: Mutex<Option<InjectedFailure>>,
}

struct InjectedFailure {
    message: String,
    /// Session lookups keep working, so handlers get past authentication.
    spare_auth: bool,
}

impl MemoryBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: Uuid::new_v4().simple().to_string(),
            users: RwLock::new(HashMap::new()),
            collections: RwLock::new(HashMap::new()),
            journal: Mutex::new(VecDeque::with_capacity(JOURNAL_CAPACITY)),
            failure: Mutex::new(None),
        }
    }

    pub async fn register_user(&self, id: impl Into<String>, email: Option<&str>) -> AuthUser {
        let user = AuthUser {
            id: id.into(),
            email: email.map(str::to_string),
        };
        self.users.write().await.insert(user.id.clone(), user.clone());
        user
    }

    async fn find_or_register(&self, email: &str) -> AuthUser {
        let existing = self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned();
        match existing {
            Some(user) => user,
            None => self.register_user(Uuid::new_v4().to_string(), Some(email)).await,
        }
    }

    pub fn issue_session(&self, user: &AuthUser) -> SessionTokens {
        self.issue_session_with_ttl(user, Duration::hours(1))
    }

    pub fn issue_session_with_ttl(&self, user: &AuthUser, ttl: Duration) -> SessionTokens {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        let key = EncodingKey::from_secret(self.secret.as_bytes());
        // HS256 over a serializable struct cannot fail
        let access_token = encode(&Header::default(), &claims, &key).unwrap_or_default();
        SessionTokens::new(access_token, Some(Uuid::new_v4().simple().to_string()))
    }

    /// Replace the contents of a collection.
    pub async fn seed(&self, collection: &str, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.collections.write().await.insert(collection.to_string(), rows);
    }

    pub async fn rows(&self, collection: &str) -> Vec<Row> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// The most recent calls, oldest first, at most [`JOURNAL_CAPACITY`].
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.journal.lock().await.iter().cloned().collect()
    }

    pub async fn magic_links(&self) -> Vec<(String, String)> {
        self.journal
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                BackendCall::MagicLink { email, redirect_to } => Some((email.clone(), redirect_to.clone())),
                _ => None,
            })
            .collect()
    }

    /// Make every following call fail with `message` until [`clear_failure`](Self::clear_failure).
    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().await = Some(InjectedFailure {
            message: message.into(),
            spare_auth: false,
        });
    }

    /// Like [`fail_with`](Self::fail_with) but sessions still resolve.
    pub async fn fail_data_with(&self, message: impl Into<String>) {
        *self.failure.lock().await = Some(InjectedFailure {
            message: message.into(),
            spare_auth: true,
        });
    }

    pub async fn clear_failure(&self) {
        *self.failure.lock().await = None;
    }

    async fn record(&self, call: BackendCall) -> Result<(), BackendError> {
        let is_auth = call == BackendCall::GetUser;
        {
            let mut journal = self.journal.lock().await;
            if journal.len() == JOURNAL_CAPACITY {
                journal.pop_front();
            }
            journal.push_back(call);
        }
        match self.failure.lock().await.as_ref() {
            Some(failure) if !(failure.spare_auth && is_auth) => {
                Err(BackendError::api(500, failure.message.clone()))
            }
            _ => Ok(()),
        }
    }

    fn sign_upload(&self, bucket: &str, path: &str, expires_at: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(bucket.as_bytes());
        hasher.update(b":");
        hasher.update(path.as_bytes());
        hasher.update(b":");
        hasher.update(expires_at.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_user(&self, session: &SessionTokens) -> Result<Option<AuthUser>, BackendError> {
        self.record(BackendCall::GetUser).await?;

        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let claims = match decode::<Claims>(&session.access_token, &key, &Validation::default()) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                return Ok(None);
            }
        };

        Ok(self.users.read().await.get(&claims.sub).cloned())
    }

    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        _session: Option<&SessionTokens>,
    ) -> Result<Vec<Row>, BackendError> {
        validate_collection(collection)?;
        filter.validate()?;
        self.record(BackendCall::Select {
            collection: collection.to_string(),
            filter: filter.clone(),
        })
        .await?;

        let collections = self.collections.read().await;
        let mut rows: Vec<Row> = collections
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| FilterWhere::matches(row, &filter.conditions))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        FilterOrder::sort_rows(&mut rows, &filter.order);
        if let Some(limit) = filter.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update(
        &self,
        collection: &str,
        changes: &Row,
        conditions: &[Condition],
        _session: Option<&SessionTokens>,
    ) -> Result<Vec<Row>, BackendError> {
        validate_collection(collection)?;
        for condition in conditions {
            condition.validate()?;
        }
        self.record(BackendCall::Update {
            collection: collection.to_string(),
            changes: changes.clone(),
            conditions: conditions.to_vec(),
        })
        .await?;

        let mut collections = self.collections.write().await;
        let mut updated = Vec::new();
        if let Some(rows) = collections.get_mut(collection) {
            for row in rows.iter_mut().filter(|row| FilterWhere::matches(row, conditions)) {
                for (key, value) in changes {
                    row.insert(key.clone(), value.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn insert(
        &self,
        collection: &str,
        row: &Row,
        _session: Option<&SessionTokens>,
    ) -> Result<Row, BackendError> {
        validate_collection(collection)?;
        self.record(BackendCall::Insert {
            collection: collection.to_string(),
            row: row.clone(),
        })
        .await?;

        let mut stored = row.clone();
        stored
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        stored
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let mut collections = self.collections.write().await;
        let rows = collections.entry(collection.to_string()).or_default();
        for (table, column) in UNIQUE_COLUMNS.iter().filter(|(table, _)| *table == collection) {
            let Some(value) = stored.get(*column).filter(|v| !v.is_null()) else {
                continue;
            };
            if rows.iter().any(|existing| existing.get(*column) == Some(value)) {
                return Err(BackendError::api(
                    409,
                    format!("duplicate key value violates unique constraint \"{}_{}_key\"", table, column),
                ));
            }
        }
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn create_signed_upload_url(
        &self,
        bucket: &str,
        path: &str,
        _session: &SessionTokens,
    ) -> Result<SignedUpload, BackendError> {
        self.record(BackendCall::SignedUpload {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
        .await?;

        let expires_at = (Utc::now() + Duration::hours(2)).timestamp();
        let token = self.sign_upload(bucket, path, expires_at);
        Ok(SignedUpload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            signed_url: format!(
                "{}/storage/v1/object/upload/sign/{}/{}?token={}",
                self.base_url, bucket, path, token
            ),
            token,
        })
    }

    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), BackendError> {
        self.record(BackendCall::MagicLink {
            email: email.to_string(),
            redirect_to: redirect_to.to_string(),
        })
        .await?;

        // No mail delivery here: sign-in is completed by following the link logged at debug level
        let user = self.find_or_register(email).await;
        let session = self.issue_session(&user);
        let separator = if redirect_to.contains('?') { '&' } else { '?' };
        tracing::debug!(
            "Magic link for {}: {}{}access_token={}&refresh_token={}",
            email,
            redirect_to,
            separator,
            session.access_token,
            session.refresh_token.unwrap_or_default()
        );
        Ok(())
    }
}
