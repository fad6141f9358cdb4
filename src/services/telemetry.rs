use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::TelemetryConfig;

/// Payload accepted by the internal logging endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub event: String,
    pub ts: DateTime<Utc>,
    pub provider_id: Option<String>,
    pub lead_id: Option<String>,
    pub source: Option<String>,
}

impl TelemetryEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ts: Utc::now(),
            provider_id: None,
            lead_id: None,
            source: None,
        }
    }

    pub fn provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    pub fn lead(mut self, lead_id: impl Into<String>) -> Self {
        self.lead_id = Some(lead_id.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Best-effort event shipping. Each event is POSTed from a detached task;
/// delivery is never retried and failures never reach the caller.
#[derive(Clone)]
pub struct Telemetry {
    client: Client,
    endpoint: Option<Arc<str>>,
}

impl Telemetry {
    pub fn from_config(config: &TelemetryConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Telemetry client fell back to defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            endpoint: config.endpoint.as_deref().map(Arc::from),
        }
    }

    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            endpoint: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Fire and forget. The handle is only useful to tests that want to wait for delivery.
    pub fn emit(&self, event: TelemetryEvent) -> Option<JoinHandle<()>> {
        let endpoint = self.endpoint.clone()?;
        let client = self.client.clone();

        Some(tokio::spawn(async move {
            let result = client
                .post(endpoint.as_ref())
                .json(&event)
                .send()
                .await
                .and_then(|response| response.error_for_status());

            match result {
                Ok(_) => tracing::debug!("Telemetry event '{}' delivered", event.event),
                Err(e) => tracing::debug!("Telemetry event '{}' dropped: {}", event.event, e),
            }
        }))
    }
}
