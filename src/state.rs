use std::sync::Arc;

use crate::backend::Backend;
use crate::config::AppConfig;
use crate::services::{Revalidator, Telemetry};

/// Everything a handler needs, passed explicitly through the router.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: Arc<dyn Backend>,
    pub telemetry: Telemetry,
    pub revalidator: Revalidator,
}

impl AppState {
    pub fn new(config: AppConfig, backend: Arc<dyn Backend>) -> Self {
        let telemetry = Telemetry::from_config(&config.telemetry);
        Self {
            config: Arc::new(config),
            backend,
            telemetry,
            revalidator: Revalidator::default(),
        }
    }
}
