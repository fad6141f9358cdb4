use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub telemetry: TelemetryConfig,
    pub site: SiteConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted Supabase-style service over HTTP
    Rest,
    /// In-process store, for local development and tests
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rest" | "supabase" => Ok(BackendKind::Rest),
            "memory" | "mem" => Ok(BackendKind::Memory),
            other => Err(format!("unknown backend kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: String,
    pub anon_key: String,
    /// Used for public writes (lead capture). Falls back to the anon key.
    pub service_role_key: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Internal logging endpoint. `None` disables telemetry entirely.
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::preset(Self::environment_from_env()).with_env_overrides()
    }

    /// Load a YAML config file on top of the environment preset, then apply env overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config = Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        Ok(config.with_env_overrides())
    }

    /// Parse a (possibly partial) YAML document. Missing sections take the preset values.
    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        let overlay: serde_yaml::Value = serde_yaml::from_str(raw)?;

        let environment = overlay
            .get("environment")
            .cloned()
            .map(serde_yaml::from_value::<Environment>)
            .transpose()?
            .unwrap_or_else(Self::environment_from_env);

        let mut base = serde_yaml::to_value(Self::preset(environment))?;
        merge_yaml(&mut base, overlay);
        serde_yaml::from_value(base)
    }

    fn environment_from_env() -> Environment {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }

    pub fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Backend overrides
        if let Ok(v) = env::var("BACKEND_KIND") {
            self.backend.kind = v.parse().unwrap_or(self.backend.kind);
        }
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.backend.url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.backend.anon_key = v;
        }
        if let Ok(v) = env::var("SUPABASE_SERVICE_ROLE_KEY") {
            self.backend.service_role_key = Some(v).filter(|k| !k.is_empty());
        }
        if let Ok(v) = env::var("BACKEND_TIMEOUT_SECS") {
            self.backend.request_timeout_secs = v.parse().unwrap_or(self.backend.request_timeout_secs);
        }

        // Telemetry overrides
        if let Ok(v) = env::var("TELEMETRY_URL") {
            self.telemetry.endpoint = Some(v).filter(|u| !u.is_empty());
        }
        if let Ok(v) = env::var("TELEMETRY_TIMEOUT_MS") {
            self.telemetry.timeout_ms = v.parse().unwrap_or(self.telemetry.timeout_ms);
        }

        // Site and storage overrides
        if let Ok(v) = env::var("SITE_URL") {
            self.site.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.storage.bucket = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            backend: BackendConfig {
                kind: BackendKind::Memory,
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                service_role_key: None,
                request_timeout_secs: 30,
            },
            telemetry: TelemetryConfig {
                endpoint: None,
                timeout_ms: 2000,
            },
            site: SiteConfig {
                base_url: "http://localhost:3000".to_string(),
            },
            storage: StorageConfig {
                bucket: "dentist-media".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                cookie_secure: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            backend: BackendConfig {
                kind: BackendKind::Rest,
                url: String::new(),
                anon_key: String::new(),
                service_role_key: None,
                request_timeout_secs: 15,
            },
            telemetry: TelemetryConfig {
                endpoint: None,
                timeout_ms: 1500,
            },
            site: SiteConfig {
                base_url: "https://staging.example.com".to_string(),
            },
            storage: StorageConfig {
                bucket: "dentist-media".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                cookie_secure: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            backend: BackendConfig {
                kind: BackendKind::Rest,
                url: String::new(),
                anon_key: String::new(),
                service_role_key: None,
                request_timeout_secs: 10,
            },
            telemetry: TelemetryConfig {
                endpoint: None,
                timeout_ms: 1000,
            },
            site: SiteConfig {
                base_url: "https://app.example.com".to_string(),
            },
            storage: StorageConfig {
                bucket: "dentist-media".to_string(),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                cookie_secure: true,
            },
        }
    }
}

/// Recursively overlay `overlay` mappings onto `base`; non-mapping values replace.
fn merge_yaml(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, serde_yaml::Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

// Global singleton config for the binary - handlers receive config through AppState
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    ($config:expr) => {
        matches!($config.environment, $crate::config::Environment::Production)
    };
}
