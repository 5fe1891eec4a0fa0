//! Configuration module
//!
//! Environment-driven configuration for the API server and the CLI: database, storage,
//! upload limits, sessions and the transcoding service.

use std::env;

use crate::constants::{DEFAULT_SESSION_COOKIE_NAME, MIN_PASSWORD_HASH_ITERATIONS};
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_IMAGE_SIZE_MB: usize = 10;
const DEFAULT_ALLOWED_IMAGE_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif,image/webp";
const PASSWORD_HASH_ITERATIONS: u32 = 100_000;
const SESSION_TTL_DAYS: i64 = 30;
const SESSION_SWEEP_INTERVAL_SECS: u64 = 3600;
const RECONCILE_SWEEP_INTERVAL_SECS: u64 = 0;
const TRANSCODER_API_URL: &str = "https://api.cloudflare.com/client/v4";
const TRANSCODER_DELIVERY_URL: &str = "https://videodelivery.net";
const TRANSCODER_UPLOAD_TTL_SECS: u64 = 3600;
const TRANSCODER_MAX_DURATION_SECS: u64 = 3600;
const TRANSCODER_TIMEOUT_SECS: u64 = 30;
const TRANSCODER_MAX_UPLOAD_BYTES: u64 = 30 * 1024 * 1024 * 1024;

/// Server-level settings.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Password hashing and session settings.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub password_hash_iterations: u32,
    pub session_ttl_days: i64,
    pub session_cookie_name: String,
    pub secure_cookies: bool,
    /// Interval between expired-session sweeps. 0 = disabled.
    pub session_sweep_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_hash_iterations: PASSWORD_HASH_ITERATIONS,
            session_ttl_days: SESSION_TTL_DAYS,
            session_cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            secure_cookies: false,
            session_sweep_interval_secs: SESSION_SWEEP_INTERVAL_SECS,
        }
    }
}

/// Transcoding service connection settings.
#[derive(Clone, Debug)]
pub struct TranscoderConfig {
    pub api_url: String,
    pub account_id: String,
    pub api_token: String,
    /// Base URL for playback manifests and thumbnails.
    pub delivery_url: String,
    pub upload_ttl_secs: u64,
    pub max_duration_secs: u64,
    /// Largest video a client may announce when asking for an upload ticket.
    pub max_upload_bytes: u64,
    pub timeout_secs: u64,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            api_url: TRANSCODER_API_URL.to_string(),
            account_id: String::new(),
            api_token: String::new(),
            delivery_url: TRANSCODER_DELIVERY_URL.to_string(),
            upload_ttl_secs: TRANSCODER_UPLOAD_TTL_SECS,
            max_duration_secs: TRANSCODER_MAX_DURATION_SECS,
            max_upload_bytes: TRANSCODER_MAX_UPLOAD_BYTES,
            timeout_secs: TRANSCODER_TIMEOUT_SECS,
        }
    }
}

/// Full application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Image upload limits
    pub max_image_size_bytes: usize,
    pub allowed_image_content_types: Vec<String>,
    pub auth: AuthConfig,
    pub transcoder: TranscoderConfig,
    /// Interval between sweeps over non-terminal videos. 0 = disabled.
    pub reconcile_sweep_interval_secs: u64,
}

impl Default for AppConfig {
    /// Development defaults: local storage under `./uploads`, no database URL.
    fn default() -> Self {
        Self {
            base: BaseConfig {
                server_port: 4000,
                cors_origins: vec!["*".to_string()],
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                environment: "development".to_string(),
            },
            database_url: String::new(),
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: Some("./uploads".to_string()),
            local_storage_base_url: Some("http://localhost:4000/media".to_string()),
            max_image_size_bytes: MAX_IMAGE_SIZE_MB * 1024 * 1024,
            allowed_image_content_types: parse_list(DEFAULT_ALLOWED_IMAGE_CONTENT_TYPES),
            auth: AuthConfig::default(),
            transcoder: TranscoderConfig::default(),
            reconcile_sweep_interval_secs: RECONCILE_SWEEP_INTERVAL_SECS,
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().to_lowercase().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";

        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::Local,
        };

        let max_image_size_mb = env::var("MAX_IMAGE_SIZE_MB")
            .unwrap_or_else(|_| MAX_IMAGE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_IMAGE_SIZE_MB);

        let auth = AuthConfig {
            password_hash_iterations: env::var("PASSWORD_HASH_ITERATIONS")
                .unwrap_or_else(|_| PASSWORD_HASH_ITERATIONS.to_string())
                .parse()
                .unwrap_or(PASSWORD_HASH_ITERATIONS),
            session_ttl_days: env::var("SESSION_TTL_DAYS")
                .unwrap_or_else(|_| SESSION_TTL_DAYS.to_string())
                .parse()
                .unwrap_or(SESSION_TTL_DAYS),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE_NAME.to_string()),
            secure_cookies: parse_bool("SECURE_COOKIES", is_production),
            session_sweep_interval_secs: env::var("SESSION_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| SESSION_SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(SESSION_SWEEP_INTERVAL_SECS),
        };

        let transcoder = TranscoderConfig {
            api_url: env::var("TRANSCODER_API_URL")
                .unwrap_or_else(|_| TRANSCODER_API_URL.to_string()),
            account_id: env::var("TRANSCODER_ACCOUNT_ID").unwrap_or_default(),
            api_token: env::var("TRANSCODER_API_TOKEN").unwrap_or_default(),
            delivery_url: env::var("TRANSCODER_DELIVERY_URL")
                .unwrap_or_else(|_| TRANSCODER_DELIVERY_URL.to_string()),
            upload_ttl_secs: env::var("TRANSCODER_UPLOAD_TTL_SECS")
                .unwrap_or_else(|_| TRANSCODER_UPLOAD_TTL_SECS.to_string())
                .parse()
                .unwrap_or(TRANSCODER_UPLOAD_TTL_SECS),
            max_duration_secs: env::var("TRANSCODER_MAX_DURATION_SECS")
                .unwrap_or_else(|_| TRANSCODER_MAX_DURATION_SECS.to_string())
                .parse()
                .unwrap_or(TRANSCODER_MAX_DURATION_SECS),
            max_upload_bytes: env::var("TRANSCODER_MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| TRANSCODER_MAX_UPLOAD_BYTES.to_string())
                .parse()
                .unwrap_or(TRANSCODER_MAX_UPLOAD_BYTES),
            timeout_secs: env::var("TRANSCODER_TIMEOUT_SECS")
                .unwrap_or_else(|_| TRANSCODER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TRANSCODER_TIMEOUT_SECS),
        };

        let config = AppConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            max_image_size_bytes: max_image_size_mb * 1024 * 1024,
            allowed_image_content_types: parse_list(
                &env::var("ALLOWED_IMAGE_CONTENT_TYPES")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_IMAGE_CONTENT_TYPES.to_string()),
            ),
            auth,
            transcoder,
            reconcile_sweep_interval_secs: env::var("RECONCILE_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| RECONCILE_SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(RECONCILE_SWEEP_INTERVAL_SECS),
        };

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.trim().is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL must not be empty"));
        }

        if self.auth.password_hash_iterations < MIN_PASSWORD_HASH_ITERATIONS {
            return Err(anyhow::anyhow!(
                "PASSWORD_HASH_ITERATIONS must be at least {}",
                MIN_PASSWORD_HASH_ITERATIONS
            ));
        }

        if self.auth.session_ttl_days <= 0 {
            return Err(anyhow::anyhow!("SESSION_TTL_DAYS must be positive"));
        }

        if self.auth.session_cookie_name.trim().is_empty() {
            return Err(anyhow::anyhow!("SESSION_COOKIE_NAME must not be empty"));
        }

        if self.max_image_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_IMAGE_SIZE_MB must be positive"));
        }

        if self.allowed_image_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_IMAGE_CONTENT_TYPES must list at least one content type"
            ));
        }

        if let Some(bad) = self
            .allowed_image_content_types
            .iter()
            .find(|ct| !ct.starts_with("image/"))
        {
            return Err(anyhow::anyhow!(
                "ALLOWED_IMAGE_CONTENT_TYPES may only contain image types, got {}",
                bad
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.as_deref().unwrap_or("").is_empty() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.as_deref().unwrap_or("").is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
        }

        if self.transcoder.upload_ttl_secs == 0 {
            return Err(anyhow::anyhow!("TRANSCODER_UPLOAD_TTL_SECS must be positive"));
        }

        if self.is_production() {
            if self.transcoder.account_id.is_empty() || self.transcoder.api_token.is_empty() {
                return Err(anyhow::anyhow!(
                    "TRANSCODER_ACCOUNT_ID and TRANSCODER_API_TOKEN must be set in production"
                ));
            }
            if self.base.cors_origins.iter().any(|o| o == "*") {
                return Err(anyhow::anyhow!(
                    "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
                ));
            }
        }

        Ok(())
    }
}

/// Application configuration handle shared across the server and CLI.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn inner(&self) -> &AppConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = AppConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn is_production(&self) -> bool {
        self.inner().is_production()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn max_image_size_bytes(&self) -> usize {
        self.inner().max_image_size_bytes
    }

    pub fn allowed_image_content_types(&self) -> &[String] {
        &self.inner().allowed_image_content_types
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.inner().auth
    }

    pub fn transcoder(&self) -> &TranscoderConfig {
        &self.inner().transcoder
    }

    pub fn session_sweep_interval_secs(&self) -> u64 {
        self.inner().auth.session_sweep_interval_secs
    }

    pub fn reconcile_sweep_interval_secs(&self) -> u64 {
        self.inner().reconcile_sweep_interval_secs
    }
}

impl From<AppConfig> for Config {
    fn from(config: AppConfig) -> Self {
        Config(Box::new(config))
    }
}
