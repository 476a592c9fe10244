use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub points: PointsConfig,
    #[serde(default)]
    pub blocks: BlocksConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub otel: OtelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointsConfig {
    /// `memory` or `postgres`
    #[serde(default = "default_backend")]
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlocksConfig {
    /// `memory` or `postgres`
    #[serde(default = "default_backend")]
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    /// Idle time before a session expires, in seconds
    #[serde(default = "default_session_timeout")]
    pub session_timeout: u64,
    /// Reaper sweep interval in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,
    /// How long an expiry notice stays retrievable, in seconds
    #[serde(default = "default_tombstone_ttl")]
    pub tombstone_ttl: u64,
    #[serde(default = "default_max_components")]
    pub max_components: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_pool_size() -> u32 {
    10
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_idle_timeout() -> u32 {
    600
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_session_timeout() -> u64 {
    900 // 15 minutes
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_tombstone_ttl() -> u64 {
    3600 // 1 hour
}

fn default_max_components() -> usize {
    40
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "amayo-display-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8082)?
            .set_default("points.backend", "memory")?
            .set_default("blocks.backend", "memory")?
            .set_default("editor.session_timeout", 900)?
            .set_default("editor.sweep_interval", 30)?
            .set_default("editor.tombstone_ttl", 3600)?
            .set_default("editor.max_components", 40)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER_PORT, JWT_SECRET, DATABASE_URL, POINTS_BACKEND, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(","),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl EditorConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }

    pub fn tombstone_ttl(&self) -> Duration {
        Duration::from_secs(self.tombstone_ttl)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            session_timeout: default_session_timeout(),
            sweep_interval: default_sweep_interval(),
            tombstone_ttl: default_tombstone_ttl(),
            max_components: default_max_components(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
