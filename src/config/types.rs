// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub tunnel: Option<TunnelConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log file path (stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            show_headers: false,
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            max_connections: None,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enable_cors: bool,
    pub max_body_size: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enable_cors: false,
            max_body_size: 10_485_760, // 10MB
        }
    }
}

/// Routes configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// Index document appended when a path resolves to a directory
    #[serde(default = "default_index_file")]
    pub index_file: String,
    /// Health check configuration
    #[serde(default)]
    pub health: HealthConfig,
    /// Mounted routes: path prefix -> handler
    #[serde(default)]
    pub custom_routes: HashMap<String, RouteConfig>,
}

fn default_index_file() -> String {
    "index.html".to_string()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            index_file: default_index_file(),
            health: HealthConfig::default(),
            custom_routes: HashMap::new(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
    /// Readiness probe path (default: /readyz)
    #[serde(default = "default_readyz_path")]
    pub readiness_path: String,
}

fn default_health_enabled() -> bool {
    true
}

fn default_healthz_path() -> String {
    "/healthz".to_string()
}

fn default_readyz_path() -> String {
    "/readyz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
            readiness_path: default_readyz_path(),
        }
    }
}

/// Route handler types
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteConfig {
    /// Static files with an optional single-file fallback tier
    Files {
        root: String,
        #[serde(default)]
        fallback: Option<String>,
    },
    /// Static files delegating misses to a fixed entry document
    Spa {
        root: String,
        entry: String,
        #[serde(default)]
        content_type: Option<String>,
    },
    /// Constant responder serving one fixed document for every request
    Content {
        file: String,
        #[serde(default)]
        content_type: Option<String>,
    },
}

/// WebSocket tunnel configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TunnelConfig {
    /// Backend URL; only host and port are used, transport is plain TCP
    pub backend: String,
}
