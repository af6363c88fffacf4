use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_RECONCILIATION_TOLERANCE: f64 = 0.01;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring: ScoringConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Evaluation policy applied by the service layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Maximum gap between recorded and derived score still reported as reconciled.
    pub reconciliation_tolerance: f64,
    /// Refuse review submission while item weights do not total 100%.
    pub require_consistent_weights: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reconciliation_tolerance: DEFAULT_RECONCILIATION_TOLERANCE,
            require_consistent_weights: false,
        }
    }
}

impl ScoringConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut scoring = Self::default();

        if let Ok(raw) = env::var("SRM_RECONCILIATION_TOLERANCE") {
            let tolerance = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value > 0.0)
                .ok_or(ConfigError::InvalidTolerance { value: raw })?;
            scoring.reconciliation_tolerance = tolerance;
        }

        if let Ok(raw) = env::var("SRM_REQUIRE_CONSISTENT_WEIGHTS") {
            scoring.require_consistent_weights = parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                variable: "SRM_REQUIRE_CONSISTENT_WEIGHTS",
                value: raw,
            })?;
        }

        Ok(scoring)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTolerance { value: String },
    InvalidFlag { variable: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTolerance { value } => write!(
                f,
                "SRM_RECONCILIATION_TOLERANCE must be a positive number (found '{}')",
                value
            ),
            ConfigError::InvalidFlag { variable, value } => {
                write!(f, "{} must be true or false (found '{}')", variable, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTolerance { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
