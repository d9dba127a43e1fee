//! Server configuration

use std::path::PathBuf;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
///
/// | Env var | Default | Meaning |
/// |---------|---------|---------|
/// | MANDI_WORK_DIR | ./data | directory for the redb database file |
/// | HTTP_PORT | 8080 | HTTP listen port |
/// | JWT_SECRET | (required outside development) | HS256 signing secret |
/// | JWT_EXPIRY_HOURS | 24 | token validity |
/// | OFFER_SWEEP_INTERVAL_SECS | 300 | offer expiry sweep cadence |
/// | PAYMENT_FAILURE_RATE | 0.05 | simulated provider decline rate |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_DIR | (unset) | daily-rolling file logs when set |
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the redb database file
    pub work_dir: String,
    /// HTTP port
    pub http_port: u16,
    /// JWT signing secret
    pub jwt_secret: String,
    /// JWT validity in hours
    pub jwt_expiry_hours: i64,
    /// Offer expiry sweep cadence in seconds
    pub offer_sweep_interval_secs: u64,
    /// Simulated payment provider decline rate, 0.0 to 1.0
    pub payment_failure_rate: f64,
    /// Environment: development | staging | production
    pub environment: String,
    /// Optional log directory for daily-rolling file output
    pub log_dir: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            work_dir: std::env::var("MANDI_WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiry_hours: std::env::var("JWT_EXPIRY_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            offer_sweep_interval_secs: std::env::var("OFFER_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            payment_failure_rate: std::env::var("PAYMENT_FAILURE_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.05),
            environment,
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
        })
    }

    /// Test / embedded constructor that skips the environment entirely.
    pub fn with_overrides(work_dir: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port: 0,
            jwt_secret: jwt_secret.into(),
            jwt_expiry_hours: 24,
            offer_sweep_interval_secs: 300,
            payment_failure_rate: 0.0,
            environment: "development".into(),
            log_dir: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Directory holding the redb database file
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// Path of the redb database file
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("market.redb")
    }

    /// Create the work directory structure if missing
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        if let Some(log_dir) = &self.log_dir {
            std::fs::create_dir_all(log_dir)?;
        }
        Ok(())
    }
}
