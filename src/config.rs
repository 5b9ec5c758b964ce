use std::env;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Chapa payment gateway configuration
#[derive(Debug, Clone)]
pub struct ChapaConfig {
    pub secret_key: String,
    pub base_url: String,
    pub webhook_hash: String,
    pub timeout_secs: u64,
    pub currency: String,
}

/// Outbound email configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// HTTP relay that accepts JSON messages. `None` means emails are only logged.
    pub relay_url: Option<String>,
    pub from_address: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub chapa: ChapaConfig,
    pub mail: MailConfig,
    pub log_level: String,
    pub http_host: String,
    pub http_port: u16,
    pub environment: String,
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable is required")?;

        let max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10u32);
        let acquire_timeout_secs = parse_env("DATABASE_ACQUIRE_TIMEOUT_SECS", 30u64);
        let idle_timeout_secs = parse_env("DATABASE_IDLE_TIMEOUT_SECS", 600u64); // 10 minutes
        let max_lifetime_secs = parse_env("DATABASE_MAX_LIFETIME_SECS", 1800u64); // 30 minutes
        let test_before_acquire = parse_env("DATABASE_TEST_BEFORE_ACQUIRE", true);

        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
        })
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/travel".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl ChapaConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.chapa.co/v1";

    /// Create gateway config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let secret_key = env::var("CHAPA_SECRET_KEY")
            .map_err(|_| "CHAPA_SECRET_KEY environment variable is required")?;
        let webhook_hash = env::var("CHAPA_WEBHOOK_HASH")
            .map_err(|_| "CHAPA_WEBHOOK_HASH environment variable is required")?;

        let base_url = env::var("CHAPA_BASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = parse_env("CHAPA_TIMEOUT_SECS", 30u64);
        let currency = env::var("PAYMENT_CURRENCY")
            .unwrap_or_else(|_| "ETB".to_string())
            .to_uppercase();

        if secret_key.trim().is_empty() {
            return Err("CHAPA_SECRET_KEY must not be empty".to_string());
        }
        if webhook_hash.trim().is_empty() {
            return Err("CHAPA_WEBHOOK_HASH must not be empty".to_string());
        }
        if currency.len() != 3 {
            return Err(format!("Invalid PAYMENT_CURRENCY: {}. Must be a 3-letter code", currency));
        }

        Ok(Self {
            secret_key,
            base_url,
            webhook_hash,
            timeout_secs,
            currency,
        })
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ChapaConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            webhook_hash: String::new(),
            timeout_secs: 30,
            currency: "ETB".to_string(),
        }
    }
}

impl MailConfig {
    pub fn from_env() -> Self {
        Self {
            relay_url: env::var("MAIL_RELAY_URL").ok().filter(|s| !s.trim().is_empty()),
            from_address: env::var("DEFAULT_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@travel.local".to_string()),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            from_address: "noreply@travel.local".to_string(),
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig::from_env()?;
        let chapa = ChapaConfig::from_env()?;
        let mail = MailConfig::from_env();

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let http_host = env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let http_port = parse_env("HTTP_PORT", 8000u16);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        Ok(Self {
            database,
            chapa,
            mail,
            log_level: log_level.to_lowercase(),
            http_host,
            http_port,
            environment: environment.to_lowercase(),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Address the HTTP server binds to
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            chapa: ChapaConfig::default(),
            mail: MailConfig::default(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8000,
            environment: "development".to_string(),
        }
    }
}
