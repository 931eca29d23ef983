use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::str::FromStr;

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
    /// Offset from UTC used to decide which calendar day an activity belongs to.
    pub timezone_offset_minutes: i32,
    pub seed_database: bool,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 3000)?;
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());
        let session_ttl_hours = parse_var("SESSION_TTL_HOURS", 24 * 7)?;
        let cookie_secure = parse_var("COOKIE_SECURE", environment == "production")?;
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        let timezone_offset_minutes = parse_var("TIMEZONE_OFFSET_MINUTES", 60)?;
        let seed_database = parse_var("SEED_DATABASE", false)?;
        let admin_email = env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty());
        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty());

        let config = AppConfig {
            host,
            port,
            environment,
            log_level,
            jwt_secret,
            session_ttl_hours,
            cookie_secure,
            cors_origins,
            bcrypt_cost,
            timezone_offset_minutes,
            seed_database,
            admin_email,
            admin_password,
        };
        config.validate()?;

        Ok(config)
    }

    /// Settings suitable for tests and local tooling: cheap hashing, no secure cookies.
    pub fn for_testing() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            jwt_secret: "test_secret_key_for_testing_only".to_string(),
            session_ttl_hours: 24,
            cookie_secure: false,
            cors_origins: vec!["http://localhost:5173".to_string()],
            bcrypt_cost: 4,
            timezone_offset_minutes: 0,
            seed_database: false,
            admin_email: None,
            admin_password: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }
        if self.session_ttl_hours <= 0 {
            bail!("SESSION_TTL_HOURS must be positive");
        }
        if self.timezone_offset_minutes.abs() >= 24 * 60 {
            bail!("TIMEZONE_OFFSET_MINUTES must be within one day");
        }
        if self.is_production()
            && (self.jwt_secret == DEFAULT_JWT_SECRET || self.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN)
        {
            bail!("JWT_SECRET must be set to at least {MIN_PRODUCTION_SECRET_LEN} characters in production");
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testing_config_is_valid() {
        let config = AppConfig::for_testing();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_address(), "127.0.0.1:0");
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let mut config = AppConfig::for_testing();
        config.environment = "production".to_string();
        config.jwt_secret = DEFAULT_JWT_SECRET.to_string();
        assert!(config.validate().is_err());

        config.jwt_secret = "x".repeat(48);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let mut config = AppConfig::for_testing();
        config.bcrypt_cost = 2;
        assert!(config.validate().is_err());
    }
}
