use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub jwt_expiry_secs: u64,
    pub bcrypt_cost: u32,
    pub verification_code_ttl_secs: u64,
    pub verification_sweep_secs: u64,
    pub verification_capacity: usize,
    pub frontend_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiry_secs", &self.jwt_expiry_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("verification_code_ttl_secs", &self.verification_code_ttl_secs)
            .field("verification_sweep_secs", &self.verification_sweep_secs)
            .field("verification_capacity", &self.verification_capacity)
            .field("frontend_url", &self.frontend_url)
            .finish()
    }
}

/// Settings the application service needs for credentials and tokens.
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: parse_or("PORT", 5001),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string()), // Use a secure secret in production
            jwt_expiry_secs: parse_or("JWT_EXPIRY_SECS", 7 * 24 * 3600),
            bcrypt_cost: parse_or("BCRYPT_COST", 12),
            verification_code_ttl_secs: parse_or("VERIFICATION_CODE_TTL_SECS", 600),
            verification_sweep_secs: parse_or("VERIFICATION_SWEEP_SECS", 300),
            verification_capacity: parse_or("VERIFICATION_CAPACITY", 10_000),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl: Duration::from_secs(self.jwt_expiry_secs),
            bcrypt_cost: self.bcrypt_cost,
        }
    }

    pub fn verification_code_ttl(&self) -> Duration {
        Duration::from_secs(self.verification_code_ttl_secs)
    }

    pub fn verification_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.verification_sweep_secs.max(1))
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
