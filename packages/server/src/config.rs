use anyhow::{Context, Result};
use chrono::Duration;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    pub receipt_storage_dir: PathBuf,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
    pub otp_policy: OtpPolicy,
    pub rate_limit_enabled: bool,
    pub admin_bootstrap: Option<AdminBootstrap>,
}

/// Lifetimes and limits applied to one-time codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub ttl: Duration,
    pub max_attempts: i32,
    pub resend_cooldown: Duration,
    /// How long a verified receipt gate stays usable
    pub gate_ttl: Duration,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(300),
            max_attempts: 5,
            resend_cooldown: Duration::seconds(30),
            gate_ttl: Duration::seconds(900),
        }
    }
}

/// First administrator, created at startup when absent.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = OtpPolicy::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_var("PORT", 8080)?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "chamber".to_string()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID")
                .context("TWILIO_ACCOUNT_SID must be set")?,
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .context("TWILIO_AUTH_TOKEN must be set")?,
            twilio_from_number: env::var("TWILIO_FROM_NUMBER")
                .context("TWILIO_FROM_NUMBER must be set")?,
            receipt_storage_dir: env::var("RECEIPT_STORAGE_DIR")
                .unwrap_or_else(|_| "./storage".to_string())
                .into(),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            otp_policy: OtpPolicy {
                ttl: Duration::seconds(parse_var(
                    "OTP_TTL_SECONDS",
                    defaults.ttl.num_seconds(),
                )?),
                max_attempts: parse_var("OTP_MAX_ATTEMPTS", defaults.max_attempts)?,
                resend_cooldown: Duration::seconds(parse_var(
                    "OTP_RESEND_COOLDOWN_SECONDS",
                    defaults.resend_cooldown.num_seconds(),
                )?),
                gate_ttl: Duration::seconds(parse_var(
                    "RECEIPT_GATE_TTL_SECONDS",
                    defaults.gate_ttl.num_seconds(),
                )?),
            },
            rate_limit_enabled: parse_var("RATE_LIMIT_ENABLED", true)?,
            admin_bootstrap: admin_bootstrap_from_env(),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn admin_bootstrap_from_env() -> Option<AdminBootstrap> {
    Some(AdminBootstrap {
        email: env::var("ADMIN_BOOTSTRAP_EMAIL").ok()?,
        password: env::var("ADMIN_BOOTSTRAP_PASSWORD").ok()?,
        name: env::var("ADMIN_BOOTSTRAP_NAME").unwrap_or_else(|_| "Administrator".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins("https://a.org, https://b.org,,"),
            vec!["https://a.org".to_string(), "https://b.org".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_default_policy() {
        let policy = OtpPolicy::default();
        assert_eq!(policy.ttl.num_seconds(), 300);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.resend_cooldown.num_seconds(), 30);
        assert_eq!(policy.gate_ttl.num_seconds(), 900);
    }

    #[test]
    fn test_unset_var_uses_default() {
        let port: u16 = parse_var("CHAMBER_TEST_SURELY_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }
}
