use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            host: try_load("CAMPUS_HOST", "0.0.0.0")?,
            port: try_load("CAMPUS_PORT", "5000")?,
            db_path: try_load("CAMPUS_DB_PATH", "campus.db")?,
            jwt_secret: jwt_secret()?,
            cookie_domain: env::var("CAMPUS_COOKIE_DOMAIN")
                .ok()
                .filter(|d| !d.trim().is_empty()),
            cookie_secure: try_load("CAMPUS_COOKIE_SECURE", "true")?,
            cors_origins: parse_origins(&env::var("CAMPUS_CORS_ORIGINS").unwrap_or_default()),
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("invalid {key} value '{raw}': {e}")
    })
}

fn jwt_secret() -> Result<String> {
    let secret = env::var("CAMPUS_JWT_SECRET").context("CAMPUS_JWT_SECRET is not set")?;
    if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
        bail!("CAMPUS_JWT_SECRET is empty or still a placeholder");
    }
    Ok(secret)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins(" https://a.example, ,https://b.example "),
            ["https://a.example", "https://b.example"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn malformed_values_are_errors() {
        // Unset key falls back to the default, which must itself parse
        let port: u16 = try_load("CAMPUS_TEST_UNSET_PORT", "5000").unwrap();
        assert_eq!(port, 5000);
        assert!(try_load::<u16>("CAMPUS_TEST_UNSET_PORT", "not-a-port").is_err());
    }
}
