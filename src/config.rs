use std::{fmt, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    /// `None` selects the in-memory store.
    pub mongodb_uri: Option<String>,
    pub db_name: String,
    pub bind_addr: String,

    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_ttl_seconds: i64,

    pub revocation_prune_interval: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("mongodb_uri", &self.mongodb_uri.as_ref().map(|_| "<set>"))
            .field("db_name", &self.db_name)
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_ttl_seconds", &self.jwt_ttl_seconds)
            .field("revocation_prune_interval", &self.revocation_prune_interval)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_ttl_seconds = parse_or(get("JWT_TTL_SECONDS"), "JWT_TTL_SECONDS", 24 * 60 * 60)?;
        let prune_seconds: u64 = parse_or(
            get("REVOCATION_PRUNE_INTERVAL_SECONDS"),
            "REVOCATION_PRUNE_INTERVAL_SECONDS",
            60 * 60,
        )?;

        Ok(Self {
            mongodb_uri: get("MONGODB_URI"),
            db_name: get("DB_NAME").unwrap_or_else(|| "user_gate".to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            jwt_secret,
            jwt_issuer: get("JWT_ISSUER").unwrap_or_else(|| "myapp".to_string()),
            jwt_ttl_seconds,
            revocation_prune_interval: Duration::from_secs(prune_seconds.max(1)),
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.jwt_issuer, "myapp");
        assert_eq!(cfg.jwt_ttl_seconds, 86_400);
        assert_eq!(cfg.db_name, "user_gate");
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.revocation_prune_interval, Duration::from_secs(3600));
        assert!(cfg.mongodb_uri.is_none());
    }

    #[test]
    fn missing_or_empty_secret_is_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("JWT_SECRET", "   ")])),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn bad_numbers_are_reported_by_name() {
        let err = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_SECONDS", "a day"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidNumber { name: "JWT_TTL_SECONDS", .. }));
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let cfg = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "do-not-print-me"),
            ("MONGODB_URI", "mongodb://user:pw@localhost"),
        ]))
        .unwrap();

        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("do-not-print-me"));
        assert!(!rendered.contains("user:pw"));
    }
}
