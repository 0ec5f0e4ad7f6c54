//! Process configuration, read once at startup.

use std::net::{Ipv4Addr, SocketAddr};

use axum::http::HeaderValue;
use chrono::Duration;
use thiserror::Error;

use notes_observability::LogFormat;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;
const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 2_592_000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Which credential strategy the deployment runs, with its settings.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
    Token { secret: String, ttl: Duration },
    Session { max_age: Duration, secure: bool },
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AuthConfig::Token { ttl, .. } => f
                .debug_struct("Token")
                .field("secret", &"<redacted>")
                .field("ttl", ttl)
                .finish(),
            AuthConfig::Session { max_age, secure } => f
                .debug_struct("Session")
                .field("max_age", max_age)
                .field("secure", secure)
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub auth: AuthConfig,
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub cors_origin: HeaderValue,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("listen_addr", &self.listen_addr)
            .field("auth", &self.auth)
            .field(
                "database_url",
                &self.database_url.as_deref().map(redact_url_credentials),
            )
            .field("cors_origin", &self.cors_origin)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Replace the `user:password@` part of a URL with `<redacted>@`.
fn redact_url_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, path) = rest.split_at(authority_end);
    match authority.rsplit_once('@') {
        Some((_, host)) => format!("{scheme}://<redacted>@{host}{path}"),
        None => url.to_string(),
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup (tests use a map).
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .trim_start_matches(':')
                .parse::<u16>()
                .map_err(|e| invalid("PORT", e.to_string()))?,
            None => DEFAULT_PORT,
        };

        let auth = match get("AUTH_STRATEGY").as_deref().map(str::trim) {
            None | Some("token") => AuthConfig::Token {
                secret: get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
                ttl: seconds(&get, "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?,
            },
            Some("session") => AuthConfig::Session {
                max_age: seconds(&get, "SESSION_MAX_AGE_SECS", DEFAULT_SESSION_MAX_AGE_SECS)?,
                secure: match get("SESSION_COOKIE_SECURE") {
                    Some(raw) => raw
                        .trim()
                        .parse::<bool>()
                        .map_err(|e| invalid("SESSION_COOKIE_SECURE", e.to_string()))?,
                    None => false,
                },
            },
            Some(other) => {
                return Err(invalid(
                    "AUTH_STRATEGY",
                    format!("'{other}' (expected 'token' or 'session')"),
                ));
            }
        };

        let database_url = match get("DATABASE_URL") {
            Some(url) => Some(url),
            None => database_url_from_parts(&get)?,
        };

        let cors_origin = get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let cors_origin =
            HeaderValue::from_str(&cors_origin).map_err(|e| invalid("CORS_ORIGIN", e.to_string()))?;

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|e: String| invalid("LOG_FORMAT", e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            auth,
            database_url,
            cors_origin,
            log_format,
        })
    }
}

fn seconds<G>(get: &G, key: &'static str, default: i64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let secs = match get(key) {
        Some(raw) => raw.trim().parse::<i64>().map_err(|e| invalid(key, e.to_string()))?,
        None => default,
    };
    if secs <= 0 {
        return Err(invalid(key, "must be a positive number of seconds"));
    }
    Ok(Duration::seconds(secs))
}

/// Build a URL from the discrete `HOST`/`DB_*` settings, if `HOST` is set.
fn database_url_from_parts<G>(get: &G) -> Result<Option<String>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(host) = get("HOST") else {
        return Ok(None);
    };
    let user = get("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?;
    let name = get("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?;
    let port = get("DB_PORT").unwrap_or_else(|| "5432".to_string());
    let credentials = match get("PASSWORD") {
        Some(password) => format!("{user}:{password}"),
        None => user,
    };
    Ok(Some(format!(
        "postgres://{credentials}@{host}:{port}/{name}?sslmode=disable"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn token_strategy_is_default_and_needs_secret() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("JWT_SECRET"));

        let cfg = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(
            cfg.auth,
            AuthConfig::Token {
                secret: "s3cret".to_string(),
                ttl: Duration::hours(24),
            }
        );
        assert_eq!(cfg.listen_addr.port(), 8080);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn session_strategy_defaults() {
        let cfg = load(&[("AUTH_STRATEGY", "session")]).unwrap();
        assert_eq!(
            cfg.auth,
            AuthConfig::Session {
                max_age: Duration::seconds(2_592_000),
                secure: false,
            }
        );
    }

    #[test]
    fn port_tolerates_leading_colon() {
        let cfg = load(&[("JWT_SECRET", "s"), ("PORT", ":9000")]).unwrap();
        assert_eq!(cfg.listen_addr.port(), 9000);
    }

    #[test]
    fn unknown_strategy_rejected() {
        let err = load(&[("AUTH_STRATEGY", "both")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "AUTH_STRATEGY", .. }));
    }

    #[test]
    fn non_positive_ttl_rejected() {
        let err = load(&[("JWT_SECRET", "s"), ("TOKEN_TTL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. }));
    }

    #[test]
    fn database_url_built_from_parts() {
        let cfg = load(&[
            ("JWT_SECRET", "s"),
            ("HOST", "db"),
            ("DB_USER", "notes"),
            ("PASSWORD", "pw"),
            ("DB_NAME", "notes"),
            ("DB_PORT", "5433"),
        ])
        .unwrap();
        assert_eq!(
            cfg.database_url.as_deref(),
            Some("postgres://notes:pw@db:5433/notes?sslmode=disable")
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = load(&[
            ("JWT_SECRET", "top-secret-value"),
            ("DATABASE_URL", "postgres://notes:hunter2@db/notes"),
        ])
        .unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("top-secret-value"));
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("postgres://<redacted>@db/notes"));
    }

    #[test]
    fn debug_redacts_password_built_from_parts() {
        let cfg = load(&[
            ("JWT_SECRET", "s"),
            ("HOST", "db"),
            ("DB_USER", "notes"),
            ("PASSWORD", "hunter2"),
            ("DB_NAME", "notes"),
        ])
        .unwrap();
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[test]
    fn url_without_credentials_is_unchanged() {
        assert_eq!(redact_url_credentials("postgres://db:5432/notes"), "postgres://db:5432/notes");
        assert_eq!(
            redact_url_credentials("postgres://u:p@w@db/notes?sslmode=disable"),
            "postgres://<redacted>@db/notes?sslmode=disable"
        );
        assert_eq!(redact_url_credentials("not a url"), "not a url");
    }
}
