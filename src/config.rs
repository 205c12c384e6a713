//! Server configuration read from the environment.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DATABASE_URL` | `sqlite://agenda.db` | SQLite database, created if missing |
//! | `PORT` | 3000 | HTTP server port |
//! | `SECRET` | - | JWT shared secret, required when `AGENDA_AUTH_ROUTES=true` |
//! | `AGENDA_TOKEN_TTL_SECS` | 3600 | Lifetime of issued tokens |
//! | `AGENDA_STATIC_DIR` | `public` | Directory holding the single-page app |
//! | `AGENDA_AUTH_ROUTES` | false | Mount `/handleLogin` and `/verify` |
//! | `AGENDA_ADMIN_PASSWORD` | - | When set, the seeder also creates user `admin` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://agenda.db";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("invalid format for {var}: {message}")]
    InvalidFormat { var: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub secret: Option<String>,
    pub token_ttl: Duration,
    pub static_dir: PathBuf,
    pub auth_routes: bool,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let port = match get("PORT") {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };
        let token_ttl = match get("AGENDA_TOKEN_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse_number::<u64>("AGENDA_TOKEN_TTL_SECS", &raw)?),
            None => Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
        };
        let auth_routes = match get("AGENDA_AUTH_ROUTES") {
            Some(raw) => parse_bool("AGENDA_AUTH_ROUTES", &raw)?,
            None => false,
        };

        let config = Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            port,
            secret: get("SECRET"),
            token_ttl,
            static_dir: get("AGENDA_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            auth_routes,
            admin_password: get("AGENDA_ADMIN_PASSWORD"),
        };

        if config.auth_routes && config.secret.is_none() {
            return Err(ConfigError::MissingEnvVar("SECRET"));
        }

        Ok(config)
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    raw.trim().parse().map_err(|err: std::num::ParseIntError| ConfigError::InvalidFormat {
        var,
        message: err.to_string(),
    })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidFormat {
            var,
            message: format!("expected true or false, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert!(!config.auth_routes);
        assert!(config.secret.is_none());
        assert!(config.admin_password.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "8081"),
            ("SECRET", "s3cr3t"),
            ("AGENDA_TOKEN_TTL_SECS", "60"),
            ("AGENDA_STATIC_DIR", "dist"),
            ("AGENDA_AUTH_ROUTES", "true"),
            ("AGENDA_ADMIN_PASSWORD", "admin"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.port, 8081);
        assert_eq!(config.secret.as_deref(), Some("s3cr3t"));
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.static_dir, PathBuf::from("dist"));
        assert!(config.auth_routes);
        assert_eq!(config.admin_password.as_deref(), Some("admin"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = config_from(&[("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat { var: "PORT", .. }));
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let err = config_from(&[("AGENDA_AUTH_ROUTES", "maybe")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidFormat {
                var: "AGENDA_AUTH_ROUTES",
                ..
            }
        ));
    }

    #[test]
    fn auth_routes_need_a_secret() {
        let err = config_from(&[("AGENDA_AUTH_ROUTES", "true")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar("SECRET")));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = config_from(&[("PORT", ""), ("SECRET", "")]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.secret.is_none());
    }
}
