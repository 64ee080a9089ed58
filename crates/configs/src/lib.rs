//! # configs
//!
//! Runtime settings, layered lowest to highest:
//!
//! 1. built-in defaults
//! 2. `config/gossip.toml` (path overridable with `GOSSIP_CONFIG`), if present
//! 3. `GOSSIP__SECTION__KEY` environment variables
//! 4. the deployment variables `PORT`, `GOOSE_DBSTRING`, `JWT_SECRET_KEY`
//!    and `FRONTEND_URL`
//!
//! A `.env` file in the working directory is loaded first.

use std::collections::HashMap;
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config/gossip.toml";

/// Deployment variables and the keys they set.
const LEGACY_VARIABLES: [(&str, &str); 4] = [
    ("PORT", "server.port"),
    ("GOOSE_DBSTRING", "database.url"),
    ("JWT_SECRET_KEY", "auth.jwt_secret"),
    ("FRONTEND_URL", "server.frontend_url"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS and the target of `GET /`.
    pub frontend_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime_secs: u64,
    pub idle_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

impl DatabaseSettings {
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// The connection URL. Only the Postgres store asks for it; an unset URL
    /// is an error here, not at load time.
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        let url = self.url.expose_secret();
        if url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database.url",
                reason: "must not be empty (set GOOSE_DBSTRING)".to_string(),
            });
        }
        Ok(url)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize)]
pub struct TelemetrySettings {
    pub log_format: LogFormat,
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Loads settings from an explicit variable map instead of the process
    /// environment.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let path = vars
            .get("GOSSIP_CONFIG")
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONFIG_PATH);

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.frontend_url", "http://localhost:5173")?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 25)?
            .set_default("database.min_connections", 5)?
            .set_default("database.max_lifetime_secs", 30 * 60)?
            .set_default("database.idle_timeout_secs", 5 * 60)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("database.run_migrations", true)?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.token_ttl_hours", 12)?
            .set_default("telemetry.log_format", "pretty")?
            .set_default("telemetry.filter", "info,sqlx=warn,tower_http=info")?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("GOSSIP")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone().into_iter().collect())),
            );
        for (var, key) in LEGACY_VARIABLES {
            builder = builder.set_override_option(key, vars.get(var).cloned())?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "auth.jwt_secret",
                reason: "must not be empty (set JWT_SECRET_KEY)".to_string(),
            });
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "auth.token_ttl_hours",
                reason: format!("must be positive, got {}", self.auth.token_ttl_hours),
            });
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                key: "database.min_connections",
                reason: format!(
                    "{} exceeds max_connections {}",
                    self.database.min_connections, self.database.max_connections
                ),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.entry("GOSSIP_CONFIG".to_string())
            .or_insert_with(|| "does/not/exist.toml".to_string());
        map
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("JWT_SECRET_KEY", "s3cret"),
            ("GOOSE_DBSTRING", "postgres://localhost/gossip"),
        ]
    }

    #[test]
    fn defaults_apply() {
        let settings = Settings::from_vars(&vars(&required())).unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.frontend_url, "http://localhost:5173");
        assert_eq!(settings.auth.token_ttl_hours, 12);
        assert_eq!(settings.database.max_connections, 25);
        assert_eq!(settings.database.max_lifetime(), Duration::from_secs(1800));
        assert_eq!(settings.telemetry.log_format, LogFormat::Pretty);
        assert_eq!(settings.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn deployment_variables_override_prefixed_ones() {
        let mut pairs = required();
        pairs.push(("GOSSIP__SERVER__PORT", "4000"));
        pairs.push(("PORT", "8080"));
        pairs.push(("GOSSIP__TELEMETRY__LOG_FORMAT", "json"));
        let settings = Settings::from_vars(&vars(&pairs)).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn empty_secret_is_rejected() {
        let pairs = [
            ("JWT_SECRET_KEY", "  "),
            ("GOOSE_DBSTRING", "postgres://localhost/gossip"),
        ];
        let err = Settings::from_vars(&vars(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "auth.jwt_secret",
                ..
            }
        ));
    }

    #[test]
    fn database_url_is_only_required_when_asked_for() {
        let settings = Settings::from_vars(&vars(&[("JWT_SECRET_KEY", "s3cret")])).unwrap();
        let err = settings.database.require_url().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "database.url", .. }));

        let settings = Settings::from_vars(&vars(&required())).unwrap();
        assert_eq!(
            settings.database.require_url().unwrap(),
            "postgres://localhost/gossip"
        );
    }

    #[test]
    fn pool_bounds_are_checked() {
        let mut pairs = required();
        pairs.push(("GOSSIP__DATABASE__MIN_CONNECTIONS", "30"));
        let err = Settings::from_vars(&vars(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "database.min_connections",
                ..
            }
        ));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let settings = Settings::from_vars(&vars(&required())).unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("s3cret"));
    }
}
