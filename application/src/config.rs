//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8000)]
    pub port: u16,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [bcrypt] cost of hashing passwords.
    ///
    /// [bcrypt]: https://wikipedia.org/wiki/Bcrypt
    #[default(12)]
    pub password_hash_cost: u32,

    /// Session configuration.
    pub session: Session,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            password_hash_cost,
            session:
                Session {
                    ttl,
                    key_id,
                    secret,
                    retired_keys,
                },
        } = value;

        Self {
            session_keys: service::domain::user::session::Keys::new(
                (key_id, secret.expose_secret().as_bytes()),
                retired_keys.iter().map(|k| {
                    (k.id.clone(), k.secret.expose_secret().as_bytes())
                }),
            ),
            session_ttl: ttl,
            password_hash_cost,
        }
    }
}

/// Session configuration.
///
/// Rotating the signing key is done by moving the current `key_id` and
/// `secret` into `retired_keys` and setting new ones. Sessions signed with a
/// retired key keep working until they expire or the key is removed.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Session {
    /// Time a session stays valid for, which is also the cookie max age.
    #[default(time::Duration::from_secs(60 * 60 * 24 * 7))]
    #[serde(with = "humantime_serde")]
    pub ttl: time::Duration,

    /// ID of the key new sessions are signed with.
    #[default("v1".to_owned())]
    pub key_id: String,

    /// Secret of the key new sessions are signed with.
    #[default(SecretString::from(Session::DEFAULT_SECRET))]
    pub secret: SecretString,

    /// Keys accepted for existing sessions only.
    pub retired_keys: Vec<SessionKey>,
}

impl Session {
    /// Secret used when none is configured.
    pub const DEFAULT_SECRET: &'static str = "secret";

    /// Indicates whether the [`Session::DEFAULT_SECRET`] is in use.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.secret.expose_secret() == Self::DEFAULT_SECRET
    }
}

/// Retired session signing key.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionKey {
    /// ID of this [`SessionKey`].
    pub id: String,

    /// Secret of this [`SessionKey`].
    pub secret: SecretString,
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::Config;

    #[test]
    fn defaults_without_file() {
        let conf = Config::new("definitely-missing-config").unwrap();

        assert_eq!(conf.server.port, 8000);
        assert_eq!(
            conf.service.session.ttl,
            Duration::from_secs(7 * 24 * 60 * 60),
        );
        assert_eq!(conf.service.session.key_id, "v1");
        assert!(conf.service.session.uses_default_secret());
        assert!(conf.service.session.retired_keys.is_empty());
    }
}
