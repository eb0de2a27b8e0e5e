//! Configuration management for the todokit binary.
//!
//! Values come from `TODOKIT_*` environment variables (after an optional
//! `.env` file) with defaults for everything:
//!
//! | variable                          | default          |
//! |-----------------------------------|------------------|
//! | `TODOKIT_ENVIRONMENT`             | `production`     |
//! | `TODOKIT_DEBUG`                   | `false`          |
//! | `TODOKIT_SHUTDOWN_TIMEOUT_SECS`   | `15`             |
//! | `TODOKIT_LOG_FORMAT`              | `json`           |
//! | `TODOKIT_LOG_LEVEL`               | `info`           |
//! | `TODOKIT_HTTP_ADDR`               | `0.0.0.0:8000`   |
//! | `TODOKIT_GRPC_ADDR`               | `0.0.0.0:8001`   |
//! | `TODOKIT_MAINTENANCE_ADDR`        | `0.0.0.0:10000`  |
//! | `TODOKIT_TODO_TOPIC`              | `todo`           |
//! | `TODOKIT_EVENT_BUS`               | `memory`         |
//! | `TODOKIT_REDPANDA_BROKERS`        | unset            |
//! | `TODOKIT_REDPANDA_CONSUMER_GROUP` | unset            |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Prefix of every variable read by [`Config::from_env`].
pub const ENV_PREFIX: &str = "TODOKIT_";

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Full variable name.
        key: String,
        /// Raw value.
        value: String,
    },

    /// The environment name is empty.
    #[error("environment is required")]
    MissingEnvironment,

    /// Unknown log format.
    #[error("unknown log format {0:?} (expected json or text)")]
    InvalidLogFormat(String),

    /// Unknown event bus.
    #[error("unknown event bus {0:?} (expected memory or redpanda)")]
    InvalidEventBus(String),

    /// An address does not parse as `host:port`.
    #[error("invalid {name} address {value:?}")]
    InvalidAddress {
        /// Which listener.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// Shutdown timeout of zero.
    #[error("shutdown timeout must be greater than zero")]
    ZeroShutdownTimeout,

    /// Empty todo topic.
    #[error("todo topic is required")]
    MissingTopic,

    /// The redpanda bus is selected without brokers.
    #[error("redpanda event bus requires TODOKIT_REDPANDA_BROKERS")]
    MissingBrokers,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    Text,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Which [`EventBus`](todokit_core::event_bus::EventBus) backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventBusKind {
    /// In-process broadcast bus.
    Memory,
    /// Kafka-compatible broker.
    Redpanda,
}

impl FromStr for EventBusKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "redpanda" => Ok(Self::Redpanda),
            other => Err(ConfigError::InvalidEventBus(other.to_string())),
        }
    }
}

/// Log configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `json` or `text`.
    pub format: String,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

/// Redpanda connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedpandaConfig {
    /// Comma-separated bootstrap servers.
    pub brokers: Option<String>,
    /// Consumer group of the event consumer.
    pub consumer_group: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Deployment name, e.g. `production` or `development`.
    pub environment: String,
    /// More verbose logs.
    pub debug: bool,
    /// How long shutdown waits for servers and the consumer.
    pub shutdown_timeout: Duration,
    /// Log configuration.
    pub log: LogConfig,
    /// HTTP and GraphQL listener.
    pub http_addr: String,
    /// gRPC listener.
    pub grpc_addr: String,
    /// Health and metrics listener.
    pub maintenance_addr: String,
    /// Topic carrying todo events.
    pub todo_topic: String,
    /// `memory` or `redpanda`.
    pub event_bus: String,
    /// Broker settings, used when `event_bus` is `redpanda`.
    pub redpanda: RedpandaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            debug: false,
            shutdown_timeout: Duration::from_secs(15),
            log: LogConfig {
                format: "json".to_string(),
                level: "info".to_string(),
            },
            http_addr: "0.0.0.0:8000".to_string(),
            grpc_addr: "0.0.0.0:8001".to_string(),
            maintenance_addr: "0.0.0.0:10000".to_string(),
            todo_topic: todokit_core::events::TODO_TOPIC.to_string(),
            event_bus: "memory".to_string(),
            redpanda: RedpandaConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is read first when present;
    /// variables already set win over it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a boolean or numeric
    /// variable does not parse. Call [`Config::validate`] afterwards.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which receives full variable
    /// names such as `TODOKIT_HTTP_ADDR`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a boolean or numeric
    /// variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let defaults = Self::default();

        Ok(Self {
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            debug: parse_var(&get, "DEBUG")?.unwrap_or(defaults.debug),
            shutdown_timeout: parse_var(&get, "SHUTDOWN_TIMEOUT_SECS")?
                .map_or(defaults.shutdown_timeout, Duration::from_secs),
            log: LogConfig {
                format: get("LOG_FORMAT").unwrap_or(defaults.log.format),
                level: get("LOG_LEVEL").unwrap_or(defaults.log.level),
            },
            http_addr: get("HTTP_ADDR").unwrap_or(defaults.http_addr),
            grpc_addr: get("GRPC_ADDR").unwrap_or(defaults.grpc_addr),
            maintenance_addr: get("MAINTENANCE_ADDR").unwrap_or(defaults.maintenance_addr),
            todo_topic: get("TODO_TOPIC").unwrap_or(defaults.todo_topic),
            event_bus: get("EVENT_BUS").unwrap_or(defaults.event_bus),
            redpanda: RedpandaConfig {
                brokers: get("REDPANDA_BROKERS").filter(|v| !v.trim().is_empty()),
                consumer_group: get("REDPANDA_CONSUMER_GROUP").filter(|v| !v.trim().is_empty()),
            },
        })
    }

    /// Check the configuration before anything is started.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment.trim().is_empty() {
            return Err(ConfigError::MissingEnvironment);
        }
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::ZeroShutdownTimeout);
        }
        if self.todo_topic.trim().is_empty() {
            return Err(ConfigError::MissingTopic);
        }

        self.log_format()?;
        self.http_socket_addr()?;
        self.grpc_socket_addr()?;
        self.maintenance_socket_addr()?;

        if self.event_bus_kind()? == EventBusKind::Redpanda && self.redpanda.brokers.is_none() {
            return Err(ConfigError::MissingBrokers);
        }

        Ok(())
    }

    /// Parsed log format.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidLogFormat`] for anything but `json` or `text`.
    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.log.format.parse()
    }

    /// Parsed event bus selection.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEventBus`] for anything but `memory` or
    /// `redpanda`.
    pub fn event_bus_kind(&self) -> Result<EventBusKind, ConfigError> {
        self.event_bus.parse()
    }

    /// Parsed HTTP address.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidAddress`] if it is not `ip:port`.
    pub fn http_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_addr("http", &self.http_addr)
    }

    /// Parsed gRPC address.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidAddress`] if it is not `ip:port`.
    pub fn grpc_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_addr("grpc", &self.grpc_addr)
    }

    /// Parsed maintenance address.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidAddress`] if it is not `ip:port`.
    pub fn maintenance_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_addr("maintenance", &self.maintenance_addr)
    }

    /// Whether this is a development deployment.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_var<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    get(name)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: format!("{ENV_PREFIX}{name}"),
                value,
            })
        })
        .transpose()
}

fn parse_addr(name: &'static str, value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_are_valid() {
        let config = load(&[]).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.shutdown_timeout, Duration::from_secs(15));
        assert_eq!(config.todo_topic, "todo");
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
        assert_eq!(config.event_bus_kind().unwrap(), EventBusKind::Memory);
        config.validate().unwrap();
    }

    #[test]
    fn variables_override_defaults() {
        let config = load(&[
            ("TODOKIT_ENVIRONMENT", "development"),
            ("TODOKIT_DEBUG", "true"),
            ("TODOKIT_SHUTDOWN_TIMEOUT_SECS", "3"),
            ("TODOKIT_LOG_FORMAT", "text"),
            ("TODOKIT_HTTP_ADDR", "127.0.0.1:9000"),
            ("TODOKIT_EVENT_BUS", "redpanda"),
            ("TODOKIT_REDPANDA_BROKERS", "localhost:9092"),
        ])
        .unwrap();

        assert!(config.is_development());
        assert!(config.debug);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(3));
        assert_eq!(config.log_format().unwrap(), LogFormat::Text);
        assert_eq!(config.http_socket_addr().unwrap().port(), 9000);
        assert_eq!(config.redpanda.brokers.as_deref(), Some("localhost:9092"));
        config.validate().unwrap();
    }

    #[test]
    fn unparsable_numbers_are_rejected_on_load() {
        let err = load(&[("TODOKIT_SHUTDOWN_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "TODOKIT_SHUTDOWN_TIMEOUT_SECS".to_string(),
                value: "soon".to_string(),
            }
        );

        assert!(load(&[("TODOKIT_DEBUG", "yes")]).is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cases = [
            (("TODOKIT_ENVIRONMENT", " "), ConfigError::MissingEnvironment),
            (("TODOKIT_SHUTDOWN_TIMEOUT_SECS", "0"), ConfigError::ZeroShutdownTimeout),
            (("TODOKIT_TODO_TOPIC", ""), ConfigError::MissingTopic),
            (
                ("TODOKIT_LOG_FORMAT", "logfmt"),
                ConfigError::InvalidLogFormat("logfmt".to_string()),
            ),
            (
                ("TODOKIT_GRPC_ADDR", ":8001"),
                ConfigError::InvalidAddress {
                    name: "grpc",
                    value: ":8001".to_string(),
                },
            ),
            (
                ("TODOKIT_EVENT_BUS", "nats"),
                ConfigError::InvalidEventBus("nats".to_string()),
            ),
            (("TODOKIT_EVENT_BUS", "redpanda"), ConfigError::MissingBrokers),
        ];

        for (var, expected) in cases {
            let config = load(&[var]).unwrap();
            assert_eq!(config.validate().unwrap_err(), expected, "{var:?}");
        }
    }

    #[test]
    fn blank_broker_list_counts_as_unset() {
        let config = load(&[
            ("TODOKIT_EVENT_BUS", "redpanda"),
            ("TODOKIT_REDPANDA_BROKERS", "  "),
        ])
        .unwrap();

        assert_eq!(config.validate().unwrap_err(), ConfigError::MissingBrokers);
    }
}
