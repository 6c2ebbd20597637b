use crate::error::{RelayError, Result};
use reqwest::Url;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Where and how events are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySettings {
    pub primary_url: String,
    pub secondary_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl DeliverySettings {
    /// Upper bound for one attempt as enforced by the relay policy. Slightly
    /// above the client's own timeout so the client normally reports first.
    pub fn attempt_budget(&self) -> Duration {
        self.connect_timeout + self.read_timeout + Duration::from_secs(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub delivery: DeliverySettings,
    /// Enables checksum verification of inbound events when set.
    pub events_secret: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = var("RELAY_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| RelayError::Config(format!("RELAY_BIND_ADDR is invalid: {e}")))?;

        let delivery = DeliverySettings {
            primary_url: required_url(var("PRIMARY_DESTINATION_URL"), "PRIMARY_DESTINATION_URL")?,
            secondary_url: required_url(
                var("SECONDARY_DESTINATION_URL"),
                "SECONDARY_DESTINATION_URL",
            )?,
            connect_timeout: seconds(
                var("DELIVERY_CONNECT_TIMEOUT_SECS"),
                "DELIVERY_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
            read_timeout: seconds(
                var("DELIVERY_READ_TIMEOUT_SECS"),
                "DELIVERY_READ_TIMEOUT_SECS",
                DEFAULT_READ_TIMEOUT_SECS,
            )?,
        };

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(RelayError::Config(format!(
                    "LOG_FORMAT must be 'pretty' or 'json', got '{other}'"
                )));
            }
        };

        Ok(Config {
            bind_addr,
            delivery,
            events_secret: var("WOMPI_EVENTS_SECRET"),
            log_format,
        })
    }
}

fn required_url(value: Option<String>, key: &str) -> Result<String> {
    let value =
        value.ok_or_else(|| RelayError::Config(format!("{key} environment variable is required")))?;

    let url = Url::parse(&value).map_err(|e| RelayError::Config(format!("{key} is invalid: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RelayError::Config(format!(
            "{key} must be an http(s) URL, got '{value}'"
        )));
    }
    Ok(value)
}

fn seconds(value: Option<String>, key: &str, default: u64) -> Result<Duration> {
    let secs = match value {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| RelayError::Config(format!("{key} is invalid: {e}")))?,
        None => default,
    };
    if secs == 0 {
        return Err(RelayError::Config(format!("{key} must be greater than zero")));
    }
    Ok(Duration::from_secs(secs))
}
