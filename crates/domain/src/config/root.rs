use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::metrics::MetricsConfig;
use super::relay::RelayConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;
use serde::{Deserialize, Serialize};

/// Main configuration structure for dotgate
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Client-facing listener (bind address, port)
    #[serde(default)]
    pub server: ServerConfig,

    /// The DNS-over-TLS resolver queries are forwarded to
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Per-exchange limits (message ceiling, timeouts)
    #[serde(default)]
    pub relay: RelayConfig,

    /// Metrics HTTP endpoint
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration, lowest priority first:
    ///
    /// 1. Default configuration
    /// 2. dotgate.toml in current directory, or /etc/dotgate/config.toml,
    ///    or an explicitly provided path
    /// 3. Environment variables (BIND_ADDRESS, BIND_PORT, UPSTREAM_ADDRESS,
    ///    UPSTREAM_PORT, UPSTREAM_TLS_HOSTNAME, METRICS_PORT, DEBUG)
    /// 4. Command-line overrides
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("dotgate.toml").exists() {
            Self::from_file("dotgate.toml")?
        } else if std::path::Path::new("/etc/dotgate/config.toml").exists() {
            Self::from_file("/etc/dotgate/config.toml")?
        } else {
            Self::default()
        };

        config.apply_env_from(|name| std::env::var(name).ok())?;
        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply the environment surface through an injectable lookup so tests
    /// don't have to mutate process-global state.
    pub fn apply_env_from<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = var("BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(port) = var("BIND_PORT") {
            self.server.bind_port = parse_port("BIND_PORT", &port)?;
        }
        if let Some(addr) = var("UPSTREAM_ADDRESS") {
            self.upstream.address = addr;
        }
        if let Some(port) = var("UPSTREAM_PORT") {
            self.upstream.port = parse_port("UPSTREAM_PORT", &port)?;
        }
        if let Some(name) = var("UPSTREAM_TLS_HOSTNAME") {
            self.upstream.tls_hostname = name;
        }
        if let Some(port) = var("METRICS_PORT") {
            self.metrics.port = parse_port("METRICS_PORT", &port)?;
        }
        if let Some(debug) = var("DEBUG") {
            if debug_enabled(&debug) {
                self.logging.level = "debug".to_string();
            }
        }
        Ok(())
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(port) = overrides.bind_port {
            self.server.bind_port = port;
        }
        if let Some(addr) = overrides.upstream_address {
            self.upstream.address = addr;
        }
        if let Some(port) = overrides.upstream_port {
            self.upstream.port = port;
        }
        if let Some(name) = overrides.tls_hostname {
            self.upstream.tls_hostname = name;
        }
        if let Some(port) = overrides.metrics_port {
            self.metrics.port = port;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if overrides.debug {
            self.logging.level = "debug".to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_port == 0 {
            return Err(ConfigError::Validation(
                "Relay port cannot be 0".to_string(),
            ));
        }

        if self.upstream.socket_addr().is_none() {
            return Err(ConfigError::Validation(format!(
                "Upstream address must be an IP literal, got '{}'",
                self.upstream.address
            )));
        }

        if self.upstream.tls_hostname.is_empty() {
            return Err(ConfigError::Validation(
                "Upstream TLS hostname cannot be empty".to_string(),
            ));
        }

        if self.relay.max_message_bytes == 0 {
            return Err(ConfigError::Validation(
                "Message size ceiling cannot be 0".to_string(),
            ));
        }

        if self.relay.io_timeout_secs == 0 || self.relay.exchange_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Timeouts cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse::<u16>()
        .map_err(|e| ConfigError::EnvVar(name.to_string(), e.to_string()))
}

fn debug_enabled(value: &str) -> bool {
    !matches!(value, "" | "0" | "false" | "no")
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
    pub upstream_address: Option<String>,
    pub upstream_port: Option<u16>,
    pub tls_hostname: Option<String>,
    pub metrics_port: Option<u16>,
    pub log_level: Option<String>,
    pub debug: bool,
}
