use clap::ArgMatches;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::modbus::client::{ModbusSession, DEFAULT_SLAVE_ID};
use crate::modbus::protocol::DEFAULT_PORT;
use crate::modbus::transport::{resolve_address, TcpTransport, DEFAULT_IO_TIMEOUT};
use crate::utils::error::ModbusError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub slave_id: u8,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter, e.g. "info" or "modbus_tcp_rust=debug".
    pub level: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            slave_id: DEFAULT_SLAVE_ID,
            timeout_seconds: DEFAULT_IO_TIMEOUT.as_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load the `--config` file (or defaults) and apply command line overrides.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ModbusError> {
        let mut config = match matches.get_one::<String>("config") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(host) = matches.get_one::<String>("host") {
            config.connection.host = host.clone();
        }
        if let Some(port) = matches.get_one::<String>("port") {
            config.connection.port = parse_arg(port, "port")?;
        }
        if let Some(slave) = matches.get_one::<String>("slave") {
            config.connection.slave_id = parse_arg(slave, "slave")?;
        }
        if let Some(timeout) = matches.get_one::<String>("timeout") {
            config.connection.timeout_seconds = parse_arg(timeout, "timeout")?;
        }
        if matches.get_flag("verbose") {
            config.logging.level = "debug".to_string();
        }

        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModbusError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModbusError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ModbusError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the settings against the same rules `connect` applies.
    pub fn validate(&self) -> Result<(), ModbusError> {
        resolve_address(&self.connection.host, self.connection.port)?;
        if self.connection.timeout_seconds == 0 {
            return Err(ModbusError::ConfigError(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.connection.timeout_seconds)
    }

    /// Unconnected TCP session built from these settings.
    pub fn session(&self) -> ModbusSession<TcpTransport> {
        let mut session = ModbusSession::with_timeout(
            self.connection.host.clone(),
            self.connection.port,
            self.timeout(),
        );
        session.set_slave_id(self.connection.slave_id);
        session
    }
}

fn parse_arg<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, ModbusError> {
    value
        .trim()
        .parse()
        .map_err(|_| ModbusError::ConfigError(format!("Invalid value for --{}: {}", name, value)))
}
