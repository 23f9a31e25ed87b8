use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModbusError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Socket error: {0}")]
    SocketError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Communication error: {0}")]
    CommunicationError(String),

    #[error("Not connected to a Modbus server")]
    NotConnected,

    #[error("Session already closed")]
    SessionClosed,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Session failed earlier (code {code}): {message}")]
    SessionFailed { code: i32, message: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ModbusError {
    /// Stable numeric code recorded in a session's error state.
    pub fn code(&self) -> i32 {
        match self {
            ModbusError::ConfigError(_) => 1,
            ModbusError::SocketError(_) => 2,
            ModbusError::ConnectionError(_) => 3,
            ModbusError::Timeout => 4,
            ModbusError::CommunicationError(_) => 5,
            ModbusError::NotConnected => 6,
            ModbusError::SessionClosed => 7,
            ModbusError::InvalidData(_) => 8,
            ModbusError::SessionFailed { .. } => 9,
            ModbusError::SerializationError(_) => 10,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ModbusError::Timeout)
    }
}

impl From<io::Error> for ModbusError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ModbusError::Timeout,
            _ => ModbusError::CommunicationError(format!("IO error: {}", err)),
        }
    }
}

impl From<toml::de::Error> for ModbusError {
    fn from(err: toml::de::Error) -> Self {
        ModbusError::ConfigError(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for ModbusError {
    fn from(err: toml::ser::Error) -> Self {
        ModbusError::SerializationError(format!("TOML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = vec![
            ModbusError::ConfigError(String::new()),
            ModbusError::SocketError(String::new()),
            ModbusError::ConnectionError(String::new()),
            ModbusError::Timeout,
            ModbusError::CommunicationError(String::new()),
            ModbusError::NotConnected,
            ModbusError::SessionClosed,
            ModbusError::InvalidData(String::new()),
            ModbusError::SessionFailed {
                code: 1,
                message: String::new(),
            },
            ModbusError::SerializationError(String::new()),
        ];

        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|&c| c > 0));
    }

    #[test]
    fn test_io_timeout_maps_to_timeout() {
        let err: ModbusError = io::Error::new(io::ErrorKind::TimedOut, "slow").into();
        assert!(err.is_timeout());

        let err: ModbusError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, ModbusError::CommunicationError(_)));
    }
}
