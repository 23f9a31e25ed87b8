pub mod settings;

pub use settings::{Config, ConnectionConfig, LoggingConfig};
