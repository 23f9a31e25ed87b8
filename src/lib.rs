//! Modbus/TCP Write Client Library
//!
//! Blocking Modbus/TCP client that encodes MBAP-framed write requests
//! (single/multiple coils and registers) and sends them over a TCP session.
//! Responses are not read.

pub mod cli;
pub mod config;
pub mod modbus;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use modbus::{
    encode_request, FunctionCode, MbapHeader, ModbusSession, SessionState, TcpTransport,
    Transport, WriteRequest,
};
pub use utils::error::ModbusError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
