pub mod client;
pub mod frame;
pub mod protocol;
pub mod transport;

pub use client::{ModbusSession, SessionFailure, SessionState, DEFAULT_SLAVE_ID};
pub use frame::{encode_request, frame_len, pack_coils};
pub use protocol::{FunctionCode, MbapHeader, WriteRequest, DEFAULT_PORT};
pub use transport::{resolve_address, TcpTransport, Transport, DEFAULT_IO_TIMEOUT};
