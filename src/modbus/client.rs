use log::{debug, error, info, warn};
use std::time::Duration;

use super::frame::encode_request;
use super::protocol::{WriteRequest, DEFAULT_PORT};
use super::transport::{resolve_address, TcpTransport, Transport, DEFAULT_IO_TIMEOUT};
use crate::utils::error::ModbusError;

pub const DEFAULT_SLAVE_ID: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Closed,
}

/// First failure seen by a session. Sticky until the session is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub code: i32,
    pub message: String,
}

/// Modbus/TCP client session.
///
/// One session drives one connection: `connect`, any number of writes, then
/// `close`. A closed session cannot reconnect, and once any operation fails
/// the session refuses further connects and writes until a new one is built.
pub struct ModbusSession<T: Transport = TcpTransport> {
    host: String,
    port: u16,
    slave_id: u8,
    transaction_id: u32,
    state: SessionState,
    failure: Option<SessionFailure>,
    transport: T,
}

impl ModbusSession<TcpTransport> {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_timeout(host, port, DEFAULT_IO_TIMEOUT)
    }

    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self::with_transport(host, port, TcpTransport::new(timeout))
    }

    /// Session on the standard Modbus/TCP port.
    pub fn with_default_port(host: impl Into<String>) -> Self {
        Self::new(host, DEFAULT_PORT)
    }
}

impl<T: Transport> ModbusSession<T> {
    pub fn with_transport(host: impl Into<String>, port: u16, transport: T) -> Self {
        Self {
            host: host.into(),
            port,
            slave_id: DEFAULT_SLAVE_ID,
            transaction_id: 1,
            state: SessionState::Unconnected,
            failure: None,
            transport,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn slave_id(&self) -> u8 {
        self.slave_id
    }

    pub fn set_slave_id(&mut self, id: u8) {
        self.slave_id = id;
    }

    /// Counter value the next frame will carry (low 16 bits on the wire).
    pub fn transaction_id(&self) -> u32 {
        self.transaction_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Code of the recorded failure, 0 when none.
    pub fn error_code(&self) -> i32 {
        self.failure.as_ref().map_or(0, |f| f.code)
    }

    pub fn error_message(&self) -> &str {
        self.failure.as_ref().map_or("", |f| f.message.as_str())
    }

    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn connect(&mut self) -> Result<(), ModbusError> {
        self.ensure_usable()?;

        match self.state {
            SessionState::Connected => {
                debug!("Already connected to {}:{}", self.host, self.port);
                return Ok(());
            }
            SessionState::Closed => return Err(self.fail(ModbusError::SessionClosed)),
            SessionState::Unconnected => {}
        }

        let addr = match resolve_address(&self.host, self.port) {
            Ok(addr) => addr,
            Err(e) => return Err(self.fail(e)),
        };
        info!("🔌 Connecting to Modbus/TCP server {} (slave {})", addr, self.slave_id);

        if let Err(e) = self.transport.connect(addr) {
            self.transport.close();
            return Err(self.fail(e));
        }

        self.state = SessionState::Connected;
        info!("✅ Connected to {}", addr);
        Ok(())
    }

    /// Release the connection. Safe to call at any time, any number of times.
    pub fn close(&mut self) {
        self.transport.close();
        if self.state == SessionState::Connected {
            self.state = SessionState::Closed;
            info!("👋 Session to {}:{} closed", self.host, self.port);
        }
    }

    /// Write Single Coil (0x05).
    pub fn write_coil(&mut self, address: u16, value: bool) -> Result<usize, ModbusError> {
        self.write(WriteRequest::SingleCoil { address, value })
    }

    /// Write Single Register (0x06).
    pub fn write_register(&mut self, address: u16, value: u16) -> Result<usize, ModbusError> {
        self.write(WriteRequest::SingleRegister { address, value })
    }

    /// Write Multiple Coils (0x0F).
    pub fn write_coils(&mut self, address: u16, values: &[bool]) -> Result<usize, ModbusError> {
        self.write(WriteRequest::MultipleCoils { address, values })
    }

    /// Write Multiple Registers (0x10).
    pub fn write_registers(&mut self, address: u16, values: &[u16]) -> Result<usize, ModbusError> {
        self.write(WriteRequest::MultipleRegisters { address, values })
    }

    /// Encode and send one request. Returns the number of bytes sent.
    pub fn write(&mut self, request: WriteRequest<'_>) -> Result<usize, ModbusError> {
        self.ensure_usable()?;

        if self.state != SessionState::Connected {
            warn!("⚠️  {} ignored: session is not connected", request.function_code());
            return Err(self.fail(ModbusError::NotConnected));
        }

        let frame = match encode_request(self.transaction_id as u16, self.slave_id, &request) {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e)),
        };

        info!(
            "📝 {} at address {} ({} value(s)) to slave {}",
            request.function_code(),
            request.address(),
            request.quantity(),
            self.slave_id
        );
        self.send(&frame)
    }

    // The counter moves once per frame handed to the transport, whether or
    // not the transport manages to deliver it.
    fn send(&mut self, frame: &[u8]) -> Result<usize, ModbusError> {
        debug!(
            "📤 Sending frame #{}: {}",
            self.transaction_id as u16,
            hex::encode(frame)
        );
        self.transaction_id = self.transaction_id.wrapping_add(1);

        match self.transport.send_all(frame) {
            Ok(sent) => {
                debug!("Sent {} bytes", sent);
                Ok(sent)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn ensure_usable(&self) -> Result<(), ModbusError> {
        match &self.failure {
            Some(failure) => Err(ModbusError::SessionFailed {
                code: failure.code,
                message: failure.message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: ModbusError) -> ModbusError {
        error!("❌ {}", err);
        if self.failure.is_none() {
            self.failure = Some(SessionFailure {
                code: err.code(),
                message: err.to_string(),
            });
        }
        err
    }
}

impl<T: Transport> Drop for ModbusSession<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}
