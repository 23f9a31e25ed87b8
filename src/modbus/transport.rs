use log::{debug, info, warn};
use std::io::{self, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpStream};
use std::time::Duration;

use crate::utils::error::ModbusError;

/// Socket I/O timeout applied to connect, send and receive.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(20);

/// Byte stream a session sends its frames over.
pub trait Transport: Send {
    fn connect(&mut self, addr: SocketAddr) -> Result<(), ModbusError>;

    /// Write the whole frame, returning the number of bytes sent.
    fn send_all(&mut self, frame: &[u8]) -> Result<usize, ModbusError>;

    /// Release the connection. Must be safe to call repeatedly.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Validate a host/port pair and turn it into a socket address.
pub fn resolve_address(host: &str, port: u16) -> Result<SocketAddr, ModbusError> {
    if host.trim().is_empty() || port == 0 {
        return Err(ModbusError::ConfigError("Missing host or port".to_string()));
    }

    let ip: Ipv4Addr = host.trim().parse().map_err(|_| {
        ModbusError::ConfigError(format!("Invalid IPv4 address: {}", host))
    })?;

    Ok(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

pub struct TcpTransport {
    stream: Option<TcpStream>,
    timeout: Duration,
}

impl TcpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            stream: None,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[cfg(test)]
    fn stream(&self) -> Option<&TcpStream> {
        self.stream.as_ref()
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_IO_TIMEOUT)
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, addr: SocketAddr) -> Result<(), ModbusError> {
        self.close();

        let timeout = self.timeout();
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ModbusError::Timeout,
            io::ErrorKind::InvalidInput | io::ErrorKind::Unsupported => {
                ModbusError::SocketError(format!("Error opening socket: {}", e))
            }
            _ => ModbusError::ConnectionError(format!("Failed to connect to {}: {}", addr, e)),
        })?;
        debug!("Socket opened to {} (I/O timeout {:?})", addr, timeout);

        stream
            .set_write_timeout(Some(timeout))
            .and_then(|_| stream.set_read_timeout(Some(timeout)))
            .map_err(|e| ModbusError::SocketError(format!("Failed to set socket timeout: {}", e)))?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("⚠️  Could not disable Nagle on {}: {}", addr, e);
        }

        self.stream = Some(stream);
        Ok(())
    }

    // Loops until the whole frame is written instead of trusting a single
    // send() to move every byte.
    fn send_all(&mut self, frame: &[u8]) -> Result<usize, ModbusError> {
        let stream = self.stream.as_mut().ok_or(ModbusError::NotConnected)?;

        stream.write_all(frame).map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ModbusError::Timeout,
            _ => ModbusError::CommunicationError(format!("Write failed: {}", e)),
        })?;
        stream
            .flush()
            .map_err(|e| ModbusError::CommunicationError(format!("Flush failed: {}", e)))?;

        Ok(frame.len())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => info!("🔒 Socket closed"),
                Err(e) => debug!("Socket shutdown reported: {}", e),
            }
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_resolve_address() {
        let addr = resolve_address("127.0.0.1", 502).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:502");
    }

    #[test]
    fn test_resolve_address_rejects_bad_config() {
        let bad = [
            ("", 502),
            ("127.0.0.1", 0),
            ("plc.local", 502),
            ("300.1.1.1", 502),
        ];
        for (host, port) in bad {
            assert!(matches!(
                resolve_address(host, port),
                Err(ModbusError::ConfigError(_))
            ));
        }
    }

    #[test]
    fn test_send_without_connection() {
        let mut transport = TcpTransport::default();
        assert_eq!(transport.timeout(), DEFAULT_IO_TIMEOUT);
        assert!(matches!(
            transport.send_all(&[0x00]),
            Err(ModbusError::NotConnected)
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut transport = TcpTransport::new(Duration::from_secs(1));
        transport.close();
        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn test_connect_applies_io_timeouts() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut transport = TcpTransport::default();
        transport.connect(addr).unwrap();
        let stream = transport.stream().unwrap();
        assert_eq!(stream.write_timeout().unwrap(), Some(DEFAULT_IO_TIMEOUT));
        assert_eq!(stream.read_timeout().unwrap(), Some(DEFAULT_IO_TIMEOUT));

        let custom = Duration::from_secs(7);
        let mut transport = TcpTransport::new(custom);
        transport.connect(addr).unwrap();
        let stream = transport.stream().unwrap();
        assert_eq!(stream.write_timeout().unwrap(), Some(custom));
        assert_eq!(stream.read_timeout().unwrap(), Some(custom));

        transport.close();
        assert!(transport.stream().is_none());
    }
}
