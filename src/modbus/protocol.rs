use std::fmt;

use crate::utils::error::ModbusError;

/// Standard Modbus/TCP server port.
pub const DEFAULT_PORT: u16 = 502;

/// Protocol identifier carried in every MBAP header (0 = Modbus).
pub const PROTOCOL_ID: u16 = 0x0000;

/// Largest ADU a Modbus/TCP peer is required to accept.
pub const MAX_FRAME_LEN: usize = 260;

pub const COIL_ON: u16 = 0xFF00;
pub const COIL_OFF: u16 = 0x0000;

/// Quantity limits for the multiple-write function codes.
pub const MAX_WRITE_COILS: u16 = 0x07B0;
pub const MAX_WRITE_REGISTERS: u16 = 0x007B;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 0x01,
    ReadDiscreteInputs = 0x02,
    ReadHoldingRegisters = 0x03,
    ReadInputRegisters = 0x04,
    WriteSingleCoil = 0x05,
    WriteSingleRegister = 0x06,
    WriteMultipleCoils = 0x0F,
    WriteMultipleRegisters = 0x10,
}

impl FunctionCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FunctionCode {
    type Error = ModbusError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(FunctionCode::ReadCoils),
            0x02 => Ok(FunctionCode::ReadDiscreteInputs),
            0x03 => Ok(FunctionCode::ReadHoldingRegisters),
            0x04 => Ok(FunctionCode::ReadInputRegisters),
            0x05 => Ok(FunctionCode::WriteSingleCoil),
            0x06 => Ok(FunctionCode::WriteSingleRegister),
            0x0F => Ok(FunctionCode::WriteMultipleCoils),
            0x10 => Ok(FunctionCode::WriteMultipleRegisters),
            other => Err(ModbusError::InvalidData(format!(
                "Unknown function code 0x{:02X}",
                other
            ))),
        }
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionCode::ReadCoils => "Read Coils",
            FunctionCode::ReadDiscreteInputs => "Read Discrete Inputs",
            FunctionCode::ReadHoldingRegisters => "Read Holding Registers",
            FunctionCode::ReadInputRegisters => "Read Input Registers",
            FunctionCode::WriteSingleCoil => "Write Single Coil",
            FunctionCode::WriteSingleRegister => "Write Single Register",
            FunctionCode::WriteMultipleCoils => "Write Multiple Coils",
            FunctionCode::WriteMultipleRegisters => "Write Multiple Registers",
        };
        write!(f, "{} (0x{:02X})", name, self.as_u8())
    }
}

/// A write request as handed to the frame encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteRequest<'a> {
    SingleCoil {
        address: u16,
        value: bool,
    },
    SingleRegister {
        address: u16,
        value: u16,
    },
    MultipleCoils {
        address: u16,
        values: &'a [bool],
    },
    MultipleRegisters {
        address: u16,
        values: &'a [u16],
    },
}

impl WriteRequest<'_> {
    pub fn function_code(&self) -> FunctionCode {
        match self {
            WriteRequest::SingleCoil { .. } => FunctionCode::WriteSingleCoil,
            WriteRequest::SingleRegister { .. } => FunctionCode::WriteSingleRegister,
            WriteRequest::MultipleCoils { .. } => FunctionCode::WriteMultipleCoils,
            WriteRequest::MultipleRegisters { .. } => FunctionCode::WriteMultipleRegisters,
        }
    }

    pub fn address(&self) -> u16 {
        match self {
            WriteRequest::SingleCoil { address, .. }
            | WriteRequest::SingleRegister { address, .. }
            | WriteRequest::MultipleCoils { address, .. }
            | WriteRequest::MultipleRegisters { address, .. } => *address,
        }
    }

    /// Number of coils or registers addressed by the request.
    pub fn quantity(&self) -> usize {
        match self {
            WriteRequest::SingleCoil { .. } | WriteRequest::SingleRegister { .. } => 1,
            WriteRequest::MultipleCoils { values, .. } => values.len(),
            WriteRequest::MultipleRegisters { values, .. } => values.len(),
        }
    }
}

/// Modbus Application Protocol header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    pub transaction_id: u16,
    pub protocol_id: u16,
    /// Byte count from the unit id to the end of the PDU.
    pub length: u16,
    pub unit_id: u8,
}

impl MbapHeader {
    pub const SIZE: usize = 7;

    pub fn new(transaction_id: u16, length: u16, unit_id: u8) -> Self {
        Self {
            transaction_id,
            protocol_id: PROTOCOL_ID,
            length,
            unit_id,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.transaction_id.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.protocol_id.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.length.to_be_bytes());
        bytes[6] = self.unit_id;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            transaction_id: u16::from_be_bytes([bytes[0], bytes[1]]),
            protocol_id: u16::from_be_bytes([bytes[2], bytes[3]]),
            length: u16::from_be_bytes([bytes[4], bytes[5]]),
            unit_id: bytes[6],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_code_from_byte() {
        assert_eq!(
            FunctionCode::try_from(0x06).unwrap(),
            FunctionCode::WriteSingleRegister
        );
        assert_eq!(
            FunctionCode::try_from(0x0F).unwrap(),
            FunctionCode::WriteMultipleCoils
        );
        assert_eq!(
            FunctionCode::try_from(0x03).unwrap(),
            FunctionCode::ReadHoldingRegisters
        );
        assert!(FunctionCode::try_from(0x2B).is_err());
    }

    #[test]
    fn test_mbap_header_layout() {
        let header = MbapHeader::new(0x1234, 6, 0x11);
        assert_eq!(
            header.to_bytes(),
            [0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0x11]
        );
        assert_eq!(MbapHeader::from_bytes(&header.to_bytes()), Some(header));
        assert_eq!(MbapHeader::from_bytes(&[0x00, 0x01]), None);
    }

    #[test]
    fn test_request_quantity() {
        let coils = [true, false, true];
        let request = WriteRequest::MultipleCoils {
            address: 10,
            values: &coils,
        };
        assert_eq!(request.quantity(), 3);
        assert_eq!(request.address(), 10);
        assert_eq!(request.function_code(), FunctionCode::WriteMultipleCoils);
    }
}
