//! MBAP + PDU request encoding for the Modbus write function codes.
//!
//! Every frame is built into a fresh `Vec<u8>` of exactly the encoded length.
//! The length field of the header counts the unit id plus the PDU, so it is
//! always the total frame length minus six.

use super::protocol::{
    MbapHeader, WriteRequest, COIL_OFF, COIL_ON, MAX_FRAME_LEN, MAX_WRITE_COILS,
    MAX_WRITE_REGISTERS,
};
use crate::utils::error::ModbusError;

/// Encode a complete Modbus/TCP request frame.
///
/// `transaction_id` is placed on the wire as-is; callers holding a wider
/// counter pass its low 16 bits.
pub fn encode_request(
    transaction_id: u16,
    unit_id: u8,
    request: &WriteRequest<'_>,
) -> Result<Vec<u8>, ModbusError> {
    validate_request(request)?;

    let pdu = encode_pdu(request);
    let header = MbapHeader::new(transaction_id, (pdu.len() + 1) as u16, unit_id);

    let mut frame = Vec::with_capacity(frame_len(request));
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(&pdu);
    debug_assert!(frame.len() <= MAX_FRAME_LEN);
    Ok(frame)
}

// Callers validate first: quantities past the protocol limits do not fit the
// count fields.
fn encode_pdu(request: &WriteRequest<'_>) -> Vec<u8> {
    let mut pdu = Vec::with_capacity(pdu_len(request));
    pdu.push(request.function_code().as_u8());
    pdu.extend_from_slice(&request.address().to_be_bytes());

    match request {
        WriteRequest::SingleCoil { value, .. } => {
            let raw = if *value { COIL_ON } else { COIL_OFF };
            pdu.extend_from_slice(&raw.to_be_bytes());
        }
        WriteRequest::SingleRegister { value, .. } => {
            pdu.extend_from_slice(&value.to_be_bytes());
        }
        WriteRequest::MultipleCoils { values, .. } => {
            let packed = pack_coils(values);
            pdu.extend_from_slice(&(values.len() as u16).to_be_bytes());
            pdu.push(packed.len() as u8);
            pdu.extend_from_slice(&packed);
        }
        WriteRequest::MultipleRegisters { values, .. } => {
            pdu.extend_from_slice(&(values.len() as u16).to_be_bytes());
            pdu.push((values.len() * 2) as u8);
            for value in values.iter() {
                pdu.extend_from_slice(&value.to_be_bytes());
            }
        }
    }

    pdu
}

/// Pack coil states LSB-first: coil `i` lands in byte `i / 8`, bit `i % 8`.
pub fn pack_coils(values: &[bool]) -> Vec<u8> {
    let mut packed = vec![0u8; values.len().div_ceil(8)];
    for (i, &on) in values.iter().enumerate() {
        if on {
            packed[i / 8] |= 1 << (i % 8);
        }
    }
    packed
}

/// Total frame length `encode_request` produces for this request.
pub fn frame_len(request: &WriteRequest<'_>) -> usize {
    MbapHeader::SIZE + pdu_len(request)
}

fn pdu_len(request: &WriteRequest<'_>) -> usize {
    match request {
        WriteRequest::SingleCoil { .. } | WriteRequest::SingleRegister { .. } => 5,
        WriteRequest::MultipleCoils { values, .. } => 6 + values.len().div_ceil(8),
        WriteRequest::MultipleRegisters { values, .. } => 6 + values.len() * 2,
    }
}

// Zero quantities would encode fine but address nothing; reject them along
// with anything over the protocol limits.
fn validate_request(request: &WriteRequest<'_>) -> Result<(), ModbusError> {
    let (quantity, limit, what) = match request {
        WriteRequest::SingleCoil { .. } | WriteRequest::SingleRegister { .. } => return Ok(()),
        WriteRequest::MultipleCoils { values, .. } => (values.len(), MAX_WRITE_COILS, "coils"),
        WriteRequest::MultipleRegisters { values, .. } => {
            (values.len(), MAX_WRITE_REGISTERS, "registers")
        }
    };

    if quantity == 0 {
        return Err(ModbusError::InvalidData(format!(
            "{} requires at least one value",
            request.function_code()
        )));
    }
    if quantity > limit as usize {
        return Err(ModbusError::InvalidData(format!(
            "Cannot write {} {} in one request (max {})",
            quantity, what, limit
        )));
    }
    Ok(())
}
