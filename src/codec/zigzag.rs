//! Variable-length integer encoding and decoding.
//!
//! Avro stores `int` and `long` values as zigzag-encoded varints, the same
//! encoding Protocol Buffers uses:
//! - Each byte carries 7 bits of data and 1 continuation bit (MSB)
//! - The continuation bit indicates whether more bytes follow
//! - Bytes are in little-endian order
//!
//! Zigzag maps signed values to unsigned so small negative numbers stay
//! short: 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...
//! - Encoding formula: (n << 1) ^ (n >> 63)
//! - Decoding formula: (n >> 1) ^ -(n & 1)

use crate::error::DecodeError;

// ============================================================================
// Decoding Functions
// ============================================================================

/// Decode an unsigned variable-length integer.
///
/// The cursor is advanced past the varint.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
/// - `DecodeError::InvalidVarint` if the varint exceeds 10 bytes
#[inline]
pub fn decode_varint(data: &mut &[u8]) -> Result<u64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        if data.is_empty() {
            return Err(DecodeError::UnexpectedEof);
        }

        let byte = data[0];
        *data = &data[1..];

        // Add the 7 data bits to the result
        result |= ((byte & 0x7F) as u64) << shift;

        // Check if this is the last byte (MSB is 0)
        if byte & 0x80 == 0 {
            return Ok(result);
        }

        shift += 7;

        // Prevent overflow (max 10 bytes for 64-bit varint)
        if shift >= 64 {
            return Err(DecodeError::InvalidVarint);
        }
    }
}

/// Decode a signed variable-length integer (zigzag encoded).
///
/// The cursor is advanced past the varint.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
/// - `DecodeError::InvalidVarint` if the varint exceeds 10 bytes
#[inline]
pub fn decode_zigzag(data: &mut &[u8]) -> Result<i64, DecodeError> {
    let unsigned = decode_varint(data)?;
    // Zigzag decode: (n >> 1) ^ -(n & 1)
    Ok(((unsigned >> 1) as i64) ^ (-((unsigned & 1) as i64)))
}

/// Skip over a varint without decoding its value.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
#[inline]
pub fn skip_varint(data: &mut &[u8]) -> Result<(), DecodeError> {
    loop {
        if data.is_empty() {
            return Err(DecodeError::UnexpectedEof);
        }
        let byte = data[0];
        *data = &data[1..];
        if byte & 0x80 == 0 {
            return Ok(());
        }
    }
}

// ============================================================================
// Encoding Functions
// ============================================================================

/// Encode an unsigned integer as a variable-length integer, appending the
/// bytes to `buf`.
#[inline]
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80; // Set continuation bit
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Encode a signed integer as a zigzag-encoded variable-length integer,
/// appending the bytes to `buf`.
#[inline]
pub fn encode_zigzag(value: i64, buf: &mut Vec<u8>) {
    // Zigzag encode: (n << 1) ^ (n >> 63)
    encode_varint(((value << 1) ^ (value >> 63)) as u64, buf);
}
