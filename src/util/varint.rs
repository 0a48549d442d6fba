//! Variable-byte integer encoding.
//!
//! Values are written as little-endian groups of 7 bits. Every byte except the
//! last has its high bit set, so a `u64` occupies between 1 and 10 bytes and
//! values below 128 occupy exactly one.
//!
//! The slice based functions never fail loudly: [`encode_into`] reports a lack
//! of room by returning 0 and [`decode`] reports truncated or overflowing input
//! by returning `None`. Callers that own growable buffers use this to decide
//! when to grow and retry.

use std::io::{Read, Write};

use byteorder::ReadBytesExt;

use crate::error::{FalchionError, Result};

/// Maximum number of bytes a `u64` can occupy.
pub const MAX_VARINT_LEN: usize = 10;

/// Number of bytes `value` occupies once encoded.
#[inline]
pub fn encoded_len(value: u64) -> usize {
    // 7 payload bits per byte; zero still takes one byte.
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Encode `value` at the start of `dest`.
///
/// Returns the number of bytes written, or 0 if `dest` is too short to hold
/// the whole encoding (in which case nothing is written).
#[inline]
pub fn encode_into(value: u64, dest: &mut [u8]) -> usize {
    let len = encoded_len(value);
    if dest.len() < len {
        return 0;
    }

    let mut val = value;
    for byte in dest.iter_mut().take(len - 1) {
        *byte = (val as u8 & 0x7F) | 0x80;
        val >>= 7;
    }
    dest[len - 1] = val as u8;
    len
}

/// Decode one value from the start of `src`.
///
/// Returns the value and the number of bytes consumed, or `None` if `src`
/// ends inside the encoding or the value does not fit in a `u64`.
#[inline]
pub fn decode(src: &[u8]) -> Option<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0u32;

    for (i, &byte) in src.iter().enumerate() {
        let payload = (byte & 0x7F) as u64;
        if shift == 63 && payload > 1 {
            return None;
        }
        result |= payload << shift;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift += 7;
        if shift > 63 {
            return None;
        }
    }

    None
}

/// Skip exactly `n` consecutive encoded values without decoding them.
///
/// Returns the number of bytes skipped, or `None` if `src` holds fewer than
/// `n` complete values.
#[inline]
pub fn skip_n(src: &[u8], n: usize) -> Option<usize> {
    if n == 0 {
        return Some(0);
    }

    let mut remaining = n;
    for (i, &byte) in src.iter().enumerate() {
        if byte & 0x80 == 0 {
            remaining -= 1;
            if remaining == 0 {
                return Some(i + 1);
            }
        }
    }

    None
}

/// Encode a u64 value into a freshly allocated vector.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut bytes = vec![0u8; encoded_len(value)];
    encode_into(value, &mut bytes);
    bytes
}

/// Write a variable-length encoded u64 to a writer.
pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> Result<usize> {
    let mut scratch = [0u8; MAX_VARINT_LEN];
    let len = encode_into(value, &mut scratch);
    writer.write_all(&scratch[..len])?;
    Ok(len)
}

/// Read a variable-length encoded u64 from a reader.
pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut result = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = reader.read_u8()?;
        let payload = (byte & 0x7F) as u64;

        if shift > 63 || (shift == 63 && payload > 1) {
            return Err(FalchionError::corrupt("VarInt overflow"));
        }

        result |= payload << shift;

        if (byte & 0x80) == 0 {
            return Ok(result);
        }

        shift += 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encoded_len_boundaries() {
        assert_eq!(encoded_len(0), 1);
        assert_eq!(encoded_len(127), 1);
        assert_eq!(encoded_len(128), 2);
        assert_eq!(encoded_len(16383), 2);
        assert_eq!(encoded_len(16384), 3);
        assert_eq!(encoded_len(u32::MAX as u64), 5);
        assert_eq!(encoded_len(u64::MAX), MAX_VARINT_LEN);
    }

    #[test]
    fn test_encode_decode() {
        let test_values = [0, 1, 127, 128, 255, 256, 16383, 16384, u32::MAX as u64, u64::MAX];

        for &value in &test_values {
            let encoded = encode_u64(value);
            assert_eq!(encoded.len(), encoded_len(value));

            let (decoded, bytes_read) = decode(&encoded).unwrap();
            assert_eq!(value, decoded);
            assert_eq!(encoded.len(), bytes_read);
        }
    }

    #[test]
    fn test_wire_layout() {
        assert_eq!(encode_u64(1), vec![0x01]);
        assert_eq!(encode_u64(300), vec![0xAC, 0x02]);
    }

    #[test]
    fn test_encode_into_no_room() {
        let mut dest = [0xFFu8; 1];
        assert_eq!(encode_into(128, &mut dest), 0);
        // Nothing was written.
        assert_eq!(dest, [0xFF]);

        assert_eq!(encode_into(127, &mut dest), 1);
        assert_eq!(dest, [0x7F]);
    }

    #[test]
    fn test_incomplete_varint() {
        assert!(decode(&[]).is_none());
        assert!(decode(&[0x80]).is_none());
        assert!(decode(&[0xFF, 0xFF]).is_none());
    }

    #[test]
    fn test_overflow() {
        let overflow_data = vec![0xFF; 11];
        assert!(decode(&overflow_data).is_none());

        let mut too_big = vec![0xFF; 9];
        too_big.push(0x02);
        assert!(decode(&too_big).is_none());
    }

    #[test]
    fn test_skip_n() {
        let mut buf = Vec::new();
        for value in [5u64, 300, 70000, 1] {
            buf.extend(encode_u64(value));
        }

        assert_eq!(skip_n(&buf, 0), Some(0));
        assert_eq!(skip_n(&buf, 1), Some(1));
        assert_eq!(skip_n(&buf, 2), Some(3));
        assert_eq!(skip_n(&buf, 4), Some(buf.len()));
        assert_eq!(skip_n(&buf, 5), None);
        assert_eq!(skip_n(&buf[..2], 2), None);
    }

    #[test]
    fn test_write_read_u64() {
        let mut buffer = Vec::new();
        let value = 123456789012345u64;

        let bytes_written = write_u64(&mut buffer, value).unwrap();
        assert_eq!(bytes_written, buffer.len());

        let mut cursor = Cursor::new(buffer);
        let decoded = read_u64(&mut cursor).unwrap();

        assert_eq!(value, decoded);
    }

    #[test]
    fn test_read_truncated() {
        let mut cursor = Cursor::new(vec![0x80u8]);
        assert!(read_u64(&mut cursor).is_err());
    }
}
