use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Largest number of payload bytes an unsigned integer may carry.
pub const MAX_UINT_BYTES: usize = 8;

/// Default maximum message payload: 64 MiB.
pub const DEFAULT_MAX_MESSAGE: usize = 64 * 1024 * 1024;

/// Encode an unsigned integer.
///
/// Values below 128 take a single byte. Larger values are written as the
/// negated byte count followed by the big-endian value with leading zero
/// bytes dropped:
/// ```text
/// 7    -> 07
/// 256  -> FE 01 00
/// ```
pub fn put_uint<B: BufMut>(dst: &mut B, x: u64) {
    if x < 0x80 {
        dst.put_u8(x as u8);
        return;
    }
    let len = MAX_UINT_BYTES - (x.leading_zeros() as usize / 8);
    dst.put_u8((len as u8).wrapping_neg());
    dst.put_uint(x, len);
}

/// Encode a signed integer.
///
/// The sign moves into bit 0; negative values are complemented first so
/// small magnitudes stay short.
pub fn put_int<B: BufMut>(dst: &mut B, x: i64) {
    let folded = if x < 0 {
        ((!x as u64) << 1) | 1
    } else {
        (x as u64) << 1
    };
    put_uint(dst, folded);
}

/// Encode a float as its byte-reversed IEEE-754 bits, so exponent bytes
/// come first and trailing zero mantissa bytes vanish.
pub fn put_float<B: BufMut>(dst: &mut B, x: f64) {
    put_uint(dst, x.to_bits().swap_bytes());
}

pub fn put_bool<B: BufMut>(dst: &mut B, x: bool) {
    put_uint(dst, u64::from(x));
}

/// Encode a length-prefixed byte string.
pub fn put_bytes<B: BufMut>(dst: &mut B, data: &[u8]) {
    put_uint(dst, data.len() as u64);
    dst.put_slice(data);
}

pub fn put_str<B: BufMut>(dst: &mut B, data: &str) {
    put_bytes(dst, data.as_bytes());
}

/// Decode an unsigned integer.
pub fn get_uint<B: Buf>(src: &mut B) -> Result<u64> {
    if !src.has_remaining() {
        return Err(WireError::UnexpectedEof);
    }
    let first = src.get_u8();
    if first < 0x80 {
        return Ok(u64::from(first));
    }

    let len = first.wrapping_neg() as usize;
    if len > MAX_UINT_BYTES {
        return Err(WireError::IntegerOverflow { len });
    }
    if src.remaining() < len {
        return Err(WireError::UnexpectedEof);
    }
    Ok(src.get_uint(len))
}

/// Decode a signed integer.
pub fn get_int<B: Buf>(src: &mut B) -> Result<i64> {
    let folded = get_uint(src)?;
    let magnitude = (folded >> 1) as i64;
    if folded & 1 == 1 {
        Ok(!magnitude)
    } else {
        Ok(magnitude)
    }
}

pub fn get_float<B: Buf>(src: &mut B) -> Result<f64> {
    Ok(f64::from_bits(get_uint(src)?.swap_bytes()))
}

/// Decode a bool. Any non-zero value is true.
pub fn get_bool<B: Buf>(src: &mut B) -> Result<bool> {
    Ok(get_uint(src)? != 0)
}

/// Decode an element or byte count as `usize`.
pub fn get_len<B: Buf>(src: &mut B) -> Result<usize> {
    let count = get_uint(src)?;
    usize::try_from(count).map_err(|_| WireError::CountOutOfRange(count))
}

/// Decode a length-prefixed byte string.
///
/// The announced length is checked against the bytes left in `src` before
/// anything is copied.
pub fn get_bytes<B: Buf>(src: &mut B) -> Result<Bytes> {
    let len = get_len(src)?;
    if src.remaining() < len {
        return Err(WireError::UnexpectedEof);
    }
    Ok(src.copy_to_bytes(len))
}

pub fn get_str<B: Buf>(src: &mut B) -> Result<String> {
    let raw = get_bytes(src)?;
    String::from_utf8(raw.to_vec()).map_err(|_| WireError::InvalidUtf8)
}

/// Append one message to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────────────────────────┐
/// │ Length (uint)    │ Payload (Length bytes)       │
/// │ 1-9 bytes        │ type id + definition/value   │
/// └──────────────────┴──────────────────────────────┘
/// ```
pub fn encode_message(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.is_empty() {
        return Err(WireError::EmptyMessage);
    }
    dst.reserve(MAX_UINT_BYTES + 1 + payload.len());
    put_uint(dst, payload.len() as u64);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one message from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message yet.
/// On success, consumes the message bytes from the buffer.
pub fn decode_message(src: &mut BytesMut, max_message: usize) -> Result<Option<Bytes>> {
    let mut peek = &src[..];
    let len = match get_uint(&mut peek) {
        Ok(len) => len,
        Err(WireError::UnexpectedEof) => return Ok(None),
        Err(err) => return Err(err),
    };

    if len == 0 {
        return Err(WireError::EmptyMessage);
    }
    if len > max_message as u64 {
        return Err(WireError::MessageTooLarge {
            size: len,
            max: max_message,
        });
    }

    let header = src.len() - peek.len();
    let len = len as usize;
    if src.len() < header + len {
        return Ok(None);
    }

    src.advance(header);
    Ok(Some(src.split_to(len).freeze()))
}

/// Configuration for message readers and writers.
#[derive(Debug, Clone)]
pub struct WireConfig {
    /// Maximum message payload in bytes. Default: 64 MiB.
    pub max_message_size: usize,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint_bytes(x: u64) -> Vec<u8> {
        let mut buf = BytesMut::new();
        put_uint(&mut buf, x);
        buf.to_vec()
    }

    fn int_bytes(x: i64) -> Vec<u8> {
        let mut buf = BytesMut::new();
        put_int(&mut buf, x);
        buf.to_vec()
    }

    #[test]
    fn uint_known_encodings() {
        assert_eq!(uint_bytes(0), [0x00]);
        assert_eq!(uint_bytes(7), [0x07]);
        assert_eq!(uint_bytes(127), [0x7f]);
        assert_eq!(uint_bytes(128), [0xff, 0x80]);
        assert_eq!(uint_bytes(256), [0xfe, 0x01, 0x00]);
        assert_eq!(uint_bytes(777), [0xfe, 0x03, 0x09]);
        assert_eq!(
            uint_bytes(u64::MAX),
            [0xf8, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn int_known_encodings() {
        assert_eq!(int_bytes(0), [0x00]);
        assert_eq!(int_bytes(-1), [0x01]);
        assert_eq!(int_bytes(42), [0x54]);
        assert_eq!(int_bytes(-129), [0xfe, 0x01, 0x01]);
        assert_eq!(int_bytes(65), [0xff, 0x82]);
        assert_eq!(int_bytes(-65), [0xff, 0x81]);
    }

    #[test]
    fn int_extremes_decode() {
        for x in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX] {
            let encoded = int_bytes(x);
            assert_eq!(get_int(&mut &encoded[..]).unwrap(), x);
        }
    }

    #[test]
    fn float_is_byte_reversed() {
        let mut buf = BytesMut::new();
        put_float(&mut buf, 17.0);
        assert_eq!(buf.as_ref(), [0xfe, 0x31, 0x40]);

        let value = get_float(&mut &buf[..]).unwrap();
        assert_eq!(value.to_bits(), 17.0f64.to_bits());
    }

    #[test]
    fn float_bits_survive() {
        let mut buf = BytesMut::new();
        put_float(&mut buf, 3.14159265);
        put_float(&mut buf, -0.0);
        let mut src = &buf[..];
        assert_eq!(get_float(&mut src).unwrap().to_bits(), 3.14159265f64.to_bits());
        assert_eq!(get_float(&mut src).unwrap().to_bits(), (-0.0f64).to_bits());
        assert!(src.is_empty());
    }

    #[test]
    fn bool_non_zero_is_true() {
        assert!(!get_bool(&mut &[0x00][..]).unwrap());
        assert!(get_bool(&mut &[0x01][..]).unwrap());
        assert!(get_bool(&mut &[0x05][..]).unwrap());
    }

    #[test]
    fn bytes_and_str() {
        let mut buf = BytesMut::new();
        put_bytes(&mut buf, &[1, 2, 3]);
        put_str(&mut buf, "gob");
        assert_eq!(buf.as_ref(), [0x03, 1, 2, 3, 0x03, b'g', b'o', b'b']);

        let mut src = &buf[..];
        assert_eq!(get_bytes(&mut src).unwrap().as_ref(), [1, 2, 3]);
        assert_eq!(get_str(&mut src).unwrap(), "gob");
    }

    #[test]
    fn uint_truncated() {
        let result = get_uint(&mut &[0xfe, 0x01][..]);
        assert!(matches!(result, Err(WireError::UnexpectedEof)));

        let result = get_uint(&mut &[0u8; 0][..]);
        assert!(matches!(result, Err(WireError::UnexpectedEof)));
    }

    #[test]
    fn uint_too_many_bytes() {
        let result = get_uint(&mut &[0xf7, 0, 0, 0, 0, 0, 0, 0, 0, 0][..]);
        assert!(matches!(result, Err(WireError::IntegerOverflow { len: 9 })));

        let result = get_uint(&mut &[0x80][..]);
        assert!(matches!(result, Err(WireError::IntegerOverflow { len: 128 })));
    }

    #[test]
    fn bytes_length_past_end() {
        let result = get_bytes(&mut &[0x05, 1, 2][..]);
        assert!(matches!(result, Err(WireError::UnexpectedEof)));
    }

    #[test]
    fn str_rejects_invalid_utf8() {
        let result = get_str(&mut &[0x02, 0xc3, 0x28][..]);
        assert!(matches!(result, Err(WireError::InvalidUtf8)));
    }

    #[test]
    fn test_encode_decode_message() {
        let mut buf = BytesMut::new();
        encode_message(b"hello, gob!", &mut buf).unwrap();
        assert_eq!(buf[0], 11);

        let message = decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        assert_eq!(message.as_ref(), b"hello, gob!");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0xfe, 0x01][..]);
        assert!(decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .is_none());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_message(b"hello", &mut buf).unwrap();
        buf.truncate(3);

        assert!(decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decode_message_too_large() {
        let mut buf = BytesMut::new();
        put_uint(&mut buf, 1024);
        let result = decode_message(&mut buf, 512);
        assert!(matches!(
            result,
            Err(WireError::MessageTooLarge { size: 1024, max: 512 })
        ));
    }

    #[test]
    fn test_zero_length_message() {
        let mut buf = BytesMut::from(&[0x00][..]);
        let result = decode_message(&mut buf, DEFAULT_MAX_MESSAGE);
        assert!(matches!(result, Err(WireError::EmptyMessage)));

        let result = encode_message(b"", &mut BytesMut::new());
        assert!(matches!(result, Err(WireError::EmptyMessage)));
    }

    #[test]
    fn test_multiple_messages() {
        let mut buf = BytesMut::new();
        encode_message(b"first", &mut buf).unwrap();
        encode_message(&[0xaa; 300], &mut buf).unwrap();

        let m1 = decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        assert_eq!(m1.as_ref(), b"first");

        let m2 = decode_message(&mut buf, DEFAULT_MAX_MESSAGE)
            .unwrap()
            .unwrap();
        assert_eq!(m2.len(), 300);
        assert!(buf.is_empty());
    }
}
