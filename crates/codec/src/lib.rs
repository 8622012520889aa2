//! Blob payload framing.
//!
//! The disperser treats a blob as a sequence of 32-byte symbols, each of
//! which must be a canonical BN254 field element. Raw payloads are framed by
//! prefixing every 31-byte window with a zero byte, which pins the top byte
//! of each symbol to zero and keeps the value below the field modulus. The
//! final window is right-padded with zeros, so the encoded length is always
//! `32 * ceil(len / 31)`.

/// Bytes per encoded symbol.
pub const BYTES_PER_SYMBOL: usize = 32;
/// Payload bytes carried per symbol.
pub const BYTES_PER_WINDOW: usize = 31;

/// Errors from payload decoding.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// the encoded buffer does not match the framing of the claimed length
    #[error("encoded length {encoded} does not match {expected} expected for a {payload}-byte payload")]
    UnexpectedLength { encoded: usize, expected: usize, payload: usize },
}

/// Number of symbols the encoding of a `payload_len`-byte payload occupies.
pub const fn encoded_symbols(payload_len: usize) -> usize {
    payload_len.div_ceil(BYTES_PER_WINDOW)
}

/// Length in bytes of the encoding of a `payload_len`-byte payload.
pub const fn encoded_len(payload_len: usize) -> usize {
    encoded_symbols(payload_len) * BYTES_PER_SYMBOL
}

/// Frame a raw payload into field-element-safe symbols.
pub fn encode_payload(data: &[u8]) -> Vec<u8> {
    let mut encoded = vec![0u8; encoded_len(data.len())];
    for (window, chunk) in data.chunks(BYTES_PER_WINDOW).enumerate() {
        let start = window * BYTES_PER_SYMBOL + 1;
        encoded[start..start + chunk.len()].copy_from_slice(chunk);
    }
    encoded
}

/// Recover the raw payload from its framed encoding.
///
/// The original payload length is required: without it the trailing padding
/// of the final window cannot be told apart from payload zeros.
pub fn decode_payload(encoded: &[u8], payload_len: usize) -> Result<Vec<u8>, CodecError> {
    let expected = encoded_len(payload_len);
    if encoded.len() != expected {
        return Err(CodecError::UnexpectedLength {
            encoded: encoded.len(),
            expected,
            payload: payload_len,
        });
    }

    let mut decoded = Vec::with_capacity(payload_len);
    for symbol in encoded.chunks(BYTES_PER_SYMBOL) {
        let take = (payload_len - decoded.len()).min(BYTES_PER_WINDOW);
        decoded.extend_from_slice(&symbol[1..1 + take]);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifteen_byte_payload() {
        let raw = b"Hello, EigenDA!";
        assert_eq!(raw.len(), 15);

        let encoded = encode_payload(raw);
        assert_eq!(encoded.len(), 32);
        assert_eq!(encoded[0], 0);
        assert_eq!(&encoded[1..16], raw);
        assert!(encoded[16..].iter().all(|&b| b == 0));

        assert_eq!(decode_payload(&encoded, raw.len()).unwrap(), raw);
    }

    #[test]
    fn empty_payload() {
        assert!(encode_payload(&[]).is_empty());
        assert_eq!(decode_payload(&[], 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn every_symbol_starts_with_zero() {
        for len in [1usize, 30, 31, 32, 62, 63, 100, 1000] {
            let raw: Vec<u8> = (0..len).map(|i| (i % 251) as u8 + 1).collect();
            let encoded = encode_payload(&raw);
            assert_eq!(encoded.len(), 32 * len.div_ceil(31));
            for symbol in encoded.chunks(BYTES_PER_SYMBOL) {
                assert_eq!(symbol.len(), BYTES_PER_SYMBOL);
                assert_eq!(symbol[0], 0);
            }
        }
    }

    #[test]
    fn round_trip_preserves_trailing_zeros() {
        // Payload zeros at the tail must survive even though the final window
        // is zero-padded.
        let raw = [1u8, 2, 3, 0, 0, 0];
        let encoded = encode_payload(&raw);
        assert_eq!(decode_payload(&encoded, raw.len()).unwrap(), raw);
    }

    #[test]
    fn round_trip_various_lengths() {
        for len in [1usize, 31, 32, 61, 62, 63, 93, 4096] {
            let raw: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
            let encoded = encode_payload(&raw);
            assert_eq!(decode_payload(&encoded, len).unwrap(), raw);
        }
    }

    #[test]
    fn length_mismatch_rejected() {
        let encoded = encode_payload(b"some payload");
        let err = decode_payload(&encoded, 100).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedLength { encoded: 32, expected: 128, payload: 100 }
        );

        // Truncated buffer with the right payload length is also rejected.
        assert!(decode_payload(&encoded[..31], 12).is_err());
    }
}
