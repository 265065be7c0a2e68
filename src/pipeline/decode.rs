//! Stage 1: base64 payload → raw bytes.
//!
//! Uploads arrive as base64 text regardless of media family, so this is the
//! single place malformed input is caught. Decoding is strict: the standard
//! alphabet with correct padding, nothing "best effort". A payload that
//! fails here was corrupted in transit or never base64 to begin with.

use crate::error::ProcessError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Decode a base64 payload with the strict standard engine.
///
/// Malformed padding or characters outside the alphabet fail with
/// [`ProcessError::Decode`]. The empty string decodes to zero bytes.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, ProcessError> {
    let bytes = STANDARD.decode(payload)?;
    debug!("Decoded base64 payload → {} bytes", bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let original: Vec<u8> = (0..=255).collect();
        let encoded = STANDARD.encode(&original);
        assert_eq!(decode_base64(&encoded).unwrap(), original);
    }

    #[test]
    fn rejects_invalid_alphabet() {
        let err = decode_base64("not-valid-base64!!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn rejects_malformed_padding() {
        assert!(decode_base64("abcde").is_err());
    }

    #[test]
    fn empty_payload_is_zero_bytes() {
        assert_eq!(decode_base64("").unwrap(), Vec::<u8>::new());
    }
}
