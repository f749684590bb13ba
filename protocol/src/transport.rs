//! Transport encoding for binary attachment content.
//!
//! The widget and the decoder may run in separate execution contexts with
//! only string/JSON-like data exchange between them, so file bytes cross the
//! channel in a text-safe reversible encoding. This is an explicit two-stage
//! transform with a round-trip invariant (`decode(encode(b)) == b`), not
//! implicit serialization.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("payload is not valid base64: {0}")]
pub struct TransportDecodeError(#[from] base64::DecodeError);

/// Encode raw file bytes into their text-safe transport form.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a transport payload back into raw bytes.
pub fn decode(payload: &str) -> Result<Vec<u8>, TransportDecodeError> {
    Ok(STANDARD.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn round_trips_empty_content() {
        assert_eq!(decode(&encode(&[])).expect("decode empty"), Vec::<u8>::new());
    }

    #[test]
    fn round_trips_every_byte_value() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        assert_eq!(decode(&encode(&bytes)).expect("decode bytes"), bytes);
    }

    #[test]
    fn round_trips_text_content() {
        let bytes = b"Hello, World!";
        assert_eq!(decode(&encode(bytes)).expect("decode text"), bytes);
    }

    #[test]
    fn rejects_malformed_payload() {
        assert!(decode("not-base64!!!").is_err());
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut payload = encode(b"Hello, World!");
        payload.pop();
        assert!(decode(&payload).is_err());
    }
}
