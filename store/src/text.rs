//! String-safe text form of binary values stored in key-value backends.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};

use crate::CodecError;

/// Encodes raw bytes into an ASCII string.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    STANDARD_NO_PAD.encode(bytes)
}

/// Decodes a string produced by [`encode`] back into raw bytes.
///
/// Surrounding whitespace is ignored.
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    Ok(STANDARD_NO_PAD.decode(text.trim().as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_value_survives() {
        let bytes: Vec<u8> = (0..=u8::MAX).chain((0..=u8::MAX).rev()).collect();
        let text = encode(&bytes);

        assert!(text.is_ascii());
        assert_eq!(decode(&text), Ok(bytes));
    }

    #[test]
    fn empty_input_encodes_to_empty_text() {
        assert_eq!(encode(&[]), "");
        assert_eq!(decode(""), Ok(Vec::new()));
    }

    #[test]
    fn rejects_characters_outside_alphabet() {
        assert!(matches!(decode("ab$d"), Err(CodecError::Text(_))));
    }
}
