//! Internal utilities.

use std::fmt;

/// Encode bytes as a lowercase hex string.
#[cfg(test)]
pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string to bytes.
///
/// Returns `None` for invalid hex characters or odd-length strings.
#[cfg(test)]
pub(crate) fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Lazy hex formatter - only formats when actually displayed.
///
/// Avoids allocation when logging at disabled levels.
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Debug for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        assert_eq!(encode_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
        assert_eq!(decode_hex("deadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_hex("00FF").unwrap(), vec![0x00, 0xff]);
        assert!(decode_hex("xyz").is_none());
        assert!(decode_hex("abc").is_none());
    }

    #[test]
    fn test_hex_display() {
        assert_eq!(format!("{}", HexBytes(&[0x00, 0x10, 0xff])), "0010ff");
    }
}
