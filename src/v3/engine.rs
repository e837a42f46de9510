//! Authoritative engine ID structure (RFC 3411 Section 5).
//!
//! An engine ID is 5-32 bytes. The first bit selects between the RFC 3411
//! layout and the historic RFC 1910 one; under RFC 3411 the first four bytes
//! carry the enterprise number and the fifth selects the format of the rest.
//! Classification is informational: a malformed payload degrades to the raw
//! octets rather than failing the message.

use crate::error::{ConfigErrorKind, Error, Result};
use bytes::Bytes;

/// Engine ID length bounds per RFC 3411.
pub const MIN_ENGINE_ID_LEN: usize = 5;
pub const MAX_ENGINE_ID_LEN: usize = 32;

/// Structured reading of an engine ID's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineIdFormat {
    /// Format 1: IPv4 address.
    Ipv4([u8; 4]),
    /// Format 2: IPv6 address.
    Ipv6([u8; 16]),
    /// Format 3: MAC address. A 7-byte payload is the Cisco variant with a
    /// leading sub-type octet, which is skipped.
    Mac([u8; 6]),
    /// Format 4: administratively assigned text (up to 27 bytes).
    Text(String),
    /// Format 5: administratively assigned octets (up to 27 bytes).
    Octets(Bytes),
    /// Formats 128-255: enterprise-specific. Format 128 is the common
    /// "random" scheme with 8 or 12 data bytes.
    Vendor { format: u8, data: Bytes },
    /// Historic RFC 1910 layout or a payload that does not match its
    /// declared format.
    Opaque(Bytes),
}

/// An authoritative engine ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineId {
    bytes: Bytes,
}

impl EngineId {
    /// Wrap engine ID bytes, enforcing the RFC 3411 length bounds.
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() < MIN_ENGINE_ID_LEN || bytes.len() > MAX_ENGINE_ID_LEN {
            return Err(Error::config(ConfigErrorKind::EngineIdLength {
                length: bytes.len(),
            }));
        }
        Ok(Self { bytes })
    }

    /// Wrap engine ID bytes as observed on the wire, without length
    /// enforcement (non-conforming agents exist; the bytes still key the
    /// user cache).
    pub fn from_wire(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        if bytes.len() < MIN_ENGINE_ID_LEN || bytes.len() > MAX_ENGINE_ID_LEN {
            tracing::warn!(
                target: "snmp_dissect::usm",
                length = bytes.len(),
                "engine ID length outside RFC 3411 bounds"
            );
        }
        Self { bytes }
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True when the first bit selects the RFC 3411 layout.
    pub fn is_rfc3411(&self) -> bool {
        self.bytes.first().is_some_and(|b| b & 0x80 != 0)
    }

    /// Enterprise number from the first four bytes (conformance bit
    /// masked off). `None` when fewer than four bytes are present.
    pub fn enterprise(&self) -> Option<u32> {
        if self.bytes.len() < 4 {
            return None;
        }
        let raw = u32::from_be_bytes([
            self.bytes[0],
            self.bytes[1],
            self.bytes[2],
            self.bytes[3],
        ]);
        Some(raw & 0x7FFF_FFFF)
    }

    /// Classify the payload per the declared format octet.
    pub fn format(&self) -> EngineIdFormat {
        if !self.is_rfc3411() || self.bytes.len() < 5 {
            return EngineIdFormat::Opaque(self.bytes.clone());
        }

        let format = self.bytes[4];
        let rest = self.bytes.slice(5..);
        match format {
            1 if rest.len() == 4 => EngineIdFormat::Ipv4([rest[0], rest[1], rest[2], rest[3]]),
            2 if rest.len() == 16 => {
                let mut a = [0u8; 16];
                a.copy_from_slice(&rest);
                EngineIdFormat::Ipv6(a)
            }
            3 if rest.len() == 6 => {
                let mut m = [0u8; 6];
                m.copy_from_slice(&rest);
                EngineIdFormat::Mac(m)
            }
            // Cisco prefixes the MAC with one sub-type octet
            3 if rest.len() == 7 => {
                let mut m = [0u8; 6];
                m.copy_from_slice(&rest[1..]);
                EngineIdFormat::Mac(m)
            }
            4 if rest.len() <= 27 => match String::from_utf8(rest.to_vec()) {
                Ok(text) => EngineIdFormat::Text(text),
                Err(_) => EngineIdFormat::Opaque(self.bytes.clone()),
            },
            5 if rest.len() <= 27 => EngineIdFormat::Octets(rest),
            128..=255 => {
                if format == 128 && !(rest.len() == 8 || rest.len() == 12) {
                    tracing::debug!(
                        target: "snmp_dissect::usm",
                        length = rest.len(),
                        "format-128 engine ID data is usually 8 or 12 bytes"
                    );
                }
                EngineIdFormat::Vendor { format, data: rest }
            }
            _ => EngineIdFormat::Opaque(self.bytes.clone()),
        }
    }
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::util::HexBytes(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_bounds() {
        assert!(EngineId::new(Bytes::from_static(&[0x80; 4])).is_err());
        assert!(EngineId::new(Bytes::from_static(&[0x80; 5])).is_ok());
        assert!(EngineId::new(Bytes::from_static(&[0x80; 32])).is_ok());
        assert!(EngineId::new(Bytes::from_static(&[0x80; 33])).is_err());
    }

    #[test]
    fn test_enterprise_number_masks_conformance_bit() {
        // net-snmp enterprise 8072 = 0x1F88
        let id = EngineId::from_wire(Bytes::from_static(&[
            0x80, 0x00, 0x1F, 0x88, 0x80, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        ]));
        assert!(id.is_rfc3411());
        assert_eq!(id.enterprise(), Some(8072));
    }

    #[test]
    fn test_ipv4_format() {
        let id = EngineId::from_wire(Bytes::from_static(&[
            0x80, 0x00, 0x00, 0x09, 0x01, 192, 168, 0, 1,
        ]));
        assert_eq!(id.format(), EngineIdFormat::Ipv4([192, 168, 0, 1]));
    }

    #[test]
    fn test_mac_format_plain_and_cisco() {
        let id = EngineId::from_wire(Bytes::from_static(&[
            0x80, 0x00, 0x00, 0x09, 0x03, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
        ]));
        assert_eq!(
            id.format(),
            EngineIdFormat::Mac([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF])
        );

        // Cisco variant with one sub-type octet before the MAC
        let id = EngineId::from_wire(Bytes::from_static(&[
            0x80, 0x00, 0x00, 0x09, 0x03, 0x7F, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
        ]));
        assert_eq!(
            id.format(),
            EngineIdFormat::Mac([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF])
        );
    }

    #[test]
    fn test_text_format() {
        let id = EngineId::from_wire(Bytes::from_static(&[
            0x80, 0x00, 0x1F, 0x88, 0x04, b'r', b'o', b'u', b't', b'e', b'r',
        ]));
        assert_eq!(id.format(), EngineIdFormat::Text("router".to_string()));
    }

    #[test]
    fn test_vendor_random_format() {
        let id = EngineId::from_wire(Bytes::from_static(&[
            0x80, 0x00, 0x1F, 0x88, 0x80, 1, 2, 3, 4, 5, 6, 7, 8,
        ]));
        match id.format() {
            EngineIdFormat::Vendor { format: 128, data } => assert_eq!(data.len(), 8),
            other => panic!("expected vendor format, got {other:?}"),
        }
    }

    #[test]
    fn test_rfc1910_layout_is_opaque() {
        let id = EngineId::from_wire(Bytes::from_static(&[0x00, 0x00, 0x00, 0x09, 0x01, 0x02]));
        assert!(!id.is_rfc3411());
        assert!(matches!(id.format(), EngineIdFormat::Opaque(_)));
    }

    #[test]
    fn test_declared_format_with_wrong_width_is_opaque() {
        // Declares IPv4 but carries 3 payload bytes
        let id = EngineId::from_wire(Bytes::from_static(&[
            0x80, 0x00, 0x00, 0x09, 0x01, 192, 168, 0,
        ]));
        assert!(matches!(id.format(), EngineIdFormat::Opaque(_)));
    }
}
