//! SNMPv3 User-based Security Model (USM).
//!
//! This module implements the pieces of RFC 3414 / RFC 7860 a passive
//! analyzer needs:
//!
//! - USM security parameter decoding
//! - Key localization (password-to-key derivation and extension)
//! - Authentication verification (HMAC-MD5-96, HMAC-SHA-96, HMAC-SHA-2)
//! - Privacy (DES-CBC, AES-128/192/256-CFB) decryption
//! - Engine-ID structure classification (RFC 3411)
//! - The localized/unlocalized user key caches

pub mod auth;
pub mod engine;
pub mod privacy;
pub mod usm;
pub mod users;

pub use auth::{LocalizedKey, MasterKey};
pub use engine::{EngineId, EngineIdFormat};
pub use privacy::{PrivKey, SaltCounter};
pub use users::{UserKeys, UserTable, UsmUserConfig};
pub use usm::{UsmOutcome, UsmSecurityParams, process_message};

/// Error returned when parsing a protocol name fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProtocolError {
    input: String,
    kind: ProtocolKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProtocolKind {
    Auth,
    Priv,
}

impl std::fmt::Display for ParseProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ProtocolKind::Auth => write!(
                f,
                "unknown authentication protocol '{}'; expected one of: MD5, SHA, SHA-224, SHA-256, SHA-384, SHA-512",
                self.input
            ),
            ProtocolKind::Priv => write!(
                f,
                "unknown privacy protocol '{}'; expected one of: DES, AES, AES-192, AES-256",
                self.input
            ),
        }
    }
}

impl std::error::Error for ParseProtocolError {}

/// Authentication protocol identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuthProtocol {
    /// HMAC-MD5-96 (RFC 3414)
    Md5,
    /// HMAC-SHA-96 (RFC 3414)
    Sha1,
    /// HMAC-SHA-224 (RFC 7860)
    Sha224,
    /// HMAC-SHA-256 (RFC 7860)
    Sha256,
    /// HMAC-SHA-384 (RFC 7860)
    Sha384,
    /// HMAC-SHA-512 (RFC 7860)
    Sha512,
}

impl std::fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Md5 => write!(f, "MD5"),
            Self::Sha1 => write!(f, "SHA"),
            Self::Sha224 => write!(f, "SHA-224"),
            Self::Sha256 => write!(f, "SHA-256"),
            Self::Sha384 => write!(f, "SHA-384"),
            Self::Sha512 => write!(f, "SHA-512"),
        }
    }
}

impl std::str::FromStr for AuthProtocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MD5" => Ok(Self::Md5),
            "SHA" | "SHA1" | "SHA-1" => Ok(Self::Sha1),
            "SHA224" | "SHA-224" | "SHA2-224" => Ok(Self::Sha224),
            "SHA256" | "SHA-256" | "SHA2-256" => Ok(Self::Sha256),
            "SHA384" | "SHA-384" | "SHA2-384" => Ok(Self::Sha384),
            "SHA512" | "SHA-512" | "SHA2-512" => Ok(Self::Sha512),
            _ => Err(ParseProtocolError {
                input: s.to_string(),
                kind: ProtocolKind::Auth,
            }),
        }
    }
}

impl AuthProtocol {
    /// Get the digest output length in bytes.
    ///
    /// This is also the key length produced by key localization, which is
    /// what privacy key derivation extends from.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Get the truncated authentication tag length carried on the wire.
    ///
    /// The tag may be shorter than the digest (e.g. SHA-512 carries a
    /// 48-byte tag per RFC 7860).
    pub fn mac_len(self) -> usize {
        match self {
            Self::Md5 | Self::Sha1 => 12, // HMAC-96
            Self::Sha224 => 16,           // RFC 7860
            Self::Sha256 => 24,           // RFC 7860
            Self::Sha384 => 32,           // RFC 7860
            Self::Sha512 => 48,           // RFC 7860
        }
    }
}

/// Privacy protocol identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrivProtocol {
    /// DES-CBC (RFC 3414). Insecure; still common in captures.
    Des,
    /// AES-128-CFB (RFC 3826)
    Aes128,
    /// AES-192-CFB (draft-blumenthal-aes-usm-04)
    Aes192,
    /// AES-256-CFB (draft-blumenthal-aes-usm-04)
    Aes256,
}

impl std::fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Des => write!(f, "DES"),
            Self::Aes128 => write!(f, "AES"),
            Self::Aes192 => write!(f, "AES-192"),
            Self::Aes256 => write!(f, "AES-256"),
        }
    }
}

impl std::str::FromStr for PrivProtocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DES" => Ok(Self::Des),
            "AES" | "AES128" | "AES-128" => Ok(Self::Aes128),
            "AES192" | "AES-192" => Ok(Self::Aes192),
            "AES256" | "AES-256" => Ok(Self::Aes256),
            _ => Err(ParseProtocolError {
                input: s.to_string(),
                kind: ProtocolKind::Priv,
            }),
        }
    }
}

impl PrivProtocol {
    /// Get the localized key length the protocol needs.
    pub fn key_len(self) -> usize {
        match self {
            Self::Des => 16, // 8 cipher key + 8 pre-IV
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// Privacy parameters (salt) length; 8 bytes for every protocol.
    pub fn salt_len(self) -> usize {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_protocol_display() {
        assert_eq!(AuthProtocol::Md5.to_string(), "MD5");
        assert_eq!(AuthProtocol::Sha1.to_string(), "SHA");
        assert_eq!(AuthProtocol::Sha224.to_string(), "SHA-224");
        assert_eq!(AuthProtocol::Sha512.to_string(), "SHA-512");
    }

    #[test]
    fn test_auth_protocol_from_str() {
        assert_eq!("MD5".parse::<AuthProtocol>().unwrap(), AuthProtocol::Md5);
        assert_eq!("md5".parse::<AuthProtocol>().unwrap(), AuthProtocol::Md5);
        assert_eq!("SHA".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha1);
        assert_eq!("sha-1".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha1);
        assert_eq!(
            "SHA2-256".parse::<AuthProtocol>().unwrap(),
            AuthProtocol::Sha256
        );
        assert_eq!(
            "sha-384".parse::<AuthProtocol>().unwrap(),
            AuthProtocol::Sha384
        );
        assert!("invalid".parse::<AuthProtocol>().is_err());
    }

    #[test]
    fn test_priv_protocol_from_str() {
        assert_eq!("DES".parse::<PrivProtocol>().unwrap(), PrivProtocol::Des);
        assert_eq!("aes".parse::<PrivProtocol>().unwrap(), PrivProtocol::Aes128);
        assert_eq!(
            "AES-192".parse::<PrivProtocol>().unwrap(),
            PrivProtocol::Aes192
        );
        assert_eq!(
            "aes256".parse::<PrivProtocol>().unwrap(),
            PrivProtocol::Aes256
        );
        assert!("3DES".parse::<PrivProtocol>().is_err());
    }

    #[test]
    fn test_tag_and_digest_lengths() {
        // RFC 3414 + RFC 7860 tables
        let table = [
            (AuthProtocol::Md5, 16, 12),
            (AuthProtocol::Sha1, 20, 12),
            (AuthProtocol::Sha224, 28, 16),
            (AuthProtocol::Sha256, 32, 24),
            (AuthProtocol::Sha384, 48, 32),
            (AuthProtocol::Sha512, 64, 48),
        ];
        for (proto, digest, mac) in table {
            assert_eq!(proto.digest_len(), digest);
            assert_eq!(proto.mac_len(), mac);
        }
    }

    #[test]
    fn test_priv_key_lengths() {
        assert_eq!(PrivProtocol::Des.key_len(), 16);
        assert_eq!(PrivProtocol::Aes128.key_len(), 16);
        assert_eq!(PrivProtocol::Aes192.key_len(), 24);
        assert_eq!(PrivProtocol::Aes256.key_len(), 32);
        assert_eq!(PrivProtocol::Des.salt_len(), 8);
    }

    #[test]
    fn test_parse_protocol_error_display() {
        let err = "bogus".parse::<AuthProtocol>().unwrap_err();
        assert!(err.to_string().contains("bogus"));
        assert!(err.to_string().contains("authentication protocol"));

        let err = "bogus".parse::<PrivProtocol>().unwrap_err();
        assert!(err.to_string().contains("privacy protocol"));
    }
}
