//! Error types for snmp-dissect.
//!
//! Errors are split by origin so a reader of decoded output can tell wire
//! malformation from MIB-index defects, missing credentials, and value-range
//! violations. All enums are `#[non_exhaustive]` to allow adding new variants
//! without breaking changes.

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Invalid BER length encoding.
    InvalidLength,
    /// Indefinite length not supported (length indicator bit set).
    IndefiniteLength,
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Length exceeds maximum.
    LengthExceedsMax { length: usize, max: usize },
    /// Insufficient data for read.
    InsufficientData { needed: usize, available: usize },
    /// High tag numbers (>= 31, long-form identifier) never occur in SNMP.
    HighTagNumber,
    /// Zero-length integer.
    ZeroLengthInteger,
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid OID encoding.
    InvalidOidEncoding,
    /// msgAuthoritativeEngineBoots outside 0..=2147483647.
    InvalidEngineBoots { value: i32 },
    /// msgAuthoritativeEngineTime outside 0..=2147483647.
    InvalidEngineTime { value: i32 },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{expected:02X}, got 0x{actual:02X}")
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({octets} octets)")
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {length} exceeds maximum {max}")
            }
            Self::InsufficientData { needed, available } => {
                write!(f, "need {needed} bytes but only {available} remaining")
            }
            Self::HighTagNumber => write!(f, "long-form tag numbers not used by SNMP"),
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::InvalidEngineBoots { value } => {
                write!(f, "negative msgAuthoritativeEngineBoots: {value}")
            }
            Self::InvalidEngineTime { value } => {
                write!(f, "negative msgAuthoritativeEngineTime: {value}")
            }
        }
    }
}

/// VarBind decode error kinds.
///
/// Each variant corresponds to one exit point of the VarBind decoder and
/// maps to a distinct user-visible diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VarBindErrorKind {
    /// Outer header is not a universal-class SEQUENCE.
    NotSequence { tag: u8 },
    /// ObjectName header is not a universal-class OBJECT IDENTIFIER.
    NotOid { tag: u8 },
    /// Value header uses constructed encoding.
    ConstructedValue { tag: u8 },
    /// ObjectName content does not decode as an OID. Raw bytes kept for
    /// diagnostics.
    InvalidObjectName { raw: bytes::Bytes },
    /// Context-class value with an unknown tag number or non-zero length.
    UnknownContextValue { number: u8, length: usize },
    /// Scalar object with an unexpected number of instance sub-identifiers.
    ScalarInstanceCount { count: usize },
    /// Instance index ran out of sub-identifiers mid-walk.
    IndexShort,
    /// A length prefix in the instance index exceeds the remaining
    /// sub-identifiers.
    IndexTooLong { declared: usize, remaining: usize },
    /// Zero-length sub-OID inside an instance index.
    ZeroLengthIndexOid,
    /// Value class/tag differs from what the OID index expects.
    WrongTag { expected: u8, actual: u8 },
    /// Value length outside the range the OID index expects.
    WrongLength {
        length: usize,
        min: usize,
        max: Option<usize>,
    },
    /// Integral value wider than its type permits.
    IntegerTooLarge { length: usize },
    /// Zero-length encoding for an integral value.
    ZeroLengthInteger,
}

impl std::fmt::Display for VarBindErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSequence { tag } => {
                write!(f, "not a universal class sequence (tag 0x{tag:02X})")
            }
            Self::NotOid { tag } => {
                write!(f, "object name is not an OID (tag 0x{tag:02X})")
            }
            Self::ConstructedValue { tag } => {
                write!(f, "value uses constructed encoding (tag 0x{tag:02X})")
            }
            Self::InvalidObjectName { raw } => {
                write!(f, "invalid OID: ")?;
                for b in raw.iter() {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::UnknownContextValue { number, length } => {
                write!(
                    f,
                    "unknown context-class value (tag {number}, length {length})"
                )
            }
            Self::ScalarInstanceCount { count } => {
                write!(f, "scalar object with {count} instance sub-identifiers")
            }
            Self::IndexShort => write!(f, "index sub-oid shorter than expected"),
            Self::IndexTooLong {
                declared,
                remaining,
            } => {
                write!(
                    f,
                    "index sub-oid too long: {declared} declared, {remaining} remaining"
                )
            }
            Self::ZeroLengthIndexOid => write!(f, "zero-length sub-oid in instance index"),
            Self::WrongTag { expected, actual } => {
                write!(
                    f,
                    "wrong value tag: expected 0x{expected:02X}, got 0x{actual:02X}"
                )
            }
            Self::WrongLength { length, min, max } => match max {
                Some(max) => {
                    write!(f, "wrong value length {length}: expected {min}..={max} bytes")
                }
                None => write!(
                    f,
                    "wrong value length {length}: expected at least {min} bytes"
                ),
            },
            Self::IntegerTooLarge { length } => {
                write!(f, "integral value too large ({length} bytes)")
            }
            Self::ZeroLengthInteger => write!(f, "zero-length integral value"),
        }
    }
}

/// OID-index defect kinds.
///
/// These indicate a bug in the MIB-derived index handed to the decoder, not
/// malformed network data, and are reported at a higher severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum IndexDefectKind {
    /// A column node whose parent is not a row.
    ColumnParentNotRow,
    /// An index key syntax the decoder does not implement.
    UnsupportedIndexSyntax,
}

impl std::fmt::Display for IndexDefectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnParentNotRow => write!(f, "column node's parent is not a row"),
            Self::UnsupportedIndexSyntax => write!(f, "unimplemented instance index"),
        }
    }
}

/// Authentication error kinds (SNMPv3 USM).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthErrorKind {
    /// Message carries no authentication parameters.
    NoAuthenticator,
    /// Resolved user has no authentication key.
    NoAuthKey,
    /// Authentication parameters length differs from the model's tag length.
    WrongMacLength { expected: usize, actual: usize },
    /// Authenticator span extends past the end of the message.
    NotEnoughData,
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAuthenticator => write!(f, "No Authenticator"),
            Self::NoAuthKey => write!(f, "User has no authKey"),
            Self::WrongMacLength { expected, actual } => {
                write!(
                    f,
                    "Authenticator length wrong: expected {expected}, got {actual}"
                )
            }
            Self::NotEnoughData => write!(f, "Not enough data remaining"),
        }
    }
}

/// Cryptographic error kinds (decryption/encryption).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CryptoErrorKind {
    /// No privacy key available.
    NoPrivKey,
    /// Localized key shorter than the cipher requires.
    InvalidKeyLength,
    /// Privacy parameters are not exactly 8 bytes.
    PrivParamsLength { actual: usize },
    /// DES ciphertext length not a positive multiple of the block size.
    InvalidCiphertextLength { length: usize, block_size: usize },
    /// Ciphertext is empty.
    EmptyCiphertext,
    /// Cipher operation failed.
    CipherError,
}

impl std::fmt::Display for CryptoErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPrivKey => write!(f, "no privacy key available"),
            Self::InvalidKeyLength => write!(f, "privacy key too short for cipher"),
            Self::PrivParamsLength { .. } => write!(f, "msgPrivacyParameters length != 8"),
            Self::InvalidCiphertextLength { length, block_size } => {
                write!(
                    f,
                    "ciphertext length {length} not a positive multiple of {block_size}"
                )
            }
            Self::EmptyCiphertext => write!(f, "ciphertext is empty"),
            Self::CipherError => write!(f, "cipher operation failed"),
        }
    }
}

/// USM user-table configuration error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigErrorKind {
    /// Empty user name.
    EmptyUserName,
    /// Non-empty engine ID outside the RFC 3411 length bounds.
    EngineIdLength { length: usize },
    /// Duplicate (userName, engineID) pair.
    DuplicateUser { user_name: Box<str> },
}

impl std::fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUserName => write!(f, "empty user name"),
            Self::EngineIdLength { length } => {
                write!(f, "engine ID length {length} outside 5..=32")
            }
            Self::DuplicateUser { user_name } => {
                write!(f, "duplicate user table entry for '{user_name}'")
            }
        }
    }
}

/// OID construction/validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OidErrorKind {
    /// Invalid arc value in a dotted string.
    InvalidArc,
    /// OID has too many arcs.
    TooManyArcs { count: usize, max: usize },
    /// Subidentifier overflow during decoding.
    SubidentifierOverflow,
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {count} arcs, exceeds maximum {max}")
            }
            Self::SubidentifierOverflow => write!(f, "subidentifier overflow"),
        }
    }
}

/// Library error type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// BER decoding error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// VarBind-level structural or value error.
    #[error("malformed VarBind: {kind}")]
    VarBind { kind: VarBindErrorKind },

    /// Defect in the supplied OID index, not in the network data.
    #[error("OID index defect: {kind}")]
    IndexDefect { kind: IndexDefectKind },

    /// Invalid OID format.
    #[error("invalid OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },

    /// Authentication could not be attempted.
    #[error("authentication failed: {kind}")]
    AuthenticationFailed { kind: AuthErrorKind },

    /// Decryption failed.
    #[error("decryptionError: {kind}")]
    DecryptionFailed { kind: CryptoErrorKind },

    /// Encryption failed.
    #[error("encryption failed: {kind}")]
    EncryptionFailed { kind: CryptoErrorKind },

    /// Invalid USM user-table configuration.
    #[error("invalid USM configuration: {kind}")]
    InvalidConfig { kind: ConfigErrorKind },
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create a VarBind error.
    pub fn varbind(kind: VarBindErrorKind) -> Self {
        Self::VarBind { kind }
    }

    /// Create an OID-index defect error.
    pub fn defect(kind: IndexDefectKind) -> Self {
        Self::IndexDefect { kind }
    }

    /// Create an authentication error.
    pub fn auth(kind: AuthErrorKind) -> Self {
        Self::AuthenticationFailed { kind }
    }

    /// Create a decryption error.
    pub fn decrypt(kind: CryptoErrorKind) -> Self {
        Self::DecryptionFailed { kind }
    }

    /// Create an encryption error.
    pub fn encrypt(kind: CryptoErrorKind) -> Self {
        Self::EncryptionFailed { kind }
    }

    /// Create a configuration error.
    pub fn config(kind: ConfigErrorKind) -> Self {
        Self::InvalidConfig { kind }
    }

    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrypt_error_message() {
        let err = Error::decrypt(CryptoErrorKind::PrivParamsLength { actual: 7 });
        assert_eq!(
            err.to_string(),
            "decryptionError: msgPrivacyParameters length != 8"
        );
    }

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(
            AuthErrorKind::NoAuthenticator.to_string(),
            "No Authenticator"
        );
        assert_eq!(AuthErrorKind::NoAuthKey.to_string(), "User has no authKey");
        assert_eq!(
            AuthErrorKind::NotEnoughData.to_string(),
            "Not enough data remaining"
        );
    }

    #[test]
    fn test_varbind_error_messages_are_distinct() {
        let short = VarBindErrorKind::IndexShort.to_string();
        let long = VarBindErrorKind::IndexTooLong {
            declared: 9,
            remaining: 2,
        }
        .to_string();
        assert_ne!(short, long);
        assert!(short.contains("shorter"));
        assert!(long.contains("too long"));
    }

    #[test]
    fn test_not_sequence_message() {
        let err = Error::varbind(VarBindErrorKind::NotSequence { tag: 0xA0 });
        assert!(err.to_string().contains("not a universal class sequence"));
    }
}
