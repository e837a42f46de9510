//! Authentication key derivation and HMAC verification (RFC 3414, RFC 7860).
//!
//! Implements password-to-key derivation (1 MiB expansion + hash), key
//! localization (binding a key to an engine ID), key extension for privacy
//! protocols that need more material than the hash provides, and truncated
//! HMAC verification over captured messages.

use digest::Digest;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::AuthProtocol;
use crate::error::{AuthErrorKind, Error, Result};

const EXPANSION_SIZE: usize = 1_048_576; // 1 MiB

/// Run `$f::<D>(args...)` with the digest type matching the protocol.
macro_rules! with_digest {
    ($proto:expr, $f:ident($($arg:expr),* $(,)?)) => {
        match $proto {
            AuthProtocol::Md5 => $f::<md5::Md5>($($arg),*),
            AuthProtocol::Sha1 => $f::<sha1::Sha1>($($arg),*),
            AuthProtocol::Sha224 => $f::<sha2::Sha224>($($arg),*),
            AuthProtocol::Sha256 => $f::<sha2::Sha256>($($arg),*),
            AuthProtocol::Sha384 => $f::<sha2::Sha384>($($arg),*),
            AuthProtocol::Sha512 => $f::<sha2::Sha512>($($arg),*),
        }
    };
}

/// Master key `Ku`: the hash of 1 MiB of repeated password material.
///
/// Deriving `Ku` is the expensive step; it depends only on (protocol,
/// password), so it is computed once per configured user and localized per
/// observed engine.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    protocol: AuthProtocol,
}

impl MasterKey {
    /// Derive the master key from a password (RFC 3414 A.2.1).
    ///
    /// A zero-length password is fed through the same procedure with every
    /// buffer byte taken as zero, i.e. the hash of 1 MiB of zeros.
    pub fn from_password(protocol: AuthProtocol, password: &[u8]) -> Self {
        Self {
            key: with_digest!(protocol, password_to_key_impl(password)),
            protocol,
        }
    }

    /// The protocol this key was derived for.
    pub fn protocol(&self) -> AuthProtocol {
        self.protocol
    }

    /// Raw `Ku` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Localize to an engine (RFC 3414 A.2.2): `H(Ku || engineID || Ku)`.
    pub fn localize(&self, engine_id: &[u8]) -> LocalizedKey {
        LocalizedKey {
            key: with_digest!(self.protocol, localize_impl(&self.key, engine_id)),
            protocol: self.protocol,
        }
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("protocol", &self.protocol)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Localized authentication key, bound to one engine ID.
///
/// Key material is zeroed from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LocalizedKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    protocol: AuthProtocol,
}

impl LocalizedKey {
    /// Derive a localized key from a password and engine ID.
    pub fn from_password(protocol: AuthProtocol, password: &[u8], engine_id: &[u8]) -> Self {
        MasterKey::from_password(protocol, password).localize(engine_id)
    }

    /// Create a localized key from raw bytes (e.g. keys from configuration).
    pub fn from_bytes(protocol: AuthProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            protocol,
        }
    }

    /// The protocol this key is for.
    pub fn protocol(&self) -> AuthProtocol {
        self.protocol
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// The wire authentication tag length for this key's protocol.
    pub fn mac_len(&self) -> usize {
        self.protocol.mac_len()
    }

    /// Compute the truncated HMAC tag over `data`.
    ///
    /// Always truncated to the protocol's tag length, which may be shorter
    /// than the digest (SHA-512 digests 64 bytes but tags 48).
    pub fn compute_hmac(&self, data: &[u8]) -> Vec<u8> {
        let tag_len = self.protocol.mac_len();
        with_digest!(self.protocol, hmac_truncated(&self.key, data, tag_len))
    }

    /// Verify a truncated HMAC tag in constant time.
    pub fn verify_hmac(&self, data: &[u8], expected: &[u8]) -> bool {
        let computed = self.compute_hmac(data);
        if computed.len() != expected.len() {
            return false;
        }
        computed.ct_eq(expected).into()
    }
}

impl std::fmt::Debug for LocalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizedKey")
            .field("protocol", &self.protocol)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Extend a localized key to `needed` bytes for privacy protocols whose key
/// is longer than the hash output (AES-192/256 under short hashes).
///
/// Each round feeds the entire accumulated key - at its actual length, not
/// re-wrapped from the original password - through the 1 MiB expansion and
/// localizes the result, appending one digest length per round. The output
/// is truncated to exactly `needed` bytes.
pub fn extend_key(
    protocol: AuthProtocol,
    localized: &LocalizedKey,
    engine_id: &[u8],
    needed: usize,
) -> Vec<u8> {
    let mut key = localized.as_bytes().to_vec();
    while key.len() < needed {
        let round = MasterKey::from_password(protocol, &key).localize(engine_id);
        key.extend_from_slice(round.as_bytes());
    }
    key.truncate(needed);
    key
}

/// Verify the authenticator of a captured message (RFC 3414 Section 6.3.2).
///
/// `auth_offset` is the position of the authentication parameters within
/// `message`; `auth_params` are those bytes as received. The digest is
/// computed over the message with the authenticator span zeroed (the tag is
/// excluded from its own coverage). Returns `Ok(true)`/`Ok(false)` for a
/// completed comparison; errors mean verification could not be attempted.
pub fn verify_message(
    key: &LocalizedKey,
    message: &[u8],
    auth_offset: usize,
    auth_params: &[u8],
) -> Result<bool> {
    if auth_params.is_empty() {
        return Err(Error::auth(AuthErrorKind::NoAuthenticator));
    }
    let tag_len = key.mac_len();
    if auth_params.len() != tag_len {
        return Err(Error::auth(AuthErrorKind::WrongMacLength {
            expected: tag_len,
            actual: auth_params.len(),
        }));
    }
    if auth_offset.saturating_add(tag_len) > message.len() {
        return Err(Error::auth(AuthErrorKind::NotEnoughData));
    }

    // Scratch copy with the authenticator zeroed; the capture itself is
    // never mutated.
    let mut scratch = message.to_vec();
    scratch[auth_offset..auth_offset + tag_len].fill(0);

    Ok(key.verify_hmac(&scratch, auth_params))
}

fn password_to_key_impl<D: Digest>(password: &[u8]) -> Vec<u8> {
    let mut hasher = D::new();
    let mut buf = [0u8; 64];
    let mut fed = 0usize;

    if password.is_empty() {
        while fed < EXPANSION_SIZE {
            hasher.update(buf);
            fed += buf.len();
        }
        return hasher.finalize().to_vec();
    }

    let mut idx = 0usize;
    while fed < EXPANSION_SIZE {
        for byte in &mut buf {
            *byte = password[idx];
            idx = (idx + 1) % password.len();
        }
        hasher.update(buf);
        fed += buf.len();
    }

    hasher.finalize().to_vec()
}

fn localize_impl<D: Digest>(master_key: &[u8], engine_id: &[u8]) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(master_key);
    hasher.update(engine_id);
    hasher.update(master_key);
    hasher.finalize().to_vec()
}

fn hmac_truncated<D>(key: &[u8], data: &[u8], tag_len: usize) -> Vec<u8>
where
    D: Digest + digest::crypto_common::BlockSizeUser + Clone,
{
    use hmac::{Mac, SimpleHmac};

    let mut mac =
        <SimpleHmac<D> as Mac>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    let out = mac.finalize().into_bytes();
    out[..tag_len].to_vec()
}
