//! Privacy (encryption) protocols for SNMPv3 (RFC 3414, RFC 3826).
//!
//! The analyzer's job is decryption of captured scoped PDUs; encryption is
//! also provided so the decrypt paths can be exercised end-to-end without
//! canned ciphertext fixtures.
//!
//! # Salt/IV construction
//!
//! - DES-CBC: privParameters is the 8-byte salt; IV = salt XOR pre-IV,
//!   where the pre-IV is the last 8 bytes of the 16-byte privacy key.
//! - AES-CFB: IV = engineBoots (4, big-endian) || engineTime (4, big-endian)
//!   || privParameters (8). Concatenation, not XOR.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::auth::{MasterKey, extend_key};
use super::PrivProtocol;
use crate::error::{CryptoErrorKind, Error, Result};

/// Generate a random non-zero u64 for salt initialization.
fn random_nonzero_u64() -> u64 {
    let mut buf = [0u8; 8];
    loop {
        getrandom::fill(&mut buf).expect("getrandom failed");
        let val = u64::from_ne_bytes(buf);
        if val != 0 {
            return val;
        }
    }
}

/// Thread-safe salt counter shared across encryptions.
pub struct SaltCounter(AtomicU64);

impl SaltCounter {
    /// Create a counter seeded from cryptographic randomness.
    pub fn new() -> Self {
        Self(AtomicU64::new(random_nonzero_u64()))
    }

    /// Create a counter with a specific starting value (tests).
    pub fn from_value(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    /// Next salt value. Zero is skipped on wraparound so an IV is never
    /// reused through a zero salt.
    pub fn next(&self) -> u64 {
        let val = self.0.fetch_add(1, Ordering::SeqCst);
        if val == 0 {
            self.0.fetch_add(1, Ordering::SeqCst)
        } else {
            val
        }
    }
}

impl Default for SaltCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Privacy key for one (user, engine) association.
///
/// Key material is zeroed from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivKey {
    /// Exactly `protocol.key_len()` bytes when derived; unchecked when
    /// constructed from raw bytes.
    key: Vec<u8>,
    #[zeroize(skip)]
    protocol: PrivProtocol,
}

impl PrivKey {
    /// Derive a privacy key from a master key and engine ID.
    ///
    /// The localized key is extended when the hash output is shorter than
    /// the cipher key (AES-192/256 under short hashes) and truncated to
    /// exactly the cipher's key length otherwise.
    pub fn derive(master: &MasterKey, protocol: PrivProtocol, engine_id: &[u8]) -> Self {
        let localized = master.localize(engine_id);
        let key = extend_key(master.protocol(), &localized, engine_id, protocol.key_len());
        Self { key, protocol }
    }

    /// Derive a privacy key from a password and engine ID.
    pub fn from_password(
        auth_protocol: super::AuthProtocol,
        protocol: PrivProtocol,
        password: &[u8],
        engine_id: &[u8],
    ) -> Self {
        Self::derive(&MasterKey::from_password(auth_protocol, password), protocol, engine_id)
    }

    /// Create a privacy key from raw localized key bytes.
    pub fn from_bytes(protocol: PrivProtocol, key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            protocol,
        }
    }

    /// The privacy protocol.
    pub fn protocol(&self) -> PrivProtocol {
        self.protocol
    }

    fn check_key_len(&self, err: fn(CryptoErrorKind) -> Error) -> Result<()> {
        if self.key.len() < self.protocol.key_len() {
            return Err(err(CryptoErrorKind::InvalidKeyLength));
        }
        Ok(())
    }

    /// Decrypt a captured scoped PDU.
    ///
    /// Returns an independent cleartext buffer; the ciphertext is never
    /// mutated. Either the whole cleartext is produced or none of it.
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        priv_params: &[u8],
    ) -> Result<Bytes> {
        if priv_params.len() != 8 {
            tracing::debug!(
                target: "snmp_dissect::usm",
                actual = priv_params.len(),
                "privacy parameters length is not 8"
            );
            return Err(Error::decrypt(CryptoErrorKind::PrivParamsLength {
                actual: priv_params.len(),
            }));
        }
        self.check_key_len(Error::decrypt)?;

        match self.protocol {
            PrivProtocol::Des => self.decrypt_des(ciphertext, priv_params),
            PrivProtocol::Aes128 | PrivProtocol::Aes192 | PrivProtocol::Aes256 => {
                self.decrypt_aes(ciphertext, engine_boots, engine_time, priv_params)
            }
        }
    }

    /// Encrypt a scoped PDU, returning (ciphertext, privParameters).
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt_counter: &SaltCounter,
    ) -> Result<(Bytes, Bytes)> {
        self.check_key_len(Error::encrypt)?;
        let salt = salt_counter.next();
        match self.protocol {
            PrivProtocol::Des => self.encrypt_des(plaintext, engine_boots, salt),
            PrivProtocol::Aes128 | PrivProtocol::Aes192 | PrivProtocol::Aes256 => {
                self.encrypt_aes(plaintext, engine_boots, engine_time, salt)
            }
        }
    }

    /// DES-CBC decryption (RFC 3414 Section 8.1.1).
    fn decrypt_des(&self, ciphertext: &[u8], priv_params: &[u8]) -> Result<Bytes> {
        use cbc::cipher::{BlockDecryptMut, KeyIvInit, block_padding::NoPadding};
        type DesCbc = cbc::Decryptor<des::Des>;

        if ciphertext.is_empty() || ciphertext.len() % 8 != 0 {
            return Err(Error::decrypt(CryptoErrorKind::InvalidCiphertextLength {
                length: ciphertext.len(),
                block_size: 8,
            }));
        }

        let iv = des_iv(&self.key, priv_params);
        let cipher = DesCbc::new_from_slices(&self.key[..8], &iv)
            .map_err(|_| Error::decrypt(CryptoErrorKind::InvalidKeyLength))?;

        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_padded_mut::<NoPadding>(&mut buffer)
            .map_err(|_| Error::decrypt(CryptoErrorKind::CipherError))?;

        Ok(Bytes::from(buffer))
    }

    /// DES-CBC encryption (RFC 3414 Section 8.1.1).
    fn encrypt_des(&self, plaintext: &[u8], engine_boots: u32, salt_int: u64) -> Result<(Bytes, Bytes)> {
        use cbc::cipher::{BlockEncryptMut, KeyIvInit, block_padding::NoPadding};
        type DesCbc = cbc::Encryptor<des::Des>;

        // Salt = engineBoots (4 bytes) || counter low bits (4 bytes)
        let mut salt = [0u8; 8];
        salt[..4].copy_from_slice(&engine_boots.to_be_bytes());
        salt[4..].copy_from_slice(&(salt_int as u32).to_be_bytes());

        let iv = des_iv(&self.key, &salt);

        // Zero-pad up to the block size
        let padded_len = plaintext.len().div_ceil(8).max(1) * 8;
        let mut buffer = vec![0u8; padded_len];
        buffer[..plaintext.len()].copy_from_slice(plaintext);

        let cipher = DesCbc::new_from_slices(&self.key[..8], &iv)
            .map_err(|_| Error::encrypt(CryptoErrorKind::InvalidKeyLength))?;
        cipher
            .encrypt_padded_mut::<NoPadding>(&mut buffer, padded_len)
            .map_err(|_| Error::encrypt(CryptoErrorKind::CipherError))?;

        Ok((Bytes::from(buffer), Bytes::copy_from_slice(&salt)))
    }

    /// AES-CFB decryption (RFC 3826 Section 3.1.4).
    ///
    /// CFB is a stream mode; any non-zero ciphertext length is acceptable.
    fn decrypt_aes(
        &self,
        ciphertext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        priv_params: &[u8],
    ) -> Result<Bytes> {
        use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};

        if ciphertext.is_empty() {
            return Err(Error::decrypt(CryptoErrorKind::EmptyCiphertext));
        }

        let iv = aes_iv(engine_boots, engine_time, priv_params);
        let key = &self.key[..self.protocol.key_len()];
        let mut buffer = ciphertext.to_vec();

        match self.protocol {
            PrivProtocol::Aes128 => {
                let cipher = cfb_mode::Decryptor::<aes::Aes128>::new_from_slices(key, &iv)
                    .map_err(|_| Error::decrypt(CryptoErrorKind::InvalidKeyLength))?;
                cipher.decrypt(&mut buffer);
            }
            PrivProtocol::Aes192 => {
                let cipher = cfb_mode::Decryptor::<aes::Aes192>::new_from_slices(key, &iv)
                    .map_err(|_| Error::decrypt(CryptoErrorKind::InvalidKeyLength))?;
                cipher.decrypt(&mut buffer);
            }
            PrivProtocol::Aes256 => {
                let cipher = cfb_mode::Decryptor::<aes::Aes256>::new_from_slices(key, &iv)
                    .map_err(|_| Error::decrypt(CryptoErrorKind::InvalidKeyLength))?;
                cipher.decrypt(&mut buffer);
            }
            PrivProtocol::Des => unreachable!("dispatched by protocol"),
        }

        Ok(Bytes::from(buffer))
    }

    /// AES-CFB encryption (RFC 3826 Section 3.1.3).
    fn encrypt_aes(
        &self,
        plaintext: &[u8],
        engine_boots: u32,
        engine_time: u32,
        salt: u64,
    ) -> Result<(Bytes, Bytes)> {
        use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};

        let salt_bytes = salt.to_be_bytes();
        let iv = aes_iv(engine_boots, engine_time, &salt_bytes);
        let key = &self.key[..self.protocol.key_len()];
        let mut buffer = plaintext.to_vec();

        match self.protocol {
            PrivProtocol::Aes128 => {
                let cipher = cfb_mode::Encryptor::<aes::Aes128>::new_from_slices(key, &iv)
                    .map_err(|_| Error::encrypt(CryptoErrorKind::InvalidKeyLength))?;
                cipher.encrypt(&mut buffer);
            }
            PrivProtocol::Aes192 => {
                let cipher = cfb_mode::Encryptor::<aes::Aes192>::new_from_slices(key, &iv)
                    .map_err(|_| Error::encrypt(CryptoErrorKind::InvalidKeyLength))?;
                cipher.encrypt(&mut buffer);
            }
            PrivProtocol::Aes256 => {
                let cipher = cfb_mode::Encryptor::<aes::Aes256>::new_from_slices(key, &iv)
                    .map_err(|_| Error::encrypt(CryptoErrorKind::InvalidKeyLength))?;
                cipher.encrypt(&mut buffer);
            }
            PrivProtocol::Des => unreachable!("dispatched by protocol"),
        }

        Ok((Bytes::from(buffer), Bytes::copy_from_slice(&salt_bytes)))
    }
}

impl std::fmt::Debug for PrivKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivKey")
            .field("protocol", &self.protocol)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// DES IV: salt XOR pre-IV (last 8 of the 16-byte privacy key).
fn des_iv(key: &[u8], salt: &[u8]) -> [u8; 8] {
    let mut iv = [0u8; 8];
    for i in 0..8 {
        iv[i] = salt[i] ^ key[8 + i];
    }
    iv
}

/// AES IV: engineBoots || engineTime || salt, all big-endian.
pub(crate) fn aes_iv(engine_boots: u32, engine_time: u32, salt: &[u8]) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..4].copy_from_slice(&engine_boots.to_be_bytes());
    iv[4..8].copy_from_slice(&engine_time.to_be_bytes());
    iv[8..].copy_from_slice(salt);
    iv
}
