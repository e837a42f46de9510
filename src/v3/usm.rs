//! USM security parameters and the verify/decrypt pipeline (RFC 3414).
//!
//! USM security parameters travel as an OCTET STRING holding a BER SEQUENCE:
//!
//! ```text
//! UsmSecurityParameters ::= SEQUENCE {
//!     msgAuthoritativeEngineID     OCTET STRING,
//!     msgAuthoritativeEngineBoots  INTEGER (0..2147483647),
//!     msgAuthoritativeEngineTime   INTEGER (0..2147483647),
//!     msgUserName                  OCTET STRING (SIZE(0..32)),
//!     msgAuthenticationParameters  OCTET STRING,
//!     msgPrivacyParameters         OCTET STRING
//! }
//! ```
//!
//! [`process_message`] runs the pipeline over a captured message: resolve
//! the user, verify the authenticator, decrypt the scoped PDU. Crypto
//! failures never abort the packet - the outcome carries flags and
//! diagnostics so the caller can keep displaying the raw bytes.

use std::sync::Arc;

use bytes::Bytes;

use super::auth;
use super::users::{UserKeys, UserTable};
use crate::ber::{Decoder, EncodeBuf};
use crate::error::{CryptoErrorKind, DecodeErrorKind, Error, Result};

/// USM security parameters as decoded from the wire.
#[derive(Debug, Clone)]
pub struct UsmSecurityParams {
    /// Authoritative engine ID.
    pub engine_id: Bytes,
    /// Engine boot count.
    pub engine_boots: u32,
    /// Engine time (seconds since last boot).
    pub engine_time: u32,
    /// User name.
    pub username: Bytes,
    /// Authentication parameters (truncated HMAC tag, or empty).
    pub auth_params: Bytes,
    /// Privacy parameters (salt, or empty).
    pub priv_params: Bytes,
}

impl UsmSecurityParams {
    /// Parameters with no security applied (discovery-style messages).
    pub fn empty() -> Self {
        Self {
            engine_id: Bytes::new(),
            engine_boots: 0,
            engine_time: 0,
            username: Bytes::new(),
            auth_params: Bytes::new(),
            priv_params: Bytes::new(),
        }
    }

    /// Decode from the content of the msgSecurityParameters OCTET STRING.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        Self::decode_from(&mut decoder)
    }

    /// Decode from an existing decoder.
    pub fn decode_from(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;

        let engine_id = seq.read_octet_string()?;

        let raw_boots = seq.read_integer()?;
        if raw_boots < 0 {
            return Err(Error::decode(
                seq.offset(),
                DecodeErrorKind::InvalidEngineBoots { value: raw_boots },
            ));
        }
        let raw_time = seq.read_integer()?;
        if raw_time < 0 {
            return Err(Error::decode(
                seq.offset(),
                DecodeErrorKind::InvalidEngineTime { value: raw_time },
            ));
        }

        let username = seq.read_octet_string()?;
        let auth_params = seq.read_octet_string()?;
        let priv_params = seq.read_octet_string()?;

        Ok(Self {
            engine_id,
            engine_boots: raw_boots as u32,
            engine_time: raw_time as u32,
            username,
            auth_params,
            priv_params,
        })
    }

    /// Encode to BER (fixture building and re-serialization).
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        self.encode_to_buf(&mut buf);
        buf.finish()
    }

    /// Encode into an existing reverse buffer.
    pub fn encode_to_buf(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            buf.push_octet_string(&self.priv_params);
            buf.push_octet_string(&self.auth_params);
            buf.push_octet_string(&self.username);
            buf.push_unsigned32(crate::ber::tag::universal::INTEGER, self.engine_time);
            buf.push_unsigned32(crate::ber::tag::universal::INTEGER, self.engine_boots);
            buf.push_octet_string(&self.engine_id);
        });
    }

    /// Locate the authentication parameters inside a whole encoded v3
    /// message, returning `(offset, length)`.
    ///
    /// Walks the envelope: outer SEQUENCE, version INTEGER, msgGlobalData
    /// SEQUENCE, msgSecurityParameters OCTET STRING, then the USM SEQUENCE
    /// down to msgAuthenticationParameters. The offset is what HMAC
    /// verification needs to zero the authenticator's own span.
    pub fn find_auth_params_offset(encoded_msg: &[u8]) -> Option<(usize, usize)> {
        let mut offset = 0usize;

        // Outer SEQUENCE
        offset = expect_tag_at(encoded_msg, offset, 0x30)?;
        // version INTEGER
        offset = skip_tlv_at(encoded_msg, offset, Some(0x02))?;
        // msgGlobalData SEQUENCE
        offset = skip_tlv_at(encoded_msg, offset, Some(0x30))?;
        // msgSecurityParameters OCTET STRING wrapper
        offset = expect_tag_at(encoded_msg, offset, 0x04)?;
        // USM SEQUENCE
        offset = expect_tag_at(encoded_msg, offset, 0x30)?;
        // engineID, boots, time, username
        offset = skip_tlv_at(encoded_msg, offset, None)?;
        offset = skip_tlv_at(encoded_msg, offset, None)?;
        offset = skip_tlv_at(encoded_msg, offset, None)?;
        offset = skip_tlv_at(encoded_msg, offset, None)?;

        // msgAuthenticationParameters OCTET STRING
        if *encoded_msg.get(offset)? != 0x04 {
            return None;
        }
        let (len, len_size) = parse_length(&encoded_msg[offset + 1..])?;
        let start = offset + 1 + len_size;
        if start + len > encoded_msg.len() {
            return None;
        }
        Some((start, len))
    }
}

/// Descend into a TLV: check the tag and return the offset of its content.
fn expect_tag_at(data: &[u8], offset: usize, tag: u8) -> Option<usize> {
    if *data.get(offset)? != tag {
        return None;
    }
    let (_, len_size) = parse_length(&data[offset + 1..])?;
    Some(offset + 1 + len_size)
}

/// Skip a whole TLV, optionally checking its tag first.
fn skip_tlv_at(data: &[u8], offset: usize, tag: Option<u8>) -> Option<usize> {
    let actual = *data.get(offset)?;
    if tag.is_some_and(|t| t != actual) {
        return None;
    }
    let (len, len_size) = parse_length(&data[offset + 1..])?;
    let end = offset + 1 + len_size + len;
    if end > data.len() {
        return None;
    }
    Some(end)
}

/// Parse a definite BER length, returning (length, bytes consumed).
fn parse_length(data: &[u8]) -> Option<(usize, usize)> {
    let first = *data.first()?;
    if first < 0x80 {
        Some((first as usize, 1))
    } else if first == 0x80 {
        // Indefinite form is never produced by SNMP encoders
        None
    } else {
        let count = (first & 0x7F) as usize;
        if count == 0 || count > 4 || data.len() < 1 + count {
            return None;
        }
        let mut len = 0usize;
        for i in 0..count {
            len = (len << 8) | (data[1 + i] as usize);
        }
        Some((len, 1 + count))
    }
}

/// Result of running the USM pipeline over one captured message.
#[derive(Debug)]
pub struct UsmOutcome {
    /// Resolved key material, when the user table had a match.
    pub user: Option<Arc<UserKeys>>,
    /// The message carried authentication parameters.
    pub authenticated: bool,
    /// `Some(result)` when verification completed; `None` when it could not
    /// be attempted (no user, no key, malformed parameters).
    pub auth_ok: Option<bool>,
    /// The message carried an encrypted scoped PDU.
    pub encrypted: bool,
    /// Decrypted scoped PDU, when decryption succeeded.
    pub cleartext: Option<Bytes>,
    /// Diagnostics from verify/decrypt attempts that could not complete.
    pub notes: Vec<Error>,
}

/// Run the USM pipeline: resolve the user, verify the authenticator over
/// the whole message, decrypt the scoped PDU.
///
/// Never fails the packet: missing credentials, wrong digests and cipher
/// errors are reported through flags and notes so the caller can fall back
/// to displaying raw bytes. A failed authenticator still attempts
/// decryption, which keeps traffic analysis useful with partly wrong
/// credentials.
pub fn process_message(
    table: &UserTable,
    whole_msg: &[u8],
    params: &UsmSecurityParams,
    encrypted_pdu: Option<&[u8]>,
) -> UsmOutcome {
    let mut outcome = UsmOutcome {
        user: None,
        authenticated: !params.auth_params.is_empty(),
        auth_ok: None,
        encrypted: encrypted_pdu.is_some(),
        cleartext: None,
        notes: Vec::new(),
    };

    outcome.user = table.lookup(&params.engine_id, &params.username);
    let Some(user) = outcome.user.as_ref() else {
        if outcome.authenticated || outcome.encrypted {
            tracing::debug!(
                target: "snmp_dissect::usm",
                user = %String::from_utf8_lossy(&params.username),
                "no matching USM user association; leaving message unverified"
            );
        }
        return outcome;
    };

    if outcome.authenticated {
        match UsmSecurityParams::find_auth_params_offset(whole_msg) {
            Some((offset, _)) => {
                match auth::verify_message(&user.auth_key, whole_msg, offset, &params.auth_params)
                {
                    Ok(ok) => {
                        if !ok {
                            tracing::debug!(
                                target: "snmp_dissect::usm",
                                user = %String::from_utf8_lossy(&params.username),
                                "authenticator mismatch"
                            );
                        }
                        outcome.auth_ok = Some(ok);
                    }
                    Err(err) => outcome.notes.push(err),
                }
            }
            None => outcome
                .notes
                .push(Error::auth(crate::error::AuthErrorKind::NotEnoughData)),
        }
    }

    if let Some(ciphertext) = encrypted_pdu {
        match user.priv_key.as_ref() {
            Some(priv_key) => match priv_key.decrypt(
                ciphertext,
                params.engine_boots,
                params.engine_time,
                &params.priv_params,
            ) {
                Ok(cleartext) => outcome.cleartext = Some(cleartext),
                Err(err) => outcome.notes.push(err),
            },
            None => outcome
                .notes
                .push(Error::decrypt(CryptoErrorKind::NoPrivKey)),
        }
    }

    outcome
}
