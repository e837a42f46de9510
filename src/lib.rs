//! # snmp-dissect
//!
//! MIB-aware decoding of captured SNMP traffic.
//!
//! This library implements the failure-sensitive half of an SNMP analyzer:
//! the VarBind/value decoder that interprets bindings against a MIB-derived
//! OID index, and the SNMPv3 User-based Security Model pipeline that
//! verifies and decrypts messages with configured credentials. All input is
//! treated as hostile: every decode path is bounds-checked and every reject
//! carries a specific diagnostic, so wire-level malformation, MIB-data
//! defects and missing credentials stay distinguishable in the output.
//!
//! ## Decoding a VarBind
//!
//! ```
//! use snmp_dissect::ber::{Class, Decoder, EncodeBuf, tag};
//! use snmp_dissect::mib::{DecodeAs, NodeKind, OidIndex, OidInfo, ValueSpec};
//! use snmp_dissect::{Value, VarBind, oid};
//!
//! let mut index = OidIndex::new();
//! index.insert(
//!     &oid!(1, 3, 6, 1, 2, 1, 1, 3),
//!     OidInfo::of_kind(NodeKind::Scalar)
//!         .named("sysUpTime")
//!         .with_value(ValueSpec::exact(
//!             Class::Application,
//!             tag::application::TIMETICKS,
//!             1,
//!             Some(5),
//!             DecodeAs::TimeTicks,
//!         )),
//! );
//!
//! // SEQUENCE { 1.3.6.1.2.1.1.3.0, TimeTicks 12345 }
//! let mut buf = EncodeBuf::new();
//! buf.push_sequence(|b| {
//!     Value::TimeTicks(12345).encode(b);
//!     b.push_oid(&oid!(1, 3, 6, 1, 2, 1, 1, 3, 0));
//! });
//!
//! let mut decoder = Decoder::new(buf.finish());
//! let vb = VarBind::decode(&mut decoder, &index).unwrap();
//! assert_eq!(vb.value, Value::TimeTicks(12345));
//! assert_eq!(vb.label(), "sysUpTime.0 (1.3.6.1.2.1.1.3.0)");
//! ```
//!
//! ## Verifying and decrypting SNMPv3
//!
//! ```no_run
//! use snmp_dissect::v3::{AuthProtocol, PrivProtocol, UserTable, UsmUserConfig};
//! use snmp_dissect::v3::{UsmSecurityParams, process_message};
//!
//! let table = UserTable::from_configs([
//!     UsmUserConfig::new(&b"ops"[..], AuthProtocol::Sha256, &b"auth-secret"[..])
//!         .with_privacy(PrivProtocol::Aes128, &b"priv-secret"[..]),
//! ])?;
//!
//! # let (whole_msg, params, encrypted): (Vec<u8>, UsmSecurityParams, Vec<u8>) = todo!();
//! let outcome = process_message(&table, &whole_msg, &params, Some(&encrypted[..]));
//! if outcome.auth_ok == Some(true) {
//!     if let Some(cleartext) = &outcome.cleartext {
//!         // hand the scoped PDU back for re-entrant dissection
//!     }
//! }
//! # Ok::<(), snmp_dissect::Error>(())
//! ```

pub mod ber;
pub mod error;
pub mod mib;
pub mod oid;
pub mod v3;
pub mod value;
pub mod varbind;

pub(crate) mod util;

pub use error::{
    AuthErrorKind, ConfigErrorKind, CryptoErrorKind, DecodeErrorKind, Error, IndexDefectKind,
    OidErrorKind, Result, VarBindErrorKind,
};
pub use mib::{IndexKey, IndexValue, NodeKind, OidIndex, OidInfo, ValueSpec};
pub use oid::Oid;
pub use value::Value;
pub use varbind::{VarBind, decode_varbind_list};
