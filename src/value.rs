//! SNMP value types.
//!
//! The `Value` enum covers every kind the VarBind decoder can produce:
//! SMIv2 application types, the v2 exception markers, the `unSpecified`
//! marker for NULL-valued bindings, and a raw fallback for tags the
//! heuristic table does not know.

use crate::ber::EncodeBuf;
use crate::oid::Oid;
use crate::util::HexBytes;
use bytes::Bytes;

/// A decoded SNMP value.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER, sign-extended to 64 bits. The wire form is limited to the
    /// Integer32 range (1-4 content bytes).
    Integer(i64),

    /// OCTET STRING (arbitrary bytes).
    OctetString(Bytes),

    /// NULL.
    Null,

    /// OBJECT IDENTIFIER.
    ObjectIdentifier(Oid),

    /// IpAddress, 4 bytes.
    IpAddress([u8; 4]),

    /// IpAddress carrying 16 bytes (seen from agents exposing IPv6 through
    /// the legacy application tag).
    IpAddressV6([u8; 16]),

    /// Application tag 0 with a length that is neither 4 nor 16.
    AnyAddress(Bytes),

    /// Counter32 (unsigned 32-bit, wrapping).
    Counter32(u32),

    /// Gauge32 (unsigned 32-bit, non-wrapping).
    Gauge32(u32),

    /// Unsigned32 / Uinteger32.
    Unsigned32(u32),

    /// TimeTicks (hundredths of a second).
    TimeTicks(u32),

    /// Opaque (legacy, arbitrary bytes).
    Opaque(Bytes),

    /// NsapAddress (legacy, raw bytes).
    NsapAddress(Bytes),

    /// Counter64 (unsigned 64-bit, wrapping).
    Counter64(u64),

    /// noSuchObject exception.
    NoSuchObject,

    /// noSuchInstance exception.
    NoSuchInstance,

    /// endOfMibView exception.
    EndOfMibView,

    /// A NULL value in a position where the MIB promises a real type:
    /// the binding exists but carries no value (request-style VarBind).
    Unspecified,

    /// Unrecognized tag, raw content kept for display.
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// True for the v2 exception markers.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u32 (any of the unsigned 32-bit application types).
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::Unsigned32(v) | Value::TimeTicks(v) => {
                Some(*v)
            }
            _ => None,
        }
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            _ => self.as_u32().map(u64::from),
        }
    }

    /// Try to get the raw bytes of a string-like value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(b) | Value::Opaque(b) | Value::NsapAddress(b) => Some(b),
            _ => None,
        }
    }

    /// Encode to BER (test fixtures and re-serialization).
    pub fn encode(&self, buf: &mut EncodeBuf) {
        use crate::ber::tag::{application as app, context as ctx};
        match self {
            Value::Integer(v) => {
                // Integer32 wire range
                buf.push_integer(*v as i32);
            }
            Value::OctetString(b) => buf.push_octet_string(b),
            Value::Null | Value::Unspecified => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(a) => buf.push_primitive(app::octet(app::IP_ADDRESS), a),
            Value::IpAddressV6(a) => buf.push_primitive(app::octet(app::IP_ADDRESS), a),
            Value::AnyAddress(b) => buf.push_primitive(app::octet(app::IP_ADDRESS), b),
            Value::Counter32(v) => buf.push_unsigned32(app::octet(app::COUNTER32), *v),
            Value::Gauge32(v) => buf.push_unsigned32(app::octet(app::GAUGE32), *v),
            Value::Unsigned32(v) => buf.push_unsigned32(app::octet(app::UINTEGER32), *v),
            Value::TimeTicks(v) => buf.push_unsigned32(app::octet(app::TIMETICKS), *v),
            Value::Opaque(b) => buf.push_primitive(app::octet(app::OPAQUE), b),
            Value::NsapAddress(b) => buf.push_primitive(app::octet(app::NSAP_ADDRESS), b),
            Value::Counter64(v) => buf.push_unsigned64(app::octet(app::COUNTER64), *v),
            Value::NoSuchObject => buf.push_primitive(ctx::octet(ctx::NO_SUCH_OBJECT), &[]),
            Value::NoSuchInstance => buf.push_primitive(ctx::octet(ctx::NO_SUCH_INSTANCE), &[]),
            Value::EndOfMibView => buf.push_primitive(ctx::octet(ctx::END_OF_MIB_VIEW), &[]),
            Value::Unknown { tag, data } => buf.push_primitive(*tag, data),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::OctetString(b) => match std::str::from_utf8(b) {
                Ok(s) if !s.is_empty() && s.chars().all(|c| !c.is_control()) => {
                    write!(f, "{s}")
                }
                _ => write!(f, "{}", HexBytes(b)),
            },
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{oid}"),
            Value::IpAddress(a) => write!(f, "{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
            Value::IpAddressV6(a) => write!(f, "{}", std::net::Ipv6Addr::from(*a)),
            Value::AnyAddress(b) => write!(f, "{}", HexBytes(b)),
            Value::Counter32(v) => write!(f, "{v}"),
            Value::Gauge32(v) => write!(f, "{v}"),
            Value::Unsigned32(v) => write!(f, "{v}"),
            Value::TimeTicks(v) => write!(f, "{v}"),
            Value::Opaque(b) => write!(f, "{}", HexBytes(b)),
            Value::NsapAddress(b) => write!(f, "{}", HexBytes(b)),
            Value::Counter64(v) => write!(f, "{v}"),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
            Value::Unspecified => write!(f, "unSpecified"),
            Value::Unknown { tag, data } => {
                write!(f, "unknown(0x{tag:02X}): {}", HexBytes(data))
            }
        }
    }
}
