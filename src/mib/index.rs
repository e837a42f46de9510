//! Table index key descriptors and instance sub-identifier codec.
//!
//! A table row names its instances by encoding the row's index values into
//! the OID tail after the column. Decoding walks the row's ordered key list,
//! consuming sub-identifiers per key; encoding is the exact inverse and is
//! used to rebuild instance OIDs from structured values.

use crate::error::{Error, IndexDefectKind, Result, VarBindErrorKind};
use crate::oid::Oid;
use bytes::Bytes;

/// One index key of a table row.
///
/// `IMPLIED` variants (last key of a row, per SMIv2) take every remaining
/// sub-identifier with no length prefix; explicit variable-length variants
/// consume a leading length-prefix sub-identifier unless the MIB fixes the
/// width statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKey {
    /// Single sub-identifier, displayed signed or unsigned.
    Integer { unsigned: bool },
    /// Length-prefixed object identifier fragment.
    Oid,
    /// Object identifier fragment taking all remaining sub-identifiers.
    ImpliedOid,
    /// Octet string, one sub-identifier per byte.
    String { fixed_len: Option<usize> },
    /// Octet string taking all remaining sub-identifiers.
    ImpliedString,
    /// Raw bytes, one sub-identifier per byte.
    Bytes { fixed_len: Option<usize> },
    /// Raw bytes taking all remaining sub-identifiers.
    ImpliedBytes,
    /// MAC address; takes the remaining sub-identifiers.
    Ether,
    /// IPv4 address; exactly four sub-identifiers.
    IpAddr,
    /// NSAP address bytes.
    Nsap { fixed_len: Option<usize> },
    /// Index syntax the decoder does not implement.
    Unsupported,
}

/// A decoded index value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexValue {
    /// Integer index; `unsigned` mirrors the key's display sign-ness.
    Integer { value: u32, unsigned: bool },
    /// OID fragment index.
    Oid(Oid),
    /// Octets index (strings, byte strings, addresses).
    Octets(Bytes),
}

impl std::fmt::Display for IndexValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexValue::Integer { value, unsigned } => {
                if *unsigned {
                    write!(f, "{value}")
                } else {
                    write!(f, "{}", *value as i32)
                }
            }
            IndexValue::Oid(oid) => write!(f, "{oid}"),
            IndexValue::Octets(b) => write!(f, "{}", crate::util::HexBytes(b)),
        }
    }
}

/// Walk a row's key list over the instance sub-identifiers.
///
/// Consumes sub-identifiers per key in order. Sub-identifiers left over
/// after the last key are tolerated (logged at debug); running out
/// mid-walk or a length prefix past the end are errors.
pub fn decode_instance(keys: &[IndexKey], subids: &[u32]) -> Result<Vec<IndexValue>> {
    let mut values = Vec::with_capacity(keys.len());
    let mut pos = 0usize;

    for key in keys {
        let remaining = subids.len() - pos;
        match *key {
            IndexKey::Integer { unsigned } => {
                if remaining < 1 {
                    return Err(Error::varbind(VarBindErrorKind::IndexShort));
                }
                values.push(IndexValue::Integer {
                    value: subids[pos],
                    unsigned,
                });
                pos += 1;
            }
            IndexKey::Oid => {
                if remaining < 1 {
                    return Err(Error::varbind(VarBindErrorKind::IndexShort));
                }
                let declared = subids[pos] as usize;
                pos += 1;
                if declared == 0 {
                    return Err(Error::varbind(VarBindErrorKind::ZeroLengthIndexOid));
                }
                if declared > subids.len() - pos {
                    return Err(Error::varbind(VarBindErrorKind::IndexTooLong {
                        declared,
                        remaining: subids.len() - pos,
                    }));
                }
                values.push(IndexValue::Oid(Oid::from_slice(
                    &subids[pos..pos + declared],
                )));
                pos += declared;
            }
            IndexKey::ImpliedOid => {
                if remaining == 0 {
                    return Err(Error::varbind(VarBindErrorKind::ZeroLengthIndexOid));
                }
                values.push(IndexValue::Oid(Oid::from_slice(&subids[pos..])));
                pos = subids.len();
            }
            IndexKey::String { fixed_len }
            | IndexKey::Bytes { fixed_len }
            | IndexKey::Nsap { fixed_len } => {
                let width = match fixed_len {
                    Some(n) => n,
                    None => {
                        // Length-prefixed
                        if remaining < 1 {
                            return Err(Error::varbind(VarBindErrorKind::IndexShort));
                        }
                        let declared = subids[pos] as usize;
                        pos += 1;
                        declared
                    }
                };
                if width > subids.len() - pos {
                    return Err(Error::varbind(VarBindErrorKind::IndexTooLong {
                        declared: width,
                        remaining: subids.len() - pos,
                    }));
                }
                values.push(IndexValue::Octets(collect_octets(&subids[pos..pos + width])));
                pos += width;
            }
            IndexKey::ImpliedString | IndexKey::ImpliedBytes | IndexKey::Ether => {
                values.push(IndexValue::Octets(collect_octets(&subids[pos..])));
                pos = subids.len();
            }
            IndexKey::IpAddr => {
                if remaining < 4 {
                    return Err(Error::varbind(VarBindErrorKind::IndexShort));
                }
                values.push(IndexValue::Octets(collect_octets(&subids[pos..pos + 4])));
                pos += 4;
            }
            IndexKey::Unsupported => {
                return Err(Error::defect(IndexDefectKind::UnsupportedIndexSyntax));
            }
        }
    }

    if pos < subids.len() {
        tracing::debug!(
            target: "snmp_dissect::mib",
            leftover = subids.len() - pos,
            "instance sub-identifiers left over after index key walk"
        );
    }

    Ok(values)
}

/// Inverse of [`decode_instance`]: rebuild the instance sub-identifiers
/// from structured index values.
pub fn encode_instance(keys: &[IndexKey], values: &[IndexValue]) -> Result<Vec<u32>> {
    let mut subids = Vec::new();

    for (key, value) in keys.iter().zip(values) {
        match (*key, value) {
            (IndexKey::Integer { .. }, IndexValue::Integer { value, .. }) => {
                subids.push(*value);
            }
            (IndexKey::Oid, IndexValue::Oid(oid)) => {
                if oid.is_empty() {
                    return Err(Error::varbind(VarBindErrorKind::ZeroLengthIndexOid));
                }
                subids.push(oid.len() as u32);
                subids.extend_from_slice(oid.arcs());
            }
            (IndexKey::ImpliedOid, IndexValue::Oid(oid)) => {
                if oid.is_empty() {
                    return Err(Error::varbind(VarBindErrorKind::ZeroLengthIndexOid));
                }
                subids.extend_from_slice(oid.arcs());
            }
            (
                IndexKey::String { fixed_len }
                | IndexKey::Bytes { fixed_len }
                | IndexKey::Nsap { fixed_len },
                IndexValue::Octets(b),
            ) => {
                if fixed_len.is_none() {
                    subids.push(b.len() as u32);
                }
                subids.extend(b.iter().map(|&byte| byte as u32));
            }
            (
                IndexKey::ImpliedString | IndexKey::ImpliedBytes | IndexKey::Ether | IndexKey::IpAddr,
                IndexValue::Octets(b),
            ) => {
                subids.extend(b.iter().map(|&byte| byte as u32));
            }
            (IndexKey::Unsupported, _) => {
                return Err(Error::defect(IndexDefectKind::UnsupportedIndexSyntax));
            }
            _ => {
                // Structural mismatch between key list and value list is a
                // caller bug, not wire data
                return Err(Error::defect(IndexDefectKind::UnsupportedIndexSyntax));
            }
        }
    }

    Ok(subids)
}

/// Truncate each sub-identifier to a single byte and concatenate.
fn collect_octets(subids: &[u32]) -> Bytes {
    let mut out = Vec::with_capacity(subids.len());
    for &subid in subids {
        if subid > 0xFF {
            tracing::debug!(
                target: "snmp_dissect::mib",
                subid,
                "octet index sub-identifier out of range, truncating to one byte"
            );
        }
        out.push(subid as u8);
    }
    Bytes::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_integer_key() {
        let keys = [IndexKey::Integer { unsigned: true }];
        let values = decode_instance(&keys, &[7]).unwrap();
        assert_eq!(
            values,
            vec![IndexValue::Integer {
                value: 7,
                unsigned: true
            }]
        );
    }

    #[test]
    fn test_integer_key_missing_subid() {
        let keys = [IndexKey::Integer { unsigned: true }];
        let err = decode_instance(&keys, &[]).unwrap_err();
        assert_eq!(
            err,
            Error::varbind(VarBindErrorKind::IndexShort)
        );
    }

    #[test]
    fn test_length_prefixed_string() {
        let keys = [IndexKey::String { fixed_len: None }];
        let values = decode_instance(&keys, &[3, 0x66, 0x6F, 0x6F]).unwrap();
        assert_eq!(
            values,
            vec![IndexValue::Octets(Bytes::from_static(b"foo"))]
        );
    }

    #[test]
    fn test_length_prefix_past_end() {
        let keys = [IndexKey::String { fixed_len: None }];
        let err = decode_instance(&keys, &[9, 0x66, 0x6F]).unwrap_err();
        assert!(matches!(
            err,
            Error::VarBind {
                kind: VarBindErrorKind::IndexTooLong {
                    declared: 9,
                    remaining: 2
                }
            }
        ));
    }

    #[test]
    fn test_fixed_width_string_has_no_prefix() {
        let keys = [IndexKey::String { fixed_len: Some(2) }];
        let values = decode_instance(&keys, &[0x61, 0x62]).unwrap();
        assert_eq!(values, vec![IndexValue::Octets(Bytes::from_static(b"ab"))]);
    }

    #[test]
    fn test_oid_key_length_prefixed() {
        let keys = [IndexKey::Oid];
        let values = decode_instance(&keys, &[3, 1, 3, 6]).unwrap();
        assert_eq!(values, vec![IndexValue::Oid(Oid::from_slice(&[1, 3, 6]))]);
    }

    #[test]
    fn test_oid_key_zero_length_rejected() {
        let keys = [IndexKey::Oid];
        let err = decode_instance(&keys, &[0]).unwrap_err();
        assert_eq!(err, Error::varbind(VarBindErrorKind::ZeroLengthIndexOid));

        let keys = [IndexKey::ImpliedOid];
        let err = decode_instance(&keys, &[]).unwrap_err();
        assert_eq!(err, Error::varbind(VarBindErrorKind::ZeroLengthIndexOid));
    }

    #[test]
    fn test_implied_oid_takes_rest() {
        let keys = [
            IndexKey::Integer { unsigned: true },
            IndexKey::ImpliedOid,
        ];
        let values = decode_instance(&keys, &[2, 1, 3, 6, 1]).unwrap();
        assert_eq!(
            values,
            vec![
                IndexValue::Integer {
                    value: 2,
                    unsigned: true
                },
                IndexValue::Oid(Oid::from_slice(&[1, 3, 6, 1])),
            ]
        );
    }

    #[test]
    fn test_ip_addr_key() {
        let keys = [IndexKey::IpAddr];
        let values = decode_instance(&keys, &[192, 168, 0, 1]).unwrap();
        assert_eq!(
            values,
            vec![IndexValue::Octets(Bytes::from_static(&[192, 168, 0, 1]))]
        );

        let err = decode_instance(&keys, &[10, 0, 0]).unwrap_err();
        assert_eq!(err, Error::varbind(VarBindErrorKind::IndexShort));
    }

    #[test]
    fn test_octet_truncation() {
        let keys = [IndexKey::ImpliedBytes];
        let values = decode_instance(&keys, &[0x1FF, 0x20]).unwrap();
        assert_eq!(
            values,
            vec![IndexValue::Octets(Bytes::from_static(&[0xFF, 0x20]))]
        );
    }

    #[test]
    fn test_unsupported_key() {
        let keys = [IndexKey::Unsupported];
        let err = decode_instance(&keys, &[1]).unwrap_err();
        assert_eq!(
            err,
            Error::defect(IndexDefectKind::UnsupportedIndexSyntax)
        );
    }

    #[test]
    fn test_multi_key_roundtrip() {
        let keys = [
            IndexKey::Integer { unsigned: false },
            IndexKey::String { fixed_len: None },
            IndexKey::IpAddr,
            IndexKey::ImpliedOid,
        ];
        let original = vec![
            IndexValue::Integer {
                value: 42,
                unsigned: false,
            },
            IndexValue::Octets(Bytes::from_static(b"ab")),
            IndexValue::Octets(Bytes::from_static(&[10, 0, 0, 1])),
            IndexValue::Oid(Oid::from_slice(&[1, 3, 6, 1, 4])),
        ];

        let subids = encode_instance(&keys, &original).unwrap();
        let decoded = decode_instance(&keys, &subids).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_display_signedness() {
        let v = IndexValue::Integer {
            value: u32::MAX,
            unsigned: false,
        };
        assert_eq!(v.to_string(), "-1");
        let v = IndexValue::Integer {
            value: u32::MAX,
            unsigned: true,
        };
        assert_eq!(v.to_string(), "4294967295");
    }
}
