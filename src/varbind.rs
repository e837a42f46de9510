//! Variable binding (VarBind) decoding.
//!
//! A VarBind is one `SEQUENCE { ObjectName, Value }` inside a PDU. Decoding
//! is MIB-aware: the ObjectName is resolved against the [`OidIndex`], the
//! trailing instance sub-identifiers are classified per the resolved table
//! row's index keys, and the value is checked against the expected BER shape
//! before interpretation. Every gate either fails with a specific diagnostic
//! or, for tag/length mismatches, decodes best-effort and flags the binding.

use crate::ber::{Class, Decoder, tag};
use crate::error::{Error, IndexDefectKind, Result, VarBindErrorKind};
use crate::mib::{DecodeAs, NodeKind, OidIndex, decode_instance};
use crate::mib::{IndexValue, ValueSpec};
use crate::oid::Oid;
use crate::value::Value;
use bytes::Bytes;

/// A decoded variable binding.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    /// The wire ObjectName.
    pub name: Oid,
    /// Number of leading arcs matched by the OID index (0 when unresolved).
    pub matched: usize,
    /// Structured instance index values (table columns only).
    pub index: Vec<IndexValue>,
    /// Resolved MIB object name, when the index supplies one.
    pub object: Option<Box<str>>,
    /// The decoded value.
    pub value: Value,
    /// Non-fatal shape mismatches (wrong tag / wrong length): the value was
    /// decoded best-effort and flagged rather than dropped.
    pub warnings: Vec<VarBindErrorKind>,
}

impl VarBind {
    /// Decode one VarBind from the decoder, resolving the ObjectName
    /// against `index`.
    ///
    /// On success the decoder is positioned after the VarBind; on error its
    /// position is unspecified and the caller should resynchronize from the
    /// enclosing structure.
    pub fn decode(decoder: &mut Decoder, index: &OidIndex) -> Result<Self> {
        // Outer SEQUENCE header. Wrong class or tag means we are not looking
        // at a VarBind at all; indefinite lengths are rejected by the length
        // reader.
        let (id, len) = decoder.read_header()?;
        if id.class != Class::Universal || !id.constructed || id.number != 0x10 {
            return Err(Error::varbind(VarBindErrorKind::NotSequence {
                tag: id.octet(),
            }));
        }
        let content = decoder.read_bytes(len)?;
        Self::decode_content(Decoder::new(content), index)
    }

    fn decode_content(mut seq: Decoder, index: &OidIndex) -> Result<Self> {
        // ObjectName header: universal primitive OID with a definite length.
        let (nid, nlen) = seq.read_header()?;
        if !nid.is_universal_primitive(tag::universal::OBJECT_IDENTIFIER & 0x1F) {
            return Err(Error::varbind(VarBindErrorKind::NotOid { tag: nid.octet() }));
        }
        let raw_name = seq.read_bytes(nlen)?;
        let name = Oid::from_ber(&raw_name).map_err(|_| {
            Error::varbind(VarBindErrorKind::InvalidObjectName {
                raw: raw_name.clone(),
            })
        })?;

        // Value header immediately follows; SNMP never nests constructed
        // values inside a VarBind.
        let (vid, vlen) = seq.read_header()?;
        if vid.constructed {
            return Err(Error::varbind(VarBindErrorKind::ConstructedValue {
                tag: vid.octet(),
            }));
        }
        let content = seq.read_bytes(vlen)?;

        let resolved = index.resolve(name.arcs());

        // Error-value fast path: context-class tags 0/1/2 with zero length
        // are the v2 exception markers; anything else context-class here is
        // malformed.
        if vid.class == Class::ContextSpecific {
            let value = match (vid.number, vlen) {
                (tag::context::NO_SUCH_OBJECT, 0) => Value::NoSuchObject,
                (tag::context::NO_SUCH_INSTANCE, 0) => Value::NoSuchInstance,
                (tag::context::END_OF_MIB_VIEW, 0) => Value::EndOfMibView,
                (number, length) => {
                    return Err(Error::varbind(VarBindErrorKind::UnknownContextValue {
                        number,
                        length,
                    }));
                }
            };
            let (matched, object) = match &resolved {
                Some(r) => (r.matched(), r.info().name.clone()),
                None => (0, None),
            };
            return Ok(VarBind {
                name,
                matched,
                index: Vec::new(),
                object,
                value,
                warnings: Vec::new(),
            });
        }

        let is_null = vid.is_universal_primitive(tag::universal::NULL & 0x1F);
        if is_null && vlen != 0 {
            return Err(Error::decode(
                seq.offset(),
                crate::error::DecodeErrorKind::InvalidNull,
            ));
        }

        let mut matched = 0usize;
        let mut object = None;
        let mut instance = Vec::new();
        let mut spec: Option<ValueSpec> = None;
        let mut indexed = false;

        if let Some(r) = &resolved {
            let info = r.info();
            object = info.name.clone();
            matched = r.matched();
            let trailing = &name.arcs()[r.matched()..];

            match info.kind {
                NodeKind::Scalar => match trailing.len() {
                    1 => {
                        instance.push(IndexValue::Integer {
                            value: trailing[0],
                            unsigned: true,
                        });
                        spec = info.value;
                        indexed = true;
                    }
                    0 if is_null => {
                        // Request-style binding naming the object itself
                        spec = info.value;
                        indexed = true;
                    }
                    count => {
                        return Err(Error::varbind(VarBindErrorKind::ScalarInstanceCount {
                            count,
                        }));
                    }
                },
                NodeKind::Column => {
                    let row = r.enclosing().ok_or(Error::defect(
                        IndexDefectKind::ColumnParentNotRow,
                    ))?;
                    if row.kind != NodeKind::Row {
                        tracing::warn!(
                            target: "snmp_dissect::varbind",
                            oid = %name,
                            "column's enclosing node is not a row; OID index is inconsistent"
                        );
                        return Err(Error::defect(IndexDefectKind::ColumnParentNotRow));
                    }
                    instance = decode_instance(&row.keys, trailing)?;
                    spec = info.value;
                    indexed = true;
                }
                NodeKind::Row | NodeKind::Other => {
                    // Indexing does not apply; value decoding falls back to
                    // the heuristic table.
                }
            }
        }

        let mut warnings = Vec::new();
        let value = if is_null {
            if indexed { Value::Unspecified } else { Value::Null }
        } else {
            match spec {
                Some(spec) => {
                    decode_expected(&spec, vid.class, vid.number, content, &mut warnings)?
                }
                None => decode_heuristic(vid.class, vid.number, vid.octet(), content)?,
            }
        };

        Ok(VarBind {
            name,
            matched,
            index: instance,
            object,
            value,
            warnings,
        })
    }

    /// Instance portion of the ObjectName (arcs past the matched prefix).
    pub fn instance_arcs(&self) -> &[u32] {
        &self.name.arcs()[self.matched..]
    }

    /// Human-readable label for this binding.
    ///
    /// Prefers `name.instance (dotted-oid)` when the MIB name is known,
    /// falling back to the raw dotted OID.
    pub fn label(&self) -> String {
        match &self.object {
            Some(object) => {
                let instance = self.instance_arcs();
                if instance.is_empty() {
                    format!("{} ({})", object, self.name)
                } else {
                    let mut inst = String::new();
                    for (i, arc) in instance.iter().enumerate() {
                        if i > 0 {
                            inst.push('.');
                        }
                        inst.push_str(&arc.to_string());
                    }
                    format!("{}.{} ({})", object, inst, self.name)
                }
            }
            None if !self.name.is_empty() => self.name.to_string(),
            None => "[Bad OID]".to_string(),
        }
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.label(), self.value)
    }
}

/// Decode a VarBind list (the `SEQUENCE OF VarBind` of a PDU).
///
/// Decoding continues past VarBinds whose content is malformed: each list
/// element is delimited by its own header, so a bad element is reported in
/// place and its bytes skipped. The outer `Err` is reserved for a list whose
/// framing itself cannot be walked.
pub fn decode_varbind_list(
    decoder: &mut Decoder,
    index: &OidIndex,
) -> Result<Vec<Result<VarBind>>> {
    let mut seq = decoder.read_sequence()?;
    let mut out = Vec::new();

    while !seq.is_empty() {
        // Frame the element first so one bad VarBind doesn't lose the rest.
        let (id, len) = seq.read_header()?;
        if id.class != Class::Universal || !id.constructed || id.number != 0x10 {
            return Err(Error::varbind(VarBindErrorKind::NotSequence {
                tag: id.octet(),
            }));
        }
        let content = seq.read_bytes(len)?;
        let result = VarBind::decode_content(Decoder::new(content), index);
        if let Err(err) = &result {
            tracing::debug!(target: "snmp_dissect::varbind", error = %err, "VarBind rejected");
        }
        out.push(result);
    }

    Ok(out)
}

/// Decode against the index-supplied value spec.
///
/// Class/tag/length mismatches are flagged and the raw content kept; the
/// integral width rules are hard errors.
fn decode_expected(
    spec: &ValueSpec,
    class: Class,
    number: u8,
    content: Bytes,
    warnings: &mut Vec<VarBindErrorKind>,
) -> Result<Value> {
    let expected_octet =
        spec.class.unwrap_or(class).bits() | spec.tag.unwrap_or(number);
    let actual_octet = class.bits() | number;

    let class_ok = spec.class.is_none_or(|c| c == class);
    let tag_ok = spec.tag.is_none_or(|t| t == number);
    if !class_ok || !tag_ok {
        warnings.push(VarBindErrorKind::WrongTag {
            expected: expected_octet,
            actual: actual_octet,
        });
        return Ok(Value::Unknown {
            tag: actual_octet,
            data: content,
        });
    }

    let len = content.len();
    if len < spec.min_len || spec.max_len.is_some_and(|max| len > max) {
        warnings.push(VarBindErrorKind::WrongLength {
            length: len,
            min: spec.min_len,
            max: spec.max_len,
        });
        return Ok(Value::Unknown {
            tag: actual_octet,
            data: content,
        });
    }

    let value = match spec.decode_as {
        DecodeAs::Integer32 => Value::Integer(decode_i32(&content)?),
        DecodeAs::Integer64 => Value::Integer(decode_i64(&content)?),
        DecodeAs::Unsigned32 => Value::Unsigned32(decode_u32(&content)?),
        DecodeAs::Unsigned64 => Value::Counter64(decode_u64(&content)?),
        DecodeAs::Counter32 => Value::Counter32(decode_u32(&content)?),
        DecodeAs::Gauge32 => Value::Gauge32(decode_u32(&content)?),
        DecodeAs::TimeTicks => Value::TimeTicks(decode_u32(&content)?),
        DecodeAs::Counter64 => Value::Counter64(decode_u64(&content)?),
        DecodeAs::OctetString => Value::OctetString(content),
        DecodeAs::ObjectIdentifier => decode_oid_value(&content)?,
        DecodeAs::IpAddress => decode_address(content),
        DecodeAs::Opaque => Value::Opaque(content),
        DecodeAs::NsapAddress => Value::NsapAddress(content),
    };
    Ok(value)
}

/// Fallback typing when the OID index gives no expected type: classify by
/// (class, tag number) alone.
fn decode_heuristic(class: Class, number: u8, octet: u8, content: Bytes) -> Result<Value> {
    use crate::ber::tag::{application as app, universal as uni};

    match class {
        Class::Universal => match number {
            n if n == uni::INTEGER => Ok(Value::Integer(decode_i32(&content)?)),
            n if n == uni::OCTET_STRING => Ok(Value::OctetString(content)),
            n if n == uni::OBJECT_IDENTIFIER => decode_oid_value(&content),
            // NULL is handled before value typing
            _ => Ok(Value::Unknown {
                tag: octet,
                data: content,
            }),
        },
        Class::Application => match number {
            app::IP_ADDRESS => Ok(decode_address(content)),
            app::COUNTER32 => Ok(Value::Counter32(decode_u32(&content)?)),
            app::GAUGE32 => Ok(Value::Gauge32(decode_u32(&content)?)),
            app::TIMETICKS => Ok(Value::TimeTicks(decode_u32(&content)?)),
            app::OPAQUE => Ok(Value::Opaque(content)),
            app::NSAP_ADDRESS => Ok(Value::NsapAddress(content)),
            app::COUNTER64 => Ok(Value::Counter64(decode_u64(&content)?)),
            app::UINTEGER32 => Ok(Value::Unsigned32(decode_u32(&content)?)),
            _ => Ok(Value::Unknown {
                tag: octet,
                data: content,
            }),
        },
        Class::ContextSpecific | Class::Private => Ok(Value::Unknown {
            tag: octet,
            data: content,
        }),
    }
}

/// Signed INTEGER in the Integer32 wire range: 1-4 bytes, sign-extended.
fn decode_i32(content: &[u8]) -> Result<i64> {
    match content.len() {
        0 => Err(Error::varbind(VarBindErrorKind::ZeroLengthInteger)),
        1..=4 => {
            let mut value: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
            for &b in content {
                value = (value << 8) | i64::from(b);
            }
            Ok(value)
        }
        length => Err(Error::varbind(VarBindErrorKind::IntegerTooLarge { length })),
    }
}

/// Signed 64-bit: 1-8 bytes, sign-extended. No leading-zero exception.
fn decode_i64(content: &[u8]) -> Result<i64> {
    match content.len() {
        0 => Err(Error::varbind(VarBindErrorKind::ZeroLengthInteger)),
        1..=8 => {
            let mut value: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
            for &b in content {
                value = (value << 8) | i64::from(b);
            }
            Ok(value)
        }
        length => Err(Error::varbind(VarBindErrorKind::IntegerTooLarge { length })),
    }
}

/// Unsigned 32-bit: 1-5 bytes, a 5-byte form must carry a leading zero.
fn decode_u32(content: &[u8]) -> Result<u32> {
    let content = strip_unsigned_lead(content, 4)?;
    let mut value: u32 = 0;
    for &b in content {
        value = (value << 8) | u32::from(b);
    }
    Ok(value)
}

/// Unsigned 64-bit: 1-9 bytes, a 9-byte form must carry a leading zero.
fn decode_u64(content: &[u8]) -> Result<u64> {
    let content = strip_unsigned_lead(content, 8)?;
    let mut value: u64 = 0;
    for &b in content {
        value = (value << 8) | u64::from(b);
    }
    Ok(value)
}

/// Width check for unsigned integral values: at most `width` significant
/// bytes, allowing one leading zero octet (the positive-sign pad emitted
/// when the MSB is set). Never truncates silently.
fn strip_unsigned_lead(content: &[u8], width: usize) -> Result<&[u8]> {
    let length = content.len();
    if length == 0 {
        return Err(Error::varbind(VarBindErrorKind::ZeroLengthInteger));
    }
    if length <= width {
        return Ok(content);
    }
    if length == width + 1 && content[0] == 0 {
        return Ok(&content[1..]);
    }
    Err(Error::varbind(VarBindErrorKind::IntegerTooLarge { length }))
}

/// OID value: at least one content byte required.
fn decode_oid_value(content: &[u8]) -> Result<Value> {
    if content.is_empty() {
        return Err(Error::varbind(VarBindErrorKind::WrongLength {
            length: 0,
            min: 1,
            max: None,
        }));
    }
    Ok(Value::ObjectIdentifier(Oid::from_ber(content)?))
}

/// IpAddress by length: 4 bytes IPv4, 16 bytes IPv6, anything else kept raw.
fn decode_address(content: Bytes) -> Value {
    match content.len() {
        4 => Value::IpAddress([content[0], content[1], content[2], content[3]]),
        16 => {
            let mut a = [0u8; 16];
            a.copy_from_slice(&content);
            Value::IpAddressV6(a)
        }
        _ => Value::AnyAddress(content),
    }
}
