//! Property tests for the decode paths.
//!
//! These check the totality and round-trip guarantees: decoding never reads
//! past declared lengths or panics on hostile bytes, integer decoding
//! matches two's-complement math, and instance-index decoding inverts
//! encoding exactly.

use bytes::Bytes;
use proptest::prelude::*;

use snmp_dissect::ber::{Decoder, EncodeBuf};
use snmp_dissect::mib::{
    IndexKey, IndexValue, NodeKind, OidIndex, OidInfo, decode_instance, encode_instance,
};
use snmp_dissect::oid::Oid;
use snmp_dissect::{Value, VarBind, oid};

fn arb_index_key() -> impl Strategy<Value = IndexKey> {
    prop_oneof![
        any::<bool>().prop_map(|unsigned| IndexKey::Integer { unsigned }),
        Just(IndexKey::Oid),
        proptest::option::of(1usize..6).prop_map(|fixed_len| IndexKey::String { fixed_len }),
        proptest::option::of(1usize..6).prop_map(|fixed_len| IndexKey::Bytes { fixed_len }),
        Just(IndexKey::IpAddr),
    ]
}

/// A value structurally matching the key.
fn arb_value_for(key: IndexKey) -> BoxedStrategy<IndexValue> {
    match key {
        IndexKey::Integer { unsigned } => any::<u32>()
            .prop_map(move |value| IndexValue::Integer { value, unsigned })
            .boxed(),
        IndexKey::Oid | IndexKey::ImpliedOid => proptest::collection::vec(any::<u32>(), 1..8)
            .prop_map(|arcs| IndexValue::Oid(Oid::new(arcs)))
            .boxed(),
        IndexKey::String { fixed_len } | IndexKey::Bytes { fixed_len } | IndexKey::Nsap { fixed_len } => {
            let len = match fixed_len {
                Some(n) => n..=n,
                None => 0..=8,
            };
            proptest::collection::vec(any::<u8>(), len)
                .prop_map(|b| IndexValue::Octets(Bytes::from(b)))
                .boxed()
        }
        IndexKey::ImpliedString | IndexKey::ImpliedBytes | IndexKey::Ether => {
            proptest::collection::vec(any::<u8>(), 0..8)
                .prop_map(|b| IndexValue::Octets(Bytes::from(b)))
                .boxed()
        }
        IndexKey::IpAddr => proptest::array::uniform4(any::<u8>())
            .prop_map(|b| IndexValue::Octets(Bytes::copy_from_slice(&b)))
            .boxed(),
        IndexKey::Unsupported => unreachable!("not generated"),
    }
}

fn arb_keys_and_values() -> impl Strategy<Value = (Vec<IndexKey>, Vec<IndexValue>)> {
    proptest::collection::vec(arb_index_key(), 1..5).prop_flat_map(|keys| {
        let values: Vec<_> = keys.iter().map(|&k| arb_value_for(k)).collect();
        (Just(keys), values)
    })
}

proptest! {
    /// Encoding a structured instance index and decoding it back is the
    /// identity, order- and value-preserving.
    #[test]
    fn instance_index_roundtrip((keys, values) in arb_keys_and_values()) {
        let subids = encode_instance(&keys, &values).unwrap();
        let decoded = decode_instance(&keys, &subids).unwrap();
        prop_assert_eq!(decoded, values);
    }

    /// Arbitrary bytes never panic the VarBind decoder and never read past
    /// the buffer; they either decode or produce an error.
    #[test]
    fn varbind_decode_is_total(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let index = OidIndex::new();
        let mut decoder = Decoder::from_slice(&data);
        let _ = VarBind::decode(&mut decoder, &index);
    }

    /// Truncating a valid VarBind at any point yields an error, not a
    /// panic or a bogus decode of the full value.
    #[test]
    fn varbind_decode_rejects_truncation(ticks in any::<u32>(), cut_fraction in 0.0f64..1.0) {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|b| {
            Value::TimeTicks(ticks).encode(b);
            b.push_oid(&oid!(1, 3, 6, 1, 2, 1, 1, 3, 0));
        });
        let bytes = buf.finish_vec();
        let cut = ((bytes.len() - 1) as f64 * cut_fraction) as usize;

        let index = OidIndex::new();
        let mut decoder = Decoder::from_slice(&bytes[..cut]);
        prop_assert!(VarBind::decode(&mut decoder, &index).is_err());
    }

    /// INTEGER decoding matches two's-complement sign extension for every
    /// 1-4 byte encoding.
    #[test]
    fn integer_sign_extension(value in any::<i32>()) {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|b| {
            Value::Integer(i64::from(value)).encode(b);
            b.push_oid(&oid!(1, 3, 6, 1, 4, 1));
        });
        let index = OidIndex::new();
        let mut decoder = Decoder::new(buf.finish());
        let vb = VarBind::decode(&mut decoder, &index).unwrap();
        prop_assert_eq!(vb.value, Value::Integer(i64::from(value)));
    }

    /// OID BER encoding round-trips for arbitrary arc sequences.
    #[test]
    fn oid_ber_roundtrip(arcs in proptest::collection::vec(any::<u32>(), 2..20)) {
        // First two arcs must satisfy the X.690 folding rule to survive
        let mut arcs = arcs;
        arcs[0] %= 3;
        if arcs[0] < 2 {
            arcs[1] %= 40;
        }
        let oid = Oid::new(arcs);
        let decoded = Oid::from_ber(&oid.to_ber()).unwrap();
        prop_assert_eq!(decoded, oid);
    }

    /// Counter64 values survive encode/decode across the full u64 range.
    #[test]
    fn counter64_roundtrip(value in any::<u64>()) {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|b| {
            Value::Counter64(value).encode(b);
            b.push_oid(&oid!(1, 3, 6, 1, 4, 1));
        });
        let index = OidIndex::new();
        let mut decoder = Decoder::new(buf.finish());
        let vb = VarBind::decode(&mut decoder, &index).unwrap();
        prop_assert_eq!(vb.value, Value::Counter64(value));
    }
}

/// Fixed-point checks from the sign-extension table.
#[test]
fn integer_sign_extension_vectors() {
    let index = OidIndex::new();
    for (bytes, expected) in [
        (&[0xFFu8][..], -1i64),
        (&[0x7F][..], 127),
        (&[0x80, 0x00][..], -32768),
        (&[0x00, 0x80][..], 128),
        (&[0xFF, 0xFF, 0xFF, 0xFF][..], -1),
        (&[0x7F, 0xFF, 0xFF, 0xFF][..], i64::from(i32::MAX)),
    ] {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|b| {
            b.push_primitive(0x02, bytes);
            b.push_oid(&oid!(1, 3, 6, 1));
        });
        let mut decoder = Decoder::new(buf.finish());
        let vb = VarBind::decode(&mut decoder, &index).unwrap();
        assert_eq!(vb.value, Value::Integer(expected), "bytes {bytes:02X?}");
    }
}

/// A row mixing every practical key shape decodes a real-world style
/// instance OID correctly.
#[test]
fn mixed_row_instance_scenario() {
    let mut index = OidIndex::new();
    index.insert(
        &oid!(1, 3, 6, 1, 4, 1, 2000, 1, 1),
        OidInfo::of_kind(NodeKind::Row).with_keys(vec![
            IndexKey::Integer { unsigned: true },
            IndexKey::String { fixed_len: None },
            IndexKey::IpAddr,
        ]),
    );
    index.insert(
        &oid!(1, 3, 6, 1, 4, 1, 2000, 1, 1, 5),
        OidInfo::of_kind(NodeKind::Column).named("exampleColumn"),
    );

    // instance: 9 . len=2 "hi" . 10.0.0.7
    let name = oid!(
        1, 3, 6, 1, 4, 1, 2000, 1, 1, 5, 9, 2, 0x68, 0x69, 10, 0, 0, 7
    );
    let mut buf = EncodeBuf::new();
    buf.push_sequence(|b| {
        Value::Integer(1).encode(b);
        b.push_oid(&name);
    });
    let mut decoder = Decoder::new(buf.finish());
    let vb = VarBind::decode(&mut decoder, &index).unwrap();

    assert_eq!(
        vb.index,
        vec![
            IndexValue::Integer {
                value: 9,
                unsigned: true
            },
            IndexValue::Octets(Bytes::from_static(b"hi")),
            IndexValue::Octets(Bytes::from_static(&[10, 0, 0, 7])),
        ]
    );
}
