//! MIB-derived OID index.
//!
//! The index is a tree over OID prefixes that tells the VarBind decoder how
//! to interpret a binding: whether the named node is a scalar or a table
//! column, which index keys identify a row instance, and what BER shape the
//! value must have. It is built once by the host (from compiled MIB data or
//! by hand in tests) and is read-only during decoding, so it can be shared
//! freely across packet decodes.

mod index;

pub use index::{IndexKey, IndexValue, decode_instance, encode_instance};

use crate::ber::Class;
use crate::oid::Oid;
use std::collections::HashMap;

/// Kind of a node in the OID index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Scalar object; instances are named by a single `.0` sub-identifier.
    Scalar,
    /// Table column; instances are named by the enclosing row's index keys.
    Column,
    /// Table row (entry); carries the ordered index key list.
    Row,
    /// Any other node (module, table, notification, ...).
    Other,
}

/// Decode rule for a value-bearing node.
///
/// Closed set: adding a kind forces every consumer match to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeAs {
    Integer32,
    Integer64,
    Unsigned32,
    Unsigned64,
    Counter32,
    Gauge32,
    TimeTicks,
    Counter64,
    OctetString,
    ObjectIdentifier,
    IpAddress,
    Opaque,
    NsapAddress,
}

/// Expected BER shape and length bounds for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSpec {
    /// Expected tag class; `None` matches any class.
    pub class: Option<Class>,
    /// Expected tag number; `None` matches any number.
    pub tag: Option<u8>,
    /// Minimum content length in bytes.
    pub min_len: usize,
    /// Maximum content length in bytes; `None` means unbounded.
    pub max_len: Option<usize>,
    /// How to interpret the content once the shape checks pass.
    pub decode_as: DecodeAs,
}

impl ValueSpec {
    /// Spec matching one exact class/tag with a length range.
    pub fn exact(
        class: Class,
        tag: u8,
        min_len: usize,
        max_len: Option<usize>,
        decode_as: DecodeAs,
    ) -> Self {
        Self {
            class: Some(class),
            tag: Some(tag),
            min_len,
            max_len,
            decode_as,
        }
    }
}

/// Metadata for one OID-index node.
#[derive(Debug, Clone)]
pub struct OidInfo {
    pub kind: NodeKind,
    /// Human-readable object name, when the MIB supplies one.
    pub name: Option<Box<str>>,
    /// Expected value shape for value-bearing nodes.
    pub value: Option<ValueSpec>,
    /// Ordered index key descriptors. Only meaningful on `Row` nodes;
    /// insertion order is the index sub-identifier order.
    pub keys: Vec<IndexKey>,
}

impl OidInfo {
    /// A node with just a kind.
    pub fn of_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            value: None,
            keys: Vec::new(),
        }
    }

    /// Set the object name.
    pub fn named(mut self, name: impl Into<Box<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the expected value shape.
    pub fn with_value(mut self, value: ValueSpec) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the row index keys.
    pub fn with_keys(mut self, keys: Vec<IndexKey>) -> Self {
        self.keys = keys;
        self
    }
}

struct Node {
    parent: Option<usize>,
    children: HashMap<u32, usize>,
    info: Option<OidInfo>,
}

/// OID prefix tree.
pub struct OidIndex {
    // nodes[0] is the unnamed root
    nodes: Vec<Node>,
}

/// A resolved OID: the deepest info-bearing node on the path plus the split
/// point between matched prefix and trailing instance sub-identifiers.
pub struct Resolved<'a> {
    index: &'a OidIndex,
    node: usize,
    matched: usize,
}

impl Default for OidIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OidIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: HashMap::new(),
                info: None,
            }],
        }
    }

    /// Insert (or replace) the metadata at an OID.
    ///
    /// Intermediate nodes are created without metadata.
    pub fn insert(&mut self, oid: &Oid, info: OidInfo) {
        let mut node = 0usize;
        for &arc in oid.arcs() {
            let existing = self.nodes[node].children.get(&arc).copied();
            node = match existing {
                Some(child) => child,
                None => {
                    let id = self.nodes.len();
                    self.nodes.push(Node {
                        parent: Some(node),
                        children: HashMap::new(),
                        info: None,
                    });
                    self.nodes[node].children.insert(arc, id);
                    id
                }
            };
        }
        self.nodes[node].info = Some(info);
    }

    /// Resolve an OID to the deepest node carrying metadata.
    ///
    /// Returns `None` when no prefix of `arcs` has metadata at all.
    pub fn resolve(&self, arcs: &[u32]) -> Option<Resolved<'_>> {
        let mut node = 0usize;
        let mut best: Option<(usize, usize)> = None;

        for (depth, arc) in arcs.iter().enumerate() {
            match self.nodes[node].children.get(arc) {
                Some(&child) => {
                    node = child;
                    if self.nodes[node].info.is_some() {
                        best = Some((node, depth + 1));
                    }
                }
                None => break,
            }
        }

        best.map(|(node, matched)| Resolved {
            index: self,
            node,
            matched,
        })
    }

    fn info_of(&self, node: usize) -> Option<&OidInfo> {
        self.nodes[node].info.as_ref()
    }
}

impl<'a> Resolved<'a> {
    /// Metadata of the resolved node.
    pub fn info(&self) -> &'a OidInfo {
        // resolve() only records nodes with metadata
        self.index.nodes[self.node]
            .info
            .as_ref()
            .expect("resolved node carries info")
    }

    /// Number of leading arcs matched by the index.
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Metadata of the nearest info-bearing ancestor.
    ///
    /// For a well-formed index this is a `Column`'s enclosing `Row`.
    pub fn enclosing(&self) -> Option<&'a OidInfo> {
        let mut cur = self.index.nodes[self.node].parent;
        while let Some(node) = cur {
            if let Some(info) = self.index.info_of(node) {
                return Some(info);
            }
            cur = self.index.nodes[node].parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn sample_index() -> OidIndex {
        let mut idx = OidIndex::new();
        // sysUpTime
        idx.insert(
            &oid!(1, 3, 6, 1, 2, 1, 1, 3),
            OidInfo::of_kind(NodeKind::Scalar)
                .named("sysUpTime")
                .with_value(ValueSpec::exact(
                    Class::Application,
                    crate::ber::tag::application::TIMETICKS,
                    1,
                    Some(5),
                    DecodeAs::TimeTicks,
                )),
        );
        // ifEntry with INDEX { ifIndex }
        idx.insert(
            &oid!(1, 3, 6, 1, 2, 1, 2, 2, 1),
            OidInfo::of_kind(NodeKind::Row)
                .named("ifEntry")
                .with_keys(vec![IndexKey::Integer { unsigned: true }]),
        );
        idx.insert(
            &oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2),
            OidInfo::of_kind(NodeKind::Column).named("ifDescr"),
        );
        idx
    }

    #[test]
    fn test_resolve_deepest_match() {
        let idx = sample_index();
        let r = idx.resolve(&[1, 3, 6, 1, 2, 1, 1, 3, 0]).unwrap();
        assert_eq!(r.matched(), 8);
        assert_eq!(r.info().kind, NodeKind::Scalar);
        assert_eq!(r.info().name.as_deref(), Some("sysUpTime"));
    }

    #[test]
    fn test_resolve_column_and_enclosing_row() {
        let idx = sample_index();
        let r = idx.resolve(&[1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 7]).unwrap();
        assert_eq!(r.info().kind, NodeKind::Column);
        let row = r.enclosing().unwrap();
        assert_eq!(row.kind, NodeKind::Row);
        assert_eq!(row.keys.len(), 1);
    }

    #[test]
    fn test_resolve_prefix_only_falls_back_to_shallower_node() {
        let idx = sample_index();
        // Row itself resolves even when the requested OID dives past an
        // arc with no metadata of its own.
        let r = idx.resolve(&[1, 3, 6, 1, 2, 1, 2, 2, 1, 99, 7]).unwrap();
        assert_eq!(r.info().kind, NodeKind::Row);
        assert_eq!(r.matched(), 9);
    }

    #[test]
    fn test_resolve_unknown_oid() {
        let idx = sample_index();
        assert!(idx.resolve(&[1, 3, 6, 1, 4, 1]).is_none());
    }

    #[test]
    fn test_insert_replaces_info() {
        let mut idx = OidIndex::new();
        idx.insert(&oid!(1, 3), OidInfo::of_kind(NodeKind::Other));
        idx.insert(&oid!(1, 3), OidInfo::of_kind(NodeKind::Scalar));
        let r = idx.resolve(&[1, 3]).unwrap();
        assert_eq!(r.info().kind, NodeKind::Scalar);
    }
}
