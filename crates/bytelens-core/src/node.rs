//! Parsed structure instances and the values stored in their fields.
//!
//! A `ParsedNode` is one occurrence of a schema-defined structure. Nodes are
//! created through a `TracedStream` so that each occurrence receives its own
//! `NodeId`, even when the same structure type repeats. Fields keep
//! first-assignment order; reassigning a name replaces the value in place.

use std::fmt;

use serde::Serialize;

/// Identity of one structure occurrence within a parse session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A decoded primitive value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::U8(v) => write!(f, "{v}"),
            Scalar::U16(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Bytes(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                write!(f, "[{}]", hex.join(" "))
            }
            Scalar::Str(v) => write!(f, "{v:?}"),
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }

            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Scalar(Scalar::$variant(value))
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Vec<u8> => Bytes,
    String => Str,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(Scalar::Str(value.to_string()))
    }
}

/// Value held by a node field: a scalar, a nested node, or a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    Node(ParsedNode),
    Seq(Vec<FieldValue>),
}

impl FieldValue {
    /// Build a sequence value from anything convertible into field values.
    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FieldValue>,
    {
        FieldValue::Seq(items.into_iter().map(Into::into).collect())
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FieldValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&ParsedNode> {
        match self {
            FieldValue::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Seq(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<ParsedNode> for FieldValue {
    fn from(value: ParsedNode) -> Self {
        FieldValue::Node(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::Seq(items)
    }
}

/// One occurrence of a schema-defined structure.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNode {
    id: NodeId,
    type_name: String,
    fields: Vec<(String, FieldValue)>,
}

impl ParsedNode {
    pub(crate) fn new(id: NodeId, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Field value by name, including untracked internal fields.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// All fields in first-assignment order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn set(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_first_assignment_order() {
        let mut node = ParsedNode::new(NodeId(1), "header");
        node.set("a", 1u8.into());
        node.set("b", 2u8.into());
        node.set("a", 3u8.into());

        assert_eq!(node.len(), 2);
        let names: Vec<&str> = node.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(node.get("a"), Some(&FieldValue::Scalar(Scalar::U8(3))));
    }

    #[test]
    fn new_node_is_empty() {
        let node = ParsedNode::new(NodeId(7), "chunk");
        assert!(node.is_empty());
        assert_eq!(node.id().to_string(), "#7");
    }

    #[test]
    fn seq_collects_scalars() {
        let value = FieldValue::seq([1u16, 2u16]);
        let items = value.as_seq().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_scalar(), Some(&Scalar::U16(2)));
    }

    #[test]
    fn byte_vectors_stay_scalar() {
        let value: FieldValue = vec![1u8, 2u8].into();
        assert_eq!(value.as_scalar(), Some(&Scalar::Bytes(vec![1, 2])));
    }

    #[test]
    fn bytes_display_as_hex() {
        let scalar = Scalar::Bytes(vec![0x01, 0xab]);
        assert_eq!(scalar.to_string(), "[01 ab]");
        assert_eq!(Scalar::Str("hi".to_string()).to_string(), "\"hi\"");
    }
}
