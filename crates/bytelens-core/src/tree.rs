//! Presentation tree built from a finished parse.
//!
//! The tree mirrors the node structure: nested nodes become entries with
//! children, sequences become group entries whose children are named `[i]`.
//! Building is read-only and can be repeated on the same parse.

use serde::Serialize;

use crate::error::TraceError;
use crate::node::{FieldValue, ParsedNode, Scalar};
use crate::session::{ElementSpan, FieldRange, OffsetLedger};

/// One named entry with its byte range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEntry {
    pub name: String,
    pub offset: u64,
    pub length: u64,
    #[serde(flatten)]
    pub content: EntryContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryContent {
    Value(Scalar),
    Children(Vec<FieldEntry>),
}

impl FieldEntry {
    pub fn range(&self) -> FieldRange {
        FieldRange::new(self.offset, self.length)
    }

    pub fn value(&self) -> Option<&Scalar> {
        match &self.content {
            EntryContent::Value(value) => Some(value),
            EntryContent::Children(_) => None,
        }
    }

    /// Child entries; empty for scalar entries.
    pub fn children(&self) -> &[FieldEntry] {
        match &self.content {
            EntryContent::Value(_) => &[],
            EntryContent::Children(children) => children,
        }
    }
}

/// Ordered top-level entries of a parsed root.
///
/// # Examples
/// ```
/// use bytelens_core::{BufferStream, ByteStream, TracedStream, build_tree};
///
/// let mut io = TracedStream::new(BufferStream::new(vec![0x07u8, 0x00, 0x01]));
/// let mut root = io.new_node("packet");
/// let kind = io.read_u1()?;
/// io.assign(&mut root, "kind", kind)?;
/// let len = io.read_u2be()?;
/// io.assign(&mut root, "len", len)?;
///
/// let tree = build_tree(&root, io.ledger())?;
/// let len = tree.find_path(&["len"]).unwrap();
/// assert_eq!((len.offset, len.length), (1, 2));
/// # Ok::<(), bytelens_core::TraceError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldTree(Vec<FieldEntry>);

impl FieldTree {
    pub fn entries(&self) -> &[FieldEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entry reached by following names from the top level down.
    pub fn find_path(&self, path: &[&str]) -> Option<&FieldEntry> {
        let (first, rest) = path.split_first()?;
        let mut entry = self.0.iter().find(|entry| entry.name == *first)?;
        for name in rest {
            entry = entry.children().iter().find(|child| child.name == *name)?;
        }
        Some(entry)
    }

    /// Entries covering byte `pos`, outermost first.
    pub fn locate(&self, pos: u64) -> Vec<&FieldEntry> {
        let mut path = Vec::new();
        let mut level = self.entries();
        while let Some(entry) = level.iter().find(|entry| entry.range().contains(pos)) {
            path.push(entry);
            level = entry.children();
        }
        path
    }
}

impl<'a> IntoIterator for &'a FieldTree {
    type Item = &'a FieldEntry;
    type IntoIter = std::slice::Iter<'a, FieldEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Build the presentation tree for `root`.
///
/// # Errors
/// Returns `TraceError::MissingField` when a node field was never attributed
/// through the ledger.
pub fn build_tree(root: &ParsedNode, ledger: &OffsetLedger) -> Result<FieldTree, TraceError> {
    node_entries(root, ledger).map(FieldTree)
}

fn node_entries(node: &ParsedNode, ledger: &OffsetLedger) -> Result<Vec<FieldEntry>, TraceError> {
    ledger
        .field_order(node.id())
        .iter()
        .map(|name| {
            let value = node.get(name).ok_or_else(|| TraceError::MissingField {
                node: node.id(),
                name: name.clone(),
            })?;
            let range = ledger.lookup_range(node.id(), name)?;
            let content = match value {
                FieldValue::Scalar(scalar) => EntryContent::Value(scalar.clone()),
                FieldValue::Node(child) => EntryContent::Children(node_entries(child, ledger)?),
                FieldValue::Seq(items) => {
                    let spans = ledger.lookup_elements(node.id(), name)?;
                    EntryContent::Children(element_entries(items, spans, ledger)?)
                }
            };
            Ok(FieldEntry {
                name: name.clone(),
                offset: range.offset,
                length: range.length,
                content,
            })
        })
        .collect()
}

fn element_entries(
    items: &[FieldValue],
    spans: &[ElementSpan],
    ledger: &OffsetLedger,
) -> Result<Vec<FieldEntry>, TraceError> {
    items
        .iter()
        .zip(spans)
        .enumerate()
        .map(|(index, (item, span))| {
            let content = match item {
                FieldValue::Scalar(scalar) => EntryContent::Value(scalar.clone()),
                FieldValue::Node(child) => EntryContent::Children(node_entries(child, ledger)?),
                FieldValue::Seq(inner) => {
                    EntryContent::Children(element_entries(inner, &span.elements, ledger)?)
                }
            };
            Ok(FieldEntry {
                name: format!("[{index}]"),
                offset: span.range.offset,
                length: span.range.length,
                content,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::build_tree;
    use crate::config::TraceConfig;
    use crate::error::TraceError;
    use crate::node::FieldValue;
    use crate::session::ParseSession;

    #[test]
    fn nested_and_sequence_fields_serialize() {
        let mut session = ParseSession::new(TraceConfig::default());
        let mut root = session.new_node("root");
        let mut inner = session.new_node("inner");

        session.push_boundary(0, 1);
        crate::intercept::assign(&mut session, 1, &mut inner, "x", 1u8.into()).unwrap();
        crate::intercept::assign(&mut session, 1, &mut root, "inner", inner.into()).unwrap();
        session.push_boundary(1, 2);
        session.push_boundary(2, 3);
        let items = FieldValue::seq([2u8, 3]);
        crate::intercept::assign(&mut session, 3, &mut root, "items", items).unwrap();

        let tree = build_tree(&root, session.ledger()).unwrap();
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            value,
            json!([
                {"name": "inner", "offset": 0, "length": 1, "children": [
                    {"name": "x", "offset": 0, "length": 1, "value": 1}
                ]},
                {"name": "items", "offset": 1, "length": 2, "children": [
                    {"name": "[0]", "offset": 1, "length": 1, "value": 2},
                    {"name": "[1]", "offset": 2, "length": 1, "value": 3}
                ]}
            ])
        );
    }

    #[test]
    fn locate_returns_outermost_first() {
        let mut session = ParseSession::new(TraceConfig::default());
        let mut root = session.new_node("root");
        let mut inner = session.new_node("inner");
        session.push_boundary(0, 2);
        crate::intercept::assign(&mut session, 2, &mut inner, "x", 1u16.into()).unwrap();
        session.push_boundary(2, 4);
        crate::intercept::assign(&mut session, 4, &mut inner, "y", 2u16.into()).unwrap();
        crate::intercept::assign(&mut session, 4, &mut root, "inner", inner.into()).unwrap();

        let tree = build_tree(&root, session.ledger()).unwrap();
        let names: Vec<&str> = tree.locate(3).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["inner", "y"]);
        assert!(tree.locate(4).is_empty());
        assert!(tree.find_path(&["inner", "z"]).is_none());
        assert_eq!(tree.find_path(&["inner", "x"]).unwrap().length, 2);
    }

    #[test]
    fn unattributed_root_builds_empty_tree() {
        let mut session = ParseSession::new(TraceConfig::default());
        let root = session.new_node("root");
        let tree = build_tree(&root, session.ledger()).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn ledger_from_another_parse_is_missing_field() {
        let mut first = ParseSession::new(TraceConfig::default());
        let mut root = first.new_node("root");
        first.push_boundary(0, 1);
        crate::intercept::assign(&mut first, 1, &mut root, "a", 1u8.into()).unwrap();

        let mut other = ParseSession::new(TraceConfig::default());
        let mut stranger = other.new_node("root");
        other.push_boundary(0, 1);
        crate::intercept::assign(&mut other, 1, &mut stranger, "b", 1u8.into()).unwrap();

        let err = build_tree(&root, other.ledger()).unwrap_err();
        assert!(matches!(err, TraceError::MissingField { ref name, .. } if name == "b"));
    }
}
