use std::collections::HashMap;

use serde::Serialize;

use crate::error::TraceError;
use crate::node::NodeId;

/// Attributed byte range of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldRange {
    pub offset: u64,
    pub length: u64,
}

impl FieldRange {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.offset && pos < self.end()
    }

    /// Smallest range covering every input range, or `None` when empty.
    pub fn hull<I>(ranges: I) -> Option<FieldRange>
    where
        I: IntoIterator<Item = FieldRange>,
    {
        ranges.into_iter().fold(None, |acc, range| {
            Some(match acc {
                None => range,
                Some(acc) => {
                    let start = acc.offset.min(range.offset);
                    let end = acc.end().max(range.end());
                    FieldRange::new(start, end - start)
                }
            })
        })
    }
}

/// Range of one sequence element, with nested spans when the element is
/// itself a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementSpan {
    pub range: FieldRange,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ElementSpan>,
}

impl ElementSpan {
    pub fn leaf(range: FieldRange) -> Self {
        Self {
            range,
            elements: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct NodeEntry {
    order: Vec<String>,
    ranges: HashMap<String, FieldRange>,
    elements: HashMap<String, Vec<ElementSpan>>,
}

/// Per-parse table of attributed field ranges, keyed by node identity.
#[derive(Debug, Default)]
pub struct OffsetLedger {
    nodes: HashMap<NodeId, NodeEntry>,
}

impl OffsetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a field range; first insertion fixes its position in
    /// the node's field order.
    pub fn record_field(&mut self, node: NodeId, name: &str, offset: u64, length: u64) {
        let entry = self.nodes.entry(node).or_default();
        if !entry.ranges.contains_key(name) {
            entry.order.push(name.to_string());
        }
        entry
            .ranges
            .insert(name.to_string(), FieldRange::new(offset, length));
    }

    pub fn record_elements(&mut self, node: NodeId, name: &str, spans: Vec<ElementSpan>) {
        self.nodes
            .entry(node)
            .or_default()
            .elements
            .insert(name.to_string(), spans);
    }

    pub fn lookup_range(&self, node: NodeId, name: &str) -> Result<FieldRange, TraceError> {
        self.nodes
            .get(&node)
            .and_then(|entry| entry.ranges.get(name))
            .copied()
            .ok_or_else(|| TraceError::MissingField {
                node,
                name: name.to_string(),
            })
    }

    pub fn lookup_offset(&self, node: NodeId, name: &str) -> Result<u64, TraceError> {
        self.lookup_range(node, name).map(|range| range.offset)
    }

    pub fn lookup_length(&self, node: NodeId, name: &str) -> Result<u64, TraceError> {
        self.lookup_range(node, name).map(|range| range.length)
    }

    pub fn lookup_elements(&self, node: NodeId, name: &str) -> Result<&[ElementSpan], TraceError> {
        self.nodes
            .get(&node)
            .and_then(|entry| entry.elements.get(name))
            .map(Vec::as_slice)
            .ok_or_else(|| TraceError::MissingField {
                node,
                name: name.to_string(),
            })
    }

    /// Tracked field names in first-assignment order; empty for unknown nodes.
    pub fn field_order(&self, node: NodeId) -> &[String] {
        self.nodes
            .get(&node)
            .map(|entry| entry.order.as_slice())
            .unwrap_or(&[])
    }

    /// Convex hull of every field recorded for `node`.
    pub fn node_hull(&self, node: NodeId) -> Option<FieldRange> {
        let entry = self.nodes.get(&node)?;
        FieldRange::hull(entry.ranges.values().copied())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
