//! Mutable state of one in-flight parse.
//!
//! A `ParseSession` bundles the boundary stack, the offset ledger, and the
//! node id allocator. It is owned by exactly one `TracedStream`; a new parse
//! attempt always starts from a new session.

pub mod boundary;
pub mod ledger;

pub use boundary::{BoundaryPair, BoundaryStack};
pub use ledger::{ElementSpan, FieldRange, OffsetLedger};

use crate::config::TraceConfig;
use crate::node::{NodeId, ParsedNode};

#[derive(Debug, Default)]
pub struct ParseSession {
    pub(crate) config: TraceConfig,
    pub(crate) stack: BoundaryStack,
    pub(crate) ledger: OffsetLedger,
    next_id: u64,
}

impl ParseSession {
    pub fn new(config: TraceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    pub fn stack(&self) -> &BoundaryStack {
        &self.stack
    }

    pub fn ledger(&self) -> &OffsetLedger {
        &self.ledger
    }

    /// Allocate an empty node with a fresh identity.
    pub fn new_node(&mut self, type_name: &str) -> ParsedNode {
        self.next_id += 1;
        ParsedNode::new(NodeId(self.next_id), type_name)
    }

    pub(crate) fn push_boundary(&mut self, start: u64, end: u64) {
        self.stack.push(BoundaryPair::new(start, end));
    }

    pub fn into_ledger(self) -> OffsetLedger {
        self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::ParseSession;
    use crate::config::TraceConfig;

    #[test]
    fn node_ids_are_distinct_per_occurrence() {
        let mut session = ParseSession::new(TraceConfig::default());
        let first = session.new_node("entry");
        let second = session.new_node("entry");
        assert_ne!(first.id(), second.id());
        assert_eq!(second.id().get(), first.id().get() + 1);
        assert_eq!(first.type_name(), second.type_name());
    }
}
