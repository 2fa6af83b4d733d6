use std::path::Path;

use crate::config::TraceConfig;
use crate::error::TraceError;
use crate::node::{FieldValue, NodeId, ParsedNode};
use crate::schema::{NodeParser, SchemaRegistry};
use crate::session::OffsetLedger;
use crate::stream::{BufferStream, TracedStream};
use crate::tree::{FieldTree, build_tree};

/// A tracked field with its value and attributed range.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo<'a> {
    pub name: &'a str,
    pub value: &'a FieldValue,
    pub offset: u64,
    pub length: u64,
}

/// Result of one completed parse: the root node and its ledger.
#[derive(Debug)]
pub struct Inspection {
    root: ParsedNode,
    ledger: OffsetLedger,
}

impl Inspection {
    pub(crate) fn new(root: ParsedNode, ledger: OffsetLedger) -> Self {
        Self { root, ledger }
    }

    pub fn root(&self) -> &ParsedNode {
        &self.root
    }

    pub fn ledger(&self) -> &OffsetLedger {
        &self.ledger
    }

    pub fn tree(&self) -> Result<FieldTree, TraceError> {
        build_tree(&self.root, &self.ledger)
    }

    pub fn lookup_offset(&self, node: NodeId, name: &str) -> Result<u64, TraceError> {
        self.ledger.lookup_offset(node, name)
    }

    pub fn lookup_length(&self, node: NodeId, name: &str) -> Result<u64, TraceError> {
        self.ledger.lookup_length(node, name)
    }

    /// Tracked fields of `node` in first-assignment order.
    pub fn fields_with_info<'a>(
        &'a self,
        node: &'a ParsedNode,
    ) -> Result<Vec<FieldInfo<'a>>, TraceError> {
        self.ledger
            .field_order(node.id())
            .iter()
            .map(|name| {
                let value = node.get(name).ok_or_else(|| TraceError::MissingField {
                    node: node.id(),
                    name: name.clone(),
                })?;
                let range = self.ledger.lookup_range(node.id(), name)?;
                Ok(FieldInfo {
                    name,
                    value,
                    offset: range.offset,
                    length: range.length,
                })
            })
            .collect()
    }
}

/// Parse `data` with `parser` in a fresh session.
///
/// # Errors
/// Propagates read, attribution, and stack errors raised during the parse; a
/// failed parse leaves nothing behind to reuse.
pub fn inspect(
    parser: &dyn NodeParser,
    data: impl Into<Vec<u8>>,
    config: TraceConfig,
) -> Result<Inspection, TraceError> {
    run(parser, BufferStream::new(data), config)
}

fn run(
    parser: &dyn NodeParser,
    source: BufferStream,
    config: TraceConfig,
) -> Result<Inspection, TraceError> {
    let mut io = TracedStream::with_config(source, config);
    let root = parser.parse(&mut io)?;
    let inspection = io.finish(root)?;
    log::info!(
        "parsed '{}': {} nodes attributed",
        parser.schema_id(),
        inspection.ledger.node_count()
    );
    Ok(inspection)
}

/// Resolve the parser for `ksy`, then parse the whole `target` file.
///
/// # Errors
/// Returns `TraceError::SchemaResolution` before touching `target` when no
/// parser matches the description.
pub fn inspect_file(
    registry: &SchemaRegistry,
    ksy: &Path,
    target: &Path,
    config: TraceConfig,
) -> Result<Inspection, TraceError> {
    let parser = registry.resolve_ksy_file(ksy)?;
    run(parser, BufferStream::open(target)?, config)
}

#[cfg(test)]
mod tests {
    use super::{inspect, inspect_file};
    use crate::config::TraceConfig;
    use crate::error::TraceError;
    use crate::node::ParsedNode;
    use crate::schema::{FnParser, SchemaRegistry};
    use crate::stream::{ByteStream, TracedStream};

    fn pair(io: &mut TracedStream) -> Result<ParsedNode, TraceError> {
        let mut root = io.new_node("pair");
        let left = io.read_u1()?;
        io.assign(&mut root, "left", left)?;
        let right = io.read_u1()?;
        io.assign(&mut root, "right", right)?;
        Ok(root)
    }

    #[test]
    fn fields_with_info_follow_assignment_order() {
        let parser = FnParser::new("pair", pair);
        let inspection = inspect(&parser, vec![7u8, 9], TraceConfig::default()).unwrap();

        let info = inspection.fields_with_info(inspection.root()).unwrap();
        let summary: Vec<(&str, u64, u64)> = info
            .iter()
            .map(|field| (field.name, field.offset, field.length))
            .collect();
        assert_eq!(summary, [("left", 0, 1), ("right", 1, 1)]);
    }

    #[test]
    fn short_input_aborts_inspection() {
        let parser = FnParser::new("pair", pair);
        let err = inspect(&parser, vec![7u8], TraceConfig::default()).unwrap_err();
        assert!(matches!(err, TraceError::UnexpectedEof { pos: 1, .. }));
    }

    #[test]
    fn inspect_file_reads_target_through_buffer_stream() {
        let dir = tempfile::tempdir().unwrap();
        let ksy = dir.path().join("pair.ksy");
        std::fs::write(&ksy, "meta:\n  id: pair\n").unwrap();
        let target = dir.path().join("pair.bin");
        std::fs::write(&target, [3u8, 4]).unwrap();

        let mut registry = SchemaRegistry::new();
        registry.register(FnParser::new("pair", pair));
        let inspection = inspect_file(&registry, &ksy, &target, TraceConfig::default()).unwrap();
        assert_eq!(inspection.lookup_offset(inspection.root().id(), "right").unwrap(), 1);

        let missing = dir.path().join("missing.bin");
        let err = inspect_file(&registry, &ksy, &missing, TraceConfig::default()).unwrap_err();
        assert!(matches!(err, TraceError::Io(_)));
    }
}
