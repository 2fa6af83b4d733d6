//! Generated parser lookup.
//!
//! Parsers are produced ahead of time from schema descriptions and registered
//! under their schema id. A `.ksy` description names its id in the `meta`
//! mapping; `resolve_ksy_file` reads that id and returns the matching parser.
//! Every lookup failure is reported as `TraceError::SchemaResolution` before
//! any input is parsed.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::TraceError;
use crate::node::ParsedNode;
use crate::stream::TracedStream;

/// A generated parser for one schema.
pub trait NodeParser {
    fn schema_id(&self) -> &str;

    /// Parse the root structure, reading and assigning through `io`.
    fn parse(&self, io: &mut TracedStream) -> Result<ParsedNode, TraceError>;
}

/// Adapter registering a plain function as a parser.
pub struct FnParser<F> {
    schema_id: String,
    parse: F,
}

impl<F> FnParser<F>
where
    F: Fn(&mut TracedStream) -> Result<ParsedNode, TraceError>,
{
    pub fn new(schema_id: impl Into<String>, parse: F) -> Self {
        Self {
            schema_id: schema_id.into(),
            parse,
        }
    }
}

impl<F> NodeParser for FnParser<F>
where
    F: Fn(&mut TracedStream) -> Result<ParsedNode, TraceError>,
{
    fn schema_id(&self) -> &str {
        &self.schema_id
    }

    fn parse(&self, io: &mut TracedStream) -> Result<ParsedNode, TraceError> {
        (self.parse)(io)
    }
}

impl<F> fmt::Debug for FnParser<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnParser")
            .field("schema_id", &self.schema_id)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct SchemaRegistry {
    parsers: BTreeMap<String, Box<dyn NodeParser>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser under its schema id, returning any parser it replaces.
    pub fn register<P>(&mut self, parser: P) -> Option<Box<dyn NodeParser>>
    where
        P: NodeParser + 'static,
    {
        let id = parser.schema_id().to_string();
        log::debug!("registering parser for schema '{id}'");
        self.parsers.insert(id, Box::new(parser))
    }

    pub fn schema_ids(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    pub fn resolve(&self, schema_id: &str) -> Result<&dyn NodeParser, TraceError> {
        match self.parsers.get(schema_id) {
            Some(parser) => {
                log::info!("resolved parser for schema '{schema_id}'");
                Ok(parser.as_ref())
            }
            None => Err(TraceError::schema(schema_id, "no generated parser registered")),
        }
    }

    /// Resolve the parser named by the `meta: id:` entry of a `.ksy` file.
    pub fn resolve_ksy_file(&self, path: &Path) -> Result<&dyn NodeParser, TraceError> {
        let label = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|err| {
            TraceError::schema(&label, format!("cannot read description: {err}"))
        })?;
        let schema_id = meta_id(&label, &text)?;
        self.resolve(&schema_id)
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.parsers.keys()).finish()
    }
}

#[derive(Debug, Deserialize)]
struct KsyDescription {
    #[serde(default)]
    meta: KsyMeta,
}

#[derive(Debug, Default, Deserialize)]
struct KsyMeta {
    id: Option<String>,
}

/// Extract the schema id declared in the top-level `meta` block of a `.ksy`
/// description.
///
/// # Errors
/// Returns `TraceError::SchemaResolution` when the text is not valid YAML or
/// declares no `meta.id`.
///
/// # Examples
/// ```
/// use bytelens_core::schema_id_from_ksy;
///
/// let ksy = "meta:\n  id: gif\n  endian: le\nseq:\n  - id: header\n";
/// assert_eq!(schema_id_from_ksy(ksy)?, "gif");
/// # Ok::<(), bytelens_core::TraceError>(())
/// ```
pub fn schema_id_from_ksy(text: &str) -> Result<String, TraceError> {
    meta_id("<ksy>", text)
}

fn meta_id(label: &str, text: &str) -> Result<String, TraceError> {
    let description: KsyDescription = serde_yaml::from_str(text)
        .map_err(|err| TraceError::schema(label, format!("invalid description: {err}")))?;
    description
        .meta
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TraceError::schema(label, "no meta id in description"))
}

#[cfg(test)]
mod tests {
    use super::{FnParser, NodeParser, SchemaRegistry, schema_id_from_ksy};
    use crate::error::TraceError;
    use crate::node::ParsedNode;
    use crate::stream::TracedStream;

    fn empty_root(io: &mut TracedStream) -> Result<ParsedNode, TraceError> {
        Ok(io.new_node("root"))
    }

    #[test]
    fn meta_id_is_found() {
        let ksy = "# comment\nmeta:\n  title: Demo\n  id: demo_format # trailing\n  endian: be\n\
                   seq:\n  - id: magic\n";
        assert_eq!(schema_id_from_ksy(ksy).unwrap(), "demo_format");
    }

    #[test]
    fn meta_id_accepts_quotes_and_blank_lines() {
        let ksy = "meta:\n\n  id: \"quoted\"\n";
        assert_eq!(schema_id_from_ksy(ksy).unwrap(), "quoted");
    }

    #[test]
    fn meta_id_in_flow_mapping() {
        let ksy = "meta: {id: gif, endian: le}\nseq:\n  - id: header\n    size: 6\n";
        assert_eq!(schema_id_from_ksy(ksy).unwrap(), "gif");
    }

    #[test]
    fn meta_text_inside_doc_block_is_ignored() {
        let ksy = "doc: |\n  meta:\n    id: not_this\nmeta:\n  id: real_id\n";
        assert_eq!(schema_id_from_ksy(ksy).unwrap(), "real_id");
    }

    #[test]
    fn subtype_meta_is_ignored() {
        let ksy = "types:\n  chunk:\n    meta:\n      id: chunk\nmeta:\n  id: real_id\n";
        assert_eq!(schema_id_from_ksy(ksy).unwrap(), "real_id");
    }

    #[test]
    fn nested_id_in_meta_is_ignored() {
        let ksy = "meta:\n  xref:\n    id: wrong\n  id: right\n";
        assert_eq!(schema_id_from_ksy(ksy).unwrap(), "right");
    }

    #[test]
    fn meta_without_id_fails() {
        let ksy = "meta:\n  endian: le\nseq:\n  - id: not_meta\n";
        let err = schema_id_from_ksy(ksy).unwrap_err();
        assert!(err.to_string().contains("no meta id"));
    }

    #[test]
    fn missing_meta_block_fails() {
        let err = schema_id_from_ksy("seq:\n  - id: magic\n").unwrap_err();
        assert!(matches!(err, TraceError::SchemaResolution { .. }));
    }

    #[test]
    fn malformed_yaml_is_schema_resolution_error() {
        let err = schema_id_from_ksy("meta: [id: x\n").unwrap_err();
        let TraceError::SchemaResolution { reason, .. } = err else {
            panic!("expected schema resolution error, got {err:?}");
        };
        assert!(reason.starts_with("invalid description"));
    }

    #[test]
    fn resolve_registered_parser() {
        let mut registry = SchemaRegistry::new();
        assert!(registry.register(FnParser::new("demo", empty_root)).is_none());
        assert!(registry.register(FnParser::new("demo", empty_root)).is_some());
        assert_eq!(registry.resolve("demo").unwrap().schema_id(), "demo");
        assert_eq!(registry.schema_ids().collect::<Vec<_>>(), ["demo"]);
    }

    #[test]
    fn resolve_unknown_schema_fails() {
        let registry = SchemaRegistry::new();
        let err = registry.resolve("nope").err().unwrap();
        assert!(matches!(
            err,
            TraceError::SchemaResolution { ref schema, .. } if schema == "nope"
        ));
    }

    #[test]
    fn resolve_ksy_file_reads_meta_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.ksy");
        std::fs::write(&path, "meta:\n  id: demo\n").unwrap();

        let mut registry = SchemaRegistry::new();
        registry.register(FnParser::new("demo", empty_root));
        assert_eq!(registry.resolve_ksy_file(&path).unwrap().schema_id(), "demo");
    }

    #[test]
    fn resolve_missing_ksy_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SchemaRegistry::new();
        let err = registry
            .resolve_ksy_file(&dir.path().join("missing.ksy"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("cannot read description"));
    }
}
