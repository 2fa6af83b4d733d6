//! bytelens core library: byte-range attribution for generated parsers.
//!
//! A schema-generated parser reads its input through a [`TracedStream`],
//! which records the byte range of every primitive read, and stores fields
//! with [`TracedStream::assign`], which attributes those ranges to fields.
//! After the parse, the [`OffsetLedger`] knows the offset and length of every
//! field at every nesting level, and [`build_tree`] turns a parsed root into a
//! navigable [`FieldTree`] for a byte-level inspector.
//!
//! Parsing is single-threaded and synchronous. Each parse owns its own
//! session (boundary stack + ledger); a failed parse is discarded and a retry
//! starts from a new stream.
//!
//! Invariants:
//! - Field order within a node is first-assignment order.
//! - A nested node's range is the hull of its own fields' ranges.
//! - Each primitive read pushes one boundary; each scalar field pops one,
//!   dropping identical boundaries directly beneath it.
//!
//! # Examples
//! ```
//! use bytelens_core::{FnParser, ParsedNode, TraceConfig, TraceError, TracedStream, inspect};
//! use bytelens_core::ByteStream;
//!
//! fn header(io: &mut TracedStream) -> Result<ParsedNode, TraceError> {
//!     let mut root = io.new_node("header");
//!     let magic = io.read_bytes(2)?;
//!     io.assign(&mut root, "magic", magic)?;
//!     let count = io.read_u2le()?;
//!     io.assign(&mut root, "count", count)?;
//!     Ok(root)
//! }
//!
//! let parser = FnParser::new("header", header);
//! let inspection = inspect(&parser, b"BL\x03\x00".to_vec(), TraceConfig::default())?;
//! let tree = inspection.tree()?;
//! let count = tree.find_path(&["count"]).unwrap();
//! assert_eq!((count.offset, count.length), (2, 2));
//! # Ok::<(), TraceError>(())
//! ```

mod config;
mod error;
mod inspect;
mod intercept;
mod node;
mod schema;
mod session;
mod stream;
mod tree;

pub use config::{DEFAULT_RESERVED_PREFIX, TraceConfig};
pub use error::TraceError;
pub use inspect::{FieldInfo, Inspection, inspect, inspect_file};
pub use node::{FieldValue, NodeId, ParsedNode, Scalar};
pub use schema::{FnParser, NodeParser, SchemaRegistry, schema_id_from_ksy};
pub use session::{
    BoundaryPair, BoundaryStack, ElementSpan, FieldRange, OffsetLedger, ParseSession,
};
pub use stream::{BufferStream, ByteStream, TracedStream};
pub use tree::{EntryContent, FieldEntry, FieldTree, build_tree};
