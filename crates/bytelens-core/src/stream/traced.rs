use super::{BufferStream, ByteStream, for_each_primitive};
use crate::config::TraceConfig;
use crate::error::TraceError;
use crate::inspect::Inspection;
use crate::intercept;
use crate::node::{FieldValue, ParsedNode};
use crate::session::{OffsetLedger, ParseSession};

macro_rules! traced_primitives {
    ($($name:ident => $ty:ty, $decode:ident;)*) => {
        $(
            fn $name(&mut self) -> Result<$ty, TraceError> {
                self.traced(|inner| inner.$name())
            }
        )*
    };
}

/// Stream decorator that records the byte range of every primitive read and
/// attributes those ranges to node fields.
///
/// Each instance owns the session of exactly one parse. Generated parsers read
/// through it like any other `ByteStream` and store fields with
/// [`TracedStream::assign`].
///
/// # Examples
/// ```
/// use bytelens_core::{BufferStream, ByteStream, TracedStream};
///
/// let mut io = TracedStream::new(BufferStream::new(vec![0x2au8, 0x00, 0x10]));
/// let mut root = io.new_node("header");
/// let version = io.read_u1()?;
/// io.assign(&mut root, "version", version)?;
/// let length = io.read_u2be()?;
/// io.assign(&mut root, "length", length)?;
///
/// assert_eq!(io.ledger().lookup_offset(root.id(), "length")?, 1);
/// assert_eq!(io.ledger().lookup_length(root.id(), "length")?, 2);
/// # Ok::<(), bytelens_core::TraceError>(())
/// ```
#[derive(Debug)]
pub struct TracedStream<S = BufferStream> {
    inner: S,
    session: ParseSession,
}

impl<S: ByteStream> TracedStream<S> {
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, TraceConfig::default())
    }

    pub fn with_config(inner: S, config: TraceConfig) -> Self {
        Self {
            inner,
            session: ParseSession::new(config),
        }
    }

    pub fn session(&self) -> &ParseSession {
        &self.session
    }

    pub fn ledger(&self) -> &OffsetLedger {
        self.session.ledger()
    }

    pub fn new_node(&mut self, type_name: &str) -> ParsedNode {
        self.session.new_node(type_name)
    }

    /// Store a field on `node` and attribute its byte range.
    ///
    /// Scalars must be assigned right after the read that produced them;
    /// nested nodes must be fully populated before they are assigned.
    ///
    /// # Errors
    /// Returns `TraceError::StackUnderflow` when a scalar has no pending read.
    pub fn assign(
        &mut self,
        node: &mut ParsedNode,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), TraceError> {
        let pos = self.inner.pos();
        intercept::assign(&mut self.session, pos, node, name, value.into())
    }

    /// Store the bytes of the last read into an internal field without
    /// attributing them.
    ///
    /// Internal fields assigned through [`TracedStream::assign`] keep their
    /// read on the stack, which `strict_stack` reports at [`finish`]. Use this
    /// for fields holding raw read results, such as `_raw_*` buffers.
    ///
    /// [`finish`]: TracedStream::finish
    ///
    /// # Errors
    /// Returns `TraceError::StackUnderflow` when there is no pending read.
    pub fn assign_raw(
        &mut self,
        node: &mut ParsedNode,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), TraceError> {
        intercept::assign_raw(&mut self.session, node, name, value.into())
    }

    /// Close the parse and hand out the root with its ledger.
    ///
    /// # Errors
    /// With `strict_stack` set, returns `TraceError::DanglingBoundaries` when
    /// reads were never attributed to a field.
    pub fn finish(self, root: ParsedNode) -> Result<Inspection, TraceError> {
        let leftover = self.session.stack().len();
        if leftover > 0 {
            if self.session.config().strict_stack {
                return Err(TraceError::DanglingBoundaries { count: leftover });
            }
            log::warn!("{leftover} read boundaries left unattributed");
        }
        Ok(Inspection::new(root, self.session.into_ledger()))
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn traced<T>(
        &mut self,
        read: impl FnOnce(&mut S) -> Result<T, TraceError>,
    ) -> Result<T, TraceError> {
        let start = self.inner.pos();
        let value = read(&mut self.inner)?;
        let end = self.inner.pos();
        self.session.push_boundary(start, end);
        Ok(value)
    }
}

impl<S: ByteStream> ByteStream for TracedStream<S> {
    fn pos(&self) -> u64 {
        self.inner.pos()
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn seek(&mut self, pos: u64) -> Result<(), TraceError> {
        self.inner.seek(pos)
    }

    fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>, TraceError> {
        self.traced(|inner| inner.read_bytes(n))
    }

    fn read_bytes_full(&mut self) -> Result<Vec<u8>, TraceError> {
        self.traced(|inner| inner.read_bytes_full())
    }

    fn read_bytes_term(
        &mut self,
        term: u8,
        include: bool,
        consume: bool,
        eos_error: bool,
    ) -> Result<Vec<u8>, TraceError> {
        self.traced(|inner| inner.read_bytes_term(term, include, consume, eos_error))
    }

    for_each_primitive!(traced_primitives);
}
