use std::fs;
use std::path::Path;

use super::ByteStream;
use crate::error::TraceError;

/// In-memory byte source.
///
/// # Examples
/// ```
/// use bytelens_core::{BufferStream, ByteStream};
///
/// let mut stream = BufferStream::new(vec![0x01u8, 0x02, 0x03]);
/// assert_eq!(stream.read_u2be()?, 0x0102);
/// assert_eq!(stream.pos(), 2);
/// # Ok::<(), bytelens_core::TraceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BufferStream {
    data: Vec<u8>,
    pos: usize,
}

impl BufferStream {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Load a whole file into memory.
    ///
    /// # Errors
    /// Returns `TraceError::Io` when the file cannot be read.
    pub fn open(path: &Path) -> Result<Self, TraceError> {
        let data = fs::read(path)?;
        log::debug!("loaded {} bytes from {}", data.len(), path.display());
        Ok(Self::new(data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }
}

impl ByteStream for BufferStream {
    fn pos(&self) -> u64 {
        self.pos as u64
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn seek(&mut self, pos: u64) -> Result<(), TraceError> {
        if pos > self.size() {
            return Err(TraceError::SeekOutOfRange {
                target: pos,
                size: self.size(),
            });
        }
        self.pos = pos as usize;
        Ok(())
    }

    fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>, TraceError> {
        let available = self.remaining().len() as u64;
        if n > available {
            return Err(TraceError::UnexpectedEof {
                pos: self.pos(),
                requested: n,
                available,
            });
        }
        let end = self.pos + n as usize;
        let bytes = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(bytes)
    }

    fn read_bytes_full(&mut self) -> Result<Vec<u8>, TraceError> {
        let bytes = self.remaining().to_vec();
        self.pos = self.data.len();
        Ok(bytes)
    }

    fn read_bytes_term(
        &mut self,
        term: u8,
        include: bool,
        consume: bool,
        eos_error: bool,
    ) -> Result<Vec<u8>, TraceError> {
        match self.remaining().iter().position(|&b| b == term) {
            Some(idx) => {
                let term_at = self.pos + idx;
                let end = if include { term_at + 1 } else { term_at };
                let bytes = self.data[self.pos..end].to_vec();
                self.pos = if consume { term_at + 1 } else { term_at };
                Ok(bytes)
            }
            None if eos_error => Err(TraceError::TerminatorNotFound {
                pos: self.pos(),
                term,
            }),
            None => self.read_bytes_full(),
        }
    }
}
