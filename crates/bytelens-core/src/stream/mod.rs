//! Sequential byte readers.
//!
//! `ByteStream` is the read contract generated parsers are written against:
//! a queryable position plus one operation per primitive kind. `BufferStream`
//! serves bytes from memory; `TracedStream` decorates any stream and records
//! the range each primitive read consumed.
//!
//! Reads either succeed completely or leave the position untouched.

mod buffer;
mod traced;

pub use buffer::BufferStream;
pub use traced::TracedStream;

use crate::error::TraceError;

/// Invoke `$mac` with every fixed-width primitive read as
/// `name => type, decoder;` entries.
macro_rules! for_each_primitive {
    ($mac:ident) => {
        $mac! {
            read_u1 => u8, from_le_bytes;
            read_s1 => i8, from_le_bytes;
            read_u2le => u16, from_le_bytes;
            read_u2be => u16, from_be_bytes;
            read_u4le => u32, from_le_bytes;
            read_u4be => u32, from_be_bytes;
            read_u8le => u64, from_le_bytes;
            read_u8be => u64, from_be_bytes;
            read_s2le => i16, from_le_bytes;
            read_s2be => i16, from_be_bytes;
            read_s4le => i32, from_le_bytes;
            read_s4be => i32, from_be_bytes;
            read_s8le => i64, from_le_bytes;
            read_s8be => i64, from_be_bytes;
            read_f4le => f32, from_le_bytes;
            read_f4be => f32, from_be_bytes;
            read_f8le => f64, from_le_bytes;
            read_f8be => f64, from_be_bytes;
        }
    };
}

pub(crate) use for_each_primitive;

macro_rules! decode_primitives {
    ($($name:ident => $ty:ty, $decode:ident;)*) => {
        $(
            fn $name(&mut self) -> Result<$ty, TraceError> {
                let bytes = read_array::<Self, { std::mem::size_of::<$ty>() }>(self)?;
                Ok(<$ty>::$decode(bytes))
            }
        )*
    };
}

pub trait ByteStream {
    fn pos(&self) -> u64;

    fn size(&self) -> u64;

    fn seek(&mut self, pos: u64) -> Result<(), TraceError>;

    /// Read exactly `n` bytes.
    fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>, TraceError>;

    /// Read everything from the current position to the end.
    fn read_bytes_full(&mut self) -> Result<Vec<u8>, TraceError>;

    /// Read up to the terminator byte `term`.
    ///
    /// `include` keeps the terminator in the result, `consume` moves the
    /// position past it. Without a terminator the rest of the input is
    /// returned, unless `eos_error` is set.
    fn read_bytes_term(
        &mut self,
        term: u8,
        include: bool,
        consume: bool,
        eos_error: bool,
    ) -> Result<Vec<u8>, TraceError>;

    fn is_eof(&self) -> bool {
        self.pos() >= self.size()
    }

    for_each_primitive!(decode_primitives);
}

fn read_array<S, const N: usize>(stream: &mut S) -> Result<[u8; N], TraceError>
where
    S: ByteStream + ?Sized,
{
    let bytes = stream.read_bytes(N as u64)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}
