//! RIFF byte primitives.
//!
//! [`RiffReader`] decodes the fixed-width little-endian fields used by the
//! WebP container on top of any [`ByteSource`]. Whether running out of input
//! is fatal is decided per call through [`Truncation`].

use alloc::vec::Vec;

use byteorder_lite::{ByteOrder, LittleEndian};

use crate::mux::MuxError;
use crate::slice_reader::ByteSource;

/// Largest payload the crate will buffer: a signed 32-bit byte count.
pub const MAX_CHUNK_SIZE: u64 = i32::MAX as u64;

/// Payloads are read in steps of this many bytes.
const READ_STEP: usize = 64 * 1024;

/// Largest value a 1-based 24-bit field can hold.
pub const MAX_1BASED: u32 = 1 << 24;

/// Largest value a plain 24-bit field can hold.
pub const MAX_U24: u32 = (1 << 24) - 1;

/// What to do when the source runs out in the middle of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Propagate [`MuxError::Truncated`].
    Fatal,
    /// Swallow the error; the read yields nothing.
    Tolerate,
}

/// Returns true when `n` needs a RIFF pad byte.
#[inline]
pub const fn is_odd(n: u64) -> bool {
    n & 1 == 1
}

/// `n` rounded up to the next even number.
#[inline]
pub const fn padded_len(n: u64) -> u64 {
    n + (n & 1)
}

/// Little-endian primitive reader over a sequential byte source.
#[derive(Debug)]
pub struct RiffReader<S> {
    source: S,
}

impl<S: ByteSource> RiffReader<S> {
    /// Wrap a byte source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    /// Give back the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], MuxError> {
        let mut buf = [0u8; N];
        self.source.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a four-character chunk tag.
    pub fn read_fourcc(&mut self) -> Result<[u8; 4], MuxError> {
        self.read_array::<4>()
    }

    /// Read an unsigned 32-bit length, widened so it never goes negative.
    pub fn read_u32(&mut self) -> Result<u64, MuxError> {
        let buf = self.read_array::<4>()?;
        Ok(u64::from(LittleEndian::read_u32(&buf)))
    }

    /// Read a signed 32-bit field.
    pub fn read_i32(&mut self) -> Result<i32, MuxError> {
        let buf = self.read_array::<4>()?;
        Ok(LittleEndian::read_i32(&buf))
    }

    /// Read an unsigned 16-bit field.
    pub fn read_u16(&mut self) -> Result<u16, MuxError> {
        let buf = self.read_array::<2>()?;
        Ok(LittleEndian::read_u16(&buf))
    }

    /// Read an unsigned 24-bit field.
    pub fn read_u24(&mut self) -> Result<u32, MuxError> {
        let buf = self.read_array::<3>()?;
        Ok(LittleEndian::read_u24(&buf))
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> Result<i8, MuxError> {
        let [b] = self.read_array::<1>()?;
        Ok(b as i8)
    }

    /// Read a 24-bit field stored as `value - 1`.
    pub fn read_1based(&mut self) -> Result<u32, MuxError> {
        Ok(self.read_u24()? + 1)
    }

    /// Read exactly `len` bytes.
    ///
    /// With [`Truncation::Tolerate`] a short source yields `Ok(None)`.
    pub fn read_payload(
        &mut self,
        len: usize,
        truncation: Truncation,
    ) -> Result<Option<Vec<u8>>, MuxError> {
        let offset = self.source.position();
        // Grow with the data actually present, not the declared length.
        let mut buf = Vec::with_capacity(len.min(READ_STEP));
        while buf.len() < len {
            let start = buf.len();
            buf.resize(start + (len - start).min(READ_STEP), 0);
            match self.source.read_exact(&mut buf[start..]) {
                Ok(()) => {}
                Err(MuxError::Truncated { .. }) if truncation == Truncation::Tolerate => {
                    log::warn!("payload of {len} bytes at offset {offset} is truncated, dropping it");
                    return Ok(None);
                }
                Err(MuxError::Truncated { .. }) => {
                    return Err(MuxError::Truncated {
                        offset,
                        needed: len,
                    })
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Some(buf))
    }

    /// Read and discard `len` bytes.
    pub fn skip(&mut self, len: u64) -> Result<(), MuxError> {
        let mut scratch = [0u8; 256];
        let mut left = len;
        while left > 0 {
            let n = left.min(scratch.len() as u64) as usize;
            self.source.read_exact(&mut scratch[..n])?;
            left -= n as u64;
        }
        Ok(())
    }

    /// Consume one pad byte.
    ///
    /// Returns whether the byte was present. A missing byte is only an error
    /// under [`Truncation::Fatal`].
    pub fn skip_pad(&mut self, truncation: Truncation) -> Result<bool, MuxError> {
        match self.source.read_exact(&mut [0u8; 1]) {
            Ok(()) => Ok(true),
            Err(MuxError::Truncated { offset, .. }) if truncation == Truncation::Tolerate => {
                log::warn!("missing pad byte at offset {offset}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
