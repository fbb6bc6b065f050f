//! Sequential byte sources for the demuxer.
//!
//! The demuxer never seeks or backs up. It only needs "give me exactly this
//! many bytes", which [`ByteSource`] captures. [`SliceReader`] serves
//! in-memory data in `no_std` builds and [`IoReader`] adapts any
//! `std::io::Read`.

use core::fmt;

use crate::mux::MuxError;

/// A forward-only source of bytes.
pub trait ByteSource {
    /// Fill `buf` completely.
    ///
    /// Returns [`MuxError::Truncated`] when the source ends first.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), MuxError>;

    /// Number of bytes consumed so far.
    fn position(&self) -> u64;
}

/// A reader that wraps a byte slice and tracks the current position.
#[derive(Clone)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Create a new SliceReader wrapping the given byte slice.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of bytes remaining from the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Returns a slice of the remaining bytes.
    #[inline]
    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}

impl ByteSource for SliceReader<'_> {
    #[inline]
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), MuxError> {
        let n = buf.len();
        if n > self.remaining() {
            // Leave the reader drained, like a stream that hit EOF.
            let offset = self.pos as u64;
            self.pos = self.data.len();
            return Err(MuxError::Truncated { offset, needed: n });
        }
        buf.copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(())
    }

    #[inline]
    fn position(&self) -> u64 {
        self.pos as u64
    }
}

impl fmt::Debug for SliceReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceReader")
            .field("len", &self.data.len())
            .field("pos", &self.pos)
            .finish()
    }
}

/// Adapts a [`std::io::Read`] into a [`ByteSource`].
///
/// End of stream is reported as [`MuxError::Truncated`]; any other I/O
/// failure as [`MuxError::Io`].
#[cfg(feature = "std")]
pub struct IoReader<R> {
    inner: R,
    pos: u64,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> IoReader<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ByteSource for IoReader<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), MuxError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    let offset = self.pos;
                    self.pos += filled as u64;
                    return Err(MuxError::Truncated {
                        offset,
                        needed: buf.len(),
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(MuxError::Io(e)),
            }
        }
        self.pos += filled as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

#[cfg(feature = "std")]
impl<R> fmt::Debug for IoReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoReader").field("pos", &self.pos).finish()
    }
}
