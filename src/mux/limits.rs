//! Configurable limits for demuxing.
//!
//! These protect against malformed or hostile inputs that declare huge
//! chunks or frame counts.

use alloc::format;

use super::MuxError;
use crate::chunk::ChunkTag;
use crate::riff::MAX_CHUNK_SIZE;

/// Configuration for demux limits.
///
/// # Example
///
/// ```rust
/// use webp_riff::mux::Limits;
///
/// let limits = Limits::default()
///     .max_chunk_size(64 * 1024 * 1024)
///     .max_frame_count(1000);
///
/// // No limits beyond the buffer bound, for trusted inputs
/// let unlimited = Limits::none();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Limits {
    /// Largest payload accepted for any single chunk. Never above `i32::MAX`.
    pub max_chunk_size: u64,

    /// Largest declared RIFF size.
    pub max_file_size: Option<u64>,

    /// Maximum number of `ANMF` frames.
    pub max_frame_count: Option<u32>,
}

impl Default for Limits {
    /// - Max chunk size: `i32::MAX`
    /// - Max file size: unlimited (the RIFF size field caps it at 4 GiB)
    /// - Max frames: 10,000
    fn default() -> Self {
        Self {
            max_chunk_size: MAX_CHUNK_SIZE,
            max_file_size: None,
            max_frame_count: Some(10_000),
        }
    }
}

impl Limits {
    /// Create limits with no restrictions beyond the buffer bound.
    ///
    /// **Warning**: Only use this for trusted inputs!
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_chunk_size: MAX_CHUNK_SIZE,
            max_file_size: None,
            max_frame_count: None,
        }
    }

    /// Set the largest accepted chunk payload (clamped to `i32::MAX`).
    #[must_use]
    pub fn max_chunk_size(mut self, bytes: u64) -> Self {
        self.max_chunk_size = bytes.min(MAX_CHUNK_SIZE);
        self
    }

    /// Set the largest accepted RIFF size.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Set the maximum number of animation frames.
    #[must_use]
    pub fn max_frame_count(mut self, frames: u32) -> Self {
        self.max_frame_count = Some(frames);
        self
    }

    /// Check a declared chunk length before anything is allocated or read.
    pub(crate) fn check_chunk(&self, tag: ChunkTag, size: u64) -> Result<usize, MuxError> {
        if size > self.max_chunk_size.min(MAX_CHUNK_SIZE) {
            return Err(MuxError::ChunkTooLarge { tag, size });
        }
        Ok(size as usize)
    }

    pub(crate) fn check_file_size(&self, size: u64) -> Result<(), MuxError> {
        if let Some(max) = self.max_file_size {
            if size > max {
                return Err(MuxError::LimitExceeded(format!(
                    "file size {size} exceeds limit {max}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn check_frame_count(&self, count: usize) -> Result<(), MuxError> {
        if let Some(max) = self.max_frame_count {
            if count as u64 > u64::from(max) {
                return Err(MuxError::LimitExceeded(format!(
                    "frame count {count} exceeds limit {max}"
                )));
            }
        }
        Ok(())
    }
}
