//! Error types for mux/demux operations.

use alloc::string::String;
use thiserror::Error;

use crate::chunk::ChunkTag;
use crate::codec::CodecError;

/// Errors that can occur during mux/demux operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MuxError {
    /// An IO error occurred while reading the source.
    #[cfg(feature = "std")]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The `RIFF` or `WEBP` signature did not match.
    #[error("Illegal magic number: expected {expected}, found {found}")]
    BadMagic {
        /// The signature that was required.
        expected: ChunkTag,
        /// The bytes actually read.
        found: ChunkTag,
    },

    /// The input ended inside a mandatory field.
    #[error("Unexpected end of input at offset {offset} ({needed} bytes needed)")]
    Truncated {
        /// Offset of the read that failed.
        offset: u64,
        /// Bytes the read asked for.
        needed: usize,
    },

    /// A declared length cannot be buffered.
    #[error("Chunk {tag} too large to read: {size} bytes")]
    ChunkTooLarge {
        /// Tag of the offending chunk.
        tag: ChunkTag,
        /// Declared or combined size.
        size: u64,
    },

    /// A narrow numeric field is outside its legal range.
    #[error("Invalid {field}: {value}")]
    InvalidField {
        /// Which field.
        field: &'static str,
        /// The rejected value.
        value: u64,
    },

    /// A chunk that cannot be stored inside the given parent.
    #[error("{found} chunk is not allowed inside {parent}")]
    UnexpectedChunk {
        /// The enclosing chunk.
        parent: ChunkTag,
        /// The offending child.
        found: ChunkTag,
    },

    /// The file is neither extended nor a plain VP8/VP8L image.
    #[error("No VP8 data found (first chunk is {0})")]
    NoBitstreamFound(ChunkTag),

    /// The external codec failed.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// A configured [`Limits`](super::Limits) value was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// Frame decoding was cancelled via an [`enough::Stop`] token.
    #[error("Cancelled: {0}")]
    Cancelled(enough::StopReason),

    /// Frame dimensions are invalid (zero or too large).
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// The invalid width.
        width: u32,
        /// The invalid height.
        height: u32,
    },

    /// No frames were added before assembly.
    #[error("No frames to assemble")]
    NoFrames,

    /// Frame offset is not a multiple of 2.
    #[error("Frame offset must be even: ({x}, {y})")]
    OddFrameOffset {
        /// The invalid x offset.
        x: u32,
        /// The invalid y offset.
        y: u32,
    },

    /// Frame extends beyond the canvas boundary.
    #[error(
        "Frame at ({x}, {y}) size {width}x{height} exceeds canvas {canvas_width}x{canvas_height}"
    )]
    FrameOutsideCanvas {
        /// Frame x offset.
        x: u32,
        /// Frame y offset.
        y: u32,
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
        /// Canvas width.
        canvas_width: u32,
        /// Canvas height.
        canvas_height: u32,
    },
}

impl From<enough::StopReason> for MuxError {
    fn from(reason: enough::StopReason) -> Self {
        Self::Cancelled(reason)
    }
}
