//! `ANMF` animation frames.

use alloc::vec::Vec;

use super::header::check_1based;
use super::{children_size, BitstreamChunk, BitstreamKind, Chunk, ChunkTag};
use crate::mux::MuxError;
use crate::riff::MAX_U24;
use crate::vec_writer::VecWriter;

/// Size of the fixed header at the start of an `ANMF` payload.
pub const ANMF_HEADER_SIZE: u64 = 16;

/// How the frame area is disposed after rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposeMethod {
    /// Do not dispose. The frame remains on the canvas.
    None,
    /// Fill the frame rectangle with the background color.
    Background,
}

/// How the frame is blended with the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMethod {
    /// Use alpha blending with the existing canvas content.
    AlphaBlend,
    /// Overwrite the canvas region with the frame data.
    Overwrite,
}

/// One animation frame: placement, timing and its own sub-chunks.
///
/// Payload layout:
///
/// ```text
/// 3 bytes: X offset / 2
/// 3 bytes: Y offset / 2
/// 3 bytes: width - 1
/// 3 bytes: height - 1
/// 3 bytes: duration (ms)
/// 1 byte:  flags (dispose bit 0, blend bit 1)
/// sub-chunks (ALPH + VP8, VP8L, unknown)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnmfChunk {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    duration: u32,
    flags: u8,
    children: Vec<Chunk>,
}

impl AnmfChunk {
    /// Build a frame.
    ///
    /// `x` and `y` are the raw on-disk offsets (in units of two pixels).
    /// `x`, `y` and `duration` must fit in 24 bits; `width` and `height`
    /// must lie in `1..=2^24`.
    ///
    /// Children are limited to bitstream chunks and unknown chunks whose tag
    /// is not a bitstream tag; anything else fails with
    /// [`MuxError::UnexpectedChunk`].
    pub fn new(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        duration: u32,
        flags: u8,
        children: Vec<Chunk>,
    ) -> Result<Self, MuxError> {
        check_u24("ANMF x", x)?;
        check_u24("ANMF y", y)?;
        check_1based("ANMF width", width)?;
        check_1based("ANMF height", height)?;
        check_u24("ANMF duration", duration)?;
        if let Some(bad) = children.iter().find(|c| !allowed_in_frame(c)) {
            return Err(MuxError::UnexpectedChunk {
                parent: ChunkTag::ANMF,
                found: bad.kind(),
            });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
            duration,
            flags,
            children,
        })
    }

    /// Raw X offset field.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Raw Y offset field.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// X offset on the canvas in pixels.
    pub fn x_offset(&self) -> u32 {
        self.x * 2
    }

    /// Y offset on the canvas in pixels.
    pub fn y_offset(&self) -> u32 {
        self.y * 2
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Display duration in milliseconds.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// The reserved/blend/dispose byte as stored.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Dispose method from bit 0.
    pub fn dispose(&self) -> DisposeMethod {
        if self.flags & 1 != 0 {
            DisposeMethod::Background
        } else {
            DisposeMethod::None
        }
    }

    /// Blend method from bit 1.
    pub fn blend(&self) -> BlendMethod {
        if self.flags & 2 != 0 {
            BlendMethod::Overwrite
        } else {
            BlendMethod::AlphaBlend
        }
    }

    /// Sub-chunks in stored order.
    pub fn children(&self) -> &[Chunk] {
        &self.children
    }

    /// First sub-chunk carrying the given bitstream kind.
    pub fn bitstream(&self, kind: BitstreamKind) -> Option<&BitstreamChunk> {
        self.children
            .iter()
            .filter_map(Chunk::as_bitstream)
            .find(|c| c.kind() == kind)
    }

    /// Header plus framed sub-chunks.
    pub fn payload_size(&self) -> u64 {
        ANMF_HEADER_SIZE + children_size(&self.children)
    }

    pub(crate) fn write_payload(&self, out: &mut Vec<u8>) {
        out.write_u24_le(self.x);
        out.write_u24_le(self.y);
        out.write_1based(self.width);
        out.write_1based(self.height);
        out.write_u24_le(self.duration);
        out.write_u8(self.flags);
        for child in &self.children {
            child.write_to(out);
        }
    }
}

/// The demuxer reads `VP8 `, `VP8L` and `ALPH` inside a frame as bitstreams
/// and every other tag as unknown; only those shapes survive a round trip.
fn allowed_in_frame(child: &Chunk) -> bool {
    match child {
        Chunk::Bitstream(_) => true,
        Chunk::Unknown(c) => !matches!(
            ChunkTag::from_fourcc(c.tag()),
            ChunkTag::VP8 | ChunkTag::VP8L | ChunkTag::ALPH
        ),
        _ => false,
    }
}

fn check_u24(field: &'static str, value: u32) -> Result<(), MuxError> {
    if value <= MAX_U24 {
        Ok(())
    } else {
        Err(MuxError::InvalidField {
            field,
            value: u64::from(value),
        })
    }
}
