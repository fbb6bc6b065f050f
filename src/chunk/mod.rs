//! The WebP chunk tree.
//!
//! A demuxed file is a [`RiffChunk`] envelope whose children are [`Chunk`]s.
//! Every chunk serializes the same way:
//!
//! ```text
//! tag (4 bytes) | payload length (u32 LE) | payload | 0x00 if length is odd
//! ```
//!
//! The framing lives in [`Chunk::write_to`]; each variant only knows how to
//! size and write its own payload. Chunks are immutable once built. To edit a
//! file, build a new tree (see [`WebPMux`](crate::mux::WebPMux)).

mod data;
mod envelope;
mod frame;
mod header;

use alloc::vec::Vec;
use core::fmt;

pub use data::{BitstreamChunk, BitstreamKind, MetadataKind, RawDataChunk, UnknownChunk};
pub use envelope::RiffChunk;
pub use frame::{AnmfChunk, BlendMethod, DisposeMethod, ANMF_HEADER_SIZE};
pub use header::{AnimChunk, LoopCount, Vp8xChunk, ANIM_PAYLOAD_SIZE, VP8X_PAYLOAD_SIZE};

use crate::riff::{is_odd, padded_len};
use crate::vec_writer::VecWriter;

/// Size of a chunk header: tag plus length.
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// All RIFF chunk tags known to WebP.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Hash, Eq)]
pub enum ChunkTag {
    /// `RIFF` envelope.
    RIFF,
    /// `VP8 ` lossy bitstream.
    VP8,
    /// `VP8L` lossless bitstream.
    VP8L,
    /// `VP8X` extended header.
    VP8X,
    /// `ANIM` animation parameters.
    ANIM,
    /// `ANMF` animation frame.
    ANMF,
    /// `ALPH` alpha channel.
    ALPH,
    /// `ICCP` color profile.
    ICCP,
    /// `EXIF` metadata.
    EXIF,
    /// `XMP ` metadata.
    XMP,
    /// Any other tag.
    Unknown([u8; 4]),
}

impl ChunkTag {
    /// Classify a raw tag.
    pub const fn from_fourcc(chunk_fourcc: [u8; 4]) -> Self {
        match &chunk_fourcc {
            b"RIFF" => Self::RIFF,
            b"VP8 " => Self::VP8,
            b"VP8L" => Self::VP8L,
            b"VP8X" => Self::VP8X,
            b"ANIM" => Self::ANIM,
            b"ANMF" => Self::ANMF,
            b"ALPH" => Self::ALPH,
            b"ICCP" => Self::ICCP,
            b"EXIF" => Self::EXIF,
            b"XMP " => Self::XMP,
            _ => Self::Unknown(chunk_fourcc),
        }
    }

    /// The raw four bytes.
    pub const fn to_fourcc(self) -> [u8; 4] {
        match self {
            Self::RIFF => *b"RIFF",
            Self::VP8 => *b"VP8 ",
            Self::VP8L => *b"VP8L",
            Self::VP8X => *b"VP8X",
            Self::ANIM => *b"ANIM",
            Self::ANMF => *b"ANMF",
            Self::ALPH => *b"ALPH",
            Self::ICCP => *b"ICCP",
            Self::EXIF => *b"EXIF",
            Self::XMP => *b"XMP ",
            Self::Unknown(fourcc) => fourcc,
        }
    }

    /// Whether the tag is outside the known set.
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_fourcc() {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

/// One node of the chunk tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A nested RIFF list (the WebP envelope itself).
    Riff(RiffChunk),
    /// Extended-format header.
    Vp8x(Vp8xChunk),
    /// Animation parameters.
    Anim(AnimChunk),
    /// Animation frame with nested sub-chunks.
    Anmf(AnmfChunk),
    /// VP8, VP8L or ALPH data for the codec.
    Bitstream(BitstreamChunk),
    /// ICCP, EXIF or XMP payload.
    Metadata(RawDataChunk),
    /// Unrecognized chunk, kept verbatim.
    Unknown(UnknownChunk),
}

impl Chunk {
    /// The chunk's tag.
    pub fn kind(&self) -> ChunkTag {
        match self {
            Chunk::Riff(_) => ChunkTag::RIFF,
            Chunk::Vp8x(_) => ChunkTag::VP8X,
            Chunk::Anim(_) => ChunkTag::ANIM,
            Chunk::Anmf(_) => ChunkTag::ANMF,
            Chunk::Bitstream(c) => c.kind().tag(),
            Chunk::Metadata(c) => c.kind().tag(),
            Chunk::Unknown(c) => ChunkTag::Unknown(c.tag()),
        }
    }

    /// The four tag bytes written before the length field.
    pub fn tag(&self) -> [u8; 4] {
        self.kind().to_fourcc()
    }

    /// Serialized payload size, excluding header and padding.
    pub fn payload_size(&self) -> u64 {
        match self {
            Chunk::Riff(c) => c.payload_size(),
            Chunk::Vp8x(_) => VP8X_PAYLOAD_SIZE,
            Chunk::Anim(_) => ANIM_PAYLOAD_SIZE,
            Chunk::Anmf(c) => c.payload_size(),
            Chunk::Bitstream(c) => c.len() as u64,
            Chunk::Metadata(c) => c.len() as u64,
            Chunk::Unknown(c) => c.len() as u64,
        }
    }

    /// Serialized size including header and pad byte. Always even.
    pub fn full_size(&self) -> u64 {
        CHUNK_HEADER_SIZE + padded_len(self.payload_size())
    }

    /// Child chunks of list-type chunks, in stored order.
    pub fn children(&self) -> Option<&[Chunk]> {
        match self {
            Chunk::Riff(c) => Some(c.children()),
            Chunk::Anmf(c) => Some(c.children()),
            _ => None,
        }
    }

    /// The bitstream chunk, if this is one.
    pub fn as_bitstream(&self) -> Option<&BitstreamChunk> {
        match self {
            Chunk::Bitstream(c) => Some(c),
            _ => None,
        }
    }

    /// Write the payload only.
    pub fn write_payload(&self, out: &mut Vec<u8>) {
        match self {
            Chunk::Riff(c) => c.write_payload(out),
            Chunk::Vp8x(c) => c.write_payload(out),
            Chunk::Anim(c) => c.write_payload(out),
            Chunk::Anmf(c) => c.write_payload(out),
            Chunk::Bitstream(c) => out.write_all(c.data()),
            Chunk::Metadata(c) => out.write_all(c.data()),
            Chunk::Unknown(c) => out.write_all(c.data()),
        }
    }

    /// Append the framed chunk: tag, length, payload and pad byte.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        write_chunk(out, self.tag(), self.payload_size(), |out| {
            self.write_payload(out)
        });
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.full_size() as usize);
        self.write_to(&mut out);
        out
    }
}

impl From<RiffChunk> for Chunk {
    fn from(c: RiffChunk) -> Self {
        Chunk::Riff(c)
    }
}

impl From<Vp8xChunk> for Chunk {
    fn from(c: Vp8xChunk) -> Self {
        Chunk::Vp8x(c)
    }
}

impl From<AnimChunk> for Chunk {
    fn from(c: AnimChunk) -> Self {
        Chunk::Anim(c)
    }
}

impl From<AnmfChunk> for Chunk {
    fn from(c: AnmfChunk) -> Self {
        Chunk::Anmf(c)
    }
}

impl From<BitstreamChunk> for Chunk {
    fn from(c: BitstreamChunk) -> Self {
        Chunk::Bitstream(c)
    }
}

impl From<RawDataChunk> for Chunk {
    fn from(c: RawDataChunk) -> Self {
        Chunk::Metadata(c)
    }
}

impl From<UnknownChunk> for Chunk {
    fn from(c: UnknownChunk) -> Self {
        Chunk::Unknown(c)
    }
}

/// Sum of the framed sizes of `children`.
pub(crate) fn children_size(children: &[Chunk]) -> u64 {
    children.iter().map(Chunk::full_size).sum()
}

/// Frame a raw payload, as [`Chunk::write_to`] does for a whole chunk.
pub(crate) fn write_framed(out: &mut Vec<u8>, tag: [u8; 4], payload: &[u8]) {
    write_chunk(out, tag, payload.len() as u64, |out| out.write_all(payload));
}

/// Tag, little-endian length, the payload written by `write_payload`, and a
/// pad byte when the length is odd.
pub(crate) fn write_chunk(
    out: &mut Vec<u8>,
    tag: [u8; 4],
    payload_size: u64,
    write_payload: impl FnOnce(&mut Vec<u8>),
) {
    debug_assert!(payload_size <= u64::from(u32::MAX));
    out.write_fourcc(tag);
    out.write_u32_le(payload_size as u32);
    let start = out.len();
    write_payload(out);
    debug_assert_eq!((out.len() - start) as u64, payload_size);
    if is_odd(payload_size) {
        out.push(0);
    }
}
