//! Chunks whose payload is an opaque byte sequence.

use alloc::vec::Vec;

use super::{write_framed, ChunkTag, CHUNK_HEADER_SIZE};
use crate::riff::padded_len;

/// Which codec payload a [`BitstreamChunk`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitstreamKind {
    /// Lossy `VP8 ` data.
    Vp8,
    /// Lossless `VP8L` data.
    Vp8l,
    /// `ALPH` data accompanying a VP8 bitstream.
    Alph,
}

impl BitstreamKind {
    /// Tag written for this kind.
    pub const fn tag(self) -> ChunkTag {
        match self {
            BitstreamKind::Vp8 => ChunkTag::VP8,
            BitstreamKind::Vp8l => ChunkTag::VP8L,
            BitstreamKind::Alph => ChunkTag::ALPH,
        }
    }
}

/// Which metadata a [`RawDataChunk`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// ICC color profile.
    Iccp,
    /// EXIF block.
    Exif,
    /// XMP packet.
    Xmp,
}

impl MetadataKind {
    /// Tag written for this kind.
    pub const fn tag(self) -> ChunkTag {
        match self {
            MetadataKind::Iccp => ChunkTag::ICCP,
            MetadataKind::Exif => ChunkTag::EXIF,
            MetadataKind::Xmp => ChunkTag::XMP,
        }
    }
}

/// Compressed image data handed to the codec untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitstreamChunk {
    kind: BitstreamKind,
    data: Vec<u8>,
}

impl BitstreamChunk {
    /// Wrap a payload of the given kind.
    pub fn new(kind: BitstreamKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// A `VP8 ` chunk.
    pub fn vp8(data: Vec<u8>) -> Self {
        Self::new(BitstreamKind::Vp8, data)
    }

    /// A `VP8L` chunk.
    pub fn vp8l(data: Vec<u8>) -> Self {
        Self::new(BitstreamKind::Vp8l, data)
    }

    /// An `ALPH` chunk.
    pub fn alph(data: Vec<u8>) -> Self {
        Self::new(BitstreamKind::Alph, data)
    }

    /// Payload kind.
    pub fn kind(&self) -> BitstreamKind {
        self.kind
    }

    /// Raw payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of the framed chunk (header, payload, pad).
    pub fn full_size(&self) -> u64 {
        CHUNK_HEADER_SIZE + padded_len(self.data.len() as u64)
    }

    /// Append the framed chunk to `out`.
    pub fn write_framed(&self, out: &mut Vec<u8>) {
        write_framed(out, self.kind.tag().to_fourcc(), &self.data);
    }

    /// Take the payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Metadata payload with no structure imposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataChunk {
    kind: MetadataKind,
    data: Vec<u8>,
}

impl RawDataChunk {
    /// Wrap a payload of the given kind.
    pub fn new(kind: MetadataKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// An `ICCP` chunk.
    pub fn iccp(data: Vec<u8>) -> Self {
        Self::new(MetadataKind::Iccp, data)
    }

    /// An `EXIF` chunk.
    pub fn exif(data: Vec<u8>) -> Self {
        Self::new(MetadataKind::Exif, data)
    }

    /// An `XMP ` chunk.
    pub fn xmp(data: Vec<u8>) -> Self {
        Self::new(MetadataKind::Xmp, data)
    }

    /// Metadata kind.
    pub fn kind(&self) -> MetadataKind {
        self.kind
    }

    /// Raw payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A chunk with an unrecognized tag, kept so it can be written back.
///
/// The tag is written as given. Building one with a known tag produces a
/// chunk that demuxes back as that known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChunk {
    tag: [u8; 4],
    data: Vec<u8>,
}

impl UnknownChunk {
    /// Wrap a tag and its payload.
    pub fn new(tag: [u8; 4], data: Vec<u8>) -> Self {
        Self { tag, data }
    }

    /// The original tag.
    pub fn tag(&self) -> [u8; 4] {
        self.tag
    }

    /// Raw payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
