//! Read-only view over a demuxed file.

use alloc::vec::Vec;

use super::demux::Demuxer;
use super::{Limits, MuxError};
use crate::chunk::{
    AnimChunk, AnmfChunk, BitstreamChunk, BitstreamKind, BlendMethod, Chunk, DisposeMethod,
    MetadataKind, RiffChunk, Vp8xChunk,
};
use crate::slice_reader::SliceReader;

/// A demuxed WebP file with accessors for the parts consumers care about.
///
/// # Example
///
/// ```rust,no_run
/// use webp_riff::mux::WebPImage;
///
/// let data = std::fs::read("animation.webp")?;
/// let image = WebPImage::from_bytes(&data)?;
/// println!("{} frames, loop count {}", image.frame_count(), image.loop_count());
/// for frame in image.frames() {
///     println!("{}x{} at ({}, {})", frame.width, frame.height, frame.x_offset, frame.y_offset);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPImage {
    riff: RiffChunk,
}

/// The codec input of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBitstream<'a> {
    /// A `VP8L` bitstream; alpha is carried inside it.
    Lossless(&'a BitstreamChunk),
    /// A `VP8 ` bitstream, with its `ALPH` plane when one precedes it.
    Lossy {
        /// Separate alpha plane.
        alpha: Option<&'a BitstreamChunk>,
        /// The VP8 data.
        vp8: &'a BitstreamChunk,
    },
    /// The frame holds no image data.
    Missing,
}

/// One frame of a [`WebPImage`].
///
/// A still image is reported as a single frame covering the canvas with zero
/// duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRef<'a> {
    /// X offset in pixels.
    pub x_offset: u32,
    /// Y offset in pixels.
    pub y_offset: u32,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Display duration in milliseconds.
    pub duration_ms: u32,
    /// Dispose method after display.
    pub dispose: DisposeMethod,
    /// Blend method onto the canvas.
    pub blend: BlendMethod,
    /// Data to hand to the codec.
    pub bitstream: FrameBitstream<'a>,
}

impl WebPImage {
    /// Wrap an already demuxed tree.
    pub fn new(riff: RiffChunk) -> Self {
        Self { riff }
    }

    /// Demux a byte buffer with default limits.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MuxError> {
        Self::with_limits(data, Limits::default())
    }

    /// Demux a byte buffer with custom limits.
    pub fn with_limits(data: &[u8], limits: Limits) -> Result<Self, MuxError> {
        let riff = Demuxer::new().limits(limits).demux(SliceReader::new(data))?;
        Ok(Self::new(riff))
    }

    /// The underlying tree.
    pub fn chunk(&self) -> &RiffChunk {
        &self.riff
    }

    /// Take the underlying tree.
    pub fn into_chunk(self) -> RiffChunk {
        self.riff
    }

    /// The `VP8X` header of an extended file.
    pub fn vp8x(&self) -> Option<&Vp8xChunk> {
        self.riff.children().iter().find_map(|c| match c {
            Chunk::Vp8x(h) => Some(h),
            _ => None,
        })
    }

    /// The `ANIM` chunk, if present.
    pub fn anim(&self) -> Option<&AnimChunk> {
        self.riff.children().iter().find_map(|c| match c {
            Chunk::Anim(a) => Some(a),
            _ => None,
        })
    }

    /// Canvas size from `VP8X`, or from the bitstream header of a simple file.
    ///
    /// `None` when a simple file's bitstream header is unreadable.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        if let Some(vp8x) = self.vp8x() {
            return Some((vp8x.canvas_width(), vp8x.canvas_height()));
        }
        self.riff
            .children()
            .iter()
            .filter_map(Chunk::as_bitstream)
            .find_map(bitstream_dimensions)
    }

    /// Whether the file is extended and flagged as animated.
    pub fn is_animated(&self) -> bool {
        self.vp8x().is_some_and(Vp8xChunk::is_animated)
    }

    /// Whether the file signals transparency.
    pub fn has_alpha(&self) -> bool {
        match self.vp8x() {
            Some(vp8x) => vp8x.has_alpha(),
            None => self
                .riff
                .children()
                .iter()
                .filter_map(Chunk::as_bitstream)
                .any(|b| b.kind() == BitstreamKind::Vp8l && vp8l_has_alpha(b.data())),
        }
    }

    /// Raw loop count; 0 (infinite) when there is no `ANIM` chunk.
    pub fn loop_count(&self) -> u16 {
        self.anim().map_or(0, AnimChunk::loop_count)
    }

    /// Background color as stored; 0 when there is no `ANIM` chunk.
    pub fn background_color(&self) -> u32 {
        self.anim().map_or(0, AnimChunk::background_color)
    }

    /// `ANMF` chunks in file order.
    pub fn anmf_chunks(&self) -> impl Iterator<Item = &AnmfChunk> + '_ {
        self.riff.children().iter().filter_map(|c| match c {
            Chunk::Anmf(f) => Some(f),
            _ => None,
        })
    }

    /// Frames in display order.
    pub fn frames(&self) -> Vec<FrameRef<'_>> {
        let frames: Vec<_> = self.anmf_chunks().map(FrameRef::from_anmf).collect();
        if !frames.is_empty() {
            return frames;
        }
        let (width, height) = self.canvas_size().unwrap_or((0, 0));
        let mut still = Vec::with_capacity(1);
        still.push(FrameRef {
            x_offset: 0,
            y_offset: 0,
            width,
            height,
            duration_ms: 0,
            dispose: DisposeMethod::None,
            blend: BlendMethod::Overwrite,
            bitstream: pick_bitstream(self.riff.children()),
        });
        still
    }

    /// Number of frames; 1 for a still image.
    pub fn frame_count(&self) -> usize {
        self.anmf_chunks().count().max(1)
    }

    /// ICC profile payload.
    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.metadata(MetadataKind::Iccp)
    }

    /// EXIF payload.
    pub fn exif(&self) -> Option<&[u8]> {
        self.metadata(MetadataKind::Exif)
    }

    /// XMP payload.
    pub fn xmp(&self) -> Option<&[u8]> {
        self.metadata(MetadataKind::Xmp)
    }

    fn metadata(&self, kind: MetadataKind) -> Option<&[u8]> {
        self.riff.children().iter().find_map(|c| match c {
            Chunk::Metadata(m) if m.kind() == kind => Some(m.data()),
            _ => None,
        })
    }
}

impl From<RiffChunk> for WebPImage {
    fn from(riff: RiffChunk) -> Self {
        Self::new(riff)
    }
}

impl<'a> FrameRef<'a> {
    fn from_anmf(anmf: &'a AnmfChunk) -> Self {
        Self {
            x_offset: anmf.x_offset(),
            y_offset: anmf.y_offset(),
            width: anmf.width(),
            height: anmf.height(),
            duration_ms: anmf.duration(),
            dispose: anmf.dispose(),
            blend: anmf.blend(),
            bitstream: pick_bitstream(anmf.children()),
        }
    }

    /// Whether the frame is VP8L.
    pub fn is_lossless(&self) -> bool {
        matches!(self.bitstream, FrameBitstream::Lossless(_))
    }
}

/// Choose the codec input among sibling chunks.
///
/// VP8L wins if present. Otherwise the first VP8 chunk is paired with the
/// last ALPH chunk that precedes it.
fn pick_bitstream(chunks: &[Chunk]) -> FrameBitstream<'_> {
    let mut alpha = None;
    let mut vp8 = None;
    for b in chunks.iter().filter_map(Chunk::as_bitstream) {
        match b.kind() {
            BitstreamKind::Vp8l => return FrameBitstream::Lossless(b),
            BitstreamKind::Alph if vp8.is_none() => alpha = Some(b),
            BitstreamKind::Alph => {}
            BitstreamKind::Vp8 => {
                if vp8.is_none() {
                    vp8 = Some(b);
                }
            }
        }
    }
    match vp8 {
        Some(vp8) => FrameBitstream::Lossy { alpha, vp8 },
        None => FrameBitstream::Missing,
    }
}

/// Dimensions from a VP8 or VP8L bitstream header.
pub(crate) fn bitstream_dimensions(chunk: &BitstreamChunk) -> Option<(u32, u32)> {
    let d = chunk.data();
    match chunk.kind() {
        BitstreamKind::Vp8 => {
            // 3-byte frame tag (bit 0 clear on keyframes), start code, then
            // two 14-bit sizes with 2-bit scale.
            if d.len() < 10 || d[0] & 1 != 0 || d[3..6] != [0x9D, 0x01, 0x2A] {
                return None;
            }
            let w = u32::from(u16::from_le_bytes([d[6], d[7]]) & 0x3FFF);
            let h = u32::from(u16::from_le_bytes([d[8], d[9]]) & 0x3FFF);
            (w > 0 && h > 0).then_some((w, h))
        }
        BitstreamKind::Vp8l => {
            if d.len() < 5 || d[0] != 0x2F {
                return None;
            }
            let bits = u32::from_le_bytes([d[1], d[2], d[3], d[4]]);
            Some(((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1))
        }
        BitstreamKind::Alph => None,
    }
}

pub(crate) fn vp8l_has_alpha(d: &[u8]) -> bool {
    d.len() >= 5 && d[0] == 0x2F && (d[4] >> 4) & 1 != 0
}
