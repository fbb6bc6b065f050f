//! Boundary to the external VP8/VP8L pixel codec.
//!
//! This crate never compresses or decompresses pixels itself. A [`Codec`]
//! implementation (a native libwebp binding, a pure-Rust decoder, or a test
//! stub) is handed framed chunk bytes and returns owned pixel buffers, or is
//! handed pixels and returns a complete WebP container.
//!
//! The helpers in this module do the core's half of the hand-off: assemble
//! the input buffer, validate what comes back, and turn encoder output into
//! chunk objects.

use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

use crate::chunk::{BitstreamChunk, BitstreamKind, Chunk, ChunkTag};
use crate::mux::{demux, MuxError};
use crate::riff::MAX_CHUNK_SIZE;

/// Pixel layouts understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// R, G, B, A bytes.
    Rgba8,
    /// A, R, G, B bytes.
    Argb8,
    /// B, G, R, A bytes.
    Bgra8,
    /// R, G, B bytes.
    Rgb8,
    /// B, G, R bytes.
    Bgr8,
}

impl PixelLayout {
    /// Bytes per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgba8 | PixelLayout::Argb8 | PixelLayout::Bgra8 => 4,
            PixelLayout::Rgb8 | PixelLayout::Bgr8 => 3,
        }
    }

    /// Whether the layout carries alpha.
    pub const fn has_alpha(self) -> bool {
        self.bytes_per_pixel() == 4
    }
}

/// Errors reported across the codec boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// The codec rejected its input.
    #[error("Decoding failed: {0}")]
    DecodeFailed(String),

    /// The codec could not encode the pixels.
    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    /// Width or height is zero or too large.
    #[error("Unsupported dimensions: {width}x{height}")]
    UnsupportedDimensions {
        /// Width.
        width: u32,
        /// Height.
        height: u32,
    },

    /// The operation does not support this layout.
    #[error("Unsupported pixel layout: {0:?}")]
    UnsupportedLayout(PixelLayout),

    /// A pixel buffer is smaller than its dimensions require.
    #[error("Buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        actual: usize,
    },

    /// The encoder returned something that is not a usable WebP container.
    #[error("Malformed encoder output: {0}")]
    MalformedOutput(String),
}

/// Pixels returned by [`Codec::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Tightly packed pixels in the requested layout.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// The external pixel codec.
///
/// Every buffer crosses the boundary exactly once: inputs are borrowed for
/// the duration of the call and outputs are owned `Vec`s moved back to the
/// caller.
pub trait Codec {
    /// Decode framed chunk bytes (`VP8 `, `VP8L`, or `ALPH` followed by
    /// `VP8 `) into pixels of the given layout.
    fn decode(&self, layout: PixelLayout, data: &[u8]) -> Result<DecodedImage, CodecError>;

    /// Lossy-encode pixels into a complete WebP container.
    ///
    /// `stride` is the distance between rows in bytes.
    fn encode(
        &self,
        layout: PixelLayout,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        quality: f32,
    ) -> Result<Vec<u8>, CodecError>;

    /// Lossless-encode pixels into a complete WebP container.
    fn encode_lossless(
        &self,
        layout: PixelLayout,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Vec<u8>, CodecError>;
}

/// Chunks produced by a lossy encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Separate alpha plane, present when the input had transparency.
    pub alpha: Option<BitstreamChunk>,
    /// The `VP8 ` bitstream.
    pub vp8: BitstreamChunk,
}

impl EncodedImage {
    /// The chunks in container order (ALPH first).
    pub fn into_chunks(self) -> Vec<Chunk> {
        let mut chunks = Vec::with_capacity(2);
        if let Some(alpha) = self.alpha {
            chunks.push(alpha.into());
        }
        chunks.push(self.vp8.into());
        chunks
    }
}

/// Decode a single bitstream chunk.
pub fn decode_bitstream(
    codec: &dyn Codec,
    chunk: &BitstreamChunk,
    layout: PixelLayout,
) -> Result<DecodedImage, MuxError> {
    let mut data = Vec::with_capacity(chunk.full_size() as usize);
    chunk.write_framed(&mut data);
    run_decode(codec, layout, &data)
}

/// Decode a VP8 bitstream together with its alpha plane.
///
/// The framed `ALPH` chunk and the framed `VP8 ` chunk are concatenated, alpha
/// first, into one buffer for the codec. Only layouts with an alpha channel
/// are accepted.
pub fn decode_with_alpha(
    codec: &dyn Codec,
    alpha: &BitstreamChunk,
    vp8: &BitstreamChunk,
    layout: PixelLayout,
) -> Result<DecodedImage, MuxError> {
    if !layout.has_alpha() {
        return Err(CodecError::UnsupportedLayout(layout).into());
    }
    let combined = alpha.full_size() + vp8.full_size();
    if combined > MAX_CHUNK_SIZE {
        return Err(MuxError::ChunkTooLarge {
            tag: ChunkTag::ALPH,
            size: combined,
        });
    }
    let mut data = Vec::with_capacity(combined as usize);
    alpha.write_framed(&mut data);
    vp8.write_framed(&mut data);
    run_decode(codec, layout, &data)
}

/// Decode to BGRA packed into native `u32` words (`0xAARRGGBB` on
/// little-endian hosts).
pub fn decode_bgra_words(
    codec: &dyn Codec,
    chunk: &BitstreamChunk,
) -> Result<(Vec<u32>, u32, u32), MuxError> {
    let image = decode_bitstream(codec, chunk, PixelLayout::Bgra8)?;
    let words = image
        .pixels
        .chunks_exact(4)
        .map(|px| u32::from_ne_bytes([px[0], px[1], px[2], px[3]]))
        .collect();
    Ok((words, image.width, image.height))
}

fn run_decode(codec: &dyn Codec, layout: PixelLayout, data: &[u8]) -> Result<DecodedImage, MuxError> {
    let image = codec.decode(layout, data)?;
    if image.width == 0 || image.height == 0 {
        return Err(CodecError::UnsupportedDimensions {
            width: image.width,
            height: image.height,
        }
        .into());
    }
    let needed = (image.width as usize)
        .checked_mul(image.height as usize)
        .and_then(|n| n.checked_mul(layout.bytes_per_pixel()))
        .ok_or(CodecError::UnsupportedDimensions {
            width: image.width,
            height: image.height,
        })?;
    if image.pixels.len() < needed {
        return Err(CodecError::BufferTooSmall {
            needed,
            actual: image.pixels.len(),
        }
        .into());
    }
    Ok(image)
}

/// Lossy-encode pixels and wrap the result in chunks.
///
/// The encoder's container is demuxed and its first inner chunk decides the
/// shape: `VP8 ` alone, or (after a `VP8X` header) an `ALPH` + `VP8 ` pair.
pub fn encode_lossy(
    codec: &dyn Codec,
    layout: PixelLayout,
    pixels: &[u8],
    width: u32,
    height: u32,
    stride: usize,
    quality: f32,
) -> Result<EncodedImage, MuxError> {
    if layout == PixelLayout::Argb8 {
        return Err(CodecError::UnsupportedLayout(layout).into());
    }
    check_input(layout, pixels, width, height, stride)?;
    let container = codec.encode(layout, pixels, width, height, stride, quality)?;
    lossy_chunks(&container)
}

/// Lossless-encode pixels into a `VP8L` chunk.
pub fn encode_lossless(
    codec: &dyn Codec,
    layout: PixelLayout,
    pixels: &[u8],
    width: u32,
    height: u32,
    stride: usize,
) -> Result<BitstreamChunk, MuxError> {
    if layout == PixelLayout::Argb8 {
        return Err(CodecError::UnsupportedLayout(layout).into());
    }
    check_input(layout, pixels, width, height, stride)?;
    let container = codec.encode_lossless(layout, pixels, width, height, stride)?;
    let riff = demux(&container)?;
    riff.children()
        .iter()
        .filter_map(Chunk::as_bitstream)
        .find(|c| c.kind() == BitstreamKind::Vp8l)
        .cloned()
        .ok_or_else(|| malformed("no VP8L chunk in lossless output").into())
}

/// Lossy-encode BGRA pixels given as native `u32` words.
///
/// `stride` is in pixels.
pub fn encode_bgra_words(
    codec: &dyn Codec,
    pixels: &[u32],
    width: u32,
    height: u32,
    stride: usize,
    quality: f32,
) -> Result<EncodedImage, MuxError> {
    let stride = word_stride(stride)?;
    let bytes = words_to_bytes(pixels);
    encode_lossy(codec, PixelLayout::Bgra8, &bytes, width, height, stride, quality)
}

/// Lossless-encode BGRA pixels given as native `u32` words.
///
/// `stride` is in pixels.
pub fn encode_lossless_bgra_words(
    codec: &dyn Codec,
    pixels: &[u32],
    width: u32,
    height: u32,
    stride: usize,
) -> Result<BitstreamChunk, MuxError> {
    let stride = word_stride(stride)?;
    let bytes = words_to_bytes(pixels);
    encode_lossless(codec, PixelLayout::Bgra8, &bytes, width, height, stride)
}

/// Pixel stride to byte stride.
fn word_stride(stride: usize) -> Result<usize, CodecError> {
    stride.checked_mul(4).ok_or(CodecError::BufferTooSmall {
        needed: usize::MAX,
        actual: stride,
    })
}

fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_ne_bytes()).collect()
}

fn check_input(
    layout: PixelLayout,
    pixels: &[u8],
    width: u32,
    height: u32,
    stride: usize,
) -> Result<(), CodecError> {
    if width == 0 || height == 0 {
        return Err(CodecError::UnsupportedDimensions { width, height });
    }
    let row = (width as usize)
        .checked_mul(layout.bytes_per_pixel())
        .ok_or(CodecError::UnsupportedDimensions { width, height })?;
    if stride < row {
        return Err(CodecError::BufferTooSmall {
            needed: row,
            actual: stride,
        });
    }
    let needed = stride
        .checked_mul(height as usize - 1)
        .and_then(|n| n.checked_add(row))
        .ok_or(CodecError::BufferTooSmall {
            needed: usize::MAX,
            actual: pixels.len(),
        })?;
    if pixels.len() < needed {
        return Err(CodecError::BufferTooSmall {
            needed,
            actual: pixels.len(),
        });
    }
    Ok(())
}

fn lossy_chunks(container: &[u8]) -> Result<EncodedImage, MuxError> {
    let riff = demux(container)?;
    let children = riff.children();
    match children.first().map(Chunk::kind) {
        Some(ChunkTag::VP8) => {
            let vp8 = children[0]
                .as_bitstream()
                .cloned()
                .ok_or_else(|| malformed("VP8 chunk is not a bitstream"))?;
            Ok(EncodedImage { alpha: None, vp8 })
        }
        Some(ChunkTag::VP8X) => {
            let find = |kind| {
                children
                    .iter()
                    .filter_map(Chunk::as_bitstream)
                    .find(|c| c.kind() == kind)
                    .cloned()
            };
            let vp8 = find(BitstreamKind::Vp8).ok_or_else(|| malformed("no VP8 chunk after VP8X"))?;
            Ok(EncodedImage {
                alpha: find(BitstreamKind::Alph),
                vp8,
            })
        }
        _ => Err(malformed("lossy output is neither VP8 nor VP8X").into()),
    }
}

fn malformed(msg: &str) -> CodecError {
    CodecError::MalformedOutput(String::from(msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{RiffChunk, Vp8xChunk};
    use alloc::vec;
    use core::cell::RefCell;

    /// Records what it was given; encodes to a fixed container.
    struct Recorder {
        seen: RefCell<Vec<u8>>,
        output: Vec<u8>,
        reply: DecodedImage,
    }

    impl Recorder {
        fn new(output: Vec<u8>, reply: DecodedImage) -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                output,
                reply,
            }
        }
    }

    impl Codec for Recorder {
        fn decode(&self, _layout: PixelLayout, data: &[u8]) -> Result<DecodedImage, CodecError> {
            *self.seen.borrow_mut() = data.to_vec();
            Ok(self.reply.clone())
        }

        fn encode(
            &self,
            _layout: PixelLayout,
            _pixels: &[u8],
            _width: u32,
            _height: u32,
            _stride: usize,
            _quality: f32,
        ) -> Result<Vec<u8>, CodecError> {
            Ok(self.output.clone())
        }

        fn encode_lossless(
            &self,
            _layout: PixelLayout,
            _pixels: &[u8],
            _width: u32,
            _height: u32,
            _stride: usize,
        ) -> Result<Vec<u8>, CodecError> {
            Ok(self.output.clone())
        }
    }

    fn image(w: u32, h: u32, bpp: usize) -> DecodedImage {
        DecodedImage {
            pixels: vec![0x11; w as usize * h as usize * bpp],
            width: w,
            height: h,
        }
    }

    #[test]
    fn alpha_is_concatenated_before_vp8() {
        let codec = Recorder::new(Vec::new(), image(1, 1, 4));
        let alpha = BitstreamChunk::alph(vec![1, 2, 3]);
        let vp8 = BitstreamChunk::vp8(vec![4, 5]);
        decode_with_alpha(&codec, &alpha, &vp8, PixelLayout::Rgba8).unwrap();
        let seen = codec.seen.borrow();
        assert_eq!(
            &seen[..],
            &[
                b'A', b'L', b'P', b'H', 3, 0, 0, 0, 1, 2, 3, 0, // padded alpha
                b'V', b'P', b'8', b' ', 2, 0, 0, 0, 4, 5,
            ]
        );
    }

    #[test]
    fn alpha_decode_needs_an_alpha_layout() {
        let codec = Recorder::new(Vec::new(), image(1, 1, 3));
        let alpha = BitstreamChunk::alph(vec![1]);
        let vp8 = BitstreamChunk::vp8(vec![4, 5]);
        for layout in [PixelLayout::Rgb8, PixelLayout::Bgr8] {
            assert!(matches!(
                decode_with_alpha(&codec, &alpha, &vp8, layout),
                Err(MuxError::Codec(CodecError::UnsupportedLayout(l))) if l == layout
            ));
        }
        assert!(codec.seen.borrow().is_empty());
    }

    #[test]
    fn huge_stride_is_rejected_not_overflowed() {
        let codec = Recorder::new(Vec::new(), image(1, 1, 4));
        assert!(matches!(
            encode_lossless(&codec, PixelLayout::Rgba8, &[0; 16], 1, 3, usize::MAX / 2),
            Err(MuxError::Codec(CodecError::BufferTooSmall { .. }))
        ));
        assert!(matches!(
            encode_lossless_bgra_words(&codec, &[0; 4], 1, 2, usize::MAX / 2),
            Err(MuxError::Codec(CodecError::BufferTooSmall { .. }))
        ));
        assert!(matches!(
            encode_bgra_words(&codec, &[0; 4], 1, 1, usize::MAX, 50.0),
            Err(MuxError::Codec(CodecError::BufferTooSmall { .. }))
        ));
    }

    #[test]
    fn zero_sized_decode_is_an_error() {
        let codec = Recorder::new(Vec::new(), image(0, 4, 4));
        let err = decode_bitstream(&codec, &BitstreamChunk::vp8l(vec![0]), PixelLayout::Rgba8)
            .unwrap_err();
        assert!(matches!(
            err,
            MuxError::Codec(CodecError::UnsupportedDimensions { width: 0, .. })
        ));
    }

    #[test]
    fn short_decode_output_is_an_error() {
        let codec = Recorder::new(Vec::new(), image(2, 2, 3));
        let err = decode_bitstream(&codec, &BitstreamChunk::vp8l(vec![0]), PixelLayout::Rgba8)
            .unwrap_err();
        assert!(matches!(err, MuxError::Codec(CodecError::BufferTooSmall { .. })));
    }

    #[test]
    fn bgra_words_pack_native_order() {
        let mut reply = image(1, 1, 4);
        reply.pixels = vec![0x10, 0x20, 0x30, 0x40];
        let codec = Recorder::new(Vec::new(), reply);
        let (words, w, h) = decode_bgra_words(&codec, &BitstreamChunk::vp8l(vec![0])).unwrap();
        assert_eq!((w, h), (1, 1));
        assert_eq!(words, [u32::from_ne_bytes([0x10, 0x20, 0x30, 0x40])]);
    }

    #[test]
    fn lossy_output_without_alpha() {
        let container = RiffChunk::webp(vec![BitstreamChunk::vp8(vec![1, 2]).into()]).to_bytes();
        let codec = Recorder::new(container, image(1, 1, 3));
        let encoded =
            encode_lossy(&codec, PixelLayout::Rgb8, &[0; 3], 1, 1, 3, 75.0).unwrap();
        assert!(encoded.alpha.is_none());
        assert_eq!(encoded.vp8.data(), [1, 2]);
    }

    #[test]
    fn lossy_output_with_alpha() {
        let container = RiffChunk::webp(vec![
            Vp8xChunk::new(Vp8xChunk::FLAG_ALPHA, 1, 1).unwrap().into(),
            BitstreamChunk::alph(vec![9]).into(),
            BitstreamChunk::vp8(vec![1, 2]).into(),
        ])
        .to_bytes();
        let codec = Recorder::new(container, image(1, 1, 4));
        let encoded =
            encode_lossy(&codec, PixelLayout::Rgba8, &[0; 4], 1, 1, 4, 75.0).unwrap();
        assert_eq!(encoded.alpha.as_ref().unwrap().data(), [9]);
        let chunks = encoded.into_chunks();
        assert_eq!(chunks[0].kind(), ChunkTag::ALPH);
        assert_eq!(chunks[1].kind(), ChunkTag::VP8);
    }

    #[test]
    fn encode_validates_input_buffer() {
        let codec = Recorder::new(Vec::new(), image(1, 1, 4));
        assert!(matches!(
            encode_lossless(&codec, PixelLayout::Rgba8, &[0; 7], 2, 1, 8),
            Err(MuxError::Codec(CodecError::BufferTooSmall { needed: 8, .. }))
        ));
        assert!(matches!(
            encode_lossless(&codec, PixelLayout::Rgb8, &[], 0, 1, 0),
            Err(MuxError::Codec(CodecError::UnsupportedDimensions { .. }))
        ));
        assert!(matches!(
            encode_lossy(&codec, PixelLayout::Argb8, &[0; 4], 1, 1, 4, 50.0),
            Err(MuxError::Codec(CodecError::UnsupportedLayout(PixelLayout::Argb8)))
        ));
    }

    #[test]
    fn lossless_output_must_contain_vp8l() {
        let container = RiffChunk::webp(vec![BitstreamChunk::vp8(vec![1, 2]).into()]).to_bytes();
        let codec = Recorder::new(container, image(1, 1, 4));
        assert!(matches!(
            encode_lossless(&codec, PixelLayout::Rgba8, &[0; 4], 1, 1, 4),
            Err(MuxError::Codec(CodecError::MalformedOutput(_)))
        ));
    }
}
