//! Frame-by-frame decoding through an external [`Codec`].
//!
//! Frames are returned as the codec produced them, positioned by their
//! offsets. Compositing onto the canvas is left to the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use webp_riff::codec::{Codec, PixelLayout};
//! use webp_riff::mux::{FrameDecoder, WebPImage};
//!
//! fn dump(codec: &dyn Codec, data: &[u8]) -> Result<(), webp_riff::mux::MuxError> {
//!     let image = WebPImage::from_bytes(data)?;
//!     let mut decoder = FrameDecoder::new(&image, codec, PixelLayout::Rgba8);
//!     while let Some(frame) = decoder.next_frame()? {
//!         println!("frame at {}ms, duration {}ms", frame.timestamp_ms, frame.duration_ms);
//!     }
//!     Ok(())
//! }
//! ```

use alloc::vec::Vec;

use super::image::{FrameBitstream, FrameRef, WebPImage};
use super::MuxError;
use crate::chunk::{BlendMethod, ChunkTag, DisposeMethod};
use crate::codec::{decode_bitstream, decode_with_alpha, Codec, DecodedImage, PixelLayout};

/// A decoded frame with owned pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Pixels in the decoder's layout, `width * height` of them.
    pub pixels: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// X offset on the canvas.
    pub x_offset: u32,
    /// Y offset on the canvas.
    pub y_offset: u32,
    /// Cumulative presentation timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Display duration of this frame in milliseconds.
    pub duration_ms: u32,
    /// Dispose method after display.
    pub dispose: DisposeMethod,
    /// Blend method onto the canvas.
    pub blend: BlendMethod,
}

/// Decode one frame's bitstream.
///
/// Lossy frames with an alpha plane are decoded with both chunks in one
/// call. Layouts without an alpha channel get the `VP8 ` chunk alone.
pub fn decode_frame(
    codec: &dyn Codec,
    frame: &FrameRef<'_>,
    layout: PixelLayout,
) -> Result<DecodedImage, MuxError> {
    match frame.bitstream {
        FrameBitstream::Lossless(vp8l) => decode_bitstream(codec, vp8l, layout),
        FrameBitstream::Lossy {
            alpha: Some(alpha),
            vp8,
        } if layout.has_alpha() => decode_with_alpha(codec, alpha, vp8, layout),
        FrameBitstream::Lossy { vp8, .. } => decode_bitstream(codec, vp8, layout),
        FrameBitstream::Missing => Err(MuxError::NoBitstreamFound(ChunkTag::VP8)),
    }
}

/// Walks the frames of a [`WebPImage`] in order.
pub struct FrameDecoder<'a> {
    frames: Vec<FrameRef<'a>>,
    codec: &'a dyn Codec,
    layout: PixelLayout,
    next: usize,
    cumulative_ms: u64,
    stop: Option<&'a dyn enough::Stop>,
}

impl<'a> FrameDecoder<'a> {
    /// Create a decoder producing pixels in `layout`.
    pub fn new(image: &'a WebPImage, codec: &'a dyn Codec, layout: PixelLayout) -> Self {
        Self {
            frames: image.frames(),
            codec,
            layout,
            next: 0,
            cumulative_ms: 0,
            stop: None,
        }
    }

    /// Set a cooperative cancellation token, checked before each frame.
    pub fn set_stop(&mut self, stop: &'a dyn enough::Stop) {
        self.stop = Some(stop);
    }

    /// Total number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if there are more frames to decode.
    pub fn has_more_frames(&self) -> bool {
        self.next < self.frames.len()
    }

    /// Returns the number of frames decoded so far.
    pub fn frames_read(&self) -> usize {
        self.next
    }

    /// Sum of all frame durations in milliseconds.
    pub fn loop_duration(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.duration_ms)).sum()
    }

    /// Decode the next frame, returning `None` when all frames have been read.
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>, MuxError> {
        if let Some(stop) = self.stop {
            stop.check()?;
        }
        let Some(frame) = self.frames.get(self.next) else {
            return Ok(None);
        };
        let image = decode_frame(self.codec, frame, self.layout)?;
        log::trace!(
            "decoded frame {} ({}x{}, {}ms)",
            self.next,
            image.width,
            image.height,
            frame.duration_ms
        );
        let timestamp_ms = self.cumulative_ms;
        self.cumulative_ms += u64::from(frame.duration_ms);
        self.next += 1;
        Ok(Some(DecodedFrame {
            pixels: image.pixels,
            width: image.width,
            height: image.height,
            x_offset: frame.x_offset,
            y_offset: frame.y_offset,
            timestamp_ms,
            duration_ms: frame.duration_ms,
            dispose: frame.dispose,
            blend: frame.blend,
        }))
    }

    /// Go back to the first frame.
    pub fn reset(&mut self) {
        self.next = 0;
        self.cumulative_ms = 0;
    }

    /// Decode every frame from the start.
    pub fn decode_all(&mut self) -> Result<Vec<DecodedFrame>, MuxError> {
        self.reset();
        let mut frames = Vec::with_capacity(self.frames.len());
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

impl Iterator for FrameDecoder<'_> {
    type Item = Result<DecodedFrame, MuxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{AnmfChunk, BitstreamChunk, Chunk, RiffChunk, Vp8xChunk};
    use crate::codec::CodecError;
    use alloc::vec;

    /// Reports the first payload byte as the frame width, and a height of 2
    /// when an ALPH chunk was handed over.
    struct WidthCodec;

    impl Codec for WidthCodec {
        fn decode(&self, layout: PixelLayout, data: &[u8]) -> Result<DecodedImage, CodecError> {
            let mut at = 0;
            let mut height = 1;
            if data.starts_with(b"ALPH") {
                let len = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
                at = 8 + len + (len & 1);
                height = 2;
            }
            let width = u32::from(data[at + 8]);
            Ok(DecodedImage {
                pixels: vec![0; (width * height) as usize * layout.bytes_per_pixel()],
                width,
                height,
            })
        }

        fn encode(
            &self,
            _: PixelLayout,
            _: &[u8],
            _: u32,
            _: u32,
            _: usize,
            _: f32,
        ) -> Result<Vec<u8>, CodecError> {
            Err(CodecError::EncodeFailed("decode only".into()))
        }

        fn encode_lossless(
            &self,
            _: PixelLayout,
            _: &[u8],
            _: u32,
            _: u32,
            _: usize,
        ) -> Result<Vec<u8>, CodecError> {
            Err(CodecError::EncodeFailed("decode only".into()))
        }
    }

    struct AlwaysStopped;

    impl enough::Stop for AlwaysStopped {
        fn check(&self) -> Result<(), enough::StopReason> {
            Err(enough::StopReason::Cancelled)
        }
    }

    fn animation() -> WebPImage {
        let frame = |width: u8, duration| -> Chunk {
            AnmfChunk::new(
                0,
                0,
                u32::from(width),
                1,
                duration,
                0,
                vec![BitstreamChunk::vp8l(vec![width]).into()],
            )
            .unwrap()
            .into()
        };
        WebPImage::new(RiffChunk::webp(vec![
            Vp8xChunk::new(Vp8xChunk::FLAG_ANIMATION, 8, 1).unwrap().into(),
            frame(2, 100),
            frame(3, 50),
            frame(4, 25),
        ]))
    }

    #[test]
    fn timestamps_accumulate() {
        let image = animation();
        let mut decoder = FrameDecoder::new(&image, &WidthCodec, PixelLayout::Rgba8);
        assert_eq!(decoder.frame_count(), 3);
        assert_eq!(decoder.loop_duration(), 175);
        let frames = decoder.decode_all().unwrap();
        let stamps: Vec<_> = frames.iter().map(|f| (f.width, f.timestamp_ms)).collect();
        assert_eq!(stamps, [(2, 0), (3, 100), (4, 150)]);
        assert!(!decoder.has_more_frames());
        assert!(decoder.next_frame().unwrap().is_none());
    }

    #[test]
    fn iterator_matches_next_frame() {
        let image = animation();
        let decoder = FrameDecoder::new(&image, &WidthCodec, PixelLayout::Rgb8);
        let widths: Vec<_> = decoder.map(|f| f.unwrap().width).collect();
        assert_eq!(widths, [2, 3, 4]);
    }

    #[test]
    fn stop_token_cancels_before_decoding() {
        let image = animation();
        let mut decoder = FrameDecoder::new(&image, &WidthCodec, PixelLayout::Rgba8);
        decoder.set_stop(&AlwaysStopped);
        assert!(matches!(decoder.next_frame(), Err(MuxError::Cancelled(_))));
        assert_eq!(decoder.frames_read(), 0);
    }

    #[test]
    fn still_alpha_frame_decodes_with_alpha() {
        let image = WebPImage::new(RiffChunk::webp(vec![
            Vp8xChunk::new(Vp8xChunk::FLAG_ALPHA, 5, 1).unwrap().into(),
            BitstreamChunk::alph(vec![0xAA; 3]).into(),
            BitstreamChunk::vp8(vec![5]).into(),
        ]));
        let frame = decode_frame(&WidthCodec, &image.frames()[0], PixelLayout::Rgba8).unwrap();
        assert_eq!((frame.width, frame.height), (5, 2));
        let opaque = decode_frame(&WidthCodec, &image.frames()[0], PixelLayout::Rgb8).unwrap();
        assert_eq!((opaque.width, opaque.height), (5, 1));
    }

    #[test]
    fn missing_bitstream_is_an_error() {
        let image = WebPImage::new(RiffChunk::webp(vec![Vp8xChunk::new(0, 1, 1)
            .unwrap()
            .into()]));
        assert!(matches!(
            decode_frame(&WidthCodec, &image.frames()[0], PixelLayout::Rgba8),
            Err(MuxError::NoBitstreamFound(ChunkTag::VP8))
        ));
    }
}
