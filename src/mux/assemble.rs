//! WebP container assembler.
//!
//! Builds a chunk tree from pre-encoded bitstreams and metadata, then
//! serializes it.
//!
//! # Example
//!
//! ```rust,no_run
//! use webp_riff::chunk::{BlendMethod, DisposeMethod, LoopCount};
//! use webp_riff::mux::{MuxFrame, WebPMux};
//!
//! let mut mux = WebPMux::new(320, 240);
//! mux.set_animation([0, 0, 0, 0], LoopCount::Forever);
//!
//! // Add pre-encoded frames
//! mux.push_frame(MuxFrame {
//!     x_offset: 0,
//!     y_offset: 0,
//!     width: 320,
//!     height: 240,
//!     duration_ms: 100,
//!     dispose: DisposeMethod::Background,
//!     blend: BlendMethod::Overwrite,
//!     bitstream: vec![], // VP8L data here
//!     alpha_data: None,
//!     is_lossless: true,
//! })?;
//!
//! let webp_bytes = mux.assemble()?;
//! # Ok::<(), webp_riff::mux::MuxError>(())
//! ```

use alloc::vec::Vec;

use super::demux::demux;
use super::error::MuxError;
use super::image::{vp8l_has_alpha, FrameBitstream, FrameRef, WebPImage};
use crate::chunk::{
    AnimChunk, AnmfChunk, BitstreamChunk, BlendMethod, Chunk, ChunkTag, DisposeMethod,
    LoopCount, RawDataChunk, RiffChunk, Vp8xChunk,
};
use crate::codec::EncodedImage;
use crate::metadata::ImageMetadata;

/// Largest frame side accepted by the assembler.
pub const MAX_FRAME_DIMENSION: u32 = 16384;

/// A single frame to be muxed into a WebP container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxFrame {
    /// Horizontal offset on the canvas. Must be even.
    pub x_offset: u32,
    /// Vertical offset on the canvas. Must be even.
    pub y_offset: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame duration in milliseconds (max 16777215).
    pub duration_ms: u32,
    /// How the frame area is disposed after rendering.
    pub dispose: DisposeMethod,
    /// How the frame is blended onto the canvas.
    pub blend: BlendMethod,
    /// Raw VP8 or VP8L bitstream data.
    pub bitstream: Vec<u8>,
    /// Raw ALPH chunk payload (for lossy frames with separate alpha).
    pub alpha_data: Option<Vec<u8>>,
    /// Whether the bitstream is VP8L (lossless). `false` means VP8 (lossy).
    pub is_lossless: bool,
}

impl MuxFrame {
    /// A full-frame lossless image at the origin.
    pub fn lossless(width: u32, height: u32, vp8l: BitstreamChunk) -> Self {
        Self::at_origin(width, height, vp8l.into_data(), None, true)
    }

    /// A full-frame lossy image at the origin, from [`encode_lossy`] output.
    ///
    /// [`encode_lossy`]: crate::codec::encode_lossy
    pub fn lossy(width: u32, height: u32, encoded: EncodedImage) -> Self {
        Self::at_origin(
            width,
            height,
            encoded.vp8.into_data(),
            encoded.alpha.map(BitstreamChunk::into_data),
            false,
        )
    }

    fn at_origin(
        width: u32,
        height: u32,
        bitstream: Vec<u8>,
        alpha_data: Option<Vec<u8>>,
        is_lossless: bool,
    ) -> Self {
        Self {
            x_offset: 0,
            y_offset: 0,
            width,
            height,
            duration_ms: 0,
            dispose: DisposeMethod::None,
            blend: BlendMethod::Overwrite,
            bitstream,
            alpha_data,
            is_lossless,
        }
    }

    /// Copy a demuxed frame. Fails if the frame holds no bitstream.
    pub fn from_frame_ref(frame: &FrameRef<'_>) -> Result<Self, MuxError> {
        let (bitstream, alpha, is_lossless) = match frame.bitstream {
            FrameBitstream::Lossless(vp8l) => (vp8l, None, true),
            FrameBitstream::Lossy { alpha, vp8 } => (vp8, alpha, false),
            FrameBitstream::Missing => {
                return Err(MuxError::NoBitstreamFound(ChunkTag::ANMF))
            }
        };
        Ok(Self {
            x_offset: frame.x_offset,
            y_offset: frame.y_offset,
            width: frame.width,
            height: frame.height,
            duration_ms: frame.duration_ms,
            dispose: frame.dispose,
            blend: frame.blend,
            bitstream: bitstream.data().to_vec(),
            alpha_data: alpha.map(|a| a.data().to_vec()),
            is_lossless,
        })
    }

    fn has_alpha(&self) -> bool {
        self.alpha_data.is_some() || (self.is_lossless && vp8l_has_alpha(&self.bitstream))
    }

    /// ALPH (if any) then the image bitstream.
    fn chunks(&self) -> Vec<Chunk> {
        let mut chunks = Vec::with_capacity(2);
        if let Some(alpha) = &self.alpha_data {
            chunks.push(BitstreamChunk::alph(alpha.clone()).into());
        }
        let image = if self.is_lossless {
            BitstreamChunk::vp8l(self.bitstream.clone())
        } else {
            BitstreamChunk::vp8(self.bitstream.clone())
        };
        chunks.push(image.into());
        chunks
    }

    fn anmf_flags(&self) -> u8 {
        let mut flags = 0u8;
        if matches!(self.dispose, DisposeMethod::Background) {
            flags |= 1;
        }
        if matches!(self.blend, BlendMethod::Overwrite) {
            flags |= 2;
        }
        flags
    }
}

/// WebP container assembler.
///
/// Builds a complete WebP file from pre-encoded frame data and optional metadata.
/// Supports both single-image and animated WebP output.
#[derive(Debug, Clone)]
pub struct WebPMux {
    canvas_width: u32,
    canvas_height: u32,
    // None = not animated
    animation: Option<AnimationParams>,
    frames: Vec<MuxFrame>,
    single_image: Option<MuxFrame>,
    metadata: ImageMetadata,
}

#[derive(Debug, Clone)]
struct AnimationParams {
    background_color: [u8; 4],
    loop_count: LoopCount,
}

impl WebPMux {
    /// Create a new mux assembler with the given canvas dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas_width: width,
            canvas_height: height,
            animation: None,
            frames: Vec::new(),
            single_image: None,
            metadata: ImageMetadata::default(),
        }
    }

    /// Parse an existing WebP file into a mux assembler.
    ///
    /// This allows modifying an existing file (e.g., adding metadata, replacing frames).
    pub fn from_data(data: &[u8]) -> Result<Self, MuxError> {
        Self::from_image(&WebPImage::new(demux(data)?))
    }

    /// Rebuild an assembler from a demuxed file.
    ///
    /// Unknown chunks are not carried over.
    pub fn from_image(image: &WebPImage) -> Result<Self, MuxError> {
        let (width, height) = image
            .canvas_size()
            .ok_or(MuxError::InvalidDimensions {
                width: 0,
                height: 0,
            })?;
        let mut mux = Self::new(width, height);
        mux.metadata = ImageMetadata {
            icc_profile: image.icc_profile().map(<[u8]>::to_vec),
            exif: image.exif().map(<[u8]>::to_vec),
            xmp: image.xmp().map(<[u8]>::to_vec),
        };

        if image.is_animated() {
            mux.animation = Some(AnimationParams {
                background_color: image.background_color().to_le_bytes(),
                loop_count: LoopCount::from(image.loop_count()),
            });
            for frame in image.frames() {
                mux.frames.push(MuxFrame::from_frame_ref(&frame)?);
            }
        } else if let Some(frame) = image.frames().first() {
            let mut single = MuxFrame::from_frame_ref(frame)?;
            single.width = width;
            single.height = height;
            mux.single_image = Some(single);
        }
        log::debug!(
            "mux from {}x{} image, {} frames",
            width,
            height,
            mux.frames.len().max(usize::from(mux.single_image.is_some()))
        );
        Ok(mux)
    }

    /// Canvas dimensions.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// ICC, EXIF and XMP payloads written with the image.
    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    /// Mutable access to the metadata payloads.
    pub fn metadata_mut(&mut self) -> &mut ImageMetadata {
        &mut self.metadata
    }

    /// Replace the ICC color profile.
    pub fn set_icc_profile(&mut self, data: Vec<u8>) {
        self.metadata.icc_profile = Some(data);
    }

    /// ICC color profile, if set.
    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.metadata.icc_profile.as_deref()
    }

    /// Drop the ICC color profile.
    pub fn clear_icc_profile(&mut self) {
        self.metadata.icc_profile = None;
    }

    /// Replace the EXIF block.
    pub fn set_exif(&mut self, data: Vec<u8>) {
        self.metadata.exif = Some(data);
    }

    /// EXIF block, if set.
    pub fn exif(&self) -> Option<&[u8]> {
        self.metadata.exif.as_deref()
    }

    /// Drop the EXIF block.
    pub fn clear_exif(&mut self) {
        self.metadata.exif = None;
    }

    /// Replace the XMP packet.
    pub fn set_xmp(&mut self, data: Vec<u8>) {
        self.metadata.xmp = Some(data);
    }

    /// XMP packet, if set.
    pub fn xmp(&self) -> Option<&[u8]> {
        self.metadata.xmp.as_deref()
    }

    /// Drop the XMP packet.
    pub fn clear_xmp(&mut self) {
        self.metadata.xmp = None;
    }

    /// Configure this mux for animation output.
    ///
    /// The `background_color` is in BGRA byte order as per the WebP spec.
    pub fn set_animation(&mut self, background_color: [u8; 4], loop_count: LoopCount) {
        self.animation = Some(AnimationParams {
            background_color,
            loop_count,
        });
    }

    /// Add a frame to the animation.
    ///
    /// Frame offsets must be even. The frame must fit within the canvas.
    pub fn push_frame(&mut self, frame: MuxFrame) -> Result<(), MuxError> {
        if frame.x_offset % 2 != 0 || frame.y_offset % 2 != 0 {
            return Err(MuxError::OddFrameOffset {
                x: frame.x_offset,
                y: frame.y_offset,
            });
        }
        check_dimensions(frame.width, frame.height)?;
        if u64::from(frame.x_offset) + u64::from(frame.width) > u64::from(self.canvas_width)
            || u64::from(frame.y_offset) + u64::from(frame.height) > u64::from(self.canvas_height)
        {
            return Err(MuxError::FrameOutsideCanvas {
                x: frame.x_offset,
                y: frame.y_offset,
                width: frame.width,
                height: frame.height,
                canvas_width: self.canvas_width,
                canvas_height: self.canvas_height,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Set a single (non-animated) image.
    pub fn set_image(&mut self, frame: MuxFrame) -> Result<(), MuxError> {
        check_dimensions(frame.width, frame.height)?;
        self.single_image = Some(frame);
        Ok(())
    }

    /// Number of animation frames.
    pub fn num_frames(&self) -> u32 {
        self.frames.len() as u32
    }

    /// Build the chunk tree.
    pub fn build(&self) -> Result<RiffChunk, MuxError> {
        check_dimensions(self.canvas_width, self.canvas_height)?;
        match &self.animation {
            Some(anim) => self.build_animated(anim),
            None => self.build_single(),
        }
    }

    /// Assemble the final WebP file.
    pub fn assemble(&self) -> Result<Vec<u8>, MuxError> {
        Ok(self.build()?.to_bytes())
    }

    fn build_single(&self) -> Result<RiffChunk, MuxError> {
        let frame = self.single_image.as_ref().ok_or(MuxError::NoFrames)?;

        if self.metadata.is_empty() && frame.alpha_data.is_none() {
            log::debug!("simple container ({} bytes)", frame.bitstream.len());
            return Ok(RiffChunk::webp(frame.chunks()));
        }

        let mut flags = self.metadata.vp8x_flags();
        if frame.has_alpha() {
            flags |= Vp8xChunk::FLAG_ALPHA;
        }

        let mut children = Vec::with_capacity(6);
        children.push(Vp8xChunk::new(flags, self.canvas_width, self.canvas_height)?.into());
        if let Some(icc) = &self.metadata.icc_profile {
            children.push(RawDataChunk::iccp(icc.clone()).into());
        }
        children.extend(frame.chunks());
        self.push_trailing_metadata(&mut children);
        log::debug!("extended container, VP8X flags {flags:#04x}");
        Ok(RiffChunk::webp(children))
    }

    fn build_animated(&self, anim: &AnimationParams) -> Result<RiffChunk, MuxError> {
        if self.frames.is_empty() {
            return Err(MuxError::NoFrames);
        }

        let mut flags = self.metadata.vp8x_flags() | Vp8xChunk::FLAG_ANIMATION;
        if self.frames.iter().any(MuxFrame::has_alpha) {
            flags |= Vp8xChunk::FLAG_ALPHA;
        }

        let mut children = Vec::with_capacity(self.frames.len() + 5);
        children.push(Vp8xChunk::new(flags, self.canvas_width, self.canvas_height)?.into());
        if let Some(icc) = &self.metadata.icc_profile {
            children.push(RawDataChunk::iccp(icc.clone()).into());
        }
        children.push(
            AnimChunk::with_loop_count(
                u32::from_le_bytes(anim.background_color),
                anim.loop_count,
            )
            .into(),
        );
        for frame in &self.frames {
            // Offsets are stored in 2-pixel units.
            let anmf = AnmfChunk::new(
                frame.x_offset / 2,
                frame.y_offset / 2,
                frame.width,
                frame.height,
                frame.duration_ms,
                frame.anmf_flags(),
                frame.chunks(),
            )?;
            children.push(anmf.into());
        }
        self.push_trailing_metadata(&mut children);
        log::debug!(
            "animated container, {} frames, loop {}",
            self.frames.len(),
            anim.loop_count
        );
        Ok(RiffChunk::webp(children))
    }

    fn push_trailing_metadata(&self, children: &mut Vec<Chunk>) {
        if let Some(exif) = &self.metadata.exif {
            children.push(RawDataChunk::exif(exif.clone()).into());
        }
        if let Some(xmp) = &self.metadata.xmp {
            children.push(RawDataChunk::xmp(xmp.clone()).into());
        }
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), MuxError> {
    if width == 0 || height == 0 || width > MAX_FRAME_DIMENSION || height > MAX_FRAME_DIMENSION {
        return Err(MuxError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use core::num::NonZeroU16;

    fn lossless_frame(x: u32, y: u32, w: u32, h: u32) -> MuxFrame {
        MuxFrame {
            x_offset: x,
            y_offset: y,
            width: w,
            height: h,
            duration_ms: 100,
            dispose: DisposeMethod::None,
            blend: BlendMethod::AlphaBlend,
            bitstream: vec![0x2F, 0, 0, 0, 0],
            alpha_data: None,
            is_lossless: true,
        }
    }

    fn kinds(riff: &RiffChunk) -> Vec<ChunkTag> {
        riff.children().iter().map(Chunk::kind).collect()
    }

    #[test]
    fn single_without_metadata_is_simple() {
        let mut mux = WebPMux::new(4, 4);
        mux.set_image(lossless_frame(0, 0, 4, 4)).unwrap();
        let riff = mux.build().unwrap();
        assert_eq!(kinds(&riff), [ChunkTag::VP8L]);
    }

    #[test]
    fn single_with_alpha_and_metadata_is_extended() {
        let mut mux = WebPMux::new(4, 4);
        mux.set_icc_profile(vec![1, 2, 3]);
        mux.set_xmp(vec![4]);
        mux.set_image(MuxFrame {
            alpha_data: Some(vec![9]),
            is_lossless: false,
            ..lossless_frame(0, 0, 4, 4)
        })
        .unwrap();
        let riff = mux.build().unwrap();
        assert_eq!(
            kinds(&riff),
            [
                ChunkTag::VP8X,
                ChunkTag::ICCP,
                ChunkTag::ALPH,
                ChunkTag::VP8,
                ChunkTag::XMP
            ]
        );
        let Chunk::Vp8x(vp8x) = &riff.children()[0] else {
            panic!("expected VP8X first");
        };
        assert_eq!(
            vp8x.flags(),
            Vp8xChunk::FLAG_ICC | Vp8xChunk::FLAG_ALPHA | Vp8xChunk::FLAG_XMP
        );
        assert_eq!((vp8x.canvas_width(), vp8x.canvas_height()), (4, 4));
    }

    #[test]
    fn animated_layout_and_flags() {
        let mut mux = WebPMux::new(8, 8);
        mux.set_animation([1, 2, 3, 4], LoopCount::Times(NonZeroU16::new(5).unwrap()));
        mux.set_exif(vec![0xE]);
        mux.push_frame(lossless_frame(0, 0, 8, 8)).unwrap();
        mux.push_frame(MuxFrame {
            dispose: DisposeMethod::Background,
            blend: BlendMethod::Overwrite,
            ..lossless_frame(2, 4, 4, 4)
        })
        .unwrap();
        let riff = mux.build().unwrap();
        assert_eq!(
            kinds(&riff),
            [
                ChunkTag::VP8X,
                ChunkTag::ANIM,
                ChunkTag::ANMF,
                ChunkTag::ANMF,
                ChunkTag::EXIF
            ]
        );
        let Chunk::Anim(anim) = &riff.children()[1] else {
            panic!("expected ANIM");
        };
        assert_eq!(anim.loop_count(), 5);
        assert_eq!(anim.background_bgra(), [1, 2, 3, 4]);
        let Chunk::Anmf(second) = &riff.children()[3] else {
            panic!("expected ANMF");
        };
        assert_eq!((second.x(), second.y()), (1, 2));
        assert_eq!(second.flags(), 0b11);
    }

    #[test]
    fn frame_validation() {
        let mut mux = WebPMux::new(10, 10);
        assert!(matches!(
            mux.push_frame(lossless_frame(1, 0, 2, 2)),
            Err(MuxError::OddFrameOffset { x: 1, y: 0 })
        ));
        assert!(matches!(
            mux.push_frame(lossless_frame(0, 0, 0, 2)),
            Err(MuxError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            mux.push_frame(lossless_frame(8, 0, 4, 2)),
            Err(MuxError::FrameOutsideCanvas { .. })
        ));
        assert!(matches!(
            mux.set_image(lossless_frame(0, 0, 16385, 1)),
            Err(MuxError::InvalidDimensions { width: 16385, .. })
        ));
    }

    #[test]
    fn no_frames() {
        let mut mux = WebPMux::new(4, 4);
        assert!(matches!(mux.build(), Err(MuxError::NoFrames)));
        mux.set_animation([0; 4], LoopCount::Forever);
        assert!(matches!(mux.build(), Err(MuxError::NoFrames)));
    }

    #[test]
    fn long_duration_rejected() {
        let mut mux = WebPMux::new(4, 4);
        mux.set_animation([0; 4], LoopCount::Forever);
        mux.push_frame(MuxFrame {
            duration_ms: 1 << 24,
            ..lossless_frame(0, 0, 4, 4)
        })
        .unwrap();
        assert!(matches!(
            mux.build(),
            Err(MuxError::InvalidField {
                field: "ANMF duration",
                ..
            })
        ));
    }

    #[test]
    fn rebuild_from_data_keeps_frames() {
        let mut mux = WebPMux::new(8, 8);
        mux.set_animation([0; 4], LoopCount::Forever);
        mux.push_frame(lossless_frame(0, 0, 8, 8)).unwrap();
        mux.push_frame(lossless_frame(2, 2, 2, 2)).unwrap();
        let bytes = mux.assemble().unwrap();

        let mut again = WebPMux::from_data(&bytes).unwrap();
        assert_eq!(again.num_frames(), 2);
        assert_eq!(again.canvas_size(), (8, 8));
        again.set_xmp(vec![1]);
        let riff = again.build().unwrap();
        assert_eq!(riff.children().last().map(Chunk::kind), Some(ChunkTag::XMP));
    }
}
