//! Fixed-size header chunks: `VP8X` and `ANIM`.

use alloc::vec::Vec;
use core::num::NonZeroU16;

use crate::mux::MuxError;
use crate::riff::MAX_1BASED;
use crate::vec_writer::VecWriter;

/// Payload size of a `VP8X` chunk.
pub const VP8X_PAYLOAD_SIZE: u64 = 10;

/// Payload size of an `ANIM` chunk.
pub const ANIM_PAYLOAD_SIZE: u64 = 6;

/// Extended-format header: feature flags and canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vp8xChunk {
    flags: u32,
    canvas_width: u32,
    canvas_height: u32,
}

impl Vp8xChunk {
    /// ICC profile present.
    pub const FLAG_ICC: u32 = 1 << 5;
    /// Alpha present.
    pub const FLAG_ALPHA: u32 = 1 << 4;
    /// EXIF present.
    pub const FLAG_EXIF: u32 = 1 << 3;
    /// XMP present.
    pub const FLAG_XMP: u32 = 1 << 2;
    /// Animated.
    pub const FLAG_ANIMATION: u32 = 1 << 1;

    /// Build a header. Canvas dimensions must lie in `1..=2^24`.
    pub fn new(flags: u32, canvas_width: u32, canvas_height: u32) -> Result<Self, MuxError> {
        check_1based("VP8X canvas width", canvas_width)?;
        check_1based("VP8X canvas height", canvas_height)?;
        Ok(Self {
            flags,
            canvas_width,
            canvas_height,
        })
    }

    /// The raw 32-bit flags/reserved field.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Canvas width in pixels.
    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }

    /// Canvas height in pixels.
    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }

    /// ICC flag.
    pub fn has_icc(&self) -> bool {
        self.flags & Self::FLAG_ICC != 0
    }

    /// Alpha flag.
    pub fn has_alpha(&self) -> bool {
        self.flags & Self::FLAG_ALPHA != 0
    }

    /// EXIF flag.
    pub fn has_exif(&self) -> bool {
        self.flags & Self::FLAG_EXIF != 0
    }

    /// XMP flag.
    pub fn has_xmp(&self) -> bool {
        self.flags & Self::FLAG_XMP != 0
    }

    /// Animation flag.
    pub fn is_animated(&self) -> bool {
        self.flags & Self::FLAG_ANIMATION != 0
    }

    pub(crate) fn write_payload(&self, out: &mut Vec<u8>) {
        out.write_i32_le(self.flags as i32);
        out.write_1based(self.canvas_width);
        out.write_1based(self.canvas_height);
    }
}

/// Number of times that an animation loops.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoopCount {
    /// The animation loops forever.
    Forever,
    /// The animation plays the specified number of times.
    Times(NonZeroU16),
}

impl core::fmt::Display for LoopCount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LoopCount::Forever => f.write_str("infinite"),
            LoopCount::Times(n) => write!(f, "{} time{}", n, if n.get() == 1 { "" } else { "s" }),
        }
    }
}

impl From<u16> for LoopCount {
    fn from(n: u16) -> Self {
        match NonZeroU16::new(n) {
            None => LoopCount::Forever,
            Some(n) => LoopCount::Times(n),
        }
    }
}

impl From<LoopCount> for u16 {
    fn from(n: LoopCount) -> Self {
        match n {
            LoopCount::Forever => 0,
            LoopCount::Times(n) => n.get(),
        }
    }
}

/// Animation parameters: background color and loop count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimChunk {
    background_color: u32,
    loop_count: u16,
}

impl AnimChunk {
    /// Build from a loop count given in a wider integer.
    ///
    /// Fails with [`MuxError::InvalidField`] when `loop_count` does not fit in
    /// 16 bits. Zero means "loop forever".
    pub fn new(background_color: u32, loop_count: u32) -> Result<Self, MuxError> {
        let loop_count = u16::try_from(loop_count).map_err(|_| MuxError::InvalidField {
            field: "ANIM loop count",
            value: u64::from(loop_count),
        })?;
        Ok(Self {
            background_color,
            loop_count,
        })
    }

    /// Build from a [`LoopCount`]; cannot fail.
    pub fn with_loop_count(background_color: u32, loop_count: LoopCount) -> Self {
        Self {
            background_color,
            loop_count: loop_count.into(),
        }
    }

    /// Background color as stored (BGRA byte order in little-endian).
    pub fn background_color(&self) -> u32 {
        self.background_color
    }

    /// Background color as `[B, G, R, A]` bytes.
    pub fn background_bgra(&self) -> [u8; 4] {
        self.background_color.to_le_bytes()
    }

    /// Raw loop count, 0 meaning infinite.
    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    /// Loop count as an enum.
    pub fn loops(&self) -> LoopCount {
        LoopCount::from(self.loop_count)
    }

    pub(crate) fn write_payload(&self, out: &mut Vec<u8>) {
        out.write_i32_le(self.background_color as i32);
        out.write_u16_le(self.loop_count);
    }
}

pub(crate) fn check_1based(field: &'static str, value: u32) -> Result<(), MuxError> {
    if (1..=MAX_1BASED).contains(&value) {
        Ok(())
    } else {
        Err(MuxError::InvalidField {
            field,
            value: u64::from(value),
        })
    }
}
