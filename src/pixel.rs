//! Typed pixels for the codec hand-off.
//!
//! With the `pixel-types` feature, frames can be decoded to and encoded from
//! pixel types of the [`rgb`] crate instead of raw byte slices:
//!
//! ```rust,no_run
//! use rgb::Rgba;
//! use webp_riff::codec::Codec;
//! use webp_riff::mux::WebPImage;
//! use webp_riff::pixel;
//!
//! fn first_frame(codec: &dyn Codec, data: &[u8]) -> Result<Vec<Rgba<u8>>, webp_riff::MuxError> {
//!     let image = WebPImage::from_bytes(data)?;
//!     let (pixels, _w, _h) = pixel::decode_frame::<Rgba<u8>>(codec, &image.frames()[0])?;
//!     Ok(pixels)
//! }
//! ```

use alloc::vec::Vec;

use rgb::{AsPixels, Bgr, Bgra, ComponentBytes, Rgb, Rgba};

use crate::chunk::BitstreamChunk;
use crate::codec::{self, Codec, EncodedImage, PixelLayout};
use crate::mux::{decode_frame as decode_frame_bytes, FrameRef, MuxError};

mod private {
    pub trait Sealed {}
}

/// Pixel type with a fixed codec layout.
pub trait WebPPixel: Copy + 'static + private::Sealed {
    /// Layout the codec is asked for.
    const LAYOUT: PixelLayout;
    /// Bytes per pixel.
    const CHANNELS: usize = Self::LAYOUT.bytes_per_pixel();
}

impl private::Sealed for Rgb<u8> {}
impl private::Sealed for Rgba<u8> {}
impl private::Sealed for Bgr<u8> {}
impl private::Sealed for Bgra<u8> {}

impl WebPPixel for Rgb<u8> {
    const LAYOUT: PixelLayout = PixelLayout::Rgb8;
}

impl WebPPixel for Rgba<u8> {
    const LAYOUT: PixelLayout = PixelLayout::Rgba8;
}

impl WebPPixel for Bgr<u8> {
    const LAYOUT: PixelLayout = PixelLayout::Bgr8;
}

impl WebPPixel for Bgra<u8> {
    const LAYOUT: PixelLayout = PixelLayout::Bgra8;
}

/// Decode one frame into typed pixels.
///
/// Returns `(pixels, width, height)`.
pub fn decode_frame<P: WebPPixel>(
    codec: &dyn Codec,
    frame: &FrameRef<'_>,
) -> Result<(Vec<P>, u32, u32), MuxError>
where
    [u8]: AsPixels<P>,
{
    let image = decode_frame_bytes(codec, frame, P::LAYOUT)?;
    let count = image.width as usize * image.height as usize;
    let pixels: &[P] = image.pixels[..count * P::CHANNELS].as_pixels();
    Ok((pixels.to_vec(), image.width, image.height))
}

/// Lossless-encode typed pixels into a `VP8L` chunk.
pub fn encode_lossless<P: WebPPixel>(
    codec: &dyn Codec,
    pixels: &[P],
    width: u32,
    height: u32,
) -> Result<BitstreamChunk, MuxError>
where
    [P]: ComponentBytes<u8>,
{
    let stride = width as usize * P::CHANNELS;
    codec::encode_lossless(codec, P::LAYOUT, pixels.as_bytes(), width, height, stride)
}

/// Lossy-encode typed pixels.
pub fn encode_lossy<P: WebPPixel>(
    codec: &dyn Codec,
    pixels: &[P],
    width: u32,
    height: u32,
    quality: f32,
) -> Result<EncodedImage, MuxError>
where
    [P]: ComponentBytes<u8>,
{
    let stride = width as usize * P::CHANNELS;
    codec::encode_lossy(codec, P::LAYOUT, pixels.as_bytes(), width, height, stride, quality)
}

/// Decode one frame to an [`imgref::ImgVec`].
#[cfg(feature = "imgref")]
pub fn decode_frame_img<P: WebPPixel>(
    codec: &dyn Codec,
    frame: &FrameRef<'_>,
) -> Result<imgref::ImgVec<P>, MuxError>
where
    [u8]: AsPixels<P>,
{
    let (pixels, w, h) = decode_frame::<P>(codec, frame)?;
    Ok(imgref::ImgVec::new(pixels, w as usize, h as usize))
}

/// Lossless-encode an [`imgref::ImgRef`]; its stride is passed through to
/// the codec.
#[cfg(feature = "imgref")]
pub fn encode_img_lossless<P: WebPPixel>(
    codec: &dyn Codec,
    img: imgref::ImgRef<'_, P>,
) -> Result<BitstreamChunk, MuxError>
where
    [P]: ComponentBytes<u8>,
{
    let stride = img.stride() * P::CHANNELS;
    codec::encode_lossless(
        codec,
        P::LAYOUT,
        img.buf().as_bytes(),
        img.width() as u32,
        img.height() as u32,
        stride,
    )
}
