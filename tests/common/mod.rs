//! In-process stand-in for a real VP8/VP8L codec.
//!
//! The "bitstreams" it writes carry real VP8/VP8L dimension headers followed
//! by raw, uncompressed samples, so the container layer sees realistic chunk
//! layouts and every pixel survives a round trip.

#![allow(dead_code)]

use webp_riff::chunk::{BitstreamChunk, Chunk, RiffChunk, Vp8xChunk};
use webp_riff::codec::{Codec, CodecError, DecodedImage, PixelLayout};

/// Pixel-exact stub codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubCodec;

/// A VP8L payload: signature, packed dimensions, raw RGBA.
pub fn vp8l_payload(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let has_alpha = rgba.chunks_exact(4).any(|px| px[3] != 255);
    let bits = (width - 1) | ((height - 1) << 14) | (u32::from(has_alpha) << 28);
    let mut out = vec![0x2F];
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(rgba);
    out
}

/// A VP8 keyframe payload: frame tag, start code, dimensions, raw RGB.
pub fn vp8_payload(width: u32, height: u32, rgb: &[u8]) -> Vec<u8> {
    let mut out = vec![0x10, 0x02, 0x00, 0x9D, 0x01, 0x2A];
    out.extend_from_slice(&(width as u16).to_le_bytes());
    out.extend_from_slice(&(height as u16).to_le_bytes());
    out.extend_from_slice(rgb);
    out
}

/// Solid RGBA image.
pub fn solid_rgba(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    px.iter()
        .cycle()
        .take((width * height * 4) as usize)
        .copied()
        .collect()
}

/// Lossless still image as a complete file.
pub fn lossless_file(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    let payload = vp8l_payload(width, height, &solid_rgba(width, height, px));
    RiffChunk::webp(vec![BitstreamChunk::vp8l(payload).into()]).to_bytes()
}

fn gather_rgba(
    layout: PixelLayout,
    pixels: &[u8],
    width: u32,
    height: u32,
    stride: usize,
) -> Result<Vec<u8>, CodecError> {
    let bpp = layout.bytes_per_pixel();
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height as usize {
        let row = &pixels[y * stride..y * stride + width as usize * bpp];
        for px in row.chunks_exact(bpp) {
            let converted = match layout {
                PixelLayout::Rgba8 => [px[0], px[1], px[2], px[3]],
                PixelLayout::Bgra8 => [px[2], px[1], px[0], px[3]],
                PixelLayout::Rgb8 => [px[0], px[1], px[2], 255],
                PixelLayout::Bgr8 => [px[2], px[1], px[0], 255],
                PixelLayout::Argb8 => return Err(CodecError::UnsupportedLayout(layout)),
            };
            rgba.extend_from_slice(&converted);
        }
    }
    Ok(rgba)
}

fn scatter_rgba(layout: PixelLayout, rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * layout.bytes_per_pixel());
    for px in rgba.chunks_exact(4) {
        let [r, g, b, a] = [px[0], px[1], px[2], px[3]];
        match layout {
            PixelLayout::Rgba8 => out.extend_from_slice(&[r, g, b, a]),
            PixelLayout::Argb8 => out.extend_from_slice(&[a, r, g, b]),
            PixelLayout::Bgra8 => out.extend_from_slice(&[b, g, r, a]),
            PixelLayout::Rgb8 => out.extend_from_slice(&[r, g, b]),
            PixelLayout::Bgr8 => out.extend_from_slice(&[b, g, r]),
        }
    }
    out
}

/// Split framed chunks back into (tag, payload) pairs.
fn split_framed(mut data: &[u8]) -> Result<Vec<([u8; 4], &[u8])>, CodecError> {
    let bad = || CodecError::DecodeFailed("bad framing".into());
    let mut chunks = Vec::new();
    while !data.is_empty() {
        if data.len() < 8 {
            return Err(bad());
        }
        let tag = [data[0], data[1], data[2], data[3]];
        let len = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let end = 8 + len;
        if data.len() < end {
            return Err(bad());
        }
        chunks.push((tag, &data[8..end]));
        data = &data[(end + (len & 1)).min(data.len())..];
    }
    Ok(chunks)
}

impl Codec for StubCodec {
    fn decode(&self, layout: PixelLayout, data: &[u8]) -> Result<DecodedImage, CodecError> {
        let chunks = split_framed(data)?;
        let alpha = chunks.iter().find(|(t, _)| t == b"ALPH").map(|(_, p)| *p);
        let (tag, payload) = chunks
            .iter()
            .find(|(t, _)| t == b"VP8 " || t == b"VP8L")
            .ok_or_else(|| CodecError::DecodeFailed("no image chunk".into()))?;

        let (width, height, rgba) = if tag == b"VP8L" {
            if payload.len() < 5 || payload[0] != 0x2F {
                return Err(CodecError::DecodeFailed("bad VP8L header".into()));
            }
            let bits = u32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);
            let (w, h) = ((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1);
            (w, h, payload[5..].to_vec())
        } else {
            if payload.len() < 10 || payload[3..6] != [0x9D, 0x01, 0x2A] {
                return Err(CodecError::DecodeFailed("bad VP8 header".into()));
            }
            let w = u32::from(u16::from_le_bytes([payload[6], payload[7]]));
            let h = u32::from(u16::from_le_bytes([payload[8], payload[9]]));
            let rgb = &payload[10..];
            let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
            for (i, px) in rgb.chunks_exact(3).enumerate() {
                let a = alpha.and_then(|a| a.get(i).copied()).unwrap_or(255);
                rgba.extend_from_slice(&[px[0], px[1], px[2], a]);
            }
            (w, h, rgba)
        };
        if rgba.len() != (width * height * 4) as usize {
            return Err(CodecError::DecodeFailed("sample count mismatch".into()));
        }
        Ok(DecodedImage {
            pixels: scatter_rgba(layout, &rgba),
            width,
            height,
        })
    }

    fn encode(
        &self,
        layout: PixelLayout,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        _quality: f32,
    ) -> Result<Vec<u8>, CodecError> {
        let rgba = gather_rgba(layout, pixels, width, height, stride)?;
        let rgb: Vec<u8> = rgba.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect();
        let vp8: Chunk = BitstreamChunk::vp8(vp8_payload(width, height, &rgb)).into();
        let alpha: Vec<u8> = rgba.chunks_exact(4).map(|px| px[3]).collect();
        let children = if alpha.iter().all(|&a| a == 255) {
            vec![vp8]
        } else {
            let vp8x = Vp8xChunk::new(Vp8xChunk::FLAG_ALPHA, width, height)
                .map_err(|e| CodecError::EncodeFailed(e.to_string()))?;
            vec![vp8x.into(), BitstreamChunk::alph(alpha).into(), vp8]
        };
        Ok(RiffChunk::webp(children).to_bytes())
    }

    fn encode_lossless(
        &self,
        layout: PixelLayout,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Vec<u8>, CodecError> {
        let rgba = gather_rgba(layout, pixels, width, height, stride)?;
        let vp8l = BitstreamChunk::vp8l(vp8l_payload(width, height, &rgba));
        Ok(RiffChunk::webp(vec![vp8l.into()]).to_bytes())
    }
}
