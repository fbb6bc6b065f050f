//! RIFF container layer for WebP images.
//!
//! This crate demuxes WebP files into a typed chunk tree, exposes frames and
//! metadata, hands bitstreams to an external pixel codec, and muxes chunk
//! trees back into bytes. It never compresses or decompresses pixels itself;
//! that is the job of a [`Codec`](codec::Codec) implementation.
//!
//! # Features
//!
//! - `std` (default): Demuxing from [`std::io::Read`] sources and
//!   [`std::io::Error`] conversion.
//! - `pixel-types`: Typed pixels from the [`rgb`](https://docs.rs/rgb) crate.
//! - `imgref`: 2D buffers from the [`imgref`](https://docs.rs/imgref) crate.
//!
//! # no_std Support
//!
//! Everything except [`mux::demux_reader`] works in `no_std` environments
//! (requires `alloc`):
//! ```toml
//! [dependencies]
//! webp-riff = { version = "...", default-features = false }
//! ```
//!
//! # Demuxing
//!
//! ```rust,no_run
//! use webp_riff::mux::WebPImage;
//!
//! let webp_data: &[u8] = &[]; // your WebP data
//! let image = WebPImage::from_bytes(webp_data)?;
//! println!("canvas {:?}, {} frames", image.canvas_size(), image.frame_count());
//! # Ok::<(), webp_riff::MuxError>(())
//! ```
//!
//! # Building a tree by hand
//!
//! ```rust
//! use webp_riff::chunk::{BitstreamChunk, RiffChunk};
//!
//! let riff = RiffChunk::webp(vec![BitstreamChunk::vp8(vec![0, 1, 2, 3]).into()]);
//! let bytes = riff.to_bytes();
//! assert_eq!(&bytes[..4], b"RIFF");
//! assert_eq!(webp_riff::mux::demux(&bytes)?, riff);
//! # Ok::<(), webp_riff::MuxError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

extern crate alloc;

pub mod chunk;
pub mod codec;
pub mod metadata;
/// WebP demux, mux and frame access.
pub mod mux;
pub mod riff;
pub mod slice_reader;
pub mod vec_writer;

/// Typed pixels for the codec hand-off.
#[cfg(feature = "pixel-types")]
pub mod pixel;

pub use chunk::{
    AnimChunk, AnmfChunk, BitstreamChunk, BitstreamKind, BlendMethod, Chunk, ChunkTag,
    DisposeMethod, LoopCount, MetadataKind, RawDataChunk, RiffChunk, UnknownChunk, Vp8xChunk,
};
pub use codec::{Codec, CodecError, DecodedImage, EncodedImage, PixelLayout};
pub use metadata::ImageMetadata;
pub use mux::{
    demux, DecodedFrame, Demuxer, FrameBitstream, FrameDecoder, FrameRef, Limits, MuxError,
    MuxFrame, WebPImage, WebPMux,
};
pub use riff::Truncation;
pub use slice_reader::{ByteSource, SliceReader};

// Re-export cooperative cancellation types
pub use enough::{Stop, StopReason, Unstoppable};
