//! WebP demux, mux and frame access.
//!
//! - **Demux** ([`Demuxer`], [`demux`]): Parse a WebP file into a
//!   [`RiffChunk`](crate::chunk::RiffChunk) tree without decoding pixels.
//! - **View** ([`WebPImage`]): Canvas, animation parameters, frames and
//!   metadata of a demuxed tree.
//! - **Decode** ([`FrameDecoder`]): Hand frames to an external
//!   [`Codec`](crate::codec::Codec) in order.
//! - **Mux** ([`WebPMux`]): Assemble WebP containers from pre-encoded chunks
//!   and metadata (ICC, EXIF, XMP).
//!
//! All types work in `no_std + alloc` environments.

mod assemble;
mod demux;
mod error;
mod frame_decode;
mod image;
mod limits;

pub use assemble::{MuxFrame, WebPMux, MAX_FRAME_DIMENSION};
#[cfg(feature = "std")]
pub use demux::demux_reader;
pub use demux::{demux, Demuxer};
pub use error::MuxError;
pub use frame_decode::{decode_frame, DecodedFrame, FrameDecoder};
pub use image::{FrameBitstream, FrameRef, WebPImage};
pub use limits::Limits;
