//! Streaming WebP demuxer.
//!
//! Reads a RIFF/WebP byte stream front to back (no seeking) into a
//! [`RiffChunk`] tree. Each nesting level (file body, `ANMF` payload) keeps
//! its own running byte budget; the budget is charged with a chunk's framed
//! size as soon as its header is read, and the level ends once the budget is
//! no longer positive.
//!
//! # Example
//!
//! ```rust,no_run
//! use webp_riff::chunk::Chunk;
//!
//! let data: &[u8] = &[]; // your WebP data
//! let riff = webp_riff::mux::demux(data)?;
//! for chunk in riff.children() {
//!     println!("{} ({} bytes)", chunk.kind(), chunk.payload_size());
//! }
//! # Ok::<(), webp_riff::mux::MuxError>(())
//! ```

use alloc::vec;
use alloc::vec::Vec;

use super::error::MuxError;
use super::limits::Limits;
use crate::chunk::{
    AnimChunk, AnmfChunk, BitstreamChunk, BitstreamKind, Chunk, ChunkTag, RawDataChunk, RiffChunk,
    UnknownChunk, Vp8xChunk, ANIM_PAYLOAD_SIZE, ANMF_HEADER_SIZE, CHUNK_HEADER_SIZE,
    VP8X_PAYLOAD_SIZE,
};
use crate::riff::{is_odd, padded_len, RiffReader, Truncation};
use crate::slice_reader::{ByteSource, SliceReader};

/// Parse a WebP file held in memory with default [`Limits`].
pub fn demux(data: &[u8]) -> Result<RiffChunk, MuxError> {
    Demuxer::new().demux(SliceReader::new(data))
}

/// Parse a WebP file from any reader with default [`Limits`].
///
/// The reader is consumed and dropped when parsing ends.
#[cfg(feature = "std")]
pub fn demux_reader<R: std::io::Read>(reader: R) -> Result<RiffChunk, MuxError> {
    Demuxer::new().demux(crate::slice_reader::IoReader::new(reader))
}

/// Configurable demuxer.
#[derive(Debug, Clone, Default)]
pub struct Demuxer {
    limits: Limits,
}

impl Demuxer {
    /// A demuxer with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the limits.
    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Parse one file from `source`.
    ///
    /// The source is taken by value and dropped (closed) before returning,
    /// whether parsing succeeded or not. No partial tree is returned on error.
    pub fn demux<S: ByteSource>(&self, source: S) -> Result<RiffChunk, MuxError> {
        Parser {
            r: RiffReader::new(source),
            limits: &self.limits,
            exhausted: false,
            frames: 0,
        }
        .run()
    }
}

#[derive(Debug, Clone, Copy)]
struct ChunkHeader {
    tag: ChunkTag,
    len: u64,
}

impl ChunkHeader {
    /// Bytes this chunk takes out of its parent's budget.
    fn framed_size(self) -> i64 {
        (CHUNK_HEADER_SIZE + padded_len(self.len)) as i64
    }
}

struct Parser<'l, S> {
    r: RiffReader<S>,
    limits: &'l Limits,
    /// Set once a tolerated truncation has drained the source.
    exhausted: bool,
    frames: usize,
}

impl<S: ByteSource> Parser<'_, S> {
    fn run(mut self) -> Result<RiffChunk, MuxError> {
        let (budget, file_pad) = self.read_envelope()?;

        let first = self.read_header()?;
        let budget = budget - first.framed_size();
        let children = match first.tag {
            ChunkTag::VP8X => self.read_extended(first, budget)?,
            ChunkTag::VP8 | ChunkTag::VP8L => vec![self.read_single(first)?],
            other => return Err(MuxError::NoBitstreamFound(other)),
        };

        // Unlike inner padding, a missing file pad is always an error.
        if file_pad {
            self.r.skip_pad(Truncation::Fatal)?;
        }
        log::debug!(
            "demuxed {} top-level chunk(s) from {} bytes",
            children.len(),
            self.r.position()
        );
        Ok(RiffChunk::webp(children))
    }

    /// Returns the body budget and whether the file carries a trailing pad.
    fn read_envelope(&mut self) -> Result<(i64, bool), MuxError> {
        let riff = self.r.read_fourcc()?;
        if &riff != b"RIFF" {
            return Err(MuxError::BadMagic {
                expected: ChunkTag::RIFF,
                found: ChunkTag::from_fourcc(riff),
            });
        }
        let mut file_size = self.r.read_u32()?;
        self.limits.check_file_size(file_size)?;
        let form = self.r.read_fourcc()?;
        if &form != b"WEBP" {
            return Err(MuxError::BadMagic {
                expected: ChunkTag::Unknown(*b"WEBP"),
                found: ChunkTag::from_fourcc(form),
            });
        }

        let file_pad = is_odd(file_size);
        if file_pad {
            file_size -= 1;
        }
        Ok((file_size as i64 - 4, file_pad))
    }

    fn read_header(&mut self) -> Result<ChunkHeader, MuxError> {
        let tag = ChunkTag::from_fourcc(self.r.read_fourcc()?);
        let len = self.r.read_u32()?;
        log::trace!("chunk {tag} len {len} at offset {}", self.r.position() - 8);
        self.limits.check_chunk(tag, len)?;
        Ok(ChunkHeader { tag, len })
    }

    fn payload(&mut self, header: ChunkHeader) -> Result<Vec<u8>, MuxError> {
        // Fatal reads never yield None.
        let data = self.r.read_payload(header.len as usize, Truncation::Fatal)?;
        Ok(data.unwrap_or_default())
    }

    fn bitstream(&mut self, header: ChunkHeader, kind: BitstreamKind) -> Result<Chunk, MuxError> {
        Ok(BitstreamChunk::new(kind, self.payload(header)?).into())
    }

    /// Unknown payloads may be cut short by the end of input; the chunk is
    /// then dropped instead of failing the parse.
    fn unknown(&mut self, header: ChunkHeader) -> Result<Option<Chunk>, MuxError> {
        match self
            .r
            .read_payload(header.len as usize, Truncation::Tolerate)?
        {
            Some(data) => Ok(Some(UnknownChunk::new(header.tag.to_fourcc(), data).into())),
            None => {
                log::warn!("dropping truncated {} chunk", header.tag);
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    fn read_single(&mut self, header: ChunkHeader) -> Result<Chunk, MuxError> {
        log::debug!("simple file format ({})", header.tag);
        let kind = if header.tag == ChunkTag::VP8 {
            BitstreamKind::Vp8
        } else {
            BitstreamKind::Vp8l
        };
        // No sibling follows, so the bitstream pad is never read here. When
        // the RIFF size is odd that byte is the file pad.
        self.bitstream(header, kind)
    }

    fn read_extended(
        &mut self,
        header: ChunkHeader,
        mut budget: i64,
    ) -> Result<Vec<Chunk>, MuxError> {
        log::debug!("extended file format");
        if header.len < VP8X_PAYLOAD_SIZE {
            return Err(MuxError::InvalidField {
                field: "VP8X chunk size",
                value: header.len,
            });
        }
        let flags = self.r.read_i32()? as u32;
        let width = self.r.read_1based()?;
        let height = self.r.read_1based()?;
        self.r.skip(header.len - VP8X_PAYLOAD_SIZE)?;
        if is_odd(header.len) {
            self.r.skip_pad(Truncation::Fatal)?;
        }

        let mut chunks = vec![Vp8xChunk::new(flags, width, height)?.into()];
        while budget > 0 && !self.exhausted {
            let header = self.read_header()?;
            budget -= header.framed_size();
            if let Some(chunk) = self.read_sibling(header)? {
                chunks.push(chunk);
            }
            // Real files are sometimes missing the last pad byte.
            if is_odd(header.len) && !self.exhausted && !self.r.skip_pad(Truncation::Tolerate)? {
                self.exhausted = true;
            }
        }
        Ok(chunks)
    }

    fn read_sibling(&mut self, header: ChunkHeader) -> Result<Option<Chunk>, MuxError> {
        let chunk = match header.tag {
            ChunkTag::ICCP => RawDataChunk::iccp(self.payload(header)?).into(),
            ChunkTag::EXIF => RawDataChunk::exif(self.payload(header)?).into(),
            ChunkTag::XMP => RawDataChunk::xmp(self.payload(header)?).into(),
            ChunkTag::VP8 => self.bitstream(header, BitstreamKind::Vp8)?,
            ChunkTag::VP8L => self.bitstream(header, BitstreamKind::Vp8l)?,
            ChunkTag::ALPH => self.bitstream(header, BitstreamKind::Alph)?,
            ChunkTag::ANIM => self.read_anim(header)?.into(),
            ChunkTag::ANMF => {
                self.frames += 1;
                self.limits.check_frame_count(self.frames)?;
                self.read_anmf(header)?.into()
            }
            ChunkTag::VP8X | ChunkTag::RIFF | ChunkTag::Unknown(_) => return self.unknown(header),
        };
        Ok(Some(chunk))
    }

    fn read_anim(&mut self, header: ChunkHeader) -> Result<AnimChunk, MuxError> {
        if header.len < ANIM_PAYLOAD_SIZE {
            return Err(MuxError::InvalidField {
                field: "ANIM chunk size",
                value: header.len,
            });
        }
        let background = self.r.read_i32()? as u32;
        let loop_count = self.r.read_u16()?;
        self.r.skip(header.len - ANIM_PAYLOAD_SIZE)?;
        AnimChunk::new(background, u32::from(loop_count))
    }

    fn read_anmf(&mut self, header: ChunkHeader) -> Result<AnmfChunk, MuxError> {
        if header.len < ANMF_HEADER_SIZE {
            return Err(MuxError::InvalidField {
                field: "ANMF chunk size",
                value: header.len,
            });
        }
        let x = self.r.read_u24()?;
        let y = self.r.read_u24()?;
        let width = self.r.read_1based()?;
        let height = self.r.read_1based()?;
        let duration = self.r.read_u24()?;
        let flags = self.r.read_i8()? as u8;

        let mut budget = (header.len - ANMF_HEADER_SIZE) as i64;
        let mut children = Vec::new();
        while budget > 0 && !self.exhausted {
            let sub = self.read_header()?;
            budget -= sub.framed_size();
            let chunk = match sub.tag {
                ChunkTag::VP8 => Some(self.bitstream(sub, BitstreamKind::Vp8)?),
                ChunkTag::VP8L => Some(self.bitstream(sub, BitstreamKind::Vp8l)?),
                ChunkTag::ALPH => Some(self.bitstream(sub, BitstreamKind::Alph)?),
                _ => self.unknown(sub)?,
            };
            children.extend(chunk);
            if is_odd(sub.len) && !self.exhausted {
                self.r.skip_pad(Truncation::Fatal)?;
            }
        }
        log::trace!("ANMF {width}x{height} with {} sub-chunk(s)", children.len());
        AnmfChunk::new(x, y, width, height, duration, flags, children)
    }
}
