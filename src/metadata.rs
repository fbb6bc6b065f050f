//! Metadata convenience functions over whole WebP files.
//!
//! These work on encoded bytes: extraction only demuxes, and every edit goes
//! through [`WebPMux`], which rebuilds the container with the right `VP8X`
//! flags.
//!
//! # Example
//!
//! ```rust,no_run
//! use webp_riff::metadata::{self, ImageMetadata};
//!
//! # let webp_data: &[u8] = &[];
//! let icc = metadata::icc_profile(webp_data)?;
//!
//! let meta = ImageMetadata {
//!     exif: Some(vec![0u8; 10]),
//!     ..ImageMetadata::default()
//! };
//! let with_meta = metadata::embed(webp_data, &meta)?;
//! let stripped = metadata::strip(&with_meta)?;
//! # Ok::<(), webp_riff::MuxError>(())
//! ```

use alloc::vec::Vec;

use crate::chunk::{Chunk, MetadataKind, Vp8xChunk};
use crate::mux::{demux, MuxError, WebPMux};

/// ICC, EXIF and XMP payloads of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    /// ICC color profile.
    pub icc_profile: Option<Vec<u8>>,
    /// EXIF block.
    pub exif: Option<Vec<u8>>,
    /// XMP packet.
    pub xmp: Option<Vec<u8>>,
}

impl ImageMetadata {
    /// Whether no payload is present.
    pub fn is_empty(&self) -> bool {
        self.icc_profile.is_none() && self.exif.is_none() && self.xmp.is_none()
    }

    /// `VP8X` flag bits announcing the present payloads.
    pub(crate) fn vp8x_flags(&self) -> u32 {
        let mut flags = 0;
        if self.icc_profile.is_some() {
            flags |= Vp8xChunk::FLAG_ICC;
        }
        if self.exif.is_some() {
            flags |= Vp8xChunk::FLAG_EXIF;
        }
        if self.xmp.is_some() {
            flags |= Vp8xChunk::FLAG_XMP;
        }
        flags
    }
}

/// Read all three payloads with one demux pass.
pub fn read(data: &[u8]) -> Result<ImageMetadata, MuxError> {
    let riff = demux(data)?;
    let mut meta = ImageMetadata::default();
    for chunk in riff.into_children() {
        let Chunk::Metadata(m) = chunk else { continue };
        // First chunk of each kind wins.
        let slot = match m.kind() {
            MetadataKind::Iccp => &mut meta.icc_profile,
            MetadataKind::Exif => &mut meta.exif,
            MetadataKind::Xmp => &mut meta.xmp,
        };
        if slot.is_none() {
            *slot = Some(m.data().to_vec());
        }
    }
    Ok(meta)
}

/// Extract the ICC color profile, if present.
pub fn icc_profile(data: &[u8]) -> Result<Option<Vec<u8>>, MuxError> {
    Ok(read(data)?.icc_profile)
}

/// Extract EXIF metadata, if present.
pub fn exif(data: &[u8]) -> Result<Option<Vec<u8>>, MuxError> {
    Ok(read(data)?.exif)
}

/// Extract XMP metadata, if present.
pub fn xmp(data: &[u8]) -> Result<Option<Vec<u8>>, MuxError> {
    Ok(read(data)?.xmp)
}

fn remux(data: &[u8], edit: impl FnOnce(&mut WebPMux)) -> Result<Vec<u8>, MuxError> {
    let mut mux = WebPMux::from_data(data)?;
    edit(&mut mux);
    mux.assemble()
}

/// Set every payload present in `metadata`, leaving the others untouched.
pub fn embed(data: &[u8], metadata: &ImageMetadata) -> Result<Vec<u8>, MuxError> {
    remux(data, |mux| {
        let target = mux.metadata_mut();
        for (slot, value) in [
            (&mut target.icc_profile, &metadata.icc_profile),
            (&mut target.exif, &metadata.exif),
            (&mut target.xmp, &metadata.xmp),
        ] {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
    })
}

/// Embed an ICC color profile.
pub fn embed_icc(data: &[u8], icc_profile: &[u8]) -> Result<Vec<u8>, MuxError> {
    remux(data, |mux| mux.set_icc_profile(icc_profile.to_vec()))
}

/// Embed EXIF metadata.
pub fn embed_exif(data: &[u8], exif: &[u8]) -> Result<Vec<u8>, MuxError> {
    remux(data, |mux| mux.set_exif(exif.to_vec()))
}

/// Embed XMP metadata.
pub fn embed_xmp(data: &[u8], xmp: &[u8]) -> Result<Vec<u8>, MuxError> {
    remux(data, |mux| mux.set_xmp(xmp.to_vec()))
}

/// Remove the ICC color profile.
pub fn remove_icc(data: &[u8]) -> Result<Vec<u8>, MuxError> {
    remux(data, WebPMux::clear_icc_profile)
}

/// Remove EXIF metadata.
pub fn remove_exif(data: &[u8]) -> Result<Vec<u8>, MuxError> {
    remux(data, WebPMux::clear_exif)
}

/// Remove XMP metadata.
pub fn remove_xmp(data: &[u8]) -> Result<Vec<u8>, MuxError> {
    remux(data, WebPMux::clear_xmp)
}

/// Remove all three payloads. A still image without alpha goes back to the
/// simple format.
pub fn strip(data: &[u8]) -> Result<Vec<u8>, MuxError> {
    remux(data, |mux| *mux.metadata_mut() = ImageMetadata::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{BitstreamChunk, ChunkTag, RiffChunk};
    use alloc::vec;

    fn simple_lossless() -> Vec<u8> {
        // 3x2 VP8L header.
        let bits: u32 = 2 | (1 << 14);
        let mut payload = vec![0x2F];
        payload.extend_from_slice(&bits.to_le_bytes());
        RiffChunk::webp(vec![BitstreamChunk::vp8l(payload).into()]).to_bytes()
    }

    #[test]
    fn embed_then_read() {
        let data = simple_lossless();
        assert!(read(&data).unwrap().is_empty());

        let with_icc = embed_icc(&data, &[1, 2, 3]).unwrap();
        assert_eq!(icc_profile(&with_icc).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(exif(&with_icc).unwrap(), None);

        let both = embed_xmp(&with_icc, b"<x/>").unwrap();
        let meta = read(&both).unwrap();
        assert_eq!(meta.icc_profile, Some(vec![1, 2, 3]));
        assert_eq!(meta.xmp.as_deref(), Some(&b"<x/>"[..]));
    }

    #[test]
    fn embed_all_at_once() {
        let meta = ImageMetadata {
            icc_profile: Some(vec![7]),
            exif: Some(vec![8, 9]),
            xmp: None,
        };
        let out = embed(&simple_lossless(), &meta).unwrap();
        assert_eq!(read(&out).unwrap(), meta);
    }

    #[test]
    fn strip_returns_to_simple_format() {
        let data = embed_exif(&simple_lossless(), &[1]).unwrap();
        let tree = demux(&data).unwrap();
        assert_eq!(tree.children()[0].kind(), ChunkTag::VP8X);

        let removed = remove_exif(&data).unwrap();
        assert_eq!(removed, simple_lossless());
        assert_eq!(strip(&data).unwrap(), simple_lossless());
    }

    #[test]
    fn remove_one_keeps_the_rest() {
        let data = embed_xmp(&embed_icc(&simple_lossless(), &[5]).unwrap(), &[6]).unwrap();
        let out = remove_icc(&data).unwrap();
        let meta = read(&out).unwrap();
        assert_eq!(meta.icc_profile, None);
        assert_eq!(meta.xmp, Some(vec![6]));
        assert_eq!(remove_xmp(&out).unwrap(), simple_lossless());
    }
}
