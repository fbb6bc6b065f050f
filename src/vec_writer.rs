//! Vec<u8> writer extension for no_std muxing.
//!
//! Mirrors the primitives of [`RiffReader`](crate::riff::RiffReader) without
//! requiring std::io::Write.

use alloc::vec::Vec;

/// Extension trait for writing RIFF fields to a Vec<u8>.
pub trait VecWriter {
    /// Append a slice to the buffer.
    fn write_all(&mut self, data: &[u8]);

    /// Write a four-character tag verbatim.
    fn write_fourcc(&mut self, tag: [u8; 4]);

    /// Write a u8.
    fn write_u8(&mut self, v: u8);

    /// Write a u16 in little-endian.
    fn write_u16_le(&mut self, v: u16);

    /// Write a u24 (3 bytes) in little-endian.
    fn write_u24_le(&mut self, v: u32);

    /// Write a u32 in little-endian.
    fn write_u32_le(&mut self, v: u32);

    /// Write an i32 in little-endian.
    fn write_i32_le(&mut self, v: i32);

    /// Write a 1-based 24-bit field (stored as `v - 1`).
    fn write_1based(&mut self, v: u32);
}

impl VecWriter for Vec<u8> {
    #[inline]
    fn write_all(&mut self, data: &[u8]) {
        self.extend_from_slice(data);
    }

    #[inline]
    fn write_fourcc(&mut self, tag: [u8; 4]) {
        self.extend_from_slice(&tag);
    }

    #[inline]
    fn write_u8(&mut self, v: u8) {
        self.push(v);
    }

    #[inline]
    fn write_u16_le(&mut self, v: u16) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    fn write_u24_le(&mut self, v: u32) {
        debug_assert!(v <= crate::riff::MAX_U24);
        let bytes = v.to_le_bytes();
        self.extend_from_slice(&bytes[..3]);
    }

    #[inline]
    fn write_u32_le(&mut self, v: u32) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    fn write_i32_le(&mut self, v: i32) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    #[inline]
    fn write_1based(&mut self, v: u32) {
        debug_assert!((1..=crate::riff::MAX_1BASED).contains(&v));
        self.write_u24_le(v - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riff::RiffReader;
    use crate::slice_reader::SliceReader;

    #[test]
    fn writes_little_endian() {
        let mut out = Vec::new();
        out.write_fourcc(*b"ANIM");
        out.write_u16_le(0x0102);
        out.write_u24_le(0x030405);
        out.write_i32_le(-1);
        out.write_u8(7);
        assert_eq!(
            out,
            [b'A', b'N', b'I', b'M', 2, 1, 5, 4, 3, 0xFF, 0xFF, 0xFF, 0xFF, 7]
        );
    }

    #[test]
    fn one_based_width_survives() {
        for w in [1u32, 2, 255, 16384, crate::riff::MAX_1BASED] {
            let mut out = Vec::new();
            out.write_1based(w);
            let mut r = RiffReader::new(SliceReader::new(&out));
            assert_eq!(r.read_1based().unwrap(), w);
        }
    }
}
