//! The `RIFF` list chunk that wraps a whole file.

use alloc::vec::Vec;

use super::{children_size, write_chunk, Chunk};
use crate::vec_writer::VecWriter;

/// Form type of a WebP file.
pub const WEBP_FORM: [u8; 4] = *b"WEBP";

/// A `RIFF` list: a form type followed by child chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiffChunk {
    form_type: [u8; 4],
    children: Vec<Chunk>,
}

impl RiffChunk {
    /// A list with an arbitrary form type.
    pub fn new(form_type: [u8; 4], children: Vec<Chunk>) -> Self {
        Self {
            form_type,
            children,
        }
    }

    /// A `RIFF`/`WEBP` envelope.
    pub fn webp(children: Vec<Chunk>) -> Self {
        Self::new(WEBP_FORM, children)
    }

    /// The form type written after the length field.
    pub fn form_type(&self) -> [u8; 4] {
        self.form_type
    }

    /// Whether the form type is `WEBP`.
    pub fn is_webp(&self) -> bool {
        self.form_type == WEBP_FORM
    }

    /// Child chunks in stored order.
    pub fn children(&self) -> &[Chunk] {
        &self.children
    }

    /// Take the children.
    pub fn into_children(self) -> Vec<Chunk> {
        self.children
    }

    /// Form type plus framed children.
    pub fn payload_size(&self) -> u64 {
        4 + children_size(&self.children)
    }

    pub(crate) fn write_payload(&self, out: &mut Vec<u8>) {
        out.write_fourcc(self.form_type);
        for child in &self.children {
            child.write_to(out);
        }
    }

    /// Serialize the whole file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload_size = self.payload_size();
        let mut out = Vec::with_capacity(8 + payload_size as usize + 1);
        write_chunk(&mut out, *b"RIFF", payload_size, |out| {
            self.write_payload(out)
        });
        out
    }
}
