//! Low-level RIFF-style chunk writer, shared by `compiler::emit`.

use super::format::{CHUNK_PREFIX_SIZE, MAGIC_RIFF, PREAMBLE_SIZE, TYPE_TLDS};

/// Accumulates `(id, payload)` chunks and assembles the final container.
#[derive(Default)]
pub struct ChunkWriter {
    chunks: Vec<([u8; 4], Vec<u8>)>,
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, id: [u8; 4], payload: Vec<u8>) {
        self.chunks.push((id, payload));
    }

    /// Writes `RIFF` + total-size + `TLDS`, then every pushed chunk in order,
    /// padding each payload to an even length per RIFF convention.
    pub fn finish(self) -> Vec<u8> {
        let mut body = Vec::new();
        for (id, payload) in &self.chunks {
            body.extend_from_slice(id);
            body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            body.extend_from_slice(payload);
            if payload.len() % 2 == 1 {
                body.push(0);
            }
        }

        let mut out = Vec::with_capacity(PREAMBLE_SIZE + body.len());
        out.extend_from_slice(&MAGIC_RIFF);
        let total_size = (body.len() + TYPE_TLDS.len()) as u32;
        out.extend_from_slice(&total_size.to_le_bytes());
        out.extend_from_slice(&TYPE_TLDS);
        out.extend_from_slice(&body);
        out
    }
}

pub fn encode_u32_array(values: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn encode_u16_array(values: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 2);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

#[allow(dead_code)]
pub const MIN_CONTAINER_SIZE: usize = PREAMBLE_SIZE + CHUNK_PREFIX_SIZE;
