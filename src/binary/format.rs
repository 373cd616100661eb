//! On-disk layout constants and the `HEAD`/`DESC` record codecs.
//!
//! The container is a RIFF-style chunked file: `RIFF` + total-size(u32 LE) +
//! `TLDS`, followed by chunks of `id:[u8;4] + size:u32(LE) + payload`, each
//! padded to an even length. Chunks may appear in any order; unknown chunk
//! IDs are skipped. All multi-byte fields are little-endian.

use crate::error::LoadError;

pub const MAGIC_RIFF: [u8; 4] = *b"RIFF";
pub const TYPE_TLDS: [u8; 4] = *b"TLDS";

pub const CHUNK_HEAD: [u8; 4] = *b"HEAD";
pub const CHUNK_DESC: [u8; 4] = *b"DESC";
pub const CHUNK_TAGS: [u8; 4] = *b"TAGS";
pub const CHUNK_SOFF: [u8; 4] = *b"SOFF";
pub const CHUNK_SLEN: [u8; 4] = *b"SLEN";
pub const CHUNK_STRS: [u8; 4] = *b"STRS";

/// Bytes that make up the `RIFF....TLDS` container preamble.
pub const PREAMBLE_SIZE: usize = 12;
/// `id + size` prefix of every chunk.
pub const CHUNK_PREFIX_SIZE: usize = 8;

/// The loader's accepted file size is bounded to cap memory use.
pub const MAX_FILE_SIZE: usize = 1 << 20;

pub const SUPPORTED_VERSION_MAJOR: u16 = 1;
pub const SUPPORTED_VERSION_MINOR: u16 = 0;

/// Leaf / "no range" sentinel used by `start_offset`, `end_offset`, string
/// IDs that are absent, and `exception_apply_to` when there is no exception.
pub const NONE_U16: u16 = 0xFFFF;

pub const DESC_RECORD_SIZE: usize = 14;
pub const HEAD_SIZE: usize = 18;

/// Decoded `HEAD` chunk payload.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub version_major: u16,
    pub version_minor: u16,
    pub max_level: u8,
    pub tld_start_offset: u16,
    pub tld_end_offset: u16,
    pub creation_timestamp: u64,
}

impl Header {
    pub fn encode(&self) -> [u8; HEAD_SIZE] {
        let mut out = [0u8; HEAD_SIZE];
        out[0..2].copy_from_slice(&self.version_major.to_le_bytes());
        out[2..4].copy_from_slice(&self.version_minor.to_le_bytes());
        out[4] = self.max_level;
        out[5] = 0; // reserved
        out[6..8].copy_from_slice(&self.tld_start_offset.to_le_bytes());
        out[8..10].copy_from_slice(&self.tld_end_offset.to_le_bytes());
        out[10..18].copy_from_slice(&self.creation_timestamp.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() != HEAD_SIZE {
            return Err(LoadError::InvalidStructureSize);
        }
        Ok(Self {
            version_major: u16::from_le_bytes([bytes[0], bytes[1]]),
            version_minor: u16::from_le_bytes([bytes[2], bytes[3]]),
            max_level: bytes[4],
            tld_start_offset: u16::from_le_bytes([bytes[6], bytes[7]]),
            tld_end_offset: u16::from_le_bytes([bytes[8], bytes[9]]),
            creation_timestamp: u64::from_le_bytes(bytes[10..18].try_into().unwrap()),
        })
    }

    pub fn is_supported_version(&self) -> bool {
        self.version_major == SUPPORTED_VERSION_MAJOR && self.version_minor <= SUPPORTED_VERSION_MINOR
    }
}

/// Decoded `DESC` record: one per rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct Description {
    pub status: u8,
    pub exception_level: u8,
    pub exception_apply_to: u16,
    pub start_offset: u16,
    pub end_offset: u16,
    pub tld_string_id: u16,
    pub tags_offset: u16,
    pub tags_count: u16,
}

impl Description {
    pub fn encode(&self) -> [u8; DESC_RECORD_SIZE] {
        let mut out = [0u8; DESC_RECORD_SIZE];
        out[0] = self.status;
        out[1] = self.exception_level;
        out[2..4].copy_from_slice(&self.exception_apply_to.to_le_bytes());
        out[4..6].copy_from_slice(&self.start_offset.to_le_bytes());
        out[6..8].copy_from_slice(&self.end_offset.to_le_bytes());
        out[8..10].copy_from_slice(&self.tld_string_id.to_le_bytes());
        out[10..12].copy_from_slice(&self.tags_offset.to_le_bytes());
        out[12..14].copy_from_slice(&self.tags_count.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), DESC_RECORD_SIZE);
        Self {
            status: bytes[0],
            exception_level: bytes[1],
            exception_apply_to: u16::from_le_bytes([bytes[2], bytes[3]]),
            start_offset: u16::from_le_bytes([bytes[4], bytes[5]]),
            end_offset: u16::from_le_bytes([bytes[6], bytes[7]]),
            tld_string_id: u16::from_le_bytes([bytes[8], bytes[9]]),
            tags_offset: u16::from_le_bytes([bytes[10], bytes[11]]),
            tags_count: u16::from_le_bytes([bytes[12], bytes[13]]),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.start_offset == NONE_U16
    }
}
