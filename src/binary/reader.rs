//! Memory-mapped binary rule file loader (component G).
//!
//! Accepts either a filename or an arbitrary byte stream. Validates magic,
//! total size, and each chunk's declared length against the container, then
//! returns a read-only, typed view over the immutable bytes.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use super::format::{
    Description, Header, CHUNK_DESC, CHUNK_HEAD, CHUNK_PREFIX_SIZE, CHUNK_SLEN, CHUNK_SOFF, CHUNK_STRS, CHUNK_TAGS,
    DESC_RECORD_SIZE, MAGIC_RIFF, MAX_FILE_SIZE, PREAMBLE_SIZE, TYPE_TLDS,
};
use crate::error::LoadError;

/// Byte offsets of each recognized chunk's payload within the mapped file,
/// located once at load time.
#[derive(Debug, Clone, Copy, Default)]
struct ChunkTable {
    head: (usize, usize),
    desc: (usize, usize),
    tags: (usize, usize),
    soff: (usize, usize),
    slen: (usize, usize),
    strs: (usize, usize),
}

/// An immutable, loaded rule file. Once built, lookups against it never
/// touch the filesystem and never allocate.
pub struct LoadedRules {
    mmap: Mmap,
    header: Header,
    table: ChunkTable,
}

impl LoadedRules {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|_| LoadError::CannotOpenFile)?;
        // SAFETY: the file is not concurrently truncated/written by this process;
        // the mapping is treated as immutable read-only memory for its lifetime.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|_| LoadError::CannotReadFile)?;
        Self::from_mmap(mmap)
    }

    /// Loads from an arbitrary byte stream by staging it through a tempfile
    /// and mapping that, so the rest of the loader has a single backing type.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        use std::io::Write;
        let mut tmp = tempfile::tempfile().map_err(|_| LoadError::OutOfMemory)?;
        tmp.write_all(data).map_err(|_| LoadError::CannotReadFile)?;
        // SAFETY: `tmp` is a private, process-local anonymous file not shared
        // with any other writer.
        let mmap = unsafe { Mmap::map(&tmp) }.map_err(|_| LoadError::CannotReadFile)?;
        Self::from_mmap(mmap)
    }

    fn from_mmap(mmap: Mmap) -> Result<Self, LoadError> {
        let table = validate(&mmap)?;
        let header = Header::decode(&mmap[table.head.0..table.head.1])?;
        if !header.is_supported_version() {
            return Err(LoadError::UnsupportedVersion);
        }
        Ok(Self { mmap, header, table })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn description_count(&self) -> usize {
        (self.table.desc.1 - self.table.desc.0) / DESC_RECORD_SIZE
    }

    pub fn description(&self, idx: u16) -> Description {
        let start = self.table.desc.0 + idx as usize * DESC_RECORD_SIZE;
        Description::decode(&self.mmap[start..start + DESC_RECORD_SIZE])
    }

    pub fn string(&self, id: u16) -> Result<&str, LoadError> {
        let (soff_start, _) = self.table.soff;
        let (slen_start, _) = self.table.slen;
        let (strs_start, strs_end) = self.table.strs;

        let off_pos = soff_start + id as usize * 4;
        let len_pos = slen_start + id as usize * 2;
        if off_pos + 4 > self.table.soff.1 || len_pos + 2 > self.table.slen.1 {
            return Err(LoadError::InvalidPointer);
        }
        let offset = u32::from_le_bytes(self.mmap[off_pos..off_pos + 4].try_into().unwrap()) as usize;
        let length = u16::from_le_bytes(self.mmap[len_pos..len_pos + 2].try_into().unwrap()) as usize;

        let start = strs_start + offset;
        let end = start + length;
        if end > strs_end || start > end {
            return Err(LoadError::InvalidPointer);
        }
        std::str::from_utf8(&self.mmap[start..end]).map_err(|_| LoadError::InvalidPointer)
    }

    /// Reads the tag pair at `tags_offset + index` (pair units) from the
    /// shared `TAGS` array.
    pub fn tag_ids(&self, desc: &Description, index: u16) -> Option<(u16, u16)> {
        if index >= desc.tags_count {
            return None;
        }
        let (tags_start, tags_end) = self.table.tags;
        let unit = desc.tags_offset as usize + index as usize * 2;
        let name_pos = tags_start + unit * 4;
        let value_pos = name_pos + 4;
        if value_pos + 4 > tags_end {
            return None;
        }
        let name_id = u32::from_le_bytes(self.mmap[name_pos..name_pos + 4].try_into().unwrap());
        let value_id = u32::from_le_bytes(self.mmap[value_pos..value_pos + 4].try_into().unwrap());
        Some((name_id as u16, value_id as u16))
    }

    pub fn tag(&self, desc: &Description, index: u16) -> Option<(&str, &str)> {
        let (name_id, value_id) = self.tag_ids(desc, index)?;
        let name = self.string(name_id).ok()?;
        let value = self.string(value_id).ok()?;
        Some((name, value))
    }

    /// Binary-searches `[start, end)` for a description whose leaf label
    /// (the string named by `tld_string_id`) equals `label`, byte-for-byte.
    pub fn find_child(&self, start: u16, end: u16, label: &str) -> Result<Option<u16>, LoadError> {
        let mut lo = start as u32;
        let mut hi = end as u32;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let desc = self.description(mid as u16);
            let candidate = self.string(desc.tld_string_id)?;
            match candidate.cmp(label) {
                std::cmp::Ordering::Equal => return Ok(Some(mid as u16)),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        Ok(None)
    }
}

fn validate(bytes: &[u8]) -> Result<ChunkTable, LoadError> {
    if bytes.len() < PREAMBLE_SIZE + CHUNK_PREFIX_SIZE || bytes.len() > MAX_FILE_SIZE {
        return Err(LoadError::InvalidFileSize);
    }
    if bytes[0..4] != MAGIC_RIFF {
        return Err(LoadError::UnrecognizedFile);
    }
    let declared = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
    if declared + 8 != bytes.len() {
        return Err(LoadError::InvalidFileSize);
    }
    if bytes[8..12] != TYPE_TLDS {
        return Err(LoadError::UnrecognizedFile);
    }

    let mut table = ChunkTable::default();
    let mut seen: HashSet<[u8; 4]> = HashSet::new();
    let mut pos = PREAMBLE_SIZE;

    while pos < bytes.len() {
        if pos + CHUNK_PREFIX_SIZE > bytes.len() {
            return Err(LoadError::InvalidHunkSize);
        }
        let mut id = [0u8; 4];
        id.copy_from_slice(&bytes[pos..pos + 4]);
        let size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let payload_start = pos + CHUNK_PREFIX_SIZE;
        let payload_end = payload_start.checked_add(size).ok_or(LoadError::InvalidHunkSize)?;
        if payload_end > bytes.len() {
            return Err(LoadError::InvalidHunkSize);
        }
        if !seen.insert(id) {
            return Err(LoadError::HunkFoundTwice);
        }

        if id == CHUNK_HEAD {
            table.head = (payload_start, payload_end);
        } else if id == CHUNK_DESC {
            if size == 0 || size % DESC_RECORD_SIZE != 0 {
                return Err(LoadError::InvalidArraySize);
            }
            table.desc = (payload_start, payload_end);
        } else if id == CHUNK_TAGS {
            if size == 0 || size % 4 != 0 {
                return Err(LoadError::InvalidArraySize);
            }
            table.tags = (payload_start, payload_end);
        } else if id == CHUNK_SOFF {
            if size == 0 || size % 4 != 0 {
                return Err(LoadError::InvalidArraySize);
            }
            table.soff = (payload_start, payload_end);
        } else if id == CHUNK_SLEN {
            if size == 0 || size % 2 != 0 {
                return Err(LoadError::InvalidArraySize);
            }
            table.slen = (payload_start, payload_end);
        } else if id == CHUNK_STRS {
            table.strs = (payload_start, payload_end);
        }
        // Unknown chunk IDs are silently skipped.

        pos = payload_end + (size % 2); // chunks are padded to even length
    }

    let required = [CHUNK_HEAD, CHUNK_DESC, CHUNK_TAGS, CHUNK_SOFF, CHUNK_SLEN, CHUNK_STRS];
    if !required.iter().all(|id| seen.contains(id)) {
        return Err(LoadError::MissingHunk);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::writer::{encode_u16_array, encode_u32_array, ChunkWriter};
    use crate::binary::format::{CHUNK_DESC, CHUNK_HEAD, CHUNK_SLEN, CHUNK_SOFF, CHUNK_STRS, CHUNK_TAGS, NONE_U16};

    fn minimal_file() -> Vec<u8> {
        let header = Header {
            version_major: 1,
            version_minor: 0,
            max_level: 1,
            tld_start_offset: 0,
            tld_end_offset: 1,
            creation_timestamp: 0,
        };
        let desc = Description {
            status: 0,
            exception_level: 0,
            exception_apply_to: NONE_U16,
            start_offset: NONE_U16,
            end_offset: NONE_U16,
            tld_string_id: 1,
            tags_offset: 0,
            tags_count: 0,
        };
        let mut w = ChunkWriter::new();
        w.push_chunk(CHUNK_HEAD, header.encode().to_vec());
        w.push_chunk(CHUNK_DESC, desc.encode().to_vec());
        w.push_chunk(CHUNK_TAGS, encode_u32_array(&[0, 0]));
        w.push_chunk(CHUNK_SOFF, encode_u32_array(&[0, 0]));
        w.push_chunk(CHUNK_SLEN, encode_u16_array(&[0, 3]));
        w.push_chunk(CHUNK_STRS, b"com".to_vec());
        w.finish()
    }

    #[test]
    fn loads_minimal_valid_file() {
        let bytes = minimal_file();
        let loaded = LoadedRules::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.description_count(), 1);
        assert_eq!(loaded.string(1).unwrap(), "com");
    }

    #[test]
    fn rejects_flipped_magic() {
        let mut bytes = minimal_file();
        bytes[0] = b'X';
        assert!(matches!(LoadedRules::from_bytes(&bytes), Err(LoadError::UnrecognizedFile)));
    }

    #[test]
    fn rejects_duplicated_chunk() {
        let mut bytes = minimal_file();
        let extra = {
            let mut w = ChunkWriter::new();
            w.push_chunk(CHUNK_STRS, b"x".to_vec());
            w.finish()
        };
        // Append a second STRS chunk body (skip the 12-byte preamble/total-size refresh,
        // we only need the raw chunk bytes for this test).
        bytes.extend_from_slice(&extra[12..]);
        let total = (bytes.len() - 8) as u32;
        bytes[4..8].copy_from_slice(&total.to_le_bytes());
        assert!(matches!(LoadedRules::from_bytes(&bytes), Err(LoadError::HunkFoundTwice)));
    }

    #[test]
    fn rejects_truncated_chunk_header() {
        let bytes = minimal_file();
        let truncated = &bytes[..bytes.len() - 1];
        assert!(LoadedRules::from_bytes(truncated).is_err());
    }
}
