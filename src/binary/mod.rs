//! Chunked binary rule file: constants/codecs, a low-level chunk writer used
//! by the compiler's emitter, and the memory-mapped loader.
//!
//! ```text
//! RIFF <size> TLDS
//!   HEAD  version, max_level, top-level range, creation timestamp
//!   DESC  one fixed-size record per rule, deepest level first
//!   TAGS  merged (name_id, value_id) superstring, u32 units
//!   SOFF  string offset table
//!   SLEN  string length table
//!   STRS  string blob
//! ```

pub mod format;
pub mod reader;
pub mod writer;

pub use format::*;
pub use reader::LoadedRules;
pub use writer::ChunkWriter;
