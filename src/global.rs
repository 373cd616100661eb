//! Process-wide "current rules" slot and the load/free entry points that
//! manage it (spec.md §5, §6).
//!
//! Loading is not thread-safe: callers must finish loading before any
//! lookup thread starts. [`load_if_absent`] exists for lazy first-use but is
//! itself racy, as documented — it assumes external serialization, same as
//! the library it mirrors. Once loaded, the file is immutable and lookups
//! against it are lock-free (the `Arc` clone taken by [`get_loaded`] is the
//! only synchronized operation on the hot path).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::binary::reader::LoadedRules;
use crate::error::LoadError;

static CURRENT: Lazy<RwLock<Option<Arc<LoadedRules>>>> = Lazy::new(|| RwLock::new(None));

/// System-wide fallback search path, tried after an explicit path and before
/// the embedded fallback.
const SYSTEM_PATH: &str = "/var/lib/libtld/tlds.tld";
/// Secondary system fallback.
const SYSTEM_PATH_ALT: &str = "/usr/share/libtld/tlds.tld";

/// A tiny built-in rule set, compiled in-memory on first use when no file is
/// found on disk and `allow_fallback` is set. Stands in for an embedded
/// binary blob: enough to keep `load`/`lookup` usable without shipping a
/// prebuilt `.tld` file alongside the crate.
const EMBEDDED_SOURCE: &str = "\
[com]\nstatus = valid\ntag/country = none\n\n\
[net]\nstatus = valid\ntag/country = none\n\n\
[org]\nstatus = valid\ntag/country = none\n";

fn compile_embedded() -> Result<Vec<u8>, LoadError> {
    let mut parser = crate::compiler::Parser::new();
    parser
        .parse_file("<embedded>", EMBEDDED_SOURCE)
        .map_err(|_| LoadError::CannotReadFile)?;
    crate::compiler::emit::emit(parser.rules, 0).map_err(|_| LoadError::CannotReadFile)
}

/// Loads a compiled rule file, installing it as the current process-wide
/// rules. `path` overrides the default search order
/// (`SYSTEM_PATH` -> `SYSTEM_PATH_ALT` -> embedded, when `allow_fallback`).
pub fn load(path: Option<&Path>, allow_fallback: bool) -> Result<(), LoadError> {
    let loaded = if let Some(path) = path {
        LoadedRules::open(path)?
    } else {
        load_from_search_path(allow_fallback)?
    };
    *CURRENT.write() = Some(Arc::new(loaded));
    Ok(())
}

fn load_from_search_path(allow_fallback: bool) -> Result<LoadedRules, LoadError> {
    for candidate in [SYSTEM_PATH, SYSTEM_PATH_ALT] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return LoadedRules::open(&path);
        }
    }
    if allow_fallback {
        let bytes = compile_embedded()?;
        return LoadedRules::from_bytes(&bytes);
    }
    Err(LoadError::CannotOpenFile)
}

/// Loads only if nothing is currently installed. Racy by design — callers
/// serializing their own first-use check may call this concurrently, but
/// the write itself is not atomic with the read of [`is_loaded`].
pub fn load_if_absent(path: Option<&Path>, allow_fallback: bool) -> Result<(), LoadError> {
    if is_loaded() {
        return Ok(());
    }
    load(path, allow_fallback)
}

/// Drops the current rules. Any `Arc<LoadedRules>` clones obtained via
/// [`get_loaded`] before this call remain valid for their own lifetime; only
/// the process-wide slot is cleared.
pub fn free_loaded() {
    *CURRENT.write() = None;
}

pub fn is_loaded() -> bool {
    CURRENT.read().is_some()
}

/// Returns a clone of the current rules, if any are loaded.
pub fn get_loaded() -> Option<Arc<LoadedRules>> {
    CURRENT.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unloaded() {
        free_loaded();
        assert!(!is_loaded());
        assert!(get_loaded().is_none());
    }

    #[test]
    fn load_if_absent_falls_back_to_embedded_rules() {
        free_loaded();
        load_if_absent(None, true).unwrap();
        assert!(is_loaded());
        let rules = get_loaded().unwrap();
        let info = crate::lookup::lookup(&rules, "example.com").unwrap();
        assert_eq!(info.outcome, crate::lookup::Outcome::Success);
        free_loaded();
    }

    #[test]
    fn load_without_fallback_and_no_system_file_fails() {
        free_loaded();
        assert!(load(None, false).is_err());
        assert!(!is_loaded());
    }
}
