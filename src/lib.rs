//! A public-suffix (TLD) compiler and longest-match lookup engine.
//!
//! Two halves share one binary format: the [`compiler`] ingests a directory
//! of INI-style rule source files (status, tags, exceptions, apply-to
//! references, wildcards — one rule per section, see [`compiler::parser`])
//! and emits a compact chunked rule file; [`lookup`] loads that file and,
//! given a lowercase domain, returns the longest matching public suffix
//! together with its `category`/`country` tags.
//!
//! # Quick start
//!
//! ```no_run
//! use tldrs::{load, lookup, Outcome};
//!
//! load(None, true).unwrap();
//! let rules = tldrs::get_loaded().unwrap();
//! let info = lookup(&rules, "www.example.com").unwrap();
//! assert_eq!(info.outcome, Outcome::Success);
//! assert_eq!(info.tld, "com");
//! ```
//!
//! Loading is not thread-safe (§5): finish all loading before any lookup
//! thread starts. Once loaded, lookups are lock-free reads over immutable,
//! memory-mapped bytes.

pub mod binary;
pub mod compiler;
pub mod enumerate;
pub mod error;
mod global;
pub mod lookup;
pub mod status;
pub mod validate;

pub use binary::reader::LoadedRules;
pub use compiler::compile_directory;
pub use enumerate::{Enumerated, Enumerator};
pub use error::{CompileError, LoadError, LookupError};
pub use global::{free_loaded, get_loaded, load, load_if_absent};
pub use lookup::{lookup, LookupInfo, Outcome};
pub use status::Status;
pub use validate::{extract_addresses, lookup_uri, Address, UriFlags, UriLookupInfo};

/// Lowercases and percent-encodes non-ASCII bytes, mirroring the external
/// normalizer the lookup engine assumes has already run on its input
/// (spec.md §1 Non-goals: Unicode IDN decoding is out of scope here — a
/// domain containing non-ASCII bytes is passed through percent-escaped).
pub fn lowercase(domain: &str) -> String {
    if domain.is_ascii() {
        return domain.to_ascii_lowercase();
    }
    let mut out = String::with_capacity(domain.len());
    for b in domain.as_bytes() {
        if b.is_ascii() {
            out.push((*b as char).to_ascii_lowercase());
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Maps a [`Status`] to its canonical lowercase name, as used in rule source
/// files and JSON/C side output.
pub fn status_to_string(status: Status) -> &'static str {
    status.as_str()
}

/// Number of tags carried by the rule a [`LookupInfo`] resolved to. Always 0
/// or 1 for `category`/`country` plus any opaque tags set on the rule; exact
/// count requires the originating [`LoadedRules`] since `LookupInfo` only
/// keeps the two privileged tag values inline.
pub fn tag_count(rules: &LoadedRules, info: &LookupInfo) -> usize {
    rules.description(info.description_index).tags_count as usize
}

/// Fetches the `index`-th `(name, value)` tag pair of the rule a
/// [`LookupInfo`] resolved to.
pub fn get_tag<'r>(rules: &'r LoadedRules, info: &LookupInfo<'_, 'r>, index: u16) -> Option<(&'r str, &'r str)> {
    let desc = rules.description(info.description_index);
    rules.tag(&desc, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::emit::emit;
    use crate::compiler::rule::Rule;

    fn sample_rules() -> LoadedRules {
        let mut r = Rule::new();
        r.add_segment("com", "t", 1).unwrap();
        r.close();
        r.set_status(Status::Valid, "t", 1).unwrap();
        r.add_tag("country", "none");
        let bytes = emit(vec![r], 0).unwrap();
        LoadedRules::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn lowercase_percent_encodes_non_ascii() {
        assert_eq!(lowercase("Example.COM"), "example.com");
        assert_eq!(lowercase("café"), "caf%C3%A9");
    }

    #[test]
    fn status_to_string_matches_rule_source_spelling() {
        assert_eq!(status_to_string(Status::Deprecated), "deprecated");
    }

    #[test]
    fn tag_helpers_read_through_the_loaded_file() {
        let rules = sample_rules();
        let info = lookup(&rules, "example.com").unwrap();
        assert_eq!(tag_count(&rules, &info), 2); // category defaults from country
        let tag = get_tag(&rules, &info, 0);
        assert!(tag.is_some());
    }
}
