//! Depth-first enumerator over every compiled rule (component I).
//!
//! Walks the `DESC` table the way it was written: children occupy a
//! contiguous range under their parent, so a small stack of `(index, end)`
//! pairs per depth is enough state to drive the whole traversal. Restartable
//! by calling [`Enumerator::reset`].

use crate::binary::reader::LoadedRules;
use crate::error::LookupError;
use crate::status::Status;

/// One rule surfaced by the enumerator.
#[derive(Debug, Clone)]
pub struct Enumerated {
    /// Dotted name in normal (leaf-first) domain notation, with a leading `.`.
    pub name: String,
    pub status: Status,
    pub description_index: u16,
}

/// Decodes `%HH` escapes in an otherwise-ASCII label. Invalid escapes are
/// passed through as literal bytes rather than rejected — the enumerator
/// only ever walks bytes this crate itself wrote.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

pub struct Enumerator<'r> {
    rules: &'r LoadedRules,
    /// `(current index, end)` per depth, root first.
    levels: Vec<(u16, u16)>,
    /// Decoded labels of every depth above the current frontier.
    ancestor_labels: Vec<String>,
    finished: bool,
}

impl<'r> Enumerator<'r> {
    pub fn new(rules: &'r LoadedRules) -> Self {
        let mut e = Self {
            rules,
            levels: Vec::new(),
            ancestor_labels: Vec::new(),
            finished: false,
        };
        e.reset();
        e
    }

    /// Rewinds the iterator to the start of the top-level range.
    pub fn reset(&mut self) {
        let header = *self.rules.header();
        self.levels = vec![(header.tld_start_offset, header.tld_end_offset)];
        self.ancestor_labels.clear();
        self.finished = false;
    }

    /// Returns the next rule, or `NOT_FOUND` once the top level is exhausted.
    pub fn next(&mut self) -> Result<Enumerated, LookupError> {
        loop {
            if self.finished {
                return Err(LookupError::NotFound);
            }
            let (idx, end) = *self.levels.last().expect("levels is never empty while not finished");
            if idx >= end {
                self.levels.pop();
                if self.levels.is_empty() {
                    self.finished = true;
                    return Err(LookupError::NotFound);
                }
                self.ancestor_labels.pop();
                let parent = self.levels.len() - 1;
                self.levels[parent].0 += 1;
                continue;
            }

            let desc = self.rules.description(idx);
            let raw = self.rules.string(desc.tld_string_id).map_err(|_| LookupError::NotFound)?;
            let label = percent_decode(raw);

            let mut parts: Vec<&str> = self.ancestor_labels.iter().map(String::as_str).collect();
            parts.push(&label);
            parts.reverse();
            let name = format!(".{}", parts.join("."));
            let status = Status::from_u8(desc.status).unwrap_or(Status::Undefined);
            let entry = Enumerated {
                name,
                status,
                description_index: idx,
            };

            if desc.is_leaf() {
                let here = self.levels.len() - 1;
                self.levels[here].0 += 1;
            } else {
                self.ancestor_labels.push(label);
                self.levels.push((desc.start_offset, desc.end_offset));
            }
            return Ok(entry);
        }
    }
}
