//! Longest-suffix match with level descent, wildcard handling, and exception
//! resolution (component H).
//!
//! The algorithm is a pure function of `(rules, domain)`: no I/O, no
//! retries, bounded work `O(log N x max_level)`. State machine per spec.md
//! §4.H: `Init -> TokenizeLabels -> FindTop -> (Descend)* -> ExceptionSweep
//! -> Resolve`. Only `Init -> TokenizeLabels` produces `NoTld`/`BadUri`;
//! `FindTop` produces `NotFound`; the rest always produce `Success`/`Invalid`
//! folded into [`LookupInfo::outcome`].

use crate::binary::format::NONE_U16;
use crate::binary::reader::LoadedRules;
use crate::error::LookupError;
use crate::status::Status;

/// Whether a resolved lookup counts as a usable public suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `status` is `Valid`, or `Exception` after jumping to `apply_to`.
    Success,
    /// `status` is a recognized but non-valid lifecycle state (deprecated,
    /// unused, reserved, proposed, infrastructure, example).
    Invalid,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Result of a successful (non-error) lookup. `tld`/`offset` borrow the
/// caller's input (`'d`); `category`/`country` borrow the loaded rule file
/// (`'r`) — the two have independent lifetimes, matching spec.md §5.
#[derive(Debug, Clone, Copy)]
pub struct LookupInfo<'d, 'r> {
    pub outcome: Outcome,
    pub status: Status,
    pub tld: &'d str,
    pub offset: usize,
    pub description_index: u16,
    pub category: Option<&'r str>,
    pub country: Option<&'r str>,
}

/// Splits `domain` on `.`, rejecting adjacent/trailing empty labels. A
/// leading empty label (`.com`) is kept as a legal "no subdomain" marker and
/// simply contributes no label of its own. Returns byte spans left to right.
fn split_labels(domain: &str) -> Result<Vec<(usize, usize)>, LookupError> {
    let bytes = domain.as_bytes();
    let mut dots = Vec::new();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'.' {
            dots.push(i);
        }
    }
    for w in dots.windows(2) {
        if w[1] == w[0] + 1 {
            return Err(LookupError::BadUri);
        }
    }
    if dots.last() == Some(&(bytes.len() - 1)) {
        return Err(LookupError::BadUri);
    }
    if dots.is_empty() {
        return Err(LookupError::NoTld);
    }

    let mut labels = Vec::with_capacity(dots.len() + 1);
    let mut seg_start = 0;
    for &dp in &dots {
        if dp > seg_start {
            labels.push((seg_start, dp));
        }
        seg_start = dp + 1;
    }
    labels.push((seg_start, bytes.len()));
    Ok(labels)
}

fn tag_value<'r>(rules: &'r LoadedRules, desc: &crate::binary::format::Description, name: &str) -> Option<&'r str> {
    for i in 0..desc.tags_count {
        if let Some((tag_name, tag_value)) = rules.tag(desc, i) {
            if tag_name == name {
                return Some(tag_value);
            }
        }
    }
    None
}

/// Performs the longest-suffix lookup described in spec.md §4.H.
pub fn lookup<'d, 'r>(rules: &'r LoadedRules, domain: &'d str) -> Result<LookupInfo<'d, 'r>, LookupError> {
    if domain.is_empty() {
        return Err(LookupError::Null);
    }
    let labels = split_labels(domain)?;

    let header = *rules.header();
    let max_level = header.max_level.max(1) as usize;
    let level_labels: &[(usize, usize)] = if labels.len() > max_level {
        &labels[labels.len() - max_level..]
    } else {
        &labels[..]
    };

    let top = *level_labels.last().expect("split_labels always yields >=1 label");
    let top_str = &domain[top.0..top.1];
    let mut current = rules
        .find_child(header.tld_start_offset, header.tld_end_offset, top_str)
        .ok()
        .flatten()
        .ok_or(LookupError::NotFound)?;
    let mut matched_start = top.0;
    let mut remaining = &level_labels[..level_labels.len() - 1];
    let mut desc = rules.description(current);

    // Descend: consume one label per step while the matched rule has
    // children and labels remain.
    while !desc.is_leaf() && !remaining.is_empty() {
        let (start, end) = (desc.start_offset, desc.end_offset);
        let first_child = rules.description(start);
        let first_label = rules.string(first_child.tld_string_id).unwrap_or("");
        let has_wildcard = first_label == "*";
        let search_start = if has_wildcard { start + 1 } else { start };

        let next = *remaining.last().unwrap();
        let next_str = &domain[next.0..next.1];
        let found = rules.find_child(search_start, end, next_str).ok().flatten();

        match found {
            Some(idx) => {
                let found_desc = rules.description(idx);
                if found_desc.status == Status::Exception.as_u8() {
                    // Exceptions are terminal and transparent: the public
                    // suffix does not advance past the ancestor we were
                    // already at; only the rule used for status/tags jumps
                    // to `apply_to`.
                    if found_desc.exception_apply_to == NONE_U16 {
                        return Err(LookupError::NotFound);
                    }
                    current = found_desc.exception_apply_to;
                    desc = rules.description(current);
                    break;
                }
                current = idx;
                desc = found_desc;
                matched_start = next.0;
                remaining = &remaining[..remaining.len() - 1];
            }
            None if has_wildcard => {
                current = start;
                desc = first_child;
                matched_start = next.0;
                remaining = &remaining[..remaining.len() - 1];
            }
            None => break,
        }
    }

    let status = Status::from_u8(desc.status).unwrap_or(Status::Undefined);
    let offset = if matched_start == 0 { 0 } else { matched_start - 1 };

    let outcome = if status.is_resolvable() { Outcome::Success } else { Outcome::Invalid };

    Ok(LookupInfo {
        outcome,
        status,
        tld: &domain[matched_start..],
        offset,
        description_index: current,
        category: tag_value(rules, &desc, "category"),
        country: tag_value(rules, &desc, "country"),
    })
}
