//! In-memory representation of one TLD definition (component A).

use hashbrown::HashMap;

use crate::error::CompileError;
use crate::status::Status;

/// One segment of a dotted name, already validated against the character class.
fn validate_segment(segment: &str, file: &str, line: u32) -> Result<(), CompileError> {
    if segment.is_empty() {
        return Err(CompileError::syntax(file, line, "empty segment"));
    }
    if segment == "*" {
        return Ok(());
    }
    if segment.starts_with('-') || segment.ends_with('-') {
        return Err(CompileError::syntax(
            file,
            line,
            format!("segment '{segment}' may not begin or end with '-'"),
        ));
    }
    if !segment
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'%')
    {
        return Err(CompileError::syntax(
            file,
            line,
            format!("segment '{segment}' contains an invalid character"),
        ));
    }
    Ok(())
}

/// A rule being built incrementally by the parser.
///
/// `segments` is ordered top-of-tree to leaf, e.g. `[uk, co]` for `co.uk`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub segments: Vec<String>,
    pub status: Option<Status>,
    pub apply_to: Option<String>,
    pub tags: HashMap<String, String>,
    /// Raised once the `[name]` header has been fully parsed; blocks further `add_segment`.
    tld_set: bool,
    status_set: bool,
    apply_to_set: bool,
    /// True when the section header that created this rule carried a leading `?`.
    pub marked_exception_syntax: bool,
    /// Dense index assigned by the emitter; `u16::MAX` until assigned.
    pub index: u16,
}

impl Rule {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            status: None,
            apply_to: None,
            tags: HashMap::new(),
            tld_set: false,
            status_set: false,
            apply_to_set: false,
            marked_exception_syntax: false,
            index: u16::MAX,
        }
    }

    pub fn add_segment(&mut self, segment: &str, file: &str, line: u32) -> Result<(), CompileError> {
        if self.tld_set {
            return Err(CompileError::syntax(
                file,
                line,
                "cannot add a segment after the rule's name is closed",
            ));
        }
        validate_segment(segment, file, line)?;
        self.segments.push(segment.to_string());
        Ok(())
    }

    /// Raises the "TLD set" flag, closing off further `add_segment` calls.
    pub fn close(&mut self) {
        self.tld_set = true;
    }

    pub fn set_status(&mut self, status: Status, file: &str, line: u32) -> Result<(), CompileError> {
        if self.status_set {
            return Err(CompileError::syntax(file, line, "status assigned twice"));
        }
        self.status = Some(status);
        self.status_set = true;
        Ok(())
    }

    pub fn set_apply_to(&mut self, name: &str, file: &str, line: u32) -> Result<(), CompileError> {
        if self.apply_to_set {
            return Err(CompileError::syntax(file, line, "apply_to assigned twice"));
        }
        self.apply_to = Some(name.to_string());
        self.apply_to_set = true;
        Ok(())
    }

    pub fn add_tag(&mut self, name: &str, value: &str) {
        self.tags.insert(name.to_string(), value.to_string());
    }

    /// Segments joined by `!`, which sorts below any valid segment character
    /// (letters, digits, `-`, `*`). Gives a parent-first alphabetic sort key
    /// and disambiguates concatenation collisions between sibling segments.
    pub fn get_inverted_name(&self) -> String {
        self.segments.join("!")
    }

    /// The rule's own label: the last element of `segments`.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_wildcard(&self) -> bool {
        self.leaf() == "*"
    }

    /// Resets the per-rule "set" flags after globals have been copied in,
    /// so that per-rule assignments may still overwrite inherited globals.
    pub fn reset_set_flags(&mut self) {
        self.status_set = false;
        self.apply_to_set = false;
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_segments_after_close() {
        let mut r = Rule::new();
        r.add_segment("uk", "t", 1).unwrap();
        r.close();
        assert!(r.add_segment("co", "t", 2).is_err());
    }

    #[test]
    fn rejects_double_status() {
        let mut r = Rule::new();
        r.set_status(Status::Valid, "t", 1).unwrap();
        assert!(r.set_status(Status::Valid, "t", 2).is_err());
    }

    #[test]
    fn inverted_name_uses_bang_separator() {
        let mut r = Rule::new();
        r.add_segment("uk", "t", 1).unwrap();
        r.add_segment("co", "t", 1).unwrap();
        assert_eq!(r.get_inverted_name(), "uk!co");
    }

    #[test]
    fn wildcard_detected_from_leaf() {
        let mut r = Rule::new();
        r.add_segment("ck", "t", 1).unwrap();
        r.add_segment("*", "t", 1).unwrap();
        assert!(r.is_wildcard());
    }

    #[test]
    fn rejects_leading_dash() {
        let mut r = Rule::new();
        assert!(r.add_segment("-co", "t", 1).is_err());
    }
}
