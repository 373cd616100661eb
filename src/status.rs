//! The closed set of per-rule lifecycle statuses.

use std::fmt;

/// Lifecycle status attached to every compiled rule.
///
/// The numeric values are the on-disk encoding used by [`crate::binary::format::Description`]
/// and must stay stable across format versions.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Valid = 0,
    Proposed = 1,
    Deprecated = 2,
    Unused = 3,
    Reserved = 4,
    Infrastructure = 5,
    Example = 6,
    Exception = 7,
    Undefined = 8,
}

impl Status {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "valid" => Self::Valid,
            "proposed" => Self::Proposed,
            "deprecated" => Self::Deprecated,
            "unused" => Self::Unused,
            "reserved" => Self::Reserved,
            "infrastructure" => Self::Infrastructure,
            "example" => Self::Example,
            "exception" => Self::Exception,
            "undefined" => Self::Undefined,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Proposed => "proposed",
            Self::Deprecated => "deprecated",
            Self::Unused => "unused",
            Self::Reserved => "reserved",
            Self::Infrastructure => "infrastructure",
            Self::Example => "example",
            Self::Exception => "exception",
            Self::Undefined => "undefined",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Valid,
            1 => Self::Proposed,
            2 => Self::Deprecated,
            3 => Self::Unused,
            4 => Self::Reserved,
            5 => Self::Infrastructure,
            6 => Self::Example,
            7 => Self::Exception,
            8 => Self::Undefined,
            _ => return None,
        })
    }

    /// True for the two statuses that make a matched rule a usable public suffix.
    pub fn is_resolvable(self) -> bool {
        matches!(self, Self::Valid | Self::Exception)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
