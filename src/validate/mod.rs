//! Boundary-only collaborators that call into the lookup engine after their
//! own syntactic checks (component J). Only the boundary is specified: URI
//! structural validation and RFC 5322 address-list splitting are intentionally
//! simplified relative to a full implementation of either grammar.

pub mod email;
pub mod uri;

pub use email::{extract_addresses, Address};
pub use uri::{lookup_uri, UriFlags, UriLookupInfo};
