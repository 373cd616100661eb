//! RFC 5322 address-list extraction (component J, email half). Splits one
//! address-list field into individual mailboxes — honoring quoted strings,
//! parenthesized comments, domain literals, and groups ending in `;` — then
//! validates each mailbox's domain against the lookup engine.

use crate::binary::reader::LoadedRules;
use crate::lookup::lookup;

/// One mailbox extracted from an address-list field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub group: Option<String>,
    pub original: String,
    pub fullname: Option<String>,
    pub user: String,
    pub domain: String,
    pub email_only: String,
    pub canonical: String,
}

/// Splits `field` on top-level `,`/`;` separators, treating `"..."`, `(...)`,
/// and `[...]` as opaque spans that may themselves nest (comments) or
/// contain separators (quoted strings, domain literals).
fn split_top_level(field: &str) -> Vec<(Option<String>, String)> {
    let mut entries = Vec::new();
    let mut depth_paren = 0i32;
    let mut in_quotes = false;
    let mut in_bracket = false;
    let mut start = 0usize;
    let mut current_group: Option<String> = None;
    let bytes: Vec<char> = field.chars().collect();

    for (i, &c) in bytes.iter().enumerate() {
        match c {
            '"' if depth_paren == 0 && !in_bracket => in_quotes = !in_quotes,
            '(' if !in_quotes && !in_bracket => depth_paren += 1,
            ')' if !in_quotes && !in_bracket => depth_paren = (depth_paren - 1).max(0),
            '[' if !in_quotes && depth_paren == 0 => in_bracket = true,
            ']' if !in_quotes && depth_paren == 0 => in_bracket = false,
            ':' if !in_quotes && !in_bracket && depth_paren == 0 => {
                let name: String = bytes[start..i].iter().collect();
                current_group = Some(name.trim().to_string());
                start = i + 1;
            }
            ',' if !in_quotes && !in_bracket && depth_paren == 0 => {
                let piece: String = bytes[start..i].iter().collect();
                if !piece.trim().is_empty() {
                    entries.push((current_group.clone(), piece.trim().to_string()));
                }
                start = i + 1;
            }
            ';' if !in_quotes && !in_bracket && depth_paren == 0 => {
                let piece: String = bytes[start..i].iter().collect();
                if !piece.trim().is_empty() {
                    entries.push((current_group.clone(), piece.trim().to_string()));
                }
                start = i + 1;
                current_group = None;
            }
            _ => {}
        }
    }
    let tail: String = bytes[start..].iter().collect();
    if !tail.trim().is_empty() {
        entries.push((current_group, tail.trim().to_string()));
    }
    entries
}

/// Parses one mailbox, either `user@domain` or `"Full Name" <user@domain>`.
fn parse_mailbox(group: Option<String>, original: &str) -> Option<Address> {
    let trimmed = original.trim();
    let (fullname, addr_spec) = match (trimmed.find('<'), trimmed.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            let name = trimmed[..open].trim().trim_matches('"').trim();
            let name = if name.is_empty() { None } else { Some(name.to_string()) };
            (name, trimmed[open + 1..close].trim())
        }
        _ => (None, trimmed),
    };

    let (user, domain) = addr_spec.rsplit_once('@')?;
    if user.is_empty() || domain.is_empty() {
        return None;
    }
    let user = user.trim().trim_matches('"').to_string();
    let domain = domain.trim().trim_start_matches('[').trim_end_matches(']').to_string();
    let email_only = format!("{user}@{domain}");

    Some(Address {
        group,
        original: trimmed.to_string(),
        fullname,
        user,
        domain,
        email_only: email_only.clone(),
        canonical: email_only,
    })
}

/// Extracts every mailbox from `field`, lowercases each domain, and keeps
/// only the ones whose domain resolves to a usable public suffix.
pub fn extract_addresses(rules: &LoadedRules, field: &str) -> Vec<Address> {
    split_top_level(field)
        .into_iter()
        .filter_map(|(group, piece)| parse_mailbox(group, &piece))
        .map(|mut addr| {
            addr.domain = addr.domain.to_ascii_lowercase();
            addr.email_only = format!("{}@{}", addr.user, addr.domain);
            addr.canonical = addr.email_only.clone();
            addr
        })
        .filter(|addr| lookup(rules, &addr.domain).map(|info| info.outcome.is_success()).unwrap_or(false))
        .collect()
}
