//! URI syntactic validator: `scheme://[user[:pass]@]host[:port]/path?query#frag`
//! (component J, URI half). Checks structure, then calls into the lookup
//! engine on the extracted, percent-decoded host.

use percent_encoding::percent_decode_str;

use crate::binary::reader::LoadedRules;
use crate::error::LookupError;
use crate::lookup::{lookup, Outcome};
use crate::status::Status;

#[derive(Debug, Clone, Copy, Default)]
pub struct UriFlags {
    pub ascii_only: bool,
    pub no_spaces: bool,
}

/// Result of a URI lookup. `tld` is an owned, decoded copy rather than a
/// borrow of the caller's buffer: once the host has been percent-decoded the
/// match no longer lines up byte-for-byte with the original URI text.
#[derive(Debug, Clone)]
pub struct UriLookupInfo<'r> {
    pub outcome: Outcome,
    pub status: Status,
    pub tld: String,
    pub description_index: u16,
    pub category: Option<&'r str>,
    pub country: Option<&'r str>,
}

fn scheme_allowed(scheme: &str, whitelist: &str) -> bool {
    whitelist
        .split(',')
        .map(str::trim)
        .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(scheme))
}

/// Parses `uri`, validates it against `flags`, and looks up the host's
/// public suffix. Parsing failures and lookup failures both surface as
/// [`LookupError`].
pub fn lookup_uri<'r>(
    rules: &'r LoadedRules,
    uri: &str,
    schemes: &str,
    flags: UriFlags,
) -> Result<UriLookupInfo<'r>, LookupError> {
    if uri.is_empty() {
        return Err(LookupError::Null);
    }
    if uri.bytes().any(|b| b.is_ascii_control()) {
        return Err(LookupError::BadUri);
    }
    if flags.ascii_only && !uri.is_ascii() {
        return Err(LookupError::BadUri);
    }
    if flags.no_spaces && uri.contains(' ') {
        return Err(LookupError::BadUri);
    }

    let (scheme, rest) = uri.split_once("://").ok_or(LookupError::BadUri)?;
    if scheme.is_empty() || !scheme.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.') {
        return Err(LookupError::BadUri);
    }
    if !scheme_allowed(scheme, schemes) {
        return Err(LookupError::BadUri);
    }

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    if authority.matches('@').count() > 1 {
        return Err(LookupError::BadUri);
    }
    let (userinfo, hostport) = match authority.split_once('@') {
        Some((u, h)) => (Some(u), h),
        None => (None, authority),
    };
    if let Some(userinfo) = userinfo {
        match userinfo.split_once(':') {
            Some((user, pass)) => {
                if user.is_empty() || pass.is_empty() {
                    return Err(LookupError::BadUri);
                }
            }
            None => {
                if userinfo.is_empty() {
                    return Err(LookupError::BadUri);
                }
            }
        }
    }

    let (host, port) = match hostport.rsplit_once(':') {
        Some((h, p)) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => (h, Some(p)),
        Some((h, p)) if p.is_empty() => {
            let _ = h;
            return Err(LookupError::BadUri);
        }
        Some((h, p)) if !p.bytes().all(|b| b.is_ascii_digit()) => {
            // Not a port, e.g. an IPv6 literal's last colon group — treat
            // the whole thing as the host.
            let _ = p;
            (hostport, None)
        }
        _ => (hostport, None),
    };
    let _ = port;
    if host.is_empty() {
        return Err(LookupError::BadUri);
    }

    if tail.matches('?').count() > 1 {
        return Err(LookupError::BadUri);
    }
    if let Some(q_pos) = tail.find('?') {
        let path = &tail[..q_pos];
        if path.contains('&') {
            return Err(LookupError::BadUri);
        }
        let query = tail[q_pos + 1..].split('#').next().unwrap_or("");
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let key = pair.split('=').next().unwrap_or("");
            if key.is_empty() {
                return Err(LookupError::BadUri);
            }
        }
    }

    let decoded = percent_decode_str(host)
        .decode_utf8()
        .map_err(|_| LookupError::BadUri)?
        .into_owned();
    let decoded = decoded.to_ascii_lowercase();

    let info = lookup(rules, &decoded)?;
    Ok(UriLookupInfo {
        outcome: info.outcome,
        status: info.status,
        tld: info.tld.to_string(),
        description_index: info.description_index,
        category: info.category,
        country: info.country,
    })
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
    fn parses_a_well_formed_https_uri() {
        let rules = sample_rules();
        let info = lookup_uri(&rules, "https://example.com/path?q=1", "*", UriFlags::default()).unwrap();
        assert_eq!(info.outcome, Outcome::Success);
        assert_eq!(info.tld, "com");
    }

    #[test]
    fn rejects_scheme_outside_whitelist() {
        let rules = sample_rules();
        assert!(lookup_uri(&rules, "ftp://example.com/", "http,https", UriFlags::default()).is_err());
    }

    #[test]
    fn rejects_double_at() {
        let rules = sample_rules();
        assert!(lookup_uri(&rules, "https://a@b@example.com/", "*", UriFlags::default()).is_err());
    }

    #[test]
    fn rejects_empty_query_key() {
        let rules = sample_rules();
        assert!(lookup_uri(&rules, "https://example.com/?=1", "*", UriFlags::default()).is_err());
    }

    #[test]
    fn rejects_ampersand_before_question_mark() {
        let rules = sample_rules();
        assert!(lookup_uri(&rules, "https://example.com/a&b?x=1", "*", UriFlags::default()).is_err());
    }

    #[test]
    fn decodes_percent_encoded_host() {
        let rules = sample_rules();
        let info = lookup_uri(&rules, "https://example%2ecom/", "*", UriFlags::default()).unwrap();
        assert_eq!(info.tld, "com");
    }

    #[test]
    fn accepts_a_host_longer_than_256_bytes() {
        let rules = sample_rules();
        let long_label = "a".repeat(300);
        let uri = format!("https://{long_label}.example.com/");
        let info = lookup_uri(&rules, &uri, "*", UriFlags::default()).unwrap();
        assert_eq!(info.outcome, Outcome::Success);
        assert_eq!(info.tld, "com");
    }
}
