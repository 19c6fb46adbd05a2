//! Candidate addresses from a person's name and their company website.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::address::CandidateAddress;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermuteError {
    #[error("{0} name is empty after cleanup")]
    EmptyName(&'static str),
    #[error("{which} name '{name}' has letters with no ASCII form")]
    NonAsciiName { which: &'static str, name: String },
    #[error("cannot extract a domain from '{0}'")]
    Website(String),
}

fn website_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    // scheme, userinfo, host, then anything from port/path/query/fragment on
    PATTERN
        .get_or_init(|| Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.\-]*://)?(?:[^@/?#]*@)?([^:/?#\s]+)"))
        .as_ref()
        .ok()
}

/// Bare lower-cased domain of a website URL or domain: scheme, path, port and
/// a leading `www.` are dropped.
pub fn domain_from_website(website: &str) -> Result<String, PermuteError> {
    let trimmed = website.trim();
    let host = website_pattern()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_lowercase())
        .ok_or_else(|| PermuteError::Website(trimmed.to_string()))?;
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if !host.contains('.') || host.starts_with('.') {
        return Err(PermuteError::Website(trimmed.to_string()));
    }
    Ok(host.to_string())
}

/// Lower-cased ASCII form of a name part: accents are folded away (`José`
/// gives `jose`), spaces and punctuation other than `-` and `'` are dropped.
fn clean_name(which: &'static str, part: &str) -> Result<String, PermuteError> {
    let mut out = String::new();
    for c in part.trim().nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() || c == '-' || c == '\'' {
            out.push(c.to_ascii_lowercase());
        } else if c.is_alphanumeric() {
            return Err(PermuteError::NonAsciiName {
                which,
                name: part.trim().to_string(),
            });
        }
    }
    if out.is_empty() {
        return Err(PermuteError::EmptyName(which));
    }
    Ok(out)
}

/// The usual corporate address shapes for `first last` at `domain`:
/// `first.last`, `first`, `flast`, `firstlast`, `last.first`, `firstl`,
/// `f.last`. Duplicates are dropped in that order and every result parses as
/// a [`CandidateAddress`].
pub fn permutations(first: &str, last: &str, domain: &str) -> Result<Vec<String>, PermuteError> {
    let first = clean_name("first", first)?;
    let last = clean_name("last", last)?;
    let (Some(f), Some(l)) = (first.chars().next(), last.chars().next()) else {
        return Err(PermuteError::EmptyName("first"));
    };
    let domain = domain_from_website(domain)?;

    let locals = [
        format!("{first}.{last}"),
        first.clone(),
        format!("{f}{last}"),
        format!("{first}{last}"),
        format!("{last}.{first}"),
        format!("{first}{l}"),
        format!("{f}.{last}"),
    ];

    let mut seen = HashSet::new();
    let out = locals
        .iter()
        .map(|local| format!("{local}@{domain}"))
        .filter(|candidate| seen.insert(candidate.clone()))
        .filter(|candidate| CandidateAddress::parse(candidate).is_ok())
        .collect();
    Ok(out)
}
