//! Candidate addresses: parsing and input-list loading.

mod domain;
mod error;
mod local;

use std::collections::HashSet;
use std::fmt;
use std::io::{self, BufRead};

pub use error::AddressError;

use domain::to_ascii_domain;
use local::is_dot_atom;

/// A `local@domain` address ready to be probed. The domain is stored in its
/// ASCII (punycode) form, which is what DNS and `RCPT TO` expect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateAddress {
    pub original: String,
    pub local: String,
    pub domain: String,
}

impl CandidateAddress {
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        let (local, domain) = match trimmed.split_once('@') {
            Some((l, d)) if !d.contains('@') => (l, d),
            _ => return Err(AddressError::MissingAt),
        };

        if local.is_empty() || local.len() > 64 {
            return Err(AddressError::LocalLength(local.len()));
        }
        if !is_dot_atom(local) {
            return Err(AddressError::LocalChars(local.to_string()));
        }
        let domain = to_ascii_domain(domain)?;

        Ok(Self {
            original: trimmed.to_string(),
            local: local.to_string(),
            domain,
        })
    }

    /// Address as sent in `RCPT TO`.
    pub fn mailbox(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }
}

impl fmt::Display for CandidateAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

/// Read one address per line. Blank lines are skipped and repeated lines are
/// kept once, in first-seen order. Lines are not validated here so that
/// malformed entries still get a result.
pub fn load_candidates<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_ascii_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    Ok(out)
}
