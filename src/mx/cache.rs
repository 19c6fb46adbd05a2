use std::collections::HashMap;

use tracing::{info, warn};

use super::{LookupMx, MxRecord, MxStatus, resolver};

/// Per-run memo of MX lookups, keyed by ASCII domain.
///
/// Entries are never invalidated. Failed lookups are cached as empty so a
/// broken domain costs a single DNS round-trip per run.
#[derive(Debug, Default)]
pub struct MxCache {
    entries: HashMap<String, Vec<MxRecord>>,
}

impl MxCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exchange hosts for `domain` in ascending preference order. Returns an
    /// empty slice when the domain has no MX or the lookup failed.
    pub fn resolve<R: LookupMx>(&mut self, resolver: &R, domain: &str) -> &[MxRecord] {
        let key = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        self.entries
            .entry(key)
            .or_insert_with_key(|key| lookup(resolver, key))
            .as_slice()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn lookup<R: LookupMx>(resolver: &R, domain: &str) -> Vec<MxRecord> {
    let status = match resolver::check_mx(resolver, domain) {
        Ok(status) => status,
        Err(err) => {
            warn!(target: "mailprobe", "{err}");
            return Vec::new();
        }
    };
    if status.records().is_empty() {
        warn!(target: "mailprobe", "MX {domain} -> no records");
    } else {
        let listed: Vec<String> = status.records().iter().map(ToString::to_string).collect();
        info!(target: "mailprobe", "MX {domain} -> {}", listed.join(", "));
    }
    status.into_records()
}
