use trust_dns_resolver::{
    Resolver,
    error::{ResolveError, ResolveErrorKind},
};

use super::{MxError, MxRecord, MxStatus};

/// Seam over DNS so the verifier can run against canned zones in tests.
///
/// Implementations return raw records; "no MX published" is an empty vector,
/// not an error.
pub trait LookupMx {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError>;
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        match self.mx_lookup(domain) {
            Ok(answer) => Ok(answer
                .iter()
                .map(|mx| MxRecord::new(mx.preference(), exchange_host(&mx.exchange().to_utf8())))
                .collect()),
            Err(err) if matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}

pub fn system_resolver() -> Result<Resolver, MxError> {
    Resolver::from_system_conf().map_err(MxError::resolver_init)
}

/// Resolve the mail exchangers of `domain`.
///
/// Unicode domains are converted to their ASCII form before the query. Null
/// MX entries are dropped and the rest come back in the order they should be
/// tried: lowest preference first, no duplicates.
pub fn check_mx<R: LookupMx>(resolver: &R, domain: &str) -> Result<MxStatus, MxError> {
    let ascii = ascii_domain(domain)?;
    let raw = resolver
        .lookup_mx(&ascii)
        .map_err(|source| MxError::lookup(&ascii, source))?;

    let hosts = in_try_order(raw);
    Ok(if hosts.is_empty() {
        MxStatus::NoRecords
    } else {
        MxStatus::Records(hosts)
    })
}

pub(crate) fn in_try_order(mut records: Vec<MxRecord>) -> Vec<MxRecord> {
    records.retain(|record| !record.is_null());
    records.sort_unstable();
    records.dedup();
    records
}

pub(crate) fn ascii_domain(domain: &str) -> Result<String, MxError> {
    match domain.trim() {
        "" => Err(MxError::EmptyDomain),
        name => idna::domain_to_ascii(name).map_err(|source| MxError::idna(name, source)),
    }
}

pub(crate) fn exchange_host(exchange: &str) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
impl LookupMx for crate::mx::tests::ZoneStub {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        (self.answer)(domain)
    }
}
