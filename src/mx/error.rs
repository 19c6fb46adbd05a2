use std::io;

use thiserror::Error;
use trust_dns_resolver::error::ResolveError;

/// DNS-side failure for one candidate domain. The verifier turns every
/// variant into a `NoMx` outcome; none of them stops a run.
#[derive(Debug, Error)]
pub enum MxError {
    #[error("empty domain")]
    EmptyDomain,
    #[error("{domain}: not a valid IDNA domain")]
    IdnaConversion {
        domain: String,
        #[source]
        source: idna::Errors,
    },
    #[error("system resolver unavailable: {source}")]
    ResolverInit {
        #[source]
        source: io::Error,
    },
    #[error("MX lookup for {domain} failed: {source}")]
    Lookup {
        domain: String,
        #[source]
        source: ResolveError,
    },
}

impl MxError {
    pub(crate) fn idna(domain: &str, source: idna::Errors) -> Self {
        Self::IdnaConversion {
            domain: domain.to_string(),
            source,
        }
    }

    pub(crate) fn resolver_init(source: io::Error) -> Self {
        Self::ResolverInit { source }
    }

    pub(crate) fn lookup(domain: &str, source: ResolveError) -> Self {
        Self::Lookup {
            domain: domain.to_string(),
            source,
        }
    }
}
