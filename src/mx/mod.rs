//! DNS MX resolution and the per-run MX cache.
//!
//! Lookups go through the [`LookupMx`] seam; [`MxCache::resolve`] is what the
//! verifier calls for each candidate domain.

mod cache;
mod error;
mod resolver;
mod types;

pub use cache::MxCache;
pub use error::MxError;
pub use resolver::{LookupMx, check_mx, system_resolver};
pub use types::{MxRecord, MxStatus};
