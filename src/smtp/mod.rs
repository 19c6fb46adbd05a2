//! Minimal SMTP client used for RCPT probing.

mod error;
mod prober;
pub(crate) mod session;
mod types;

pub use error::ProbeError;
pub use prober::{Envelope, HostProber, SmtpProber};
pub use types::SmtpReply;
