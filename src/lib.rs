#![forbid(unsafe_code)]
//! mailprobe_lib: vérification de boîtes aux lettres par sonde SMTP (RCPT TO),
//! avec résolution MX en cache et sortie via proxy SOCKS/Tor.

pub mod address;
pub mod anonymizer;
pub mod config;
pub mod logging;
pub mod mx;
pub mod pause;
pub mod permute;
pub mod report;
pub mod smtp;
pub mod transport;
pub mod types;
pub mod verifier;

pub use address::{AddressError, CandidateAddress, load_candidates};
pub use anonymizer::{Anonymizer, AnonymizerError, NoAnonymizer, TorController};
pub use config::{ConfigError, ConfigFile, Pacing, TorOptions, VerifierOptions};
pub use mx::{LookupMx, MxCache, MxError, MxRecord, MxStatus, check_mx, system_resolver};
pub use pause::{Pause, ThreadPause};
pub use permute::{PermuteError, domain_from_website, permutations};
pub use report::{ReportError, ReportFormat, write_report, write_verified};
pub use smtp::{Envelope, HostProber, ProbeError, SmtpProber, SmtpReply};
pub use transport::{Connector, DirectConnector, Socks5Connector, SocksCredentials};
pub use types::{ProbeOutcome, ProbeResult, RunSummary, VerifiedSet};
pub use verifier::VerifierSession;

#[cfg(test)]
mod testing;
