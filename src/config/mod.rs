//! Verifier settings: built-in defaults, TOML file overlay and helpers.

mod error;
mod file;
mod pacing;

use std::net::SocketAddr;
use std::time::Duration;

use phf::phf_set;

use crate::smtp::Envelope;
use crate::transport::SocksCredentials;

pub use error::ConfigError;
pub use file::ConfigFile;
pub use pacing::Pacing;

/// Mail hosts whose RCPT answers do not reveal mailbox existence. Matched as
/// hostname suffixes.
static TENTATIVE_PROVIDERS: phf::Set<&'static str> = phf_set! {
    "google.com",
    "googlemail.com",
    "outlook.com",
    "hotmail.com",
    "yahoodns.net",
    "icloud.com",
    "aol.com",
};

const SOFT_FAIL_CODES: [u16; 4] = [421, 450, 451, 452];

/// Upper bound on the base retry delay; backoff multiplies it by the attempt.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(3600);

/// Settings of the local anonymizing proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorOptions {
    pub enabled: bool,
    pub socks_addr: SocketAddr,
    pub control_addr: SocketAddr,
    pub control_password: Option<String>,
    pub socks_credentials: Option<SocksCredentials>,
    pub health_timeout: Duration,
    pub restart_settle: Duration,
    pub restart_command: Vec<String>,
}

impl Default for TorOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            socks_addr: SocketAddr::from(([127, 0, 0, 1], 9050)),
            control_addr: SocketAddr::from(([127, 0, 0, 1], 9051)),
            control_password: None,
            socks_credentials: None,
            health_timeout: Duration::from_secs(3),
            restart_settle: Duration::from_secs(10),
            restart_command: vec!["systemctl".into(), "restart".into(), "tor".into()],
        }
    }
}

/// Every tunable of a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierOptions {
    pub port: u16,
    pub connect_timeout: Duration,
    pub helo_domain: String,
    pub mail_from: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub soft_fail_codes: Vec<u16>,
    pub pacing: Pacing,
    pub rotate_after: u32,
    pub tentative_providers: Vec<String>,
    pub tor: TorOptions,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        let mut providers: Vec<String> =
            TENTATIVE_PROVIDERS.iter().map(|s| s.to_string()).collect();
        providers.sort();
        Self {
            port: 25,
            connect_timeout: Duration::from_secs(10),
            helo_domain: "example.com".to_string(),
            mail_from: "test@example.com".to_string(),
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            soft_fail_codes: SOFT_FAIL_CODES.to_vec(),
            pacing: Pacing::default(),
            rotate_after: 3,
            tentative_providers: providers,
            tor: TorOptions::default(),
        }
    }
}

impl VerifierOptions {
    pub fn is_soft_fail(&self, code: u16) -> bool {
        self.soft_fail_codes.contains(&code)
    }

    /// Whether `host` belongs to a provider listed as tentative.
    pub fn is_tentative_provider(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.tentative_providers.iter().any(|suffix| {
            let suffix = suffix.trim_start_matches('.').to_ascii_lowercase();
            host == suffix || host.ends_with(&format!(".{suffix}"))
        })
    }

    pub fn envelope(&self) -> Envelope {
        Envelope {
            helo_domain: self.helo_domain.clone(),
            mail_from: self.mail_from.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::invalid("retry.max_retries", "must be at least 1"));
        }
        if self.retry_delay > MAX_RETRY_DELAY {
            return Err(ConfigError::invalid(
                "retry.retry_delay_secs",
                format!("must not exceed {}", MAX_RETRY_DELAY.as_secs()),
            ));
        }
        if self.rotate_after == 0 {
            return Err(ConfigError::invalid("tor.rotate_after", "must be at least 1"));
        }
        if self.helo_domain.trim().is_empty() {
            return Err(ConfigError::invalid("smtp.helo_domain", "must not be empty"));
        }
        if !self.mail_from.contains('@') {
            return Err(ConfigError::invalid(
                "smtp.mail_from",
                format!("'{}' is not an address", self.mail_from),
            ));
        }
        if self.pacing.jitter > self.pacing.mean {
            return Err(ConfigError::invalid(
                "pacing.jitter_secs",
                "must not exceed pacing.mean_secs",
            ));
        }
        Ok(())
    }
}
