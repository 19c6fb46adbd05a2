use std::io;

use thiserror::Error;

/// Failure of a single probe attempt against one exchange host.
///
/// Transport failures and non-accepting RCPT codes share this type so the
/// retry loop can reason about them uniformly.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no MX record for {domain}")]
    NoMxRecord { domain: String },
    #[error("connection to {host} failed: {source}")]
    ConnectFailure {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("connection to {host} dropped: {source}")]
    ProtocolDisconnect {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("protocol error with {host}: {message}")]
    Protocol { host: String, message: String },
    #[error("{host} soft-failed with {code} {message}")]
    SoftFailCode {
        host: String,
        code: u16,
        message: String,
    },
    #[error("{host} rejected with {code} {message}")]
    HardRejectCode {
        host: String,
        code: u16,
        message: String,
    },
    #[error("{host} answered {code} {message} (provider hides mailbox existence)")]
    AmbiguousProviderCode {
        host: String,
        code: u16,
        message: String,
    },
}

impl ProbeError {
    pub(crate) fn connect(host: &str, source: io::Error) -> Self {
        Self::ConnectFailure {
            host: host.to_string(),
            source,
        }
    }

    pub(crate) fn disconnect(host: &str, source: io::Error) -> Self {
        Self::ProtocolDisconnect {
            host: host.to_string(),
            source,
        }
    }

    pub(crate) fn protocol(host: &str, message: impl Into<String>) -> Self {
        Self::Protocol {
            host: host.to_string(),
            message: message.into(),
        }
    }

    /// Whether the same host may be tried again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailure { .. }
                | Self::ProtocolDisconnect { .. }
                | Self::Protocol { .. }
                | Self::SoftFailCode { .. }
        )
    }

    /// Whether the failure looks like a timeout rather than a hard transport error.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::SoftFailCode { .. } => true,
            Self::ConnectFailure { source, .. } | Self::ProtocolDisconnect { source, .. } => {
                matches!(
                    source.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                )
            }
            _ => false,
        }
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            Self::SoftFailCode { code, .. }
            | Self::HardRejectCode { code, .. }
            | Self::AmbiguousProviderCode { code, .. } => Some(*code),
            _ => None,
        }
    }
}
