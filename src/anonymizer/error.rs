use std::io;

use thiserror::Error;

/// Errors raised while managing the anonymizing proxy.
#[derive(Debug, Error)]
pub enum AnonymizerError {
    #[error("proxy endpoint {addr} unreachable: {source}")]
    ProxyUnreachable {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("control port authentication failed: {code} {message}")]
    ControlChannelAuthFailure { code: u16, message: String },
    #[error("control port error: {0}")]
    ControlProtocol(String),
    #[error("control port I/O error: {source}")]
    ControlIo {
        #[source]
        source: io::Error,
    },
    #[error("restart command {command:?} failed: {message}")]
    RestartFailed { command: Vec<String>, message: String },
}

impl AnonymizerError {
    pub(crate) fn unreachable(addr: impl Into<String>, source: io::Error) -> Self {
        Self::ProxyUnreachable {
            addr: addr.into(),
            source,
        }
    }

    pub(crate) fn auth(code: u16, message: impl Into<String>) -> Self {
        Self::ControlChannelAuthFailure {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn io(source: io::Error) -> Self {
        Self::ControlIo { source }
    }
}
