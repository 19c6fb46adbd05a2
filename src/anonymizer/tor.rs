use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use crate::config::TorOptions;
use crate::smtp::session::SmtpSession;
use crate::transport::set_timeouts;

use super::{Anonymizer, AnonymizerError};

/// Local Tor daemon: SOCKS data port plus authenticated control port.
#[derive(Debug, Clone)]
pub struct TorController {
    pub socks_addr: SocketAddr,
    pub control_addr: SocketAddr,
    pub control_password: Option<String>,
    pub health_timeout: Duration,
    pub restart_command: Vec<String>,
}

impl TorController {
    pub fn from_options(tor: &TorOptions) -> Self {
        Self {
            socks_addr: tor.socks_addr,
            control_addr: tor.control_addr,
            control_password: tor.control_password.clone(),
            health_timeout: tor.health_timeout,
            restart_command: tor.restart_command.clone(),
        }
    }

    fn probe_port(&self, addr: &SocketAddr) -> Result<(), AnonymizerError> {
        TcpStream::connect_timeout(addr, self.health_timeout)
            .map(drop)
            .map_err(|err| AnonymizerError::unreachable(addr.to_string(), err))
    }
}

impl Anonymizer for TorController {
    fn check_health(&self) -> Result<(), AnonymizerError> {
        self.probe_port(&self.socks_addr)?;
        self.probe_port(&self.control_addr)
    }

    fn restart(&self) -> Result<(), AnonymizerError> {
        let Some((program, args)) = self.restart_command.split_first() else {
            return Err(AnonymizerError::RestartFailed {
                command: Vec::new(),
                message: "no restart command configured".into(),
            });
        };
        let status = Command::new(program).args(args).status().map_err(|err| {
            AnonymizerError::RestartFailed {
                command: self.restart_command.clone(),
                message: err.to_string(),
            }
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(AnonymizerError::RestartFailed {
                command: self.restart_command.clone(),
                message: format!("exited with {status}"),
            })
        }
    }

    fn new_identity(&self) -> Result<(), AnonymizerError> {
        let stream = TcpStream::connect_timeout(&self.control_addr, self.health_timeout)
            .map_err(|err| AnonymizerError::unreachable(self.control_addr.to_string(), err))?;
        set_timeouts(&stream, self.health_timeout).map_err(AnonymizerError::io)?;
        request_new_identity(stream, self.control_password.as_deref())
    }
}

/// `AUTHENTICATE` then `SIGNAL NEWNYM` on an open control connection.
pub(crate) fn request_new_identity<S: Read + Write>(
    stream: S,
    password: Option<&str>,
) -> Result<(), AnonymizerError> {
    // control-port replies share SMTP's "code[-| ]text" framing
    let mut session = SmtpSession::new(stream);

    let auth_cmd = match password {
        Some(pw) if !pw.is_empty() => format!("AUTHENTICATE \"{}\"", quote(pw)),
        _ => "AUTHENTICATE".to_string(),
    };
    let auth = session.command(&auth_cmd).map_err(AnonymizerError::io)?;
    if auth.code != 250 {
        return Err(AnonymizerError::auth(auth.code, auth.message));
    }

    let signal = session
        .command("SIGNAL NEWNYM")
        .map_err(AnonymizerError::io)?;
    if signal.code != 250 {
        return Err(AnonymizerError::ControlProtocol(format!(
            "SIGNAL NEWNYM refused: {signal}"
        )));
    }
    debug!(target: "mailprobe", "control port accepted NEWNYM");

    if session.send_command("QUIT").is_ok() {
        let _ = session.read_reply();
    }
    Ok(())
}

fn quote(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStream;

    #[test]
    fn authenticates_and_signals() {
        let mut stream =
            ScriptedStream::from_lines(&["250 OK\r\n", "250 OK\r\n", "250 closing connection\r\n"]);
        request_new_identity(&mut stream, Some("s3\"cret")).expect("rotation");
        assert_eq!(
            stream.written_str(),
            "AUTHENTICATE \"s3\\\"cret\"\r\nSIGNAL NEWNYM\r\nQUIT\r\n"
        );
    }

    #[test]
    fn bad_password_is_auth_failure() {
        let mut stream = ScriptedStream::from_lines(&[
            "515 Authentication failed: Password did not match HashedControlPassword value\r\n",
        ]);
        let err = request_new_identity(&mut stream, Some("nope")).expect_err("should fail");
        match err {
            AnonymizerError::ControlChannelAuthFailure { code, .. } => assert_eq!(code, 515),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_password_sends_bare_authenticate() {
        let mut stream = ScriptedStream::from_lines(&["250 OK\r\n", "552 Unrecognized signal\r\n"]);
        let err = request_new_identity(&mut stream, Some("")).expect_err("should fail");
        assert!(matches!(err, AnonymizerError::ControlProtocol(_)));
        assert!(stream.written_str().starts_with("AUTHENTICATE\r\n"));
    }

    #[test]
    fn missing_restart_command_fails() {
        let tor = TorController {
            socks_addr: "127.0.0.1:9050".parse().unwrap(),
            control_addr: "127.0.0.1:9051".parse().unwrap(),
            control_password: None,
            health_timeout: Duration::from_millis(10),
            restart_command: Vec::new(),
        };
        assert!(matches!(
            tor.restart(),
            Err(AnonymizerError::RestartFailed { .. })
        ));
    }
}
