use std::io::{Read, Write};

use tracing::debug;

use crate::address::CandidateAddress;
use crate::transport::Connector;

use super::ProbeError;
use super::SmtpReply;
use super::session::SmtpSession;

/// One RCPT probe of `address` against `host`.
///
/// Returns the `RCPT TO` reply whatever its code; classification is up to the
/// caller. Transport and protocol trouble comes back as [`ProbeError`].
pub trait HostProber {
    fn probe_host(
        &mut self,
        host: &str,
        address: &CandidateAddress,
    ) -> Result<SmtpReply, ProbeError>;
}

/// Envelope identity presented to the exchange host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub helo_domain: String,
    pub mail_from: String,
}

/// SMTP prober speaking through an injected [`Connector`].
pub struct SmtpProber<C: Connector> {
    connector: C,
    port: u16,
    envelope: Envelope,
}

impl<C: Connector> SmtpProber<C> {
    pub fn new(connector: C, port: u16, envelope: Envelope) -> Self {
        Self {
            connector,
            port,
            envelope,
        }
    }
}

impl<C: Connector> HostProber for SmtpProber<C> {
    fn probe_host(
        &mut self,
        host: &str,
        address: &CandidateAddress,
    ) -> Result<SmtpReply, ProbeError> {
        let stream = self
            .connector
            .connect(host, self.port)
            .map_err(|err| ProbeError::connect(host, err))?;
        rcpt_dialogue(stream, host, &self.envelope, &address.mailbox())
    }
}

/// Greeting, EHLO (HELO fallback), MAIL FROM, RCPT TO, QUIT. Never DATA.
pub(crate) fn rcpt_dialogue<S: Read + Write>(
    stream: S,
    host: &str,
    envelope: &Envelope,
    mailbox: &str,
) -> Result<SmtpReply, ProbeError> {
    let mut session = SmtpSession::new(stream);

    let greeting = session
        .read_reply()
        .map_err(|err| ProbeError::disconnect(host, err))?;
    if !greeting.is_positive_completion() {
        return Err(ProbeError::protocol(
            host,
            format!("unexpected greeting {greeting}"),
        ));
    }

    let ehlo = session
        .command(&format!("EHLO {}", envelope.helo_domain))
        .map_err(|err| ProbeError::disconnect(host, err))?;
    if !ehlo.is_positive_completion() {
        debug!(target: "mailprobe", "{host} refused EHLO ({ehlo}), falling back to HELO");
        let helo = session
            .command(&format!("HELO {}", envelope.helo_domain))
            .map_err(|err| ProbeError::disconnect(host, err))?;
        if !helo.is_positive_completion() {
            return Err(ProbeError::protocol(host, format!("HELO refused: {helo}")));
        }
    }

    let mail = session
        .command(&format!("MAIL FROM:<{}>", envelope.mail_from))
        .map_err(|err| ProbeError::disconnect(host, err))?;
    if mail.is_transient_failure() {
        quit(&mut session);
        // deferred sender: retry later, never a mailbox verdict
        return Err(ProbeError::SoftFailCode {
            host: host.to_string(),
            code: mail.code,
            message: format!("MAIL FROM deferred: {}", mail.message),
        });
    }
    if !mail.is_positive_completion() {
        quit(&mut session);
        // a refused sender says nothing about the mailbox
        return Err(ProbeError::protocol(
            host,
            format!("MAIL FROM refused: {mail}"),
        ));
    }

    let rcpt = session
        .command(&format!("RCPT TO:<{mailbox}>"))
        .map_err(|err| ProbeError::disconnect(host, err))?;
    quit(&mut session);
    Ok(rcpt)
}

fn quit<S: Read + Write>(session: &mut SmtpSession<S>) {
    if session.send_command("QUIT").is_ok() {
        let _ = session.read_reply();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStream;
    use std::io;

    fn envelope() -> Envelope {
        Envelope {
            helo_domain: "example.com".into(),
            mail_from: "test@example.com".into(),
        }
    }

    struct Refusing;

    impl Connector for Refusing {
        type Stream = ScriptedStream;

        fn connect(&self, _host: &str, _port: u16) -> io::Result<ScriptedStream> {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        }
    }

    #[test]
    fn rcpt_accepted_and_no_data_sent() {
        let mut stream = ScriptedStream::from_lines(&[
            "220 mx.example.com ESMTP\r\n",
            "250-mx.example.com\r\n250 8BITMIME\r\n",
            "250 2.1.0 Ok\r\n",
            "250 2.1.5 Ok\r\n",
            "221 2.0.0 Bye\r\n",
        ]);
        let reply = rcpt_dialogue(&mut stream, "mx.example.com", &envelope(), "b@example.com")
            .expect("dialogue");
        assert_eq!(reply.code, 250);

        let written = stream.written_str();
        assert_eq!(
            written,
            "EHLO example.com\r\nMAIL FROM:<test@example.com>\r\nRCPT TO:<b@example.com>\r\nQUIT\r\n"
        );
        assert!(!written.contains("DATA"));
    }

    #[test]
    fn falls_back_to_helo() {
        let mut stream = ScriptedStream::from_lines(&[
            "220 old.example.com\r\n",
            "502 command not implemented\r\n",
            "250 old.example.com\r\n",
            "250 Ok\r\n",
            "550 5.1.1 no such user\r\n",
            "221 Bye\r\n",
        ]);
        let reply = rcpt_dialogue(&mut stream, "old.example.com", &envelope(), "x@example.com")
            .expect("dialogue");
        assert_eq!(reply.code, 550);
        assert!(stream.written_str().contains("HELO example.com\r\n"));
    }

    #[test]
    fn deferred_sender_never_reaches_rcpt() {
        for code in ["451 4.7.1 greylisted", "454 4.7.0 TLS not available", "471 local policy"] {
            let deferral = format!("{code}\r\n");
            let mut stream =
                ScriptedStream::from_lines(&["220 mx\r\n", "250 mx\r\n", &deferral, "221 Bye\r\n"]);
            let err = rcpt_dialogue(&mut stream, "mx", &envelope(), "x@example.com")
                .expect_err("deferred sender");
            assert!(matches!(err, ProbeError::SoftFailCode { .. }), "{code}: {err:?}");
            assert!(err.is_retryable());
            assert!(!stream.written_str().contains("RCPT"));
        }
    }

    #[test]
    fn bad_greeting_is_protocol_error() {
        let mut stream = ScriptedStream::from_lines(&["554 go away\r\n"]);
        let err = rcpt_dialogue(&mut stream, "mx", &envelope(), "x@example.com")
            .expect_err("should fail");
        assert!(matches!(err, ProbeError::Protocol { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn dropped_connection_is_disconnect() {
        let mut stream = ScriptedStream::from_lines(&["220 mx\r\n", "250 mx\r\n"]);
        let err = rcpt_dialogue(&mut stream, "mx", &envelope(), "x@example.com")
            .expect_err("should fail");
        assert!(matches!(err, ProbeError::ProtocolDisconnect { .. }));
    }

    #[test]
    fn connect_failure_maps_to_connect_error() {
        let mut prober = SmtpProber::new(Refusing, 25, envelope());
        let addr = CandidateAddress::parse("x@example.com").unwrap();
        let err = prober.probe_host("mx", &addr).expect_err("should fail");
        assert!(matches!(err, ProbeError::ConnectFailure { .. }));
    }
}
