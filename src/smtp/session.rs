use std::io::{self, BufRead, BufReader, Read, Write};

use super::SmtpReply;

/// Line-oriented SMTP client session over any byte stream.
pub(crate) struct SmtpSession<S: Read + Write> {
    reader: BufReader<S>,
}

impl<S: Read + Write> SmtpSession<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self {
            reader: BufReader::new(stream),
        }
    }

    pub(crate) fn send_command(&mut self, command: &str) -> io::Result<()> {
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        let stream = self.reader.get_mut();
        stream.write_all(&line)?;
        stream.flush()
    }

    pub(crate) fn command(&mut self, command: &str) -> io::Result<SmtpReply> {
        self.send_command(command)?;
        self.read_reply()
    }

    /// Read one complete reply, following `NNN-` continuation lines until
    /// the final `NNN ` line. Every line must carry the same code.
    pub(crate) fn read_reply(&mut self) -> io::Result<SmtpReply> {
        let mut reply: Option<SmtpReply> = None;
        loop {
            let line = self.next_line()?;
            let (code, more, text) = split_reply_line(&line)?;
            match reply.as_mut() {
                None => reply = Some(SmtpReply::new(code, text)),
                Some(r) if r.code == code => {
                    r.message.push('\n');
                    r.message.push_str(text);
                }
                Some(r) => {
                    return Err(invalid(format!(
                        "reply code changed mid-reply: {} then {code}",
                        r.code
                    )));
                }
            }
            if !more {
                break;
            }
        }
        reply.ok_or_else(|| invalid("empty SMTP reply".into()))
    }

    fn next_line(&mut self) -> io::Result<String> {
        let mut raw = String::new();
        if self.reader.read_line(&mut raw)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection mid-reply",
            ));
        }
        let len = raw.trim_end_matches(['\r', '\n']).len();
        raw.truncate(len);
        Ok(raw)
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// `"250-text"` -> `(250, true, "text")`.
fn split_reply_line(line: &str) -> io::Result<(u16, bool, &str)> {
    let code = line
        .get(..3)
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u16>().ok())
        .ok_or_else(|| invalid(format!("malformed SMTP reply line: {line:?}")))?;
    let more = line.as_bytes().get(3) == Some(&b'-');
    Ok((code, more, line.get(4..).unwrap_or("")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStream;

    #[test]
    fn reads_multiline_reply() {
        let stream = ScriptedStream::from_lines(&[
            "250-mx.example.com Hello\r\n",
            "250-SIZE 35882577\r\n",
            "250 PIPELINING\r\n",
        ]);
        let mut session = SmtpSession::new(stream);
        let reply = session.read_reply().expect("reply");
        assert_eq!(reply.code, 250);
        assert_eq!(reply.message.lines().count(), 3);
        assert!(reply.message.ends_with("PIPELINING"));
    }

    #[test]
    fn rejects_inconsistent_codes() {
        let stream = ScriptedStream::from_lines(&["250-first\r\n", "251 second\r\n"]);
        let mut session = SmtpSession::new(stream);
        let err = session.read_reply().expect_err("should fail");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn eof_is_reported_as_unexpected_eof() {
        let mut session = SmtpSession::new(ScriptedStream::from_lines(&[]));
        let err = session.read_reply().expect_err("should fail");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn bare_code_line_has_empty_message() {
        let mut session = SmtpSession::new(ScriptedStream::from_lines(&["221\r\n"]));
        let reply = session.command("QUIT").expect("reply");
        assert_eq!(reply, SmtpReply::new(221, ""));
        assert_eq!(session.into_inner().written_str(), "QUIT\r\n");
    }

    #[test]
    fn non_numeric_code_is_invalid_data() {
        let mut session = SmtpSession::new(ScriptedStream::from_lines(&["2x0 nope\r\n"]));
        let err = session.read_reply().expect_err("should fail");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
