//! In-memory stand-ins shared by unit tests.

use std::io::{self, Cursor, Read, Write};

/// Duplex stream that replays canned server bytes and records what the client
/// wrote.
pub(crate) struct ScriptedStream {
    incoming: Cursor<Vec<u8>>,
    outgoing: Vec<u8>,
}

impl ScriptedStream {
    pub(crate) fn from_lines(lines: &[&str]) -> Self {
        let joined: String = lines.concat();
        Self {
            incoming: Cursor::new(joined.into_bytes()),
            outgoing: Vec::new(),
        }
    }

    pub(crate) fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.outgoing).into_owned()
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.incoming.read(buf)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outgoing.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
