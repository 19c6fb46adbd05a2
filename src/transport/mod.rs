//! Outbound transports for the SMTP prober.
//!
//! The prober never opens sockets itself: it is handed a [`Connector`], so
//! routing through the anonymizing proxy is a construction-time choice.

mod socks5;

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

pub use socks5::{Socks5Connector, SocksCredentials};

/// Transport factory: opens a byte stream to `host:port`.
pub trait Connector {
    type Stream: Read + Write;

    fn connect(&self, host: &str, port: u16) -> io::Result<Self::Stream>;
}

/// Plain TCP, resolving the host locally.
#[derive(Debug, Clone)]
pub struct DirectConnector {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl DirectConnector {
    pub fn new(connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            io_timeout,
        }
    }
}

impl Connector for DirectConnector {
    type Stream = TcpStream;

    fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    set_timeouts(&stream, self.io_timeout)?;
                    return Ok(stream);
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no socket address for {host}"),
            )
        }))
    }
}

pub(crate) fn set_timeouts(stream: &TcpStream, timeout: Duration) -> io::Result<()> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    Ok(())
}

impl<C: Connector + ?Sized> Connector for &C {
    type Stream = C::Stream;

    fn connect(&self, host: &str, port: u16) -> io::Result<Self::Stream> {
        (**self).connect(host, port)
    }
}
