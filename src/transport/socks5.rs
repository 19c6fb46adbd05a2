use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use socks::Socks5Stream;

use super::{Connector, set_timeouts};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocksCredentials {
    pub username: String,
    pub password: String,
}

/// SOCKS5 CONNECT through a local proxy such as Tor.
///
/// Hostnames are sent unresolved so that DNS for the exchange host happens
/// at the exit, not locally.
#[derive(Debug, Clone)]
pub struct Socks5Connector {
    pub proxy: SocketAddr,
    pub credentials: Option<SocksCredentials>,
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl Socks5Connector {
    pub fn new(proxy: SocketAddr, connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            proxy,
            credentials: None,
            connect_timeout,
            io_timeout,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<SocksCredentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

impl Connector for Socks5Connector {
    type Stream = TcpStream;

    fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let proxy = self.proxy;
        let credentials = self.credentials.clone();
        let target = host.to_string();

        // the proxy handshake has no timeout of its own: bound it here
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let target = (target.as_str(), port);
            let stream = match &credentials {
                Some(c) => {
                    Socks5Stream::connect_with_password(proxy, target, &c.username, &c.password)
                }
                None => Socks5Stream::connect(proxy, target),
            };
            let _ = tx.send(stream);
        });

        let stream = match rx.recv_timeout(self.connect_timeout) {
            Ok(result) => result?.into_inner(),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("SOCKS connect to {host}:{port} timed out"),
                ));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(io::Error::other("SOCKS connect worker exited"));
            }
        };
        set_timeouts(&stream, self.io_timeout)?;
        Ok(stream)
    }
}
