//! OBEX over TCP.
//!
//! Many stacks speak OBEX straight over a TCP connection, and it is the
//! transport of choice for talking to a desktop OBEX daemon or for
//! wire-level debugging without radio hardware.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::core::traits::Transport;

/// IANA-registered port for OBEX over TCP.
pub const OBEX_TCP_PORT: u16 = 650;

/// A blocking TCP byte channel.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    closed: bool,
}

impl TcpTransport {
    /// Connect to a peer, e.g. `("192.168.1.10", OBEX_TCP_PORT)`.
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        debug!(peer = ?stream.peer_addr().ok(), "tcp transport connected");
        Ok(Self {
            stream,
            closed: false,
        })
    }

    /// Connect with a bound on how long connection establishment may take.
    pub fn connect_timeout(addr: &SocketAddr, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(addr, timeout)?;
        debug!(peer = %addr, "tcp transport connected");
        Ok(Self {
            stream,
            closed: false,
        })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn set_receive_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.shutdown(Shutdown::Both) {
            // The peer may have torn the connection down first.
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_send_and_receive_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut peer, _) = listener.accept().unwrap();
            let mut buf = [0u8; 3];
            peer.read_exact(&mut buf).unwrap();
            assert_eq!(buf, [0x81, 0x00, 0x03]);
            peer.write_all(&[0xA0, 0x00, 0x03]).unwrap();
        });

        let mut transport = TcpTransport::connect(addr).unwrap();
        transport.send(&[0x81, 0x00, 0x03]).unwrap();

        let mut got = Vec::new();
        let mut buf = [0u8; 2];
        while got.len() < 3 {
            let n = transport.receive(&mut buf).unwrap();
            assert!(n > 0);
            got.extend_from_slice(&buf[..n]);
        }
        assert_eq!(got, [0xA0, 0x00, 0x03]);

        transport.close().unwrap();
        transport.close().unwrap();
        server.join().unwrap();
    }
}
