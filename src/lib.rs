//! # obexftp
//!
//! A client for the OBEX File Transfer Profile: session establishment,
//! binary request/response framing and file-system-like operations over
//! any ordered, reliable byte channel.
//!
//! The crate is a protocol engine, not a radio stack. Device discovery,
//! RFCOMM channel resolution and link encryption live below the
//! [`core::traits::Transport`] boundary; hand in an open channel and the
//! engine does the rest:
//!
//! - **Framing**: OBEX packets (1-byte code, 16-bit big-endian length,
//!   typed headers) encoded and decoded by [`protocol`]
//! - **Session**: CONNECT/DISCONNECT lifecycle, packet-size negotiation
//!   and Connection-ID echo in [`session`], strictly one request in
//!   flight per session
//! - **Operations**: list, get, put, delete, navigate and rename in
//!   [`client`], with multi-packet transfers chunked to the negotiated
//!   packet size
//!
//! ## Example
//!
//! ```no_run
//! use obexftp::prelude::*;
//! use obexftp::transport::TcpTransport;
//!
//! fn main() -> Result<(), ObexError> {
//!     let transport = TcpTransport::connect(("192.168.1.10", OBEX_TCP_PORT))?;
//!     let mut client = FtpClient::connect(transport)?;
//!
//!     let listing = client.list("/")?;
//!     println!("{listing}");
//!
//!     let photo = client.get("/images/some.jpg")?;
//!     std::fs::write("downloaded.jpg", photo)?;
//!
//!     client.disconnect()?;
//!     Ok(())
//! }
//! ```
//!
//! Blocking and single-threaded by design: every operation completes (or
//! fails) before the next may begin. To talk to several devices at once,
//! give each its own transport and session.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod core;
pub mod protocol;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::client::FtpClient;
    pub use crate::core::error::ObexError;
    pub use crate::core::traits::{DeviceAddress, DeviceHandle, Discovery, ServiceClass, Transport};
    pub use crate::protocol::{Frame, Header, HeaderId, Opcode, ResponseCode};
    pub use crate::session::{Session, SessionConfig, SessionState};
    pub use crate::transport::OBEX_TCP_PORT;
}

// Re-export commonly used items at crate root
pub use crate::client::FtpClient;
pub use crate::core::error::ObexError;
pub use crate::session::{Session, SessionConfig, SessionState};
