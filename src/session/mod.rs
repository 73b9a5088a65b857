//! Session lifecycle and the single request/response choke point.
//!
//! A [`Session`] owns its [`Transport`] exclusively for its whole lifetime
//! and drives it strictly synchronously: [`Session::exchange`] sends one
//! request and blocks for one response, and taking `&mut self` is what
//! keeps two requests from ever being outstanding on one transport. A
//! `Session` is not meant to be shared between call sites; callers that
//! need that must serialize access themselves.
//!
//! Transport failures, timeouts and malformed frames are terminal: the
//! session transitions to Closed and a new one must be connected to retry,
//! because the server-assigned Connection-ID cannot be resumed blindly.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::core::constants::{
    CONNECT_PREFIX_SIZE, DEFAULT_PACKET_SIZE, DEFAULT_RECEIVE_TIMEOUT, FRAME_HEADER_SIZE,
    MINIMUM_PACKET_SIZE, UUID_FOLDER_BROWSING,
};
use crate::core::error::{FramingError, ObexError};
use crate::core::traits::Transport;
use crate::protocol::frame::{Frame, Opcode, ResponseCode};
use crate::protocol::header::{Header, HeaderId};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No CONNECT attempted yet.
    Idle,
    /// CONNECT exchange in flight.
    Connecting,
    /// Session established, ready for operations.
    Connected,
    /// A multi-packet GET or PUT is in progress.
    Transferring,
    /// DISCONNECT exchange in flight.
    Disconnecting,
    /// Terminal. A new session must be created to retry.
    Closed,
}

/// Connection parameters proposed on CONNECT.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum packet size to propose; the negotiated value is the smaller
    /// of this and the peer's advertisement.
    pub max_packet_size: u16,
    /// Blocking-receive timeout for each response frame. `None` waits
    /// forever.
    pub receive_timeout: Option<Duration>,
    /// Service target UUID sent in the Target header; `None` connects to
    /// the peer's default (inbox) service.
    pub target: Option<Vec<u8>>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_PACKET_SIZE,
            receive_timeout: Some(DEFAULT_RECEIVE_TIMEOUT),
            target: Some(UUID_FOLDER_BROWSING.to_vec()),
        }
    }
}

impl SessionConfig {
    /// Default File Transfer Profile configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Propose a different maximum packet size.
    pub fn max_packet_size(mut self, size: u16) -> Self {
        self.max_packet_size = size.max(MINIMUM_PACKET_SIZE);
        self
    }

    /// Change the per-response receive timeout.
    pub fn receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Select a different service target UUID.
    pub fn target(mut self, uuid: Vec<u8>) -> Self {
        self.target = Some(uuid);
        self
    }

    /// Connect to the peer's default service, with no Target header.
    pub fn no_target(mut self) -> Self {
        self.target = None;
        self
    }
}

/// An established OBEX session over an exclusively-owned transport.
#[derive(Debug)]
pub struct Session<T: Transport> {
    transport: T,
    state: SessionState,
    max_packet_size: u16,
    connection_id: Option<u32>,
}

impl<T: Transport> Session<T> {
    /// Establish a session: send CONNECT and block for the response.
    ///
    /// On a Success response the negotiated packet size and any returned
    /// Connection-ID are stored and the session is Connected. Any other
    /// status closes the transport and fails with
    /// [`ObexError::ConnectRejected`].
    pub fn connect(transport: T, config: SessionConfig) -> Result<Self, ObexError> {
        let mut session = Self {
            transport,
            state: SessionState::Idle,
            max_packet_size: config.max_packet_size.max(MINIMUM_PACKET_SIZE),
            connection_id: None,
        };
        session
            .transport
            .set_receive_timeout(config.receive_timeout)?;

        session.state = SessionState::Connecting;
        let mut headers = Vec::new();
        if let Some(uuid) = &config.target {
            headers.push(Header::target(uuid));
        }
        let request = Frame::connect_request(session.max_packet_size, headers);

        let response = match session.round_trip(request, CONNECT_PREFIX_SIZE) {
            Ok(response) => response,
            Err(err) => {
                session.close_transport();
                return Err(err);
            }
        };

        let status = match response.response_code() {
            Some(status) => status,
            None => {
                session.close_transport();
                return Err(ObexError::Protocol {
                    code: response.code,
                });
            }
        };
        if status != ResponseCode::Success {
            debug!(%status, "connect rejected by peer");
            session.close_transport();
            return Err(ObexError::ConnectRejected { status });
        }

        let peer_max = u16::from_be_bytes([response.prefix[2], response.prefix[3]]);
        session.max_packet_size = session
            .max_packet_size
            .min(peer_max)
            .max(MINIMUM_PACKET_SIZE);
        session.connection_id = response
            .header(HeaderId::CONNECTION_ID)
            .and_then(Header::as_u32);
        session.state = SessionState::Connected;
        debug!(
            max_packet_size = session.max_packet_size,
            connection_id = ?session.connection_id,
            "session connected"
        );
        Ok(session)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Negotiated maximum packet size.
    pub fn max_packet_size(&self) -> u16 {
        self.max_packet_size
    }

    /// Connection-ID assigned by the peer, if any.
    pub fn connection_id(&self) -> Option<u32> {
        self.connection_id
    }

    /// Build a request frame, echoing the Connection-ID first when one was
    /// assigned.
    pub fn request(&self, opcode: Opcode, headers: Vec<Header>) -> Frame {
        self.request_with_prefix(opcode, Vec::new(), headers)
    }

    /// Like [`Session::request`] with opcode-specific non-header bytes.
    pub fn request_with_prefix(
        &self,
        opcode: Opcode,
        prefix: Vec<u8>,
        headers: Vec<Header>,
    ) -> Frame {
        let mut all = Vec::with_capacity(headers.len() + 1);
        if let Some(id) = self.connection_id {
            all.push(Header::connection_id(id));
        }
        all.extend(headers);
        Frame::request_with_prefix(opcode, prefix, all)
    }

    /// Send one request and block for its response.
    ///
    /// This is the only path to the wire: every operation funnels through
    /// here, one exchange at a time. Fatal errors (transport, framing,
    /// invalid response code) close the session before propagating.
    pub fn exchange(&mut self, request: Frame) -> Result<Frame, ObexError> {
        match self.state {
            SessionState::Connected | SessionState::Transferring | SessionState::Disconnecting => {}
            actual => {
                return Err(ObexError::InvalidState {
                    expected: SessionState::Connected,
                    actual,
                });
            }
        }

        let result = self.round_trip(request, 0).and_then(|response| {
            match response.response_code() {
                Some(_) => Ok(response),
                None => Err(ObexError::Protocol {
                    code: response.code,
                }),
            }
        });
        if let Err(err) = &result {
            if err.is_fatal() {
                warn!(error = %err, "exchange failed, closing session");
                self.close_transport();
            }
        }
        result
    }

    /// Mark a multi-packet transfer as started.
    pub(crate) fn begin_transfer(&mut self) {
        if self.state == SessionState::Connected {
            self.state = SessionState::Transferring;
        }
    }

    /// Return from Transferring to Connected.
    pub(crate) fn finish_transfer(&mut self) {
        if self.state == SessionState::Transferring {
            self.state = SessionState::Connected;
        }
    }

    /// Cancel the multi-packet operation in progress.
    ///
    /// Valid only while Transferring. A Success response returns the
    /// session to Connected; anything else closes it.
    pub fn abort(&mut self) -> Result<(), ObexError> {
        if self.state != SessionState::Transferring {
            return Err(ObexError::InvalidState {
                expected: SessionState::Transferring,
                actual: self.state,
            });
        }
        let request = self.request(Opcode::Abort, Vec::new());
        let response = self.exchange(request)?;
        let status = match response.response_code() {
            Some(status) => status,
            None => {
                return Err(ObexError::Protocol {
                    code: response.code,
                });
            }
        };
        if status == ResponseCode::Success {
            self.state = SessionState::Connected;
            debug!("transfer aborted, session recovered");
            Ok(())
        } else {
            warn!(%status, "peer refused abort, closing session");
            self.close_transport();
            Err(ObexError::Rejected { status })
        }
    }

    /// Send DISCONNECT and close the session.
    ///
    /// Any response status acknowledges the disconnect; the session ends
    /// Closed even if the peer answers strangely or the transport fails
    /// mid-exchange. Fails with [`ObexError::InvalidState`] once Closed.
    pub fn disconnect(&mut self) -> Result<(), ObexError> {
        if self.state == SessionState::Closed {
            return Err(ObexError::InvalidState {
                expected: SessionState::Connected,
                actual: SessionState::Closed,
            });
        }
        self.state = SessionState::Disconnecting;
        let request = self.request(Opcode::Disconnect, Vec::new());
        let result = self.exchange(request);
        self.close_transport();
        // Any decoded response acknowledges the disconnect; only transport
        // failures surface, and the session is Closed either way.
        result.map(|response| {
            trace!(code = response.code, "disconnect acknowledged");
        })
    }

    /// One request/response round trip without state bookkeeping.
    fn round_trip(&mut self, request: Frame, response_prefix: usize) -> Result<Frame, ObexError> {
        let bytes = request.encode(self.max_packet_size)?;
        trace!(code = request.code, len = bytes.len(), "sending frame");
        self.transport.send(&bytes)?;
        let response = self.recv_frame(response_prefix)?;
        trace!(code = response.code, "received frame");
        Ok(response)
    }

    /// Receive exactly one frame, reassembling it from as many transport
    /// reads as it takes. The transport gives no frame boundaries.
    fn recv_frame(&mut self, prefix_len: usize) -> Result<Frame, ObexError> {
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE);
        self.read_exact_into(&mut buf, FRAME_HEADER_SIZE)?;
        let declared = u16::from_be_bytes([buf[1], buf[2]]);
        if (declared as usize) < FRAME_HEADER_SIZE {
            return Err(FramingError::DeclaredTooShort { declared }.into());
        }
        self.read_exact_into(&mut buf, declared as usize - FRAME_HEADER_SIZE)?;
        Ok(Frame::decode(&buf, prefix_len)?)
    }

    /// Append exactly `n` more bytes from the transport onto `buf`.
    fn read_exact_into(&mut self, buf: &mut Vec<u8>, n: usize) -> Result<(), ObexError> {
        let mut chunk = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            let got = self.transport.receive(&mut chunk[filled..])?;
            if got == 0 {
                // Channel closed under us. Mid-transfer this truncates the
                // object; otherwise it is a plain transport failure.
                if self.state == SessionState::Transferring {
                    return Err(ObexError::TruncatedTransfer);
                }
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "transport closed mid-frame",
                )
                .into());
            }
            filled += got;
        }
        buf.extend_from_slice(&chunk);
        Ok(())
    }

    /// Transport access for frame-shape assertions in tests.
    #[cfg(test)]
    pub(crate) fn transport_ref(&self) -> &T {
        &self.transport
    }

    /// Terminal transition; safe to call repeatedly.
    fn close_transport(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closed;
            if let Err(err) = self.transport.close() {
                trace!(error = %err, "transport close reported an error");
            }
        }
    }
}
