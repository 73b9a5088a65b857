//! Error types for the OBEX client core.
//!
//! Codec failures get their own enums so tests can match on the exact
//! malformation; everything folds into [`ObexError`] at the operation
//! surface. Malformed wire data is fatal to the session: once framing can
//! no longer be trusted, the session transitions to Closed.

use thiserror::Error;

use crate::protocol::frame::ResponseCode;
use crate::session::SessionState;

/// Errors producing wire bytes from frames and headers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Encoded frame would exceed the negotiated maximum packet size.
    #[error("frame of {len} bytes exceeds negotiated maximum of {max}")]
    FrameTooLarge {
        /// Total encoded length.
        len: usize,
        /// Negotiated maximum packet size.
        max: u16,
    },

    /// Header value variant does not match the identifier's encoding kind.
    #[error("header 0x{id:02x} cannot carry the given value kind")]
    ValueKindMismatch {
        /// Offending header identifier byte.
        id: u8,
    },
}

/// Errors decoding a single header from frame bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderDecodeError {
    /// Fewer bytes remain than the header's encoding kind requires.
    #[error("header needs {needed} bytes, {available} remain")]
    UnexpectedEnd {
        /// Bytes the encoding kind requires.
        needed: usize,
        /// Bytes remaining in the frame.
        available: usize,
    },

    /// A length-prefixed header declared less than its own 3-byte minimum.
    #[error("header 0x{id:02x} declares impossible length {declared}")]
    BadLengthPrefix {
        /// Header identifier byte.
        id: u8,
        /// Declared total header length.
        declared: u16,
    },

    /// Text header content is not valid null-terminated UTF-16BE.
    #[error("header 0x{id:02x} carries malformed UTF-16 text")]
    InvalidText {
        /// Header identifier byte.
        id: u8,
    },
}

/// Errors decoding a frame from a byte buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// Buffer is shorter than the 3-byte fixed prefix.
    #[error("frame too short: got {actual} bytes, need at least 3")]
    TooShort {
        /// Bytes available.
        actual: usize,
    },

    /// Declared length is smaller than the fixed prefix.
    #[error("declared frame length {declared} is below the 3-byte minimum")]
    DeclaredTooShort {
        /// Declared total length.
        declared: u16,
    },

    /// Buffer holds fewer bytes than the frame declares.
    #[error("frame declares {declared} bytes, buffer holds {actual}")]
    LengthMismatch {
        /// Declared total length.
        declared: u16,
        /// Bytes available.
        actual: usize,
    },

    /// Bytes remain past the declared frame length.
    #[error("{remaining} trailing bytes past declared frame length")]
    TrailingBytes {
        /// Undecoded byte count.
        remaining: usize,
    },

    /// A header inside the frame failed to decode.
    #[error("header decode failed: {0}")]
    Header(#[from] HeaderDecodeError),
}

/// Top-level error surfaced by session and file operations.
///
/// No variant is retried internally; retry policy belongs to the caller
/// because an OBEX session carries server-assigned state (the
/// Connection-ID) that cannot be resumed blindly.
#[derive(Debug, Error)]
pub enum ObexError {
    /// Transport I/O failure or timeout. The session is Closed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Frame or header could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Received bytes could not be framed. The session is Closed.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Response code byte is not a valid OBEX response.
    #[error("protocol error: 0x{code:02x} is not a response code")]
    Protocol {
        /// The raw code byte received.
        code: u8,
    },

    /// Peer rejected the CONNECT request.
    #[error("connect rejected: {status}")]
    ConnectRejected {
        /// Response status returned by the peer.
        status: ResponseCode,
    },

    /// Remote object or folder does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// Path sent in the request's Name header.
        path: String,
    },

    /// Remote peer refused access to the object or folder.
    #[error("forbidden: {path}")]
    Forbidden {
        /// Path sent in the request's Name header.
        path: String,
    },

    /// Peer answered an operation with an unexpected status.
    #[error("request rejected: {status}")]
    Rejected {
        /// Response status returned by the peer.
        status: ResponseCode,
    },

    /// Channel closed before a multi-packet transfer completed.
    #[error("transfer truncated: channel closed mid-sequence")]
    TruncatedTransfer,

    /// Operation attempted in the wrong lifecycle state. Caller bug, not
    /// recoverable by retry.
    #[error("invalid state: expected {expected:?}, session is {actual:?}")]
    InvalidState {
        /// State the operation requires.
        expected: SessionState,
        /// State the session is in.
        actual: SessionState,
    },
}

impl ObexError {
    /// Whether the error leaves the session unusable.
    ///
    /// Rejections and state-precondition failures keep the session alive;
    /// transport and framing failures do not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Encoding(_)
                | Self::Framing(_)
                | Self::Protocol { .. }
                | Self::TruncatedTransfer
        )
    }
}
