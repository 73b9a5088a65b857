//! Frame encoding and decoding for the OBEX request/response exchange.
//!
//! Every packet on the wire is one frame:
//!
//! ```text
//! +--------+-----------------+-------------------+-------------------+
//! | Code   | Total Length    | Non-header bytes  | Headers ...       |
//! | 1 byte | 2 bytes (BE16)  | opcode-specific   | id + value each   |
//! +--------+-----------------+-------------------+-------------------+
//! ```
//!
//! The length counts the whole frame including the 3-byte fixed prefix.
//! CONNECT requests and responses carry 4 non-header bytes
//! (version, flags, max packet size); SETPATH requests carry 2
//! (flags, constants); every other frame carries none.

use crate::core::constants::{FRAME_HEADER_SIZE, OBEX_VERSION};
use crate::core::error::{EncodingError, FramingError};
use crate::protocol::header::{Header, HeaderId};

/// Request opcodes, with the final bit where the operation carries it
/// inherently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Establish an OBEX session.
    Connect = 0x80,
    /// Tear down the session.
    Disconnect = 0x81,
    /// Push an object chunk, more to follow.
    Put = 0x02,
    /// Push the last chunk of an object (or a body-less request).
    PutFinal = 0x82,
    /// Request an object, more request packets to follow.
    Get = 0x03,
    /// Request an object, request complete.
    GetFinal = 0x83,
    /// Change the remote current folder.
    SetPath = 0x85,
    /// Cancel the multi-packet operation in progress.
    Abort = 0xFF,
}

impl Opcode {
    /// Parse an opcode from its wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x80 => Some(Self::Connect),
            0x81 => Some(Self::Disconnect),
            0x02 => Some(Self::Put),
            0x82 => Some(Self::PutFinal),
            0x03 => Some(Self::Get),
            0x83 => Some(Self::GetFinal),
            0x85 => Some(Self::SetPath),
            0xFF => Some(Self::Abort),
            _ => None,
        }
    }

    /// The wire byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Response status codes. The wire byte always carries the final bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseCode {
    /// More packets are required to complete the operation.
    Continue = 0x90,
    /// Operation completed.
    Success = 0xA0,
    /// Object created.
    Created = 0xA1,
    /// Request accepted for processing.
    Accepted = 0xA2,
    /// Request malformed.
    BadRequest = 0xC0,
    /// Authentication required.
    Unauthorized = 0xC1,
    /// Access refused.
    Forbidden = 0xC3,
    /// Object or folder does not exist.
    NotFound = 0xC4,
    /// Operation not allowed on this object.
    MethodNotAllowed = 0xC5,
    /// Requested representation not available.
    NotAcceptable = 0xC6,
    /// Peer timed out waiting for the rest of the request.
    RequestTimeout = 0xC8,
    /// Request conflicts with the object's state.
    Conflict = 0xC9,
    /// A request precondition failed.
    PreconditionFailed = 0xCC,
    /// Peer-side failure.
    InternalServerError = 0xD0,
    /// Operation not implemented by the peer.
    NotImplemented = 0xD1,
    /// Service temporarily unavailable.
    ServiceUnavailable = 0xD3,
    /// Peer storage is full.
    DatabaseFull = 0xE0,
    /// Peer storage is locked.
    DatabaseLocked = 0xE1,
}

impl ResponseCode {
    /// Parse a response code from its wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x90 => Some(Self::Continue),
            0xA0 => Some(Self::Success),
            0xA1 => Some(Self::Created),
            0xA2 => Some(Self::Accepted),
            0xC0 => Some(Self::BadRequest),
            0xC1 => Some(Self::Unauthorized),
            0xC3 => Some(Self::Forbidden),
            0xC4 => Some(Self::NotFound),
            0xC5 => Some(Self::MethodNotAllowed),
            0xC6 => Some(Self::NotAcceptable),
            0xC8 => Some(Self::RequestTimeout),
            0xC9 => Some(Self::Conflict),
            0xCC => Some(Self::PreconditionFailed),
            0xD0 => Some(Self::InternalServerError),
            0xD1 => Some(Self::NotImplemented),
            0xD3 => Some(Self::ServiceUnavailable),
            0xE0 => Some(Self::DatabaseFull),
            0xE1 => Some(Self::DatabaseLocked),
            _ => None,
        }
    }

    /// The wire byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether this code completes an operation successfully.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::Created | Self::Accepted)
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Continue => "continue",
            Self::Success => "success",
            Self::Created => "created",
            Self::Accepted => "accepted",
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::MethodNotAllowed => "method not allowed",
            Self::NotAcceptable => "not acceptable",
            Self::RequestTimeout => "request timeout",
            Self::Conflict => "conflict",
            Self::PreconditionFailed => "precondition failed",
            Self::InternalServerError => "internal server error",
            Self::NotImplemented => "not implemented",
            Self::ServiceUnavailable => "service unavailable",
            Self::DatabaseFull => "database full",
            Self::DatabaseLocked => "database locked",
        };
        write!(f, "{name} (0x{:02x})", self.as_byte())
    }
}

/// One protocol message: code byte, opcode-specific non-header bytes and
/// an ordered header sequence. Transient, built per exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw opcode or response code byte.
    pub code: u8,
    /// Non-header bytes between the length field and the first header.
    pub prefix: Vec<u8>,
    /// Headers in wire order.
    pub headers: Vec<Header>,
}

impl Frame {
    /// Build a request frame without non-header bytes.
    pub fn request(opcode: Opcode, headers: Vec<Header>) -> Self {
        Self {
            code: opcode.as_byte(),
            prefix: Vec::new(),
            headers,
        }
    }

    /// Build a request frame with non-header bytes.
    pub fn request_with_prefix(opcode: Opcode, prefix: Vec<u8>, headers: Vec<Header>) -> Self {
        Self {
            code: opcode.as_byte(),
            prefix,
            headers,
        }
    }

    /// Build a CONNECT request proposing a maximum packet size.
    pub fn connect_request(max_packet_size: u16, headers: Vec<Header>) -> Self {
        let mut prefix = vec![OBEX_VERSION, 0x00];
        prefix.extend_from_slice(&max_packet_size.to_be_bytes());
        Self::request_with_prefix(Opcode::Connect, prefix, headers)
    }

    /// Build a response frame (test peers and fixtures).
    pub fn response(code: ResponseCode, headers: Vec<Header>) -> Self {
        Self {
            code: code.as_byte(),
            prefix: Vec::new(),
            headers,
        }
    }

    /// Build a response frame with non-header bytes (CONNECT responses).
    pub fn response_with_prefix(
        code: ResponseCode,
        prefix: Vec<u8>,
        headers: Vec<Header>,
    ) -> Self {
        Self {
            code: code.as_byte(),
            prefix,
            headers,
        }
    }

    /// The request opcode, when the code byte is one.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_byte(self.code)
    }

    /// The response code, when the code byte is one.
    pub fn response_code(&self) -> Option<ResponseCode> {
        ResponseCode::from_byte(self.code)
    }

    /// First header with the given identifier.
    pub fn header(&self, id: HeaderId) -> Option<&Header> {
        self.headers.iter().find(|h| h.id == id)
    }

    /// Serialize the frame, back-patching the 2-byte total length.
    ///
    /// Fails when the encoded frame would exceed `max_packet_size`.
    pub fn encode(&self, max_packet_size: u16) -> Result<Vec<u8>, EncodingError> {
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + self.prefix.len());
        buf.push(self.code);
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(&self.prefix);
        for header in &self.headers {
            header.encode_into(&mut buf)?;
        }
        if buf.len() > max_packet_size as usize {
            return Err(EncodingError::FrameTooLarge {
                len: buf.len(),
                max: max_packet_size,
            });
        }
        let total = buf.len() as u16;
        buf[1..3].copy_from_slice(&total.to_be_bytes());
        Ok(buf)
    }

    /// Parse a frame from a buffer holding exactly one frame.
    ///
    /// `prefix_len` is the count of non-header bytes the caller expects
    /// after the length field; for responses it depends on the request
    /// that elicited them.
    pub fn decode(bytes: &[u8], prefix_len: usize) -> Result<Self, FramingError> {
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(FramingError::TooShort {
                actual: bytes.len(),
            });
        }
        let declared = u16::from_be_bytes([bytes[1], bytes[2]]);
        if (declared as usize) < FRAME_HEADER_SIZE + prefix_len {
            return Err(FramingError::DeclaredTooShort { declared });
        }
        if bytes.len() < declared as usize {
            return Err(FramingError::LengthMismatch {
                declared,
                actual: bytes.len(),
            });
        }
        if bytes.len() > declared as usize {
            return Err(FramingError::TrailingBytes {
                remaining: bytes.len() - declared as usize,
            });
        }

        let prefix = bytes[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + prefix_len].to_vec();
        let mut headers = Vec::new();
        let mut offset = FRAME_HEADER_SIZE + prefix_len;
        while offset < declared as usize {
            let (header, next) = Header::decode(&bytes[..declared as usize], offset)?;
            headers.push(header);
            offset = next;
        }

        Ok(Self {
            code: bytes[0],
            prefix,
            headers,
        })
    }
}
