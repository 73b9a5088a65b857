//! Typed OBEX headers and their wire encodings.
//!
//! The high two bits of a header identifier select the value encoding, so
//! decode dispatches on those bits rather than a known-identifier list:
//! unknown identifiers of a known kind still decode structurally.
//!
//! Wire encodings by kind:
//!
//! ```text
//! 00xxxxxx  null-terminated UTF-16BE text, 2-byte big-endian total length
//! 01xxxxxx  raw byte sequence,             2-byte big-endian total length
//! 10xxxxxx  single byte value              (2 bytes total)
//! 11xxxxxx  4-byte big-endian integer      (5 bytes total)
//! ```
//!
//! Length prefixes count the identifier and the length field themselves.

use crate::core::error::{EncodingError, HeaderDecodeError};

/// Value encoding selected by a header identifier's top two bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// Null-terminated UTF-16BE text, length-prefixed.
    Text,
    /// Raw byte sequence, length-prefixed.
    Bytes,
    /// One-byte unsigned value.
    U8,
    /// Four-byte big-endian unsigned value.
    U32,
}

/// A header identifier byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderId(u8);

impl HeaderId {
    /// Number of objects (used by CONNECT).
    pub const COUNT: Self = Self(0xC0);
    /// Name of the object, typically a path or file name.
    pub const NAME: Self = Self(0x01);
    /// Object type, e.g. `x-obex/folder-listing`.
    pub const TYPE: Self = Self(0x42);
    /// Object length in bytes.
    pub const LENGTH: Self = Self(0xC3);
    /// ISO 8601 timestamp as a byte sequence.
    pub const TIME: Self = Self(0x44);
    /// Human-readable description text.
    pub const DESCRIPTION: Self = Self(0x05);
    /// Service selector sent by the client on CONNECT.
    pub const TARGET: Self = Self(0x46);
    /// HTTP 1.x message as a byte sequence.
    pub const HTTP: Self = Self(0x47);
    /// A chunk of the object body.
    pub const BODY: Self = Self(0x48);
    /// The final chunk of the object body.
    pub const END_OF_BODY: Self = Self(0x49);
    /// Service identity echoed by the server on CONNECT.
    pub const WHO: Self = Self(0x4A);
    /// Server-assigned session token, echoed on every later request.
    pub const CONNECTION_ID: Self = Self(0xCB);
    /// Application-defined tag/length/value parameters.
    pub const APP_PARAMETERS: Self = Self(0x4C);
    /// Authentication challenge digest.
    pub const AUTH_CHALLENGE: Self = Self(0x4D);
    /// Authentication response digest.
    pub const AUTH_RESPONSE: Self = Self(0x4E);
    /// OBEX object class of the object.
    pub const OBJECT_CLASS: Self = Self(0x4F);

    /// Wrap a raw identifier byte.
    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// The raw identifier byte.
    pub fn as_byte(self) -> u8 {
        self.0
    }

    /// Encoding kind from the top two identifier bits.
    pub fn kind(self) -> HeaderKind {
        match self.0 >> 6 {
            0b00 => HeaderKind::Text,
            0b01 => HeaderKind::Bytes,
            0b10 => HeaderKind::U8,
            _ => HeaderKind::U32,
        }
    }
}

/// A decoded header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    /// Text value (Name, Description).
    Text(String),
    /// Byte-sequence value (Body, Target, AppParameters).
    Bytes(Vec<u8>),
    /// One-byte value.
    U8(u8),
    /// Four-byte value (Length, ConnectionId, Count).
    U32(u32),
}

impl HeaderValue {
    /// Encoding kind this value serializes as.
    pub fn kind(&self) -> HeaderKind {
        match self {
            Self::Text(_) => HeaderKind::Text,
            Self::Bytes(_) => HeaderKind::Bytes,
            Self::U8(_) => HeaderKind::U8,
            Self::U32(_) => HeaderKind::U32,
        }
    }
}

/// A typed identifier/value pair inside a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Identifier byte.
    pub id: HeaderId,
    /// Decoded value.
    pub value: HeaderValue,
}

impl Header {
    /// Build a header from parts.
    pub fn new(id: HeaderId, value: HeaderValue) -> Self {
        Self { id, value }
    }

    /// Name header carrying an object or folder path.
    pub fn name(name: &str) -> Self {
        Self::new(HeaderId::NAME, HeaderValue::Text(name.to_owned()))
    }

    /// Type header; the conventional encoding null-terminates the ASCII
    /// type string.
    pub fn object_type(mime: &str) -> Self {
        let mut bytes = mime.as_bytes().to_vec();
        bytes.push(0);
        Self::new(HeaderId::TYPE, HeaderValue::Bytes(bytes))
    }

    /// Object length announced ahead of a PUT body.
    pub fn length(len: u32) -> Self {
        Self::new(HeaderId::LENGTH, HeaderValue::U32(len))
    }

    /// Service target UUID for CONNECT.
    pub fn target(uuid: &[u8]) -> Self {
        Self::new(HeaderId::TARGET, HeaderValue::Bytes(uuid.to_vec()))
    }

    /// A non-final body chunk.
    pub fn body(chunk: Vec<u8>) -> Self {
        Self::new(HeaderId::BODY, HeaderValue::Bytes(chunk))
    }

    /// The final body chunk.
    pub fn end_of_body(chunk: Vec<u8>) -> Self {
        Self::new(HeaderId::END_OF_BODY, HeaderValue::Bytes(chunk))
    }

    /// Connection-ID echo.
    pub fn connection_id(id: u32) -> Self {
        Self::new(HeaderId::CONNECTION_ID, HeaderValue::U32(id))
    }

    /// Application parameters as raw tag/length/value bytes.
    pub fn app_parameters(params: Vec<u8>) -> Self {
        Self::new(HeaderId::APP_PARAMETERS, HeaderValue::Bytes(params))
    }

    /// Text content, if this is a text header.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Byte content, if this is a byte-sequence header.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            HeaderValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Integer content, if this is a 4-byte header.
    pub fn as_u32(&self) -> Option<u32> {
        match &self.value {
            HeaderValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// Serialize onto the end of `buf`.
    ///
    /// Fails when the value variant does not match the identifier's
    /// encoding kind; the constructors above always match.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodingError> {
        if self.id.kind() != self.value.kind() {
            return Err(EncodingError::ValueKindMismatch {
                id: self.id.as_byte(),
            });
        }
        buf.push(self.id.as_byte());
        match &self.value {
            HeaderValue::Text(text) => {
                let content = encode_text(text);
                buf.extend_from_slice(&length_prefix(content.len())?.to_be_bytes());
                buf.extend_from_slice(&content);
            }
            HeaderValue::Bytes(bytes) => {
                buf.extend_from_slice(&length_prefix(bytes.len())?.to_be_bytes());
                buf.extend_from_slice(bytes);
            }
            HeaderValue::U8(v) => buf.push(*v),
            HeaderValue::U32(v) => buf.extend_from_slice(&v.to_be_bytes()),
        }
        Ok(())
    }

    /// Decode one header starting at `offset`, returning it and the offset
    /// of the next header.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(Self, usize), HeaderDecodeError> {
        let remaining = buf.len().saturating_sub(offset);
        if remaining < 1 {
            return Err(HeaderDecodeError::UnexpectedEnd {
                needed: 1,
                available: 0,
            });
        }
        let id = HeaderId::from_byte(buf[offset]);
        match id.kind() {
            HeaderKind::Text | HeaderKind::Bytes => {
                if remaining < 3 {
                    return Err(HeaderDecodeError::UnexpectedEnd {
                        needed: 3,
                        available: remaining,
                    });
                }
                let declared = u16::from_be_bytes([buf[offset + 1], buf[offset + 2]]);
                if declared < 3 {
                    return Err(HeaderDecodeError::BadLengthPrefix {
                        id: id.as_byte(),
                        declared,
                    });
                }
                if remaining < declared as usize {
                    return Err(HeaderDecodeError::UnexpectedEnd {
                        needed: declared as usize,
                        available: remaining,
                    });
                }
                let content = &buf[offset + 3..offset + declared as usize];
                let value = match id.kind() {
                    HeaderKind::Text => HeaderValue::Text(decode_text(content, id)?),
                    _ => HeaderValue::Bytes(content.to_vec()),
                };
                Ok((Self::new(id, value), offset + declared as usize))
            }
            HeaderKind::U8 => {
                if remaining < 2 {
                    return Err(HeaderDecodeError::UnexpectedEnd {
                        needed: 2,
                        available: remaining,
                    });
                }
                let value = HeaderValue::U8(buf[offset + 1]);
                Ok((Self::new(id, value), offset + 2))
            }
            HeaderKind::U32 => {
                if remaining < 5 {
                    return Err(HeaderDecodeError::UnexpectedEnd {
                        needed: 5,
                        available: remaining,
                    });
                }
                let value = HeaderValue::U32(u32::from_be_bytes([
                    buf[offset + 1],
                    buf[offset + 2],
                    buf[offset + 3],
                    buf[offset + 4],
                ]));
                Ok((Self::new(id, value), offset + 5))
            }
        }
    }
}

/// Total header length for a length-prefixed kind, refusing content that
/// cannot be represented in the 16-bit field.
fn length_prefix(content_len: usize) -> Result<u16, EncodingError> {
    u16::try_from(3 + content_len).map_err(|_| EncodingError::FrameTooLarge {
        len: 3 + content_len,
        max: u16::MAX,
    })
}

/// UTF-16BE bytes without a terminator, as application parameters carry
/// names.
pub(crate) fn utf16_be_bytes(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Encode text as null-terminated UTF-16BE. The empty string encodes to
/// just the terminator, matching what deployed stacks send.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = utf16_be_bytes(text);
    out.extend_from_slice(&[0, 0]);
    out
}

/// Decode null-terminated UTF-16BE. Zero-length content is tolerated and
/// reads as the empty string; some devices omit the terminator entirely.
fn decode_text(content: &[u8], id: HeaderId) -> Result<String, HeaderDecodeError> {
    if content.is_empty() {
        return Ok(String::new());
    }
    let invalid = || HeaderDecodeError::InvalidText { id: id.as_byte() };
    if content.len() % 2 != 0 {
        return Err(invalid());
    }
    let mut units: Vec<u16> = content
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    if units.last() == Some(&0) {
        units.pop();
    }
    String::from_utf16(&units).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(header: Header) -> Header {
        let mut buf = Vec::new();
        header.encode_into(&mut buf).unwrap();
        let (decoded, consumed) = Header::decode(&buf, 0).unwrap();
        assert_eq!(consumed, buf.len());
        decoded
    }

    #[test]
    fn test_kind_dispatch() {
        assert_eq!(HeaderId::NAME.kind(), HeaderKind::Text);
        assert_eq!(HeaderId::BODY.kind(), HeaderKind::Bytes);
        assert_eq!(HeaderId::CONNECTION_ID.kind(), HeaderKind::U32);
        assert_eq!(HeaderId::from_byte(0x80).kind(), HeaderKind::U8);
    }

    #[test]
    fn test_name_wire_bytes() {
        let mut buf = Vec::new();
        Header::name("x").encode_into(&mut buf).unwrap();
        assert_eq!(buf, hex::decode("01000700780000").unwrap());
    }

    #[test]
    fn test_connection_id_wire_bytes() {
        let mut buf = Vec::new();
        Header::connection_id(1).encode_into(&mut buf).unwrap();
        assert_eq!(buf, vec![0xCB, 0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        assert_eq!(roundtrip(Header::name("photos/cat.jpg")).as_text(), Some("photos/cat.jpg"));
        assert_eq!(
            roundtrip(Header::body(vec![1, 2, 3])).as_bytes(),
            Some(&[1u8, 2, 3][..])
        );
        assert_eq!(roundtrip(Header::length(0xDEAD_BEEF)).as_u32(), Some(0xDEAD_BEEF));
        let one_byte = Header::new(HeaderId::from_byte(0x97), HeaderValue::U8(0x42));
        assert_eq!(roundtrip(one_byte).value, HeaderValue::U8(0x42));
    }

    #[test]
    fn test_empty_name_roundtrip() {
        let decoded = roundtrip(Header::name(""));
        assert_eq!(decoded.as_text(), Some(""));
    }

    #[test]
    fn test_unknown_id_decodes_structurally() {
        // 0xF0 has U32 kind but is not a registered identifier.
        let header = Header::new(HeaderId::from_byte(0xF0), HeaderValue::U32(7));
        let decoded = roundtrip(header.clone());
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_type_is_null_terminated() {
        let header = Header::object_type("x-obex/folder-listing");
        let bytes = header.as_bytes().unwrap();
        assert_eq!(bytes.last(), Some(&0));
        assert_eq!(&bytes[..bytes.len() - 1], b"x-obex/folder-listing");
    }

    #[test]
    fn test_truncated_length_prefix() {
        assert!(matches!(
            Header::decode(&[0x01, 0x00], 0),
            Err(HeaderDecodeError::UnexpectedEnd { needed: 3, .. })
        ));
    }

    #[test]
    fn test_content_overruns_buffer() {
        // Declares 10 bytes total but only 5 are present.
        assert!(matches!(
            Header::decode(&[0x48, 0x00, 0x0A, 0xAA, 0xBB], 0),
            Err(HeaderDecodeError::UnexpectedEnd { needed: 10, available: 5 })
        ));
    }

    #[test]
    fn test_bad_length_prefix() {
        assert!(matches!(
            Header::decode(&[0x48, 0x00, 0x02, 0x00], 0),
            Err(HeaderDecodeError::BadLengthPrefix { id: 0x48, declared: 2 })
        ));
    }

    #[test]
    fn test_odd_text_length_rejected() {
        // 4 total = 1 content byte, not a whole UTF-16 unit.
        assert!(matches!(
            Header::decode(&[0x01, 0x00, 0x04, 0x61], 0),
            Err(HeaderDecodeError::InvalidText { id: 0x01 })
        ));
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let bad = Header::new(HeaderId::NAME, HeaderValue::U32(1));
        let mut buf = Vec::new();
        assert!(matches!(
            bad.encode_into(&mut buf),
            Err(crate::core::error::EncodingError::ValueKindMismatch { id: 0x01 })
        ));
        assert!(buf.is_empty());
    }
}
