//! File Transfer Profile operations: list, get, put, delete, navigate,
//! rename.
//!
//! Each operation is one or more request/response exchanges through the
//! session's choke point. Multi-packet transfers split and reassemble
//! strictly along the negotiated maximum packet size; Continue responses
//! are the expected intermediate result, not an error.

use tracing::debug;

use crate::core::constants::{
    APPARAM_OPERATION_MOVE, APPARAM_TAG_DESTINATION, APPARAM_TAG_OPERATION, APPARAM_TAG_SOURCE,
    FOLDER_LISTING_TYPE, FRAME_HEADER_SIZE, SETPATH_BACKUP, SETPATH_DONT_CREATE,
};
use crate::core::error::ObexError;
use crate::core::traits::Transport;
use crate::protocol::frame::{Frame, Opcode, ResponseCode};
use crate::protocol::header::{self, Header, HeaderId};
use crate::session::{Session, SessionConfig, SessionState};

/// Per-packet bytes that are not body payload: the frame prefix plus the
/// Body header's own id and length field.
const BODY_PACKET_OVERHEAD: usize = FRAME_HEADER_SIZE + 3;

/// Wire size of a Connection-ID header echo.
const CONNECTION_ID_OVERHEAD: usize = 5;

/// An OBEX File Transfer Profile client.
///
/// Wraps a [`Session`] and exposes file-system-like operations. All
/// operations require the session to be Connected and leave it Connected
/// unless the error is fatal to the session.
#[derive(Debug)]
pub struct FtpClient<T: Transport> {
    session: Session<T>,
}

impl<T: Transport> FtpClient<T> {
    /// Connect to the Folder Browsing service over an open transport.
    pub fn connect(transport: T) -> Result<Self, ObexError> {
        Self::connect_with(transport, SessionConfig::new())
    }

    /// Connect with explicit session parameters.
    pub fn connect_with(transport: T, config: SessionConfig) -> Result<Self, ObexError> {
        let session = Session::connect(transport, config)?;
        Ok(Self { session })
    }

    /// The underlying session, for state and negotiation inspection.
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Fetch the folder listing of `path` (empty for the current folder).
    ///
    /// Returns the listing object, an XML document per the folder-listing
    /// DTD, as text.
    pub fn list(&mut self, path: &str) -> Result<String, ObexError> {
        debug!(path, "listing folder");
        let mut headers = vec![Header::object_type(FOLDER_LISTING_TYPE)];
        if !path.is_empty() {
            headers.push(Header::name(path));
        }
        let body = self.get_object(headers, path)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Fetch the object named `path`.
    pub fn get(&mut self, path: &str) -> Result<Vec<u8>, ObexError> {
        debug!(path, "getting object");
        self.get_object(vec![Header::name(path)], path)
    }

    /// Store `data` as the object named `path`, chunked to the negotiated
    /// packet size.
    pub fn put(&mut self, path: &str, data: &[u8]) -> Result<(), ObexError> {
        self.require_connected()?;
        debug!(path, len = data.len(), "putting object");
        self.session.begin_transfer();
        let result = self.put_chunked(path, data);
        self.session.finish_transfer();
        result
    }

    /// Delete the object named `path`.
    ///
    /// A PUT carrying a Name and no body bytes is the deletion request;
    /// a single round trip.
    pub fn delete(&mut self, path: &str) -> Result<(), ObexError> {
        self.require_connected()?;
        debug!(path, "deleting object");
        let request = self.session.request(Opcode::PutFinal, vec![Header::name(path)]);
        let status = self.exchange_status(request)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, path))
        }
    }

    /// Change the remote current folder to the child folder `segment`;
    /// the empty segment addresses the folder root.
    ///
    /// With `create` false the peer must not create a missing folder and
    /// answers NotFound instead.
    pub fn navigate(&mut self, segment: &str, create: bool) -> Result<(), ObexError> {
        self.require_connected()?;
        debug!(segment, create, "changing remote folder");
        let flags = if create { 0 } else { SETPATH_DONT_CREATE };
        let request = self.session.request_with_prefix(
            Opcode::SetPath,
            vec![flags, 0x00],
            vec![Header::name(segment)],
        );
        let status = self.exchange_status(request)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, segment))
        }
    }

    /// Change the remote current folder to its parent.
    pub fn navigate_up(&mut self) -> Result<(), ObexError> {
        self.require_connected()?;
        debug!("changing remote folder to parent");
        let request =
            self.session
                .request_with_prefix(Opcode::SetPath, vec![SETPATH_BACKUP, 0x00], vec![]);
        let status = self.exchange_status(request)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, ".."))
        }
    }

    /// Rename (move) the object `from` to `to` on the peer.
    ///
    /// Encoded as a PUT carrying only application parameters: the
    /// operation name under tag 0x34 and the two names, UTF-16BE and
    /// unterminated, under tags 0x35 and 0x36.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), ObexError> {
        self.require_connected()?;
        debug!(from, to, "renaming object");
        let mut params = Vec::new();
        params.push(APPARAM_TAG_OPERATION);
        params.push(APPARAM_OPERATION_MOVE.len() as u8);
        params.extend_from_slice(APPARAM_OPERATION_MOVE);
        for (tag, name) in [(APPARAM_TAG_SOURCE, from), (APPARAM_TAG_DESTINATION, to)] {
            let encoded = header::utf16_be_bytes(name);
            params.push(tag);
            params.push(encoded.len() as u8);
            params.extend_from_slice(&encoded);
        }
        let request = self
            .session
            .request(Opcode::PutFinal, vec![Header::app_parameters(params)]);
        let status = self.exchange_status(request)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, from))
        }
    }

    /// Cancel the transfer in progress, keeping the session usable when
    /// the peer cooperates.
    pub fn abort(&mut self) -> Result<(), ObexError> {
        self.session.abort()
    }

    /// End the session. The session is Closed afterwards even when the
    /// transport fails mid-exchange.
    pub fn disconnect(&mut self) -> Result<(), ObexError> {
        self.session.disconnect()
    }

    /// GET request/continue loop, accumulating body chunks until a
    /// terminal status.
    fn get_object(&mut self, headers: Vec<Header>, path: &str) -> Result<Vec<u8>, ObexError> {
        self.require_connected()?;
        self.session.begin_transfer();
        let result = self.get_loop(headers, path);
        self.session.finish_transfer();
        result
    }

    fn get_loop(&mut self, headers: Vec<Header>, path: &str) -> Result<Vec<u8>, ObexError> {
        let mut body = Vec::new();
        let mut request = self.session.request(Opcode::GetFinal, headers);
        loop {
            let response = self.session.exchange(request)?;
            let status = response_status(&response)?;
            for header in &response.headers {
                if header.id == HeaderId::BODY || header.id == HeaderId::END_OF_BODY {
                    if let Some(chunk) = header.as_bytes() {
                        body.extend_from_slice(chunk);
                    }
                }
            }
            match status {
                ResponseCode::Continue => {
                    request = self.session.request(Opcode::GetFinal, vec![]);
                }
                status if status.is_success() => {
                    debug!(len = body.len(), "object received");
                    return Ok(body);
                }
                status => return Err(status_error(status, path)),
            }
        }
    }

    /// PUT first packet (Name + Length), then body chunks, final chunk as
    /// EndOfBody.
    fn put_chunked(&mut self, path: &str, data: &[u8]) -> Result<(), ObexError> {
        let capacity = self.chunk_capacity();
        let first = self.session.request(
            Opcode::Put,
            vec![Header::name(path), Header::length(data.len() as u32)],
        );
        let status = self.exchange_status(first)?;
        if status != ResponseCode::Continue {
            return Err(status_error(status, path));
        }

        let mut remaining = data;
        while remaining.len() > capacity {
            let (chunk, rest) = remaining.split_at(capacity);
            let request = self
                .session
                .request(Opcode::Put, vec![Header::body(chunk.to_vec())]);
            let status = self.exchange_status(request)?;
            if status != ResponseCode::Continue {
                return Err(status_error(status, path));
            }
            remaining = rest;
        }

        let request = self.session.request(
            Opcode::PutFinal,
            vec![Header::end_of_body(remaining.to_vec())],
        );
        let status = self.exchange_status(request)?;
        if status.is_success() {
            debug!(len = data.len(), "object stored");
            Ok(())
        } else {
            Err(status_error(status, path))
        }
    }

    /// Body bytes that fit one PUT packet beside the frame prefix, the
    /// Body header and the Connection-ID echo.
    fn chunk_capacity(&self) -> usize {
        let mut overhead = BODY_PACKET_OVERHEAD;
        if self.session.connection_id().is_some() {
            overhead += CONNECTION_ID_OVERHEAD;
        }
        self.session.max_packet_size() as usize - overhead
    }

    fn exchange_status(&mut self, request: Frame) -> Result<ResponseCode, ObexError> {
        let response = self.session.exchange(request)?;
        response_status(&response)
    }

    fn require_connected(&self) -> Result<(), ObexError> {
        match self.session.state() {
            SessionState::Connected => Ok(()),
            actual => Err(ObexError::InvalidState {
                expected: SessionState::Connected,
                actual,
            }),
        }
    }
}

/// Status of a response already validated by the session.
fn response_status(response: &Frame) -> Result<ResponseCode, ObexError> {
    response.response_code().ok_or(ObexError::Protocol {
        code: response.code,
    })
}

/// Map a terminal failure status onto the error taxonomy.
fn status_error(status: ResponseCode, path: &str) -> ObexError {
    match status {
        ResponseCode::NotFound => ObexError::NotFound {
            path: path.to_owned(),
        },
        ResponseCode::Forbidden => ObexError::Forbidden {
            path: path.to_owned(),
        },
        status => ObexError::Rejected { status },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::OBEX_VERSION;
    use crate::testing::ScriptedTransport;

    fn connect_response(max_packet_size: u16, connection_id: Option<u32>) -> Frame {
        let headers = connection_id
            .map(|id| vec![Header::connection_id(id)])
            .unwrap_or_default();
        Frame::response_with_prefix(
            ResponseCode::Success,
            vec![
                OBEX_VERSION,
                0x00,
                (max_packet_size >> 8) as u8,
                max_packet_size as u8,
            ],
            headers,
        )
    }

    fn client_with(
        script: impl FnOnce(&mut ScriptedTransport),
    ) -> FtpClient<ScriptedTransport> {
        let mut transport = ScriptedTransport::new();
        transport.queue_frame(&connect_response(1024, None));
        script(&mut transport);
        FtpClient::connect(transport).unwrap()
    }

    fn sent(client: &FtpClient<ScriptedTransport>, index: usize) -> Frame {
        Frame::decode(&transport_of(client).sent[index], 0).unwrap()
    }

    fn transport_of(client: &FtpClient<ScriptedTransport>) -> &ScriptedTransport {
        client.session.transport_ref()
    }

    #[test]
    fn test_get_reassembles_chunked_object() {
        let object: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
        let mut client = client_with(|transport| {
            for chunk in object.chunks(1000) {
                transport.queue_frame(&Frame::response(
                    ResponseCode::Continue,
                    vec![Header::body(chunk.to_vec())],
                ));
            }
            transport.queue_frame(&Frame::response(
                ResponseCode::Success,
                vec![Header::end_of_body(Vec::new())],
            ));
        });

        let data = client.get("big.bin").unwrap();
        assert_eq!(data, object);
        assert_eq!(client.session().state(), SessionState::Connected);

        // One initial request plus one continuation per Continue response.
        let transport = transport_of(&client);
        assert_eq!(transport.sent.len(), 1 + 10 + 1);
        for bytes in &transport.sent {
            assert!(bytes.len() <= 1024);
        }
        let first = sent(&client, 1);
        assert_eq!(first.opcode(), Some(Opcode::GetFinal));
        assert_eq!(first.header(HeaderId::NAME).unwrap().as_text(), Some("big.bin"));
    }

    #[test]
    fn test_get_not_found_keeps_session_usable() {
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(ResponseCode::NotFound, vec![]));
        });

        let err = client.get("/images/none.jpg").unwrap_err();
        assert!(matches!(err, ObexError::NotFound { path } if path == "/images/none.jpg"));
        assert_eq!(client.session().state(), SessionState::Connected);
    }

    #[test]
    fn test_list_requests_folder_listing_type() {
        let listing = "<folder-listing><file name=\"a.txt\"/></folder-listing>";
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(
                ResponseCode::Success,
                vec![Header::end_of_body(listing.as_bytes().to_vec())],
            ));
        });

        let text = client.list("photos").unwrap();
        assert_eq!(text, listing);

        let request = sent(&client, 1);
        assert_eq!(request.opcode(), Some(Opcode::GetFinal));
        let object_type = request.header(HeaderId::TYPE).unwrap().as_bytes().unwrap();
        assert_eq!(object_type, b"x-obex/folder-listing\0");
        assert_eq!(request.header(HeaderId::NAME).unwrap().as_text(), Some("photos"));
    }

    #[test]
    fn test_list_root_omits_name_header() {
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(
                ResponseCode::Success,
                vec![Header::end_of_body(b"<folder-listing/>".to_vec())],
            ));
        });

        client.list("").unwrap();
        assert!(sent(&client, 1).header(HeaderId::NAME).is_none());
    }

    #[test]
    fn test_delete_sends_single_bodyless_put() {
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(ResponseCode::Success, vec![]));
        });

        client.delete("/images/some.jpg").unwrap();

        let transport = transport_of(&client);
        assert_eq!(transport.sent.len(), 2, "connect plus exactly one request");
        let request = sent(&client, 1);
        assert_eq!(request.opcode(), Some(Opcode::PutFinal));
        assert_eq!(
            request.header(HeaderId::NAME).unwrap().as_text(),
            Some("/images/some.jpg")
        );
        assert!(request.header(HeaderId::BODY).is_none());
        assert!(request.header(HeaderId::END_OF_BODY).is_none());
    }

    #[test]
    fn test_delete_not_found_carries_path() {
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(ResponseCode::NotFound, vec![]));
        });

        let err = client.delete("/images/some.jpg").unwrap_err();
        assert!(matches!(err, ObexError::NotFound { path } if path == "/images/some.jpg"));
    }

    #[test]
    fn test_put_chunks_along_negotiated_size() {
        let data: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        let mut client = client_with(|transport| {
            for _ in 0..3 {
                transport.queue_frame(&Frame::response(ResponseCode::Continue, vec![]));
            }
            transport.queue_frame(&Frame::response(ResponseCode::Success, vec![]));
        });

        client.put("big.bin", &data).unwrap();
        assert_eq!(client.session().state(), SessionState::Connected);

        let transport = transport_of(&client);
        // connect, first packet, two full chunks, final chunk
        assert_eq!(transport.sent.len(), 5);
        for bytes in &transport.sent {
            assert!(bytes.len() <= 1024);
        }

        let first = sent(&client, 1);
        assert_eq!(first.opcode(), Some(Opcode::Put));
        assert_eq!(first.header(HeaderId::NAME).unwrap().as_text(), Some("big.bin"));
        assert_eq!(first.header(HeaderId::LENGTH).unwrap().as_u32(), Some(2500));
        assert!(first.header(HeaderId::BODY).is_none());

        // No Connection-ID: capacity is 1024 - 6.
        let full = sent(&client, 2);
        assert_eq!(full.opcode(), Some(Opcode::Put));
        assert_eq!(full.header(HeaderId::BODY).unwrap().as_bytes().unwrap().len(), 1018);

        let last = sent(&client, 4);
        assert_eq!(last.opcode(), Some(Opcode::PutFinal));
        let tail = last.header(HeaderId::END_OF_BODY).unwrap().as_bytes().unwrap();
        assert_eq!(tail.len(), 2500 - 2 * 1018);

        let mut reassembled = Vec::new();
        for index in 2..5 {
            let frame = sent(&client, index);
            let chunk = frame
                .header(HeaderId::BODY)
                .or_else(|| frame.header(HeaderId::END_OF_BODY))
                .unwrap();
            reassembled.extend_from_slice(chunk.as_bytes().unwrap());
        }
        assert_eq!(reassembled, data);
    }

    #[test]
    fn test_put_empty_sends_end_of_body() {
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(ResponseCode::Continue, vec![]));
            transport.queue_frame(&Frame::response(ResponseCode::Success, vec![]));
        });

        client.put("empty.txt", &[]).unwrap();

        let last = sent(&client, 2);
        assert_eq!(last.opcode(), Some(Opcode::PutFinal));
        let tail = last.header(HeaderId::END_OF_BODY).unwrap();
        assert_eq!(tail.as_bytes(), Some(&[][..]));
    }

    #[test]
    fn test_put_unexpected_status_is_rejected() {
        let data = vec![0u8; 10];
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(ResponseCode::DatabaseFull, vec![]));
        });

        let err = client.put("big.bin", &data).unwrap_err();
        assert!(matches!(
            err,
            ObexError::Rejected { status: ResponseCode::DatabaseFull }
        ));
        assert_eq!(client.session().state(), SessionState::Connected);
    }

    #[test]
    fn test_navigate_sets_dont_create_flag() {
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(ResponseCode::Success, vec![]));
            transport.queue_frame(&Frame::response(ResponseCode::Success, vec![]));
        });

        client.navigate("photos", false).unwrap();
        client.navigate("new-folder", true).unwrap();

        let transport = transport_of(&client);
        let strict = Frame::decode(&transport.sent[1], 2).unwrap();
        assert_eq!(strict.opcode(), Some(Opcode::SetPath));
        assert_eq!(strict.prefix, vec![SETPATH_DONT_CREATE, 0x00]);
        assert_eq!(strict.header(HeaderId::NAME).unwrap().as_text(), Some("photos"));

        let create = Frame::decode(&transport.sent[2], 2).unwrap();
        assert_eq!(create.prefix, vec![0x00, 0x00]);
    }

    #[test]
    fn test_navigate_up_sends_backup_flag_without_name() {
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(ResponseCode::Success, vec![]));
        });

        client.navigate_up().unwrap();

        let request = Frame::decode(&transport_of(&client).sent[1], 2).unwrap();
        assert_eq!(request.prefix, vec![SETPATH_BACKUP, 0x00]);
        assert!(request.header(HeaderId::NAME).is_none());
    }

    #[test]
    fn test_rename_app_parameter_layout() {
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(ResponseCode::Success, vec![]));
        });

        client.rename("a.txt", "b.txt").unwrap();

        let request = sent(&client, 1);
        assert_eq!(request.opcode(), Some(Opcode::PutFinal));
        let params = request
            .header(HeaderId::APP_PARAMETERS)
            .unwrap()
            .as_bytes()
            .unwrap();
        let mut expected = vec![APPARAM_TAG_OPERATION, 4];
        expected.extend_from_slice(b"move");
        expected.extend_from_slice(&[APPARAM_TAG_SOURCE, 10]);
        expected.extend_from_slice(&header::utf16_be_bytes("a.txt"));
        expected.extend_from_slice(&[APPARAM_TAG_DESTINATION, 10]);
        expected.extend_from_slice(&header::utf16_be_bytes("b.txt"));
        assert_eq!(params, expected);
    }

    #[test]
    fn test_operation_after_disconnect_is_invalid_state() {
        let mut client = client_with(|transport| {
            transport.queue_frame(&Frame::response(ResponseCode::Success, vec![]));
        });

        client.disconnect().unwrap();
        assert!(matches!(
            client.get("a.txt"),
            Err(ObexError::InvalidState { actual: SessionState::Closed, .. })
        ));
    }

    #[test]
    fn test_connection_id_shrinks_chunk_capacity() {
        let data = vec![7u8; 1013];
        let mut transport = ScriptedTransport::new();
        transport.queue_frame(&connect_response(1024, Some(5)));
        transport.queue_frame(&Frame::response(ResponseCode::Continue, vec![]));
        transport.queue_frame(&Frame::response(ResponseCode::Success, vec![]));
        let mut client = FtpClient::connect(transport).unwrap();

        // 1013 = 1024 - 6 - 5: exactly one final chunk.
        client.put("fit.bin", &data).unwrap();
        let transport = transport_of(&client);
        assert_eq!(transport.sent.len(), 3);
        assert_eq!(transport.sent[2].len(), 1024);
        let last = Frame::decode(&transport.sent[2], 0).unwrap();
        assert_eq!(last.headers[0], Header::connection_id(5));
    }
}
