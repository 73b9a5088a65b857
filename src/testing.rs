//! Scripted in-memory transport for session and operation tests.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::core::traits::Transport;
use crate::protocol::frame::Frame;

/// What `receive` does once the scripted bytes run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnEmpty {
    /// Report the peer closing the channel (read of zero bytes).
    Eof,
    /// Report a blocking-receive timeout.
    TimedOut,
}

/// A [`Transport`] that captures everything sent and serves pre-queued
/// response bytes, optionally a few bytes per read to exercise frame
/// reassembly.
#[derive(Debug)]
pub struct ScriptedTransport {
    incoming: VecDeque<u8>,
    /// Every `send` call, in order.
    pub sent: Vec<Vec<u8>>,
    read_fragment: usize,
    on_empty: OnEmpty,
    /// Number of `close` calls observed.
    pub close_calls: usize,
    /// Timeout last configured through the trait.
    pub timeout: Option<Duration>,
}

impl ScriptedTransport {
    /// Empty script; reads at the end report EOF.
    pub fn new() -> Self {
        Self {
            incoming: VecDeque::new(),
            sent: Vec::new(),
            read_fragment: usize::MAX,
            on_empty: OnEmpty::Eof,
            close_calls: 0,
            timeout: None,
        }
    }

    /// Cap each `receive` call at `n` bytes.
    pub fn with_fragment(mut self, n: usize) -> Self {
        self.read_fragment = n;
        self
    }

    /// Change what happens when the script is exhausted.
    pub fn on_empty(mut self, behavior: OnEmpty) -> Self {
        self.on_empty = behavior;
        self
    }

    /// Queue a whole response frame.
    pub fn queue_frame(&mut self, frame: &Frame) {
        let bytes = frame.encode(u16::MAX).expect("test frame encodes");
        self.incoming.extend(bytes);
    }

    /// Queue raw bytes verbatim.
    pub fn queue_bytes(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied());
    }

    /// Decode the n-th sent frame for assertions.
    pub fn sent_frame(&self, index: usize, prefix_len: usize) -> Frame {
        Frame::decode(&self.sent[index], prefix_len).expect("sent frame decodes")
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.sent.push(buf.to_vec());
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.incoming.is_empty() {
            return match self.on_empty {
                OnEmpty::Eof => Ok(0),
                OnEmpty::TimedOut => Err(io::Error::new(io::ErrorKind::TimedOut, "scripted timeout")),
            };
        }
        let n = buf.len().min(self.read_fragment).min(self.incoming.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.incoming.pop_front().expect("checked non-empty");
        }
        Ok(n)
    }

    fn set_receive_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.close_calls += 1;
        Ok(())
    }
}
