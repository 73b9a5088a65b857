//! Pure wire-format transforms: headers and frames.
//!
//! Nothing in this module performs I/O; the session layer feeds it byte
//! buffers and sends what it produces.

pub mod frame;
pub mod header;

pub use frame::{Frame, Opcode, ResponseCode};
pub use header::{Header, HeaderId, HeaderKind, HeaderValue};
