//! Core constants, error types and boundary traits.
//!
//! Everything else in the crate builds on this module; it has no view of
//! sessions or operations.

pub mod constants;
pub mod error;
pub mod traits;

pub use constants::{DEFAULT_PACKET_SIZE, MINIMUM_PACKET_SIZE, OBEX_VERSION};
pub use error::{EncodingError, FramingError, HeaderDecodeError, ObexError};
pub use traits::{DeviceAddress, DeviceHandle, Discovery, ServiceClass, Transport};
