//! Concrete transports implementing [`crate::core::traits::Transport`].
//!
//! Only TCP ships here; Bluetooth RFCOMM, IrDA and USB serial channels
//! are expected to come from platform crates implementing the same trait.

mod tcp;

pub use tcp::{OBEX_TCP_PORT, TcpTransport};
