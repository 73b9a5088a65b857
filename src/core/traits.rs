//! Boundary traits for the OBEX client core.
//!
//! The core never opens its own links. A [`Transport`] is handed in already
//! connected (Bluetooth RFCOMM, IrDA, USB serial or TCP are interchangeable
//! beneath it) and a [`Discovery`] implementation, where available, supplies
//! the device addresses and channel numbers that the transport layer needs
//! to open one.

use std::io;
use std::time::Duration;

/// An ordered, reliable, full-duplex byte channel.
///
/// The session layer assumes nothing about read boundaries: a single OBEX
/// frame may arrive across many `receive` calls, and one call never returns
/// bytes from more than was asked for. Implementations must block on
/// `receive` until data arrives or the configured timeout elapses, in which
/// case they return an error of kind [`io::ErrorKind::WouldBlock`] or
/// [`io::ErrorKind::TimedOut`].
pub trait Transport {
    /// Send the whole buffer.
    fn send(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Receive at most `buf.len()` bytes, blocking until at least one byte
    /// arrives. Returns 0 only when the peer closed the channel.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Set the blocking-receive timeout. `None` blocks indefinitely.
    fn set_receive_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Tear down the channel. Called when the session closes; must be safe
    /// to call more than once.
    fn close(&mut self) -> io::Result<()>;
}

/// Opaque identifier of a discovered device, e.g. a Bluetooth address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceAddress(pub String);

impl std::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A device together with the channel its OBEX service listens on.
///
/// Immutable once obtained; consumed by whatever opens the [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    /// Device address from discovery.
    pub address: DeviceAddress,
    /// Resolved RFCOMM channel (or equivalent) number.
    pub channel: u8,
}

impl DeviceHandle {
    /// Pair an address with its resolved channel.
    pub fn new(address: DeviceAddress, channel: u8) -> Self {
        Self { address, channel }
    }
}

/// OBEX service classes a channel can be resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceClass {
    /// File Transfer Profile (folder browsing).
    FileTransfer,
    /// Object Push Profile.
    ObjectPush,
    /// IrMC Synchronization.
    Synchronization,
}

/// Device inquiry and service/channel resolution.
///
/// Bluetooth inquiry and SDP browsing live behind this trait, outside the
/// protocol core.
pub trait Discovery {
    /// Enumerate reachable devices, nearest first where the medium knows.
    fn discover(&mut self) -> io::Result<Vec<DeviceAddress>>;

    /// Resolve the channel a device serves the given service class on.
    fn resolve_channel(
        &mut self,
        address: &DeviceAddress,
        service: ServiceClass,
    ) -> io::Result<u8>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedInquiry;

    impl Discovery for FixedInquiry {
        fn discover(&mut self) -> io::Result<Vec<DeviceAddress>> {
            Ok(vec![DeviceAddress("00:11:22:33:44:55".into())])
        }

        fn resolve_channel(
            &mut self,
            _address: &DeviceAddress,
            service: ServiceClass,
        ) -> io::Result<u8> {
            Ok(match service {
                ServiceClass::FileTransfer => 6,
                ServiceClass::ObjectPush => 9,
                ServiceClass::Synchronization => 11,
            })
        }
    }

    #[test]
    fn test_discovery_to_device_handle() {
        let mut inquiry = FixedInquiry;
        let devices = inquiry.discover().unwrap();
        let address = devices.into_iter().next().unwrap();
        let channel = inquiry
            .resolve_channel(&address, ServiceClass::FileTransfer)
            .unwrap();
        let handle = DeviceHandle::new(address.clone(), channel);
        assert_eq!(handle.channel, 6);
        assert_eq!(handle.address.to_string(), "00:11:22:33:44:55");
        assert_eq!(handle, DeviceHandle::new(address, 6));
    }
}
