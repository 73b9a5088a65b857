//! Protocol constants fixed by the OBEX specification and the File
//! Transfer Profile.
//!
//! These values are wire-level facts and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// PROTOCOL VERSION AND FRAME LAYOUT
// =============================================================================

/// OBEX protocol version byte (major 1, minor 0).
pub const OBEX_VERSION: u8 = 0x10;

/// Final bit, set on the last request packet of an operation and on every
/// response code.
pub const FINAL_BIT: u8 = 0x80;

/// Fixed frame prefix: 1-byte code + 2-byte big-endian total length.
pub const FRAME_HEADER_SIZE: usize = 3;

/// Non-header bytes carried by CONNECT requests and responses
/// (version + flags + max packet size).
pub const CONNECT_PREFIX_SIZE: usize = 4;

/// Non-header bytes carried by SETPATH requests (flags + constants).
pub const SETPATH_PREFIX_SIZE: usize = 2;

// =============================================================================
// PACKET SIZE BOUNDS
// =============================================================================

/// Smallest packet size a conforming peer may advertise.
pub const MINIMUM_PACKET_SIZE: u16 = 255;

/// Packet size proposed on CONNECT unless configured otherwise.
pub const DEFAULT_PACKET_SIZE: u16 = 1024;

/// Largest representable packet size (16-bit length field).
pub const MAXIMUM_PACKET_SIZE: u16 = u16::MAX;

// =============================================================================
// SETPATH FLAGS
// =============================================================================

/// Navigate to the parent folder instead of a named child.
pub const SETPATH_BACKUP: u8 = 0x01;

/// Fail if the target folder does not exist instead of creating it.
pub const SETPATH_DONT_CREATE: u8 = 0x02;

// =============================================================================
// SERVICE TARGETS
// =============================================================================

/// Folder Browsing service UUID (F9EC7BC4-953C-11D2-984E-525400DC9E09),
/// the Target header value for File Transfer Profile sessions.
pub const UUID_FOLDER_BROWSING: [u8; 16] = [
    0xF9, 0xEC, 0x7B, 0xC4, 0x95, 0x3C, 0x11, 0xD2, 0x98, 0x4E, 0x52, 0x54, 0x00, 0xDC, 0x9E,
    0x09,
];

/// Siemens S45 service UUID (6B01CB31-4106-11D4-9A77-0050DA3F471F), used by
/// S45-era phones in place of the Folder Browsing target.
pub const UUID_SIEMENS_S45: [u8; 16] = [
    0x6B, 0x01, 0xCB, 0x31, 0x41, 0x06, 0x11, 0xD4, 0x9A, 0x77, 0x00, 0x50, 0xDA, 0x3F, 0x47,
    0x1F,
];

// =============================================================================
// OBJECT TYPES AND APPLICATION PARAMETERS
// =============================================================================

/// Type header value requesting a folder listing object.
pub const FOLDER_LISTING_TYPE: &str = "x-obex/folder-listing";

/// Application-parameter tag carrying the remote operation name for
/// rename-style PUT requests.
pub const APPARAM_TAG_OPERATION: u8 = 0x34;

/// Application-parameter tag carrying the source name of a rename.
pub const APPARAM_TAG_SOURCE: u8 = 0x35;

/// Application-parameter tag carrying the destination name of a rename.
pub const APPARAM_TAG_DESTINATION: u8 = 0x36;

/// Operation name for a remote rename/move.
pub const APPARAM_OPERATION_MOVE: &[u8] = b"move";

// =============================================================================
// TIMING
// =============================================================================

/// Default blocking-receive timeout for one response frame.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_size_ordering() {
        assert!(MINIMUM_PACKET_SIZE <= DEFAULT_PACKET_SIZE);
        assert!(DEFAULT_PACKET_SIZE <= MAXIMUM_PACKET_SIZE);
    }

    #[test]
    fn test_connect_prefix_fits_minimum_frame() {
        assert!(FRAME_HEADER_SIZE + CONNECT_PREFIX_SIZE <= MINIMUM_PACKET_SIZE as usize);
    }
}
