//! High-level file operations over an established session.

mod ftp;

pub use ftp::FtpClient;
