use thiserror::Error;

/// Error decoding an mDNS packet.
///
/// Every variant is fatal to the enclosing decode; a partially parsed
/// message is never returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("packet is smaller than header size")]
    TruncatedHeader,
    #[error("read crosses the end of the packet")]
    OutOfBounds,
    #[error("label length byte uses reserved tag bits")]
    BadLabelTag,
    #[error("compression pointer does not point strictly backwards")]
    CompressionLoop,
    #[error("NSEC bitmap window {0} is not supported")]
    InvalidNsecWindow(u8),
    #[error("record data is malformed")]
    MalformedRecord,
}
