use thiserror::Error;

/// Error kinds covering every way a handshake can fail.
///
/// `would_block` is deliberately absent: it is not an error, it's
/// communicated via `Blocked` on the `Ok` path of the driver.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("transport closed")]
    TransportClosed,

    #[error("bad handshake message: {0}")]
    BadMessage(&'static str),

    #[error("unsupported protocol version")]
    UnsupportedVersion,

    #[error("peer selected a cipher suite we did not offer")]
    CipherMismatch,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HandshakeError>;

impl HandshakeError {
    pub fn bad_message(reason: &'static str) -> Self {
        HandshakeError::BadMessage(reason)
    }
}
