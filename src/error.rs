use std::fmt;

/// Errors produced by the frame codec (stuffing/destuffing).
#[derive(Debug)]
pub enum CodecError {
    /// The stuffed region ended with a dangling escape byte (`0x7D`) and could
    /// not be destuffed.
    MalformedStuffing,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::MalformedStuffing => write!(f, "dangling escape byte in stuffed region"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Errors produced by the link-layer session.
#[derive(Debug)]
pub enum Error {
    /// `open` exhausted its retries without receiving a UA.
    OpenFailed,
    /// `write` exhausted its retries without receiving an RR.
    WriteFailed,
    /// The frame captured by `read` failed BCC1/BCC2 or could not be
    /// destuffed; a REJ has already been sent.
    FrameError,
    /// The frame captured by `read` was a retransmitted duplicate of the last
    /// frame delivered to the application; an RR has already been re-sent.
    Duplicate,
    /// `close` could not complete the teardown handshake. The port has still
    /// been closed; this is a warning, not a fatal error.
    CloseWarning,
    /// The session is not in a state that permits the requested operation
    /// (e.g. `write`/`read` on a session that is not `Open`).
    NotOpen,
    /// The caller supplied a payload longer than `Pmax` or of length zero.
    InvalidPayloadLength,
    /// Underlying serial port I/O failed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OpenFailed => write!(f, "open: no UA received after exhausting retries"),
            Error::WriteFailed => write!(f, "write: no RR received after exhausting retries"),
            Error::FrameError => write!(f, "read: frame failed BCC1/BCC2 validation"),
            Error::Duplicate => write!(f, "read: duplicate frame discarded"),
            Error::CloseWarning => write!(f, "close: teardown handshake did not complete cleanly"),
            Error::NotOpen => write!(f, "operation requires an open session"),
            Error::InvalidPayloadLength => write!(f, "payload length must be in 1..=Pmax"),
            Error::Io(e) => write!(f, "serial port I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
