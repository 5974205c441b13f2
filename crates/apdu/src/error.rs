//! Error types for APDU construction, parsing and transceive operations

use crate::status::StatusWord;

/// Error type for protocol-layer APDU operations
///
/// Variants fall into three families: malformed input from the caller
/// (hex/AID/response framing), I/O failures surfaced by the card link,
/// and a response status that did not match an explicitly required value.
///
/// `PartialEq` only: the embedded [`hex::FromHexError`] does not
/// implement `Eq`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Malformed hex input (odd length or non-hex digit)
    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Response too short to carry a status word
    #[error("response too short to contain a status word: {0} bytes")]
    ResponseTooShort(usize),

    /// AID too long to encode its length in a single byte
    #[error("AID of {0} bytes exceeds the one-byte length field")]
    AidTooLong(usize),

    /// I/O failure from the card handle
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response status did not match the required value
    #[error("unexpected status: expected {expected}, got {actual}")]
    UnexpectedStatus {
        /// The status the caller required
        expected: StatusWord,
        /// The status the card actually returned
        actual: StatusWord,
    },
}

impl Error {
    /// Create a new unexpected-status error
    pub const fn unexpected_status(expected: StatusWord, actual: StatusWord) -> Self {
        Self::UnexpectedStatus { expected, actual }
    }

    /// Whether this error denotes malformed caller input rather than an
    /// I/O or status condition
    pub const fn is_invalid_format(&self) -> bool {
        matches!(
            self,
            Self::InvalidHex(_) | Self::ResponseTooShort(_) | Self::AidTooLong(_)
        )
    }
}

/// I/O-level failure of a card link
///
/// Raised by [`IsoCard`](crate::card::IsoCard) implementations and
/// propagated unchanged through the transceive helpers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the device
    #[error("failed to connect to device")]
    Connection,

    /// Failed to transmit data over the link
    #[error("failed to transmit data")]
    Transmission,

    /// The handle was used after being closed, or the device left the field
    #[error("card handle is closed")]
    Closed,

    /// The per-transceive timeout elapsed
    #[error("operation timed out")]
    Timeout,

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}
