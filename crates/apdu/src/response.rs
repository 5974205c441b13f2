//! Utility functions for APDU response handling
//!
//! A response APDU always ends in a two-byte status word; everything
//! before it is the data payload.

use tracing::debug;

use crate::error::Error;
use crate::status::StatusWord;

/// Extract the status word of a response APDU (always its last two bytes)
///
/// # Errors
/// Fails if the response is shorter than two bytes.
pub fn status_bytes(response: &[u8]) -> Result<StatusWord, Error> {
    if response.len() < 2 {
        debug!(len = response.len(), "response too short for status word");
        return Err(Error::ResponseTooShort(response.len()));
    }
    let len = response.len();
    Ok(StatusWord::new(response[len - 2], response[len - 1]))
}

/// Extract the data payload of a response APDU: everything except the
/// trailing status word
///
/// # Errors
/// Fails if the response is shorter than two bytes.
pub fn response_data(response: &[u8]) -> Result<&[u8], Error> {
    if response.len() < 2 {
        return Err(Error::ResponseTooShort(response.len()));
    }
    Ok(&response[..response.len() - 2])
}

/// Check whether a response carries exactly the expected status word
///
/// Exact equality, no wildcarding. A response too short to carry a
/// status word compares unequal to everything.
pub fn has_status(response: &[u8], expected: StatusWord) -> bool {
    status_bytes(response).is_ok_and(|actual| actual == expected)
}
