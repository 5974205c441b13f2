//! Transceive helpers: response chaining and status enforcement
//!
//! Many cards cannot return an arbitrarily long response in one frame;
//! they return a short response ending in `61 XX` ("XX more bytes are
//! ready") and expect a GET RESPONSE command for the rest.
//! [`transceive_chained`] drives that exchange; the `require` helpers
//! wrap a single exchange and fail fast on an unexpected status word.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::card::IsoCard;
use crate::error::Error;
use crate::response::{response_data, status_bytes};
use crate::status::{StatusWord, common};

/// Send a command and reassemble a response delivered in multiple parts
///
/// While the response carries a `61 XX` continuation status its data is
/// accumulated and `get_response` is sent again; the final response is
/// appended whole, data and status. A response that is not chained is
/// therefore returned verbatim. There is no upper bound on the number of
/// exchanges; transport errors propagate, nothing is retried here.
pub fn transceive_chained<C: IsoCard + ?Sized>(
    card: &mut C,
    command: &[u8],
    get_response: &[u8],
) -> Result<Bytes, Error> {
    let mut buffer = BytesMut::new();
    let mut response = card.transceive(command)?;

    while status_bytes(&response)?.is_more_data_available() {
        trace!(
            pending = status_bytes(&response)?.sw2,
            "continuation status, fetching next part"
        );
        buffer.put_slice(response_data(&response)?);
        response = card.transceive(get_response)?;
    }

    buffer.put_slice(&response);
    Ok(buffer.freeze())
}

/// Perform one transceive and require an exact status word
///
/// Returns the raw response (data and status) when the status matches;
/// fails with [`Error::UnexpectedStatus`] carrying both values otherwise.
pub fn transceive_require_status<C: IsoCard + ?Sized>(
    card: &mut C,
    command: &[u8],
    expected: StatusWord,
) -> Result<Bytes, Error> {
    let response = card.transceive(command)?;
    let actual = status_bytes(&response)?;
    if actual == expected {
        Ok(response)
    } else {
        Err(Error::unexpected_status(expected, actual))
    }
}

/// Perform one transceive and require the success status (90 00)
pub fn transceive_require_ok<C: IsoCard + ?Sized>(
    card: &mut C,
    command: &[u8],
) -> Result<Bytes, Error> {
    transceive_require_status(card, command, common::SUCCESS)
}
