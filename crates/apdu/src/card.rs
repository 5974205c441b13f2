//! Card handle abstraction
//!
//! [`IsoCard`] represents one physical proximity session with an
//! ISO 7816-4 device. A handle is created when the proximity subsystem
//! reports a device, becomes connected only when the consumer explicitly
//! connects, and is closed for good once the device leaves the field; a
//! new physical presentation always yields a new handle.
//!
//! Transceive operations are blocking and single-outstanding-operation
//! per handle. No internal lock is provided; callers must serialize all
//! transceive calls against one handle.

use std::fmt;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::TransportError;

/// Capability surface of a card handle
///
/// Implemented once per host platform; implementations apply any
/// hardware quirk corrections transparently.
pub trait IsoCard: fmt::Debug {
    /// Open the connection to the card
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Close the connection; the handle is never reused afterwards
    fn close(&mut self) -> Result<(), TransportError>;

    /// Whether the handle currently holds an open connection
    fn is_connected(&self) -> bool;

    /// Per-transceive timeout in milliseconds
    fn timeout(&self) -> u32;

    /// Set the per-transceive timeout in milliseconds
    fn set_timeout(&mut self, timeout_ms: u32);

    /// Maximum number of bytes a single transceive may carry
    ///
    /// Platform- and device-dependent; implementations may clamp an
    /// erroneously large reported value down to a known-safe ceiling.
    fn max_transceive_length(&self) -> Result<usize, TransportError>;

    /// Send one command APDU and receive its response
    fn transceive(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Transceive each command in order and collect the responses
    ///
    /// Stops at the first failure and propagates it; no partial results
    /// are returned.
    fn transceive_batch(&mut self, commands: &[&[u8]]) -> Result<Vec<Bytes>, TransportError> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            trace!(command = %hex::encode_upper(command), "transceiving batched command");
            match self.transceive(command) {
                Ok(response) => responses.push(response),
                Err(e) => {
                    debug!(error = %e, "batched transceive failed");
                    return Err(e);
                }
            }
        }
        Ok(responses)
    }
}

/// Scripted in-memory card used by the transceive helper tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MockCard {
    /// Responses returned in order; a transceive past the end fails
    pub responses: Vec<Bytes>,
    /// Commands received so far
    pub commands: Vec<Bytes>,
    pub connected: bool,
    pub timeout_ms: u32,
}

#[cfg(test)]
impl MockCard {
    pub fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = &'static [u8]>,
    {
        Self {
            responses: responses.into_iter().map(Bytes::from_static).collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl IsoCard for MockCard {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn timeout(&self) -> u32 {
        self.timeout_ms
    }

    fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    fn max_transceive_length(&self) -> Result<usize, TransportError> {
        Ok(261)
    }

    fn transceive(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.commands.push(Bytes::copy_from_slice(command));
        if self.responses.is_empty() {
            return Err(TransportError::Transmission);
        }
        Ok(self.responses.remove(0))
    }
}
