//! Platform card factory and hardware corrections

use isotap_apdu::{Bytes, IsoCard, TransportError};

/// Timeout applied to a freshly connected card, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u32 = 15_000;

/// Known-safe single-frame ceiling for a device family that reports a
/// larger maximum than its NFC controller can actually move
const MAX_FRAME_CEILING: usize = 253;

/// Factory producing card handles from raw device references
///
/// Implemented once per host platform next to the matching
/// [`ProximityAdapter`](crate::ProximityAdapter).
pub trait CardSource<D> {
    /// The handle type this source produces
    type Card: IsoCard + Send + 'static;

    /// Obtain a card handle for a freshly discovered device
    fn obtain(&self, device: &D) -> Result<Self::Card, TransportError>;
}

/// Card handle wrapper applying hardware quirk corrections
///
/// Clamps the reported maximum transceive length to a known-safe
/// ceiling and applies a generous default timeout on every connect.
/// Everything else delegates to the wrapped handle.
#[derive(Debug)]
pub struct QuirkedCard<C: IsoCard> {
    inner: C,
}

impl<C: IsoCard> QuirkedCard<C> {
    /// Wrap a platform card handle
    pub const fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Unwrap the underlying handle
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: IsoCard> IsoCard for QuirkedCard<C> {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.inner.connect()?;
        self.inner.set_timeout(DEFAULT_TIMEOUT_MS);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close()
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn timeout(&self) -> u32 {
        self.inner.timeout()
    }

    fn set_timeout(&mut self, timeout_ms: u32) {
        self.inner.set_timeout(timeout_ms);
    }

    fn max_transceive_length(&self) -> Result<usize, TransportError> {
        Ok(self.inner.max_transceive_length()?.min(MAX_FRAME_CEILING))
    }

    fn transceive(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.inner.transceive(command)
    }
}
