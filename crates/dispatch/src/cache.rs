//! Single-slot tag cache
//!
//! Lets multiple independent application views share the one
//! most-recently-discovered device: a view registers as consumer when it
//! appears, gets the cached device replayed immediately if one is
//! already present, and reports the device through [`invalidate`]
//! when it turns out to be unusable.
//!
//! The cache is an explicitly owned object; tie its lifetime to the
//! owning application component and hand references to whoever needs
//! shared tag visibility. Wire it behind a dispatcher with a closure:
//!
//! ```ignore
//! let cache = Arc::new(TagCache::new());
//! let sink = Arc::clone(&cache);
//! let listener = move |card| sink.tag_discovered(Arc::new(card));
//! ```
//!
//! It assumes at most one concurrent mutator; the internal lock only
//! keeps the slot coherent, it is not a delivery ordering guarantee.
//!
//! [`invalidate`]: TagCache::invalidate

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::adapter::OnDiscoveredTagListener;

/// Shared slot holding at most one currently-valid device and at most
/// one registered consumer
pub struct TagCache<C> {
    inner: Mutex<CacheInner<C>>,
}

struct CacheInner<C> {
    consumer: Option<Arc<dyn OnDiscoveredTagListener<Arc<C>>>>,
    last: Option<Arc<C>>,
}

impl<C> TagCache<C> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                consumer: None,
                last: None,
            }),
        }
    }

    /// Register a consumer, replacing any previous one
    ///
    /// If a device is already cached it is delivered to the new
    /// consumer synchronously, before this call returns.
    pub fn set_consumer(&self, consumer: Arc<dyn OnDiscoveredTagListener<Arc<C>>>) {
        let cached = {
            let mut inner = self.inner.lock();
            inner.consumer = Some(Arc::clone(&consumer));
            inner.last.clone()
        };
        if let Some(card) = cached {
            consumer.tag_discovered(card);
        }
    }

    /// Detach the current consumer without touching the cached device
    pub fn clear_consumer(&self) {
        self.inner.lock().consumer = None;
    }

    /// Forget the cached device if it is the one reported as unusable
    ///
    /// A stale invalidation for a superseded device is a no-op.
    pub fn invalidate(&self, device: &Arc<C>) {
        let mut inner = self.inner.lock();
        if inner
            .last
            .as_ref()
            .is_some_and(|last| Arc::ptr_eq(last, device))
        {
            inner.last = None;
        }
    }

    /// The currently cached device, if any
    pub fn cached(&self) -> Option<Arc<C>> {
        self.inner.lock().last.clone()
    }

    /// Forward the device to the current consumer, then cache it
    ///
    /// The cache update happens whether or not a consumer was present.
    pub fn tag_discovered(&self, card: Arc<C>) {
        let consumer = self.inner.lock().consumer.clone();
        if let Some(consumer) = consumer {
            consumer.tag_discovered(Arc::clone(&card));
        }
        self.inner.lock().last = Some(card);
    }
}

impl<C> Default for TagCache<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TagCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("TagCache")
            .field("has_consumer", &inner.consumer.is_some())
            .field("has_device", &inner.last.is_some())
            .finish()
    }
}
