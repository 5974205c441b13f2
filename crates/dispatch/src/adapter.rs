//! Boundary traits towards the host platform
//!
//! The arbiter never talks to proximity hardware itself; it drives a
//! [`ProximityAdapter`] implemented once per host platform, and tells
//! the user about missing or disabled hardware through a fire-and-forget
//! [`GuidanceSink`].

use std::sync::Arc;

/// Callback through which an adapter reports raw device discoveries
pub type DiscoveryHandler<D> = Arc<dyn Fn(D) + Send + Sync>;

/// Low-level radio technology an exclusive subscription can be
/// restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioTechnology {
    /// ISO 14443 Type A
    TypeA,
    /// ISO 14443 Type B
    TypeB,
    /// FeliCa
    TypeF,
    /// ISO 15693
    TypeV,
}

/// Options handed to the platform when entering exclusive mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusiveOptions {
    /// Restrict discovery to one radio technology
    pub technology: RadioTechnology,
    /// Skip the upfront format probe the subsystem would otherwise
    /// perform, trading compatibility breadth for lower latency
    pub skip_format_check: bool,
    /// Silence platform-native feedback sounds while the subscription
    /// is active
    pub suppress_sounds: bool,
    /// Delay before periodic presence re-checks, in milliseconds
    ///
    /// Some chipset families perform the presence check with a command
    /// that resets the link mid-operation; delaying it avoids that.
    pub presence_check_delay_ms: Option<u32>,
}

/// Capability surface of the platform's proximity-sensing subsystem
///
/// Discoveries arrive either through the handler registered with
/// [`start_exclusive`](Self::start_exclusive), or (in compatibility
/// mode) through a platform event the host integration must forward to
/// [`TagDispatcher::intercept_event`](crate::TagDispatcher::intercept_event),
/// which extracts the device via
/// [`device_from_event`](Self::device_from_event).
pub trait ProximityAdapter {
    /// Opaque handle for a freshly discovered device
    type Device: Send + 'static;
    /// Platform event object delivered in compatibility mode
    type Event;

    /// Whether the host has a proximity subsystem at all
    fn is_present(&self) -> bool;

    /// Whether the subsystem is administratively enabled
    fn is_enabled(&self) -> bool;

    /// Whether the platform supports exclusive-ownership listening
    fn supports_exclusive(&self) -> bool;

    /// Subscribe in exclusive mode: the subsystem grants this component
    /// sole ownership of every presentation
    fn start_exclusive(&mut self, options: &ExclusiveOptions, handler: DiscoveryHandler<Self::Device>);

    /// Tear down an exclusive subscription
    fn stop_exclusive(&mut self);

    /// Subscribe in compatibility mode: presentations arrive indirectly
    /// as platform events the host must forward for interception
    fn start_compatibility(&mut self);

    /// Tear down a compatibility subscription
    fn stop_compatibility(&mut self);

    /// Extract the raw device reference from a platform event, if the
    /// event carries one
    fn device_from_event(&self, event: &Self::Event) -> Option<Self::Device>;
}

/// Advisory side channel for user-facing guidance
///
/// Entirely fire-and-forget: no return values, no coupling to the
/// arbiter's state machine.
pub trait GuidanceSink: Send + Sync {
    /// Show a transient message to the user
    fn show_message(&self, message: &str);

    /// Navigate the user to the subsystem's settings screen
    fn open_settings(&self) {}
}

/// Guidance sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGuidance;

impl GuidanceSink for NoGuidance {
    fn show_message(&self, _message: &str) {}
}

/// Listener receiving validated card handles
///
/// Invoked at most once per successfully validated discovery and never
/// concurrently with itself.
pub trait OnDiscoveredTagListener<C>: Send + Sync {
    /// A validated device has been presented
    fn tag_discovered(&self, card: C);
}

impl<C, F> OnDiscoveredTagListener<C> for F
where
    F: Fn(C) + Send + Sync,
{
    fn tag_discovered(&self, card: C) {
        self(card)
    }
}
