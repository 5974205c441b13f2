//! The tag-acquisition arbiter
//!
//! [`TagDispatcher`] owns the decision of how to listen for a proximity
//! event, validates every freshly discovered device before the
//! application sees it, and delivers validated handles to the single
//! registered listener under the configured threading policy.
//!
//! The state machine is small: `Idle` until [`enable`] subscribes in one
//! of two modes, then every validated discovery produces one listener
//! invocation while the subscription keeps listening for further
//! presentations, until [`disable`] tears it down again.
//!
//! [`enable`]: TagDispatcher::enable
//! [`disable`]: TagDispatcher::disable

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use isotap_apdu::command::SELECT_PROBE;
use isotap_apdu::{IsoCard, TransportError};

use crate::adapter::{
    DiscoveryHandler, ExclusiveOptions, GuidanceSink, NoGuidance, OnDiscoveredTagListener,
    ProximityAdapter,
};
use crate::card::CardSource;
use crate::config::DispatchConfig;
use crate::executor::{DispatchExecutor, InlineExecutor, Task, ThreadExecutor};

const UNAVAILABLE_MESSAGE: &str = "This device does not support NFC";
const DISABLED_MESSAGE: &str = "NFC is turned off, please enable it in settings";

/// Outcome of starting to listen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenStatus {
    /// The platform has no proximity subsystem; the dispatcher stays
    /// idle
    NotAvailable,
    /// A subsystem exists but is administratively disabled; the
    /// dispatcher stays idle
    AvailableDisabled,
    /// Listening has started in one of the two modes
    AvailableEnabled,
}

/// The listening mode a dispatcher is currently subscribed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenMode {
    /// Sole ownership of every presentation, fine-grained flags
    Exclusive,
    /// Presentations arrive indirectly and must be forwarded to
    /// [`TagDispatcher::intercept_event`]
    Compatibility,
}

/// Active subscription, kept for the matching teardown
enum Subscription {
    Exclusive(ExclusiveOptions),
    Compatibility,
}

/// How validated devices reach the listener
enum Delivery {
    /// Host's primary context: run in place when already on it,
    /// schedule otherwise
    Primary(Arc<dyn DispatchExecutor>),
    /// Dispatcher-owned background context, always scheduled so the
    /// subsystem's own callback is unblocked immediately
    Background(ThreadExecutor),
}

impl Delivery {
    fn deliver(&self, task: Task) {
        match self {
            Self::Primary(executor) => {
                if executor.is_current() {
                    task();
                } else {
                    executor.dispatch(task);
                }
            }
            Self::Background(executor) => executor.dispatch(task),
        }
    }
}

/// State shared with the adapter's discovery callback
struct DispatchCore<D, S: CardSource<D>> {
    source: S,
    listener: Arc<dyn OnDiscoveredTagListener<S::Card>>,
    delivery: Delivery,
    _device: PhantomData<fn(D)>,
}

impl<D, S: CardSource<D>> DispatchCore<D, S> {
    /// Validate a raw discovery and hand it to the listener
    ///
    /// A discovery that fails anywhere in here is dropped without a
    /// trace beyond a log line: the listener must never have to
    /// distinguish "no device" from "a device that failed silently".
    fn handle_discovery(&self, device: D) {
        let mut card = match self.source.obtain(&device) {
            Ok(card) => card,
            Err(e) => {
                warn!(error = %e, "dropping discovery, no card handle obtained");
                return;
            }
        };

        if let Err(e) = validate(&mut card) {
            warn!(error = %e, "dropping discovery, validation probe failed");
            return;
        }

        debug!("discovery validated, delivering to listener");
        let listener = Arc::clone(&self.listener);
        self.delivery
            .deliver(Box::new(move || listener.tag_discovered(card)));
    }
}

/// Probe a freshly discovered device before it is surfaced
///
/// The first connect/close cycle is disposable; one device family hangs
/// on its very first transceive without it. The second connection sends
/// a generic SELECT to prove the link can actually carry an exchange,
/// which filters out marginal presentations before the application ever
/// sees them.
fn validate<C: IsoCard>(card: &mut C) -> Result<(), TransportError> {
    card.connect()?;
    card.close()?;

    card.connect()?;
    card.transceive(&SELECT_PROBE)?;
    card.close()
}

/// Builder for [`TagDispatcher`]
///
/// Collects the platform boundary objects and the configuration matrix;
/// call [`build`](Self::build) to fix them for the dispatcher's
/// lifetime.
pub struct TagDispatcherBuilder<A, S>
where
    A: ProximityAdapter,
    S: CardSource<A::Device>,
{
    adapter: A,
    source: S,
    listener: Arc<dyn OnDiscoveredTagListener<S::Card>>,
    guidance: Arc<dyn GuidanceSink>,
    primary: Option<Arc<dyn DispatchExecutor>>,
    config: DispatchConfig,
}

impl<A, S> TagDispatcherBuilder<A, S>
where
    A: ProximityAdapter,
    S: CardSource<A::Device> + Send + Sync + 'static,
{
    /// Start building a dispatcher around a platform adapter, a card
    /// factory and the listener that will receive validated devices
    pub fn new<L>(adapter: A, source: S, listener: L) -> Self
    where
        L: OnDiscoveredTagListener<S::Card> + 'static,
    {
        Self {
            adapter,
            source,
            listener: Arc::new(listener),
            guidance: Arc::new(NoGuidance),
            primary: None,
            config: DispatchConfig::default(),
        }
    }

    /// Replace the default configuration
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the advisory guidance sink
    pub fn guidance(mut self, guidance: Arc<dyn GuidanceSink>) -> Self {
        self.guidance = guidance;
        self
    }

    /// Inject the host's primary execution context
    ///
    /// Only consulted when the configuration selects primary-thread
    /// dispatch; without it delivery falls back to [`InlineExecutor`].
    pub fn primary_executor(mut self, executor: Arc<dyn DispatchExecutor>) -> Self {
        self.primary = Some(executor);
        self
    }

    /// Build the dispatcher
    pub fn build(self) -> TagDispatcher<A, S> {
        let delivery = if self.config.dispatch_on_primary_thread {
            Delivery::Primary(
                self.primary
                    .unwrap_or_else(|| Arc::new(InlineExecutor)),
            )
        } else {
            Delivery::Background(ThreadExecutor::new())
        };

        TagDispatcher {
            adapter: self.adapter,
            core: Arc::new(DispatchCore {
                source: self.source,
                listener: self.listener,
                delivery,
                _device: PhantomData,
            }),
            subscription: None,
            config: self.config,
            guidance: self.guidance,
        }
    }
}

impl<A, S> fmt::Debug for TagDispatcherBuilder<A, S>
where
    A: ProximityAdapter,
    S: CardSource<A::Device>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagDispatcherBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The arbiter between the proximity subsystem and the application
pub struct TagDispatcher<A, S>
where
    A: ProximityAdapter,
    S: CardSource<A::Device>,
{
    adapter: A,
    core: Arc<DispatchCore<A::Device, S>>,
    subscription: Option<Subscription>,
    config: DispatchConfig,
    guidance: Arc<dyn GuidanceSink>,
}

impl<A, S> TagDispatcher<A, S>
where
    A: ProximityAdapter,
    S: CardSource<A::Device> + Send + Sync + 'static,
{
    /// Start listening for device presentations
    ///
    /// Picks exclusive mode when the platform supports it and the
    /// configuration has not vetoed it, compatibility mode otherwise.
    /// When the subsystem is absent or disabled the dispatcher stays
    /// idle and, if configured, tells the user through the guidance
    /// sink. Re-enabling an already listening dispatcher replaces the
    /// current subscription.
    pub fn enable(&mut self) -> ListenStatus {
        if !self.adapter.is_present() {
            debug!("no proximity subsystem on this host");
            if self.config.prompt_on_unavailable {
                self.guidance.show_message(UNAVAILABLE_MESSAGE);
            }
            return ListenStatus::NotAvailable;
        }

        if !self.adapter.is_enabled() {
            debug!("proximity subsystem is administratively disabled");
            if self.config.prompt_on_unavailable {
                self.guidance.show_message(DISABLED_MESSAGE);
                self.guidance.open_settings();
            }
            return ListenStatus::AvailableDisabled;
        }

        self.disable();

        if self.adapter.supports_exclusive() && !self.config.disable_exclusive_mode {
            let core = Arc::clone(&self.core);
            let handler: DiscoveryHandler<A::Device> =
                Arc::new(move |device| core.handle_discovery(device));
            let options = self.config.exclusive_options();
            debug!(?options, "entering exclusive listen mode");
            self.adapter.start_exclusive(&options, handler);
            self.subscription = Some(Subscription::Exclusive(options));
        } else {
            debug!("entering compatibility listen mode");
            self.adapter.start_compatibility();
            self.subscription = Some(Subscription::Compatibility);
        }

        ListenStatus::AvailableEnabled
    }

    /// Stop listening
    ///
    /// Tears down whichever mode is active. Idempotent, and safe to
    /// call on a dispatcher that never listened.
    pub fn disable(&mut self) {
        match self.subscription.take() {
            Some(Subscription::Exclusive(_)) => self.adapter.stop_exclusive(),
            Some(Subscription::Compatibility) => self.adapter.stop_compatibility(),
            None => {}
        }
    }

    /// Forward a platform event received in compatibility mode
    ///
    /// Extracts a raw device reference if the event carries one and
    /// runs it through the same validation path as an exclusive-mode
    /// discovery. Returns whether a device was found.
    pub fn intercept_event(&self, event: &A::Event) -> bool {
        match self.adapter.device_from_event(event) {
            Some(device) => {
                self.core.handle_discovery(device);
                true
            }
            None => false,
        }
    }

    /// The listening mode currently subscribed in, if any
    pub fn active_mode(&self) -> Option<ListenMode> {
        match self.subscription {
            Some(Subscription::Exclusive(_)) => Some(ListenMode::Exclusive),
            Some(Subscription::Compatibility) => Some(ListenMode::Compatibility),
            None => None,
        }
    }

    /// The configuration this dispatcher was built with
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The platform adapter, for host wiring
    pub const fn adapter(&self) -> &A {
        &self.adapter
    }
}

impl<A, S> fmt::Debug for TagDispatcher<A, S>
where
    A: ProximityAdapter,
    S: CardSource<A::Device>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagDispatcher")
            .field("config", &self.config)
            .field("active_mode", &match self.subscription {
                Some(Subscription::Exclusive(_)) => Some(ListenMode::Exclusive),
                Some(Subscription::Compatibility) => Some(ListenMode::Compatibility),
                None => None,
            })
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::RadioTechnology;
    use crate::config::PRESENCE_CHECK_DELAY_MS;
    use isotap_apdu::Bytes;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct AdapterState {
        handler: Option<DiscoveryHandler<u32>>,
        last_options: Option<ExclusiveOptions>,
        exclusive_started: usize,
        exclusive_stopped: usize,
        compat_started: usize,
        compat_stopped: usize,
    }

    struct MockAdapter {
        present: bool,
        enabled: bool,
        exclusive: bool,
        state: Arc<Mutex<AdapterState>>,
    }

    impl MockAdapter {
        fn ready(exclusive: bool) -> (Self, Arc<Mutex<AdapterState>>) {
            let state = Arc::new(Mutex::new(AdapterState::default()));
            (
                Self {
                    present: true,
                    enabled: true,
                    exclusive,
                    state: Arc::clone(&state),
                },
                state,
            )
        }
    }

    impl ProximityAdapter for MockAdapter {
        type Device = u32;
        type Event = Option<u32>;

        fn is_present(&self) -> bool {
            self.present
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn supports_exclusive(&self) -> bool {
            self.exclusive
        }

        fn start_exclusive(
            &mut self,
            options: &ExclusiveOptions,
            handler: DiscoveryHandler<u32>,
        ) {
            let mut state = self.state.lock();
            state.handler = Some(handler);
            state.last_options = Some(options.clone());
            state.exclusive_started += 1;
        }

        fn stop_exclusive(&mut self) {
            let mut state = self.state.lock();
            state.handler = None;
            state.exclusive_stopped += 1;
        }

        fn start_compatibility(&mut self) {
            self.state.lock().compat_started += 1;
        }

        fn stop_compatibility(&mut self) {
            self.state.lock().compat_stopped += 1;
        }

        fn device_from_event(&self, event: &Option<u32>) -> Option<u32> {
            *event
        }
    }

    #[derive(Debug)]
    struct ProbeCard {
        fail_probe: bool,
        connects: usize,
        transceives: usize,
        connected: bool,
        timeout_ms: u32,
    }

    impl IsoCard for ProbeCard {
        fn connect(&mut self) -> Result<(), TransportError> {
            self.connects += 1;
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
            Ok(253)
        }

        fn transceive(&mut self, _command: &[u8]) -> Result<Bytes, TransportError> {
            self.transceives += 1;
            if self.fail_probe {
                Err(TransportError::Transmission)
            } else {
                Ok(Bytes::from_static(&[0x90, 0x00]))
            }
        }
    }

    struct MockSource {
        fail_probe: bool,
    }

    impl CardSource<u32> for MockSource {
        type Card = ProbeCard;

        fn obtain(&self, _device: &u32) -> Result<ProbeCard, TransportError> {
            Ok(ProbeCard {
                fail_probe: self.fail_probe,
                connects: 0,
                transceives: 0,
                connected: false,
                timeout_ms: 0,
            })
        }
    }

    type Seen = Arc<Mutex<Vec<ProbeCard>>>;

    fn dispatcher(
        adapter: MockAdapter,
        fail_probe: bool,
        config: DispatchConfig,
    ) -> (TagDispatcher<MockAdapter, MockSource>, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let dispatcher =
            TagDispatcherBuilder::new(adapter, MockSource { fail_probe }, move |card| {
                sink.lock().push(card)
            })
            .config(config)
            .build();
        (dispatcher, seen)
    }

    #[derive(Default)]
    struct PromptLog {
        messages: Mutex<Vec<String>>,
        settings_opened: Mutex<usize>,
    }

    impl GuidanceSink for PromptLog {
        fn show_message(&self, message: &str) {
            self.messages.lock().push(message.to_owned());
        }

        fn open_settings(&self) {
            *self.settings_opened.lock() += 1;
        }
    }

    #[test]
    fn picks_exclusive_mode_when_supported() {
        let (adapter, state) = MockAdapter::ready(true);
        let (mut dispatcher, _seen) = dispatcher(adapter, false, DispatchConfig::default());

        assert_eq!(dispatcher.enable(), ListenStatus::AvailableEnabled);
        assert_eq!(dispatcher.active_mode(), Some(ListenMode::Exclusive));
        assert_eq!(state.lock().exclusive_started, 1);

        let options = state.lock().last_options.clone().unwrap();
        assert_eq!(options.technology, RadioTechnology::TypeA);
        assert_eq!(options.presence_check_delay_ms, Some(PRESENCE_CHECK_DELAY_MS));
    }

    #[test]
    fn falls_back_to_compatibility_without_support() {
        let (adapter, state) = MockAdapter::ready(false);
        let (mut dispatcher, _seen) = dispatcher(adapter, false, DispatchConfig::default());

        assert_eq!(dispatcher.enable(), ListenStatus::AvailableEnabled);
        assert_eq!(dispatcher.active_mode(), Some(ListenMode::Compatibility));
        assert_eq!(state.lock().compat_started, 1);
        assert_eq!(state.lock().exclusive_started, 0);
    }

    #[test]
    fn config_can_veto_exclusive_mode() {
        let (adapter, state) = MockAdapter::ready(true);
        let config = DispatchConfig::default().with_disable_exclusive_mode(true);
        let (mut dispatcher, _seen) = dispatcher(adapter, false, config);

        assert_eq!(dispatcher.enable(), ListenStatus::AvailableEnabled);
        assert_eq!(dispatcher.active_mode(), Some(ListenMode::Compatibility));
        assert_eq!(state.lock().exclusive_started, 0);
    }

    #[test]
    fn reports_missing_subsystem_and_prompts() {
        let (mut adapter, _state) = MockAdapter::ready(true);
        adapter.present = false;

        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let prompts = Arc::new(PromptLog::default());
        let mut dispatcher =
            TagDispatcherBuilder::new(adapter, MockSource { fail_probe: false }, move |card| {
                sink.lock().push(card)
            })
            .guidance(prompts.clone())
            .build();

        assert_eq!(dispatcher.enable(), ListenStatus::NotAvailable);
        assert_eq!(dispatcher.active_mode(), None);
        assert_eq!(prompts.messages.lock().len(), 1);
    }

    #[test]
    fn reports_disabled_subsystem_and_opens_settings() {
        let (mut adapter, _state) = MockAdapter::ready(true);
        adapter.enabled = false;

        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let prompts = Arc::new(PromptLog::default());
        let mut dispatcher =
            TagDispatcherBuilder::new(adapter, MockSource { fail_probe: false }, move |card| {
                sink.lock().push(card)
            })
            .guidance(prompts.clone())
            .build();

        assert_eq!(dispatcher.enable(), ListenStatus::AvailableDisabled);
        assert_eq!(*prompts.settings_opened.lock(), 1);
    }

    #[test]
    fn prompt_can_be_switched_off() {
        let (mut adapter, _state) = MockAdapter::ready(true);
        adapter.present = false;

        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let prompts = Arc::new(PromptLog::default());
        let mut dispatcher =
            TagDispatcherBuilder::new(adapter, MockSource { fail_probe: false }, move |card| {
                sink.lock().push(card)
            })
            .guidance(prompts.clone())
            .config(DispatchConfig::default().with_prompt_on_unavailable(false))
            .build();

        assert_eq!(dispatcher.enable(), ListenStatus::NotAvailable);
        assert!(prompts.messages.lock().is_empty());
    }

    #[test]
    fn validated_discovery_reaches_listener() {
        let (adapter, state) = MockAdapter::ready(true);
        let (mut dispatcher, seen) = dispatcher(adapter, false, DispatchConfig::default());
        dispatcher.enable();

        let handler = state.lock().handler.clone().unwrap();
        handler(7);

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        // Warm-up connect plus probe connect, one probe exchange, closed
        // again before delivery.
        assert_eq!(seen[0].connects, 2);
        assert_eq!(seen[0].transceives, 1);
        assert!(!seen[0].connected);
    }

    #[test]
    fn failed_probe_is_dropped_silently() {
        let (adapter, state) = MockAdapter::ready(true);
        let (mut dispatcher, seen) = dispatcher(adapter, true, DispatchConfig::default());
        dispatcher.enable();

        let handler = state.lock().handler.clone().unwrap();
        handler(7);

        assert!(seen.lock().is_empty());
    }

    #[test]
    fn keeps_listening_after_a_delivery() {
        let (adapter, state) = MockAdapter::ready(true);
        let (mut dispatcher, seen) = dispatcher(adapter, false, DispatchConfig::default());
        dispatcher.enable();

        let handler = state.lock().handler.clone().unwrap();
        handler(1);
        handler(2);

        assert_eq!(seen.lock().len(), 2);
        assert_eq!(dispatcher.active_mode(), Some(ListenMode::Exclusive));
    }

    #[test]
    fn disable_is_idempotent() {
        let (adapter, state) = MockAdapter::ready(true);
        let (mut dispatcher, _seen) = dispatcher(adapter, false, DispatchConfig::default());

        // Disabling before any enable is a no-op.
        dispatcher.disable();
        assert_eq!(state.lock().exclusive_stopped, 0);

        dispatcher.enable();
        dispatcher.disable();
        dispatcher.disable();
        assert_eq!(state.lock().exclusive_stopped, 1);
        assert_eq!(dispatcher.active_mode(), None);
    }

    #[test]
    fn teardown_matches_the_active_mode() {
        let (adapter, state) = MockAdapter::ready(false);
        let (mut dispatcher, _seen) = dispatcher(adapter, false, DispatchConfig::default());

        dispatcher.enable();
        dispatcher.disable();
        assert_eq!(state.lock().compat_stopped, 1);
        assert_eq!(state.lock().exclusive_stopped, 0);
    }

    #[test]
    fn intercepts_events_carrying_a_device() {
        let (adapter, _state) = MockAdapter::ready(false);
        let (mut dispatcher, seen) = dispatcher(adapter, false, DispatchConfig::default());
        dispatcher.enable();

        assert!(dispatcher.intercept_event(&Some(42)));
        assert_eq!(seen.lock().len(), 1);

        assert!(!dispatcher.intercept_event(&None));
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn background_policy_delivers_off_the_callback_thread() {
        use std::thread;
        use std::time::Duration;

        let (adapter, state) = MockAdapter::ready(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let caller = thread::current().id();
        let delivered_on = Arc::new(Mutex::new(None));
        let thread_log = Arc::clone(&delivered_on);

        let mut dispatcher = TagDispatcherBuilder::new(
            adapter,
            MockSource { fail_probe: false },
            move |card: ProbeCard| {
                *thread_log.lock() = Some(thread::current().id());
                sink.lock().push(card);
            },
        )
        .config(DispatchConfig::default().with_dispatch_on_primary_thread(false))
        .build();
        dispatcher.enable();

        let handler = state.lock().handler.clone().unwrap();
        handler(7);

        // Delivery is asynchronous under the background policy.
        for _ in 0..50 {
            if !seen.lock().is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(seen.lock().len(), 1);
        assert_ne!(delivered_on.lock().unwrap(), caller);
    }
}
