//! Arbiter configuration
//!
//! An immutable set of named toggles fixed at construction; nothing
//! mutates a [`DispatchConfig`] after the dispatcher is built.

use crate::adapter::{ExclusiveOptions, RadioTechnology};

/// Delay before periodic presence re-checks when the chipset workaround
/// is active, in milliseconds
pub const PRESENCE_CHECK_DELAY_MS: u32 = 5_000;

/// Configuration matrix for a [`TagDispatcher`](crate::TagDispatcher)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Show user-facing guidance when the subsystem is absent or
    /// disabled
    pub prompt_on_unavailable: bool,

    /// Silence platform-native feedback sounds during exclusive mode
    pub suppress_interaction_sounds: bool,

    /// Deliver validated devices on the host's primary execution
    /// context instead of a dedicated background context
    pub dispatch_on_primary_thread: bool,

    /// Insert a fixed delay before periodic presence re-checks
    ///
    /// Defends against a chipset family whose presence check resets the
    /// link mid-command.
    pub presence_check_delay_workaround: bool,

    /// Force compatibility mode even when exclusive mode is supported
    pub disable_exclusive_mode: bool,

    /// Skip the subsystem's optional upfront format probe
    pub skip_format_check: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prompt_on_unavailable: true,
            suppress_interaction_sounds: false,
            dispatch_on_primary_thread: true,
            presence_check_delay_workaround: true,
            disable_exclusive_mode: false,
            skip_format_check: false,
        }
    }
}

impl DispatchConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to prompt the user when the subsystem is unavailable
    pub const fn with_prompt_on_unavailable(mut self, prompt: bool) -> Self {
        self.prompt_on_unavailable = prompt;
        self
    }

    /// Set whether to silence platform feedback sounds
    pub const fn with_suppress_interaction_sounds(mut self, suppress: bool) -> Self {
        self.suppress_interaction_sounds = suppress;
        self
    }

    /// Set whether delivery happens on the primary execution context
    pub const fn with_dispatch_on_primary_thread(mut self, primary: bool) -> Self {
        self.dispatch_on_primary_thread = primary;
        self
    }

    /// Set whether to delay periodic presence re-checks
    pub const fn with_presence_check_delay_workaround(mut self, workaround: bool) -> Self {
        self.presence_check_delay_workaround = workaround;
        self
    }

    /// Set whether to force compatibility mode
    pub const fn with_disable_exclusive_mode(mut self, disable: bool) -> Self {
        self.disable_exclusive_mode = disable;
        self
    }

    /// Set whether to skip the upfront format probe
    pub const fn with_skip_format_check(mut self, skip: bool) -> Self {
        self.skip_format_check = skip;
        self
    }

    /// The options bundle handed to the platform when entering
    /// exclusive mode
    pub fn exclusive_options(&self) -> ExclusiveOptions {
        ExclusiveOptions {
            technology: RadioTechnology::TypeA,
            skip_format_check: self.skip_format_check,
            suppress_sounds: self.suppress_interaction_sounds,
            presence_check_delay_ms: self
                .presence_check_delay_workaround
                .then_some(PRESENCE_CHECK_DELAY_MS),
        }
    }
}
