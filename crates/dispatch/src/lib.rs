//! Tag-acquisition arbiter for proximity smartcard sessions
//!
//! The proximity-sensing subsystems of real hosts are flaky and
//! version-fragmented: the same physical tap can arrive through an
//! exclusive reader callback or through a generic event-redirection
//! mechanism, and a marginal presentation (weak coupling, small antenna)
//! can yield a device handle that dies on first use. This crate hands the
//! application exactly one validated card session per physical
//! presentation, whatever the platform underneath does:
//!
//! - [`TagDispatcher`] picks a listening mode, validates every raw
//!   discovery with a disposable probe exchange, and delivers surviving
//!   devices to a single listener under a configurable threading policy.
//! - [`DispatchConfig`] is the immutable options matrix fixed at
//!   construction.
//! - [`TagCache`] optionally shares the most recent validated device
//!   across application views.
//!
//! The platform itself is reached only through the [`ProximityAdapter`]
//! and [`CardSource`] boundary traits.
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod adapter;
pub mod cache;
pub mod card;
pub mod config;
pub mod dispatcher;
pub mod executor;

pub use adapter::{
    DiscoveryHandler, ExclusiveOptions, GuidanceSink, NoGuidance, OnDiscoveredTagListener,
    ProximityAdapter, RadioTechnology,
};
pub use cache::TagCache;
pub use card::{CardSource, QuirkedCard};
pub use config::DispatchConfig;
pub use dispatcher::{ListenMode, ListenStatus, TagDispatcher, TagDispatcherBuilder};
pub use executor::{DispatchExecutor, InlineExecutor, ThreadExecutor};
