//! Section navigation state machine.
//!
//! The `Navigator` owns the current section, consults the `ResourceCache`
//! before fetching, and reconciles fetch results that resolve out of order.
//! It talks to the outside world only through the traits in
//! `collaborators`, so it runs the same under a terminal UI or a test.
//!
//! Fetches run as spawned tokio tasks and report back over a channel; the
//! owner applies them with `drain_completions` or `settle_next`. Every
//! mutation therefore happens on the owner's task.

pub mod collaborators;
pub mod completion;
#[allow(clippy::module_inception)]
pub mod navigator;

pub use collaborators::{FetchResponse, ResourceFetcher, Retry, SectionRenderer, SessionControl};
pub use completion::{Completion, LoadOutcome};
pub use navigator::{Navigator, DEFAULT_FETCH_TIMEOUT};
