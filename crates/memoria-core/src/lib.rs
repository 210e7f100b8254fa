//! Core library for the memoria dashboard.
//!
//! The dashboard shows a handful of top-level sections (memorials, events,
//! store, orders, ...). This crate owns the parts with real state to protect:
//!
//! - `cache`: per-resource freshness cache with fixed per-key TTLs
//! - `navigator`: the section state machine that decides when to fetch and
//!   discards responses superseded by a newer navigation
//! - `api`: REST client and error classification
//! - `auth`: persisted session and keychain credentials
//! - `config`: on-disk configuration
//!
//! Rendering and the login flow are collaborators supplied by the binary.

pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod models;
pub mod navigator;
pub mod section;

pub use api::{ApiClient, ApiError};
pub use cache::{ResourceCache, TtlPolicy};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use navigator::{
    FetchResponse, Navigator, ResourceFetcher, Retry, SectionRenderer, SessionControl,
};
pub use section::{ResourceKey, Section};
