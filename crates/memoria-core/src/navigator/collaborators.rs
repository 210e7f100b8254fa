//! Boundary traits implemented outside the core.

use futures::future::BoxFuture;

use crate::api::ApiError;
use crate::models::SectionData;
use crate::section::{ResourceKey, Section};

/// Raw HTTP result for one resource request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues the request for a resource. Auth is the fetcher's concern.
///
/// The returned future must not borrow the fetcher; it is moved onto a
/// spawned task. `Err` is reserved for failures with no HTTP status
/// (connection refused, DNS, body read errors).
pub trait ResourceFetcher: Send + Sync {
    fn fetch(&self, key: ResourceKey) -> BoxFuture<'static, Result<FetchResponse, ApiError>>;
}

/// Presentation side. The navigator never draws anything itself.
pub trait SectionRenderer {
    /// Make `section` the visible region.
    fn show_section(&mut self, _section: Section) {}

    /// A fetch for `section` is in flight. `stale` is the last payload, if any.
    fn render_loading(&mut self, _section: Section, _stale: Option<&SectionData>) {}

    fn render_section(&mut self, section: Section, data: &SectionData);

    /// Show a failure with a retry affordance; pass `retry` to `Navigator::retry`.
    fn render_section_error(&mut self, section: Section, error: &ApiError, retry: Retry);
}

/// Session side, invoked once when the backend rejects the session.
pub trait SessionControl {
    fn clear_session(&mut self);
    fn redirect_to_login(&mut self);
}

/// Handle for re-running a failed section load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    pub section: Section,
}
