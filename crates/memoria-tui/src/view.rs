//! Render and session collaborators backing the terminal UI.
//!
//! The navigator pushes results into `ViewState`; the draw loop reads it.
//! `SessionHook` turns the navigator's auth-loss callbacks into a login
//! request the app picks up on its next tick.

use std::collections::HashMap;

use tracing::warn;

use memoria_core::api::ApiError;
use memoria_core::auth::Session;
use memoria_core::models::SectionData;
use memoria_core::{Retry, Section, SectionRenderer, SessionControl};

/// What one section currently displays.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionView {
    /// Never loaded.
    Empty,
    /// Fetch in flight; `stale` is shown dimmed if present.
    Loading { stale: Option<SectionData> },
    Ready(SectionData),
    Failed { message: String, retry: Retry },
}

static EMPTY_VIEW: SectionView = SectionView::Empty;

#[derive(Debug)]
pub struct ViewState {
    pub visible: Section,
    views: HashMap<Section, SectionView>,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            visible: Section::Dashboard,
            views: HashMap::new(),
        }
    }

    pub fn view(&self, section: Section) -> &SectionView {
        self.views.get(&section).unwrap_or(&EMPTY_VIEW)
    }

    pub fn visible_view(&self) -> &SectionView {
        self.view(self.visible)
    }

    /// Retry handle if the visible section is showing an error.
    pub fn visible_retry(&self) -> Option<Retry> {
        match self.visible_view() {
            SectionView::Failed { retry, .. } => Some(*retry),
            _ => None,
        }
    }

    /// Forget everything rendered so far (logout).
    pub fn clear(&mut self) {
        self.views.clear();
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionRenderer for ViewState {
    fn show_section(&mut self, section: Section) {
        self.visible = section;
    }

    fn render_loading(&mut self, section: Section, stale: Option<&SectionData>) {
        self.views.insert(
            section,
            SectionView::Loading {
                stale: stale.cloned(),
            },
        );
    }

    fn render_section(&mut self, section: Section, data: &SectionData) {
        self.views.insert(section, SectionView::Ready(data.clone()));
    }

    fn render_section_error(&mut self, section: Section, error: &ApiError, retry: Retry) {
        self.views.insert(
            section,
            SectionView::Failed {
                message: error.user_message(),
                retry,
            },
        );
    }
}

/// Session collaborator: owns the persisted session.
pub struct SessionHook {
    pub session: Session,
    login_requested: bool,
}

impl SessionHook {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            login_requested: false,
        }
    }

    /// Returns true once per redirect.
    pub fn take_login_request(&mut self) -> bool {
        std::mem::take(&mut self.login_requested)
    }
}

impl SessionControl for SessionHook {
    fn clear_session(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
    }

    fn redirect_to_login(&mut self) {
        self.login_requested = true;
    }
}
