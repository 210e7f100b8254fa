//! Application state management for the memoria dashboard.
//!
//! `App` owns the configuration, the navigator (which in turn owns the
//! resource cache, view state and session), and the login form.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use memoria_core::auth::{CredentialStore, Session, SessionData};
use memoria_core::{ApiClient, Config, Navigator, ResourceCache, ResourceFetcher, Section};

use crate::view::{SectionView, SessionHook, ViewState};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Environment variables prefilling the login form
const EMAIL_ENV: &str = "MEMORIA_EMAIL";
const PASSWORD_ENV: &str = "MEMORIA_PASSWORD";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

pub type DashboardNavigator = Navigator<ViewState, SessionHook>;

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub api: ApiClient,
    pub navigator: DashboardNavigator,

    pub state: AppState,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    /// Selected row per list section
    selections: HashMap<Section, usize>,

    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config
            .cache_dir()
            .unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let mut session = Session::new(cache_dir);
        match session.load() {
            Ok(found) => debug!(found, "Session loaded"),
            Err(e) => warn!(error = %e, "Failed to load stored session"),
        }

        let api = ApiClient::with_timeout(&config.api_base_url(), config.fetch_timeout())?;
        let fetcher = match session.token() {
            Some(token) => api.with_token(token),
            None => api.without_token(),
        };

        let cache = ResourceCache::new(config.ttl_policy());
        let navigator = Navigator::new(
            cache,
            Arc::new(fetcher),
            ViewState::new(),
            SessionHook::new(session),
        )
        .with_fetch_timeout(config.fetch_timeout());

        let mut app = Self::with_navigator(config, api, navigator);

        app.login_email = std::env::var(EMAIL_ENV)
            .ok()
            .or_else(|| app.config.last_email.clone())
            .unwrap_or_default();

        app.login_password = std::env::var(PASSWORD_ENV)
            .ok()
            .or_else(|| {
                if app.login_email.is_empty() {
                    None
                } else {
                    CredentialStore::get_password(&app.login_email).ok()
                }
            })
            .unwrap_or_default();

        Ok(app)
    }

    /// Assemble an app around an existing navigator. Without a valid session
    /// the navigator is parked until login.
    pub fn with_navigator(config: Config, api: ApiClient, mut navigator: DashboardNavigator) -> Self {
        if !navigator.session().session.is_valid() {
            navigator.end_session(Arc::new(api.without_token()));
        }

        Self {
            config,
            api,
            navigator,
            state: AppState::Normal,
            login_email: String::new(),
            login_password: String::new(),
            login_focus: LoginFocus::Email,
            login_error: None,
            selections: HashMap::new(),
            status_message: None,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.navigator.session().session.is_valid()
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();

        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return Err(anyhow::anyhow!("Email and password required"));
        }

        self.login_error = None;

        match self.api.authenticate(&email, &password).await {
            Ok(session_data) => {
                if let Err(e) = CredentialStore::store(&email, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                let fetcher = self.api.with_token(&session_data.token);
                self.finish_login(session_data, Arc::new(fetcher));
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                let lower = format!("{:#}", e).to_lowercase();
                let user_message = if lower.contains("unauthorized") || lower.contains("access denied") {
                    "Invalid email or password".to_string()
                } else if lower.contains("network") || lower.contains("connect") {
                    "Unable to connect to server. Check your internet connection.".to_string()
                } else if lower.contains("timed out") {
                    "Connection timed out. Please try again.".to_string()
                } else {
                    format!("Login failed: {}", e)
                };
                self.login_error = Some(user_message);
                Err(e)
            }
        }
    }

    /// Persist the new session, hand the navigator its fetcher and reload
    /// the section the user was on.
    pub fn finish_login(&mut self, session_data: SessionData, fetcher: Arc<dyn ResourceFetcher>) {
        let greeting = format!("Welcome, {}", session_data.display_name());

        let hook = self.navigator.session_mut();
        hook.session.update(session_data);
        if let Err(e) = hook.session.save() {
            warn!(error = %e, "Failed to save session");
        }

        self.navigator.resume_session(fetcher);
        self.login_password.clear();
        self.login_error = None;
        self.state = AppState::Normal;
        self.status_message = Some(greeting);
        info!("Login successful");

        let current = self.navigator.current_section();
        self.navigator.navigate_to(current);
    }

    /// Drop cached data, the stored session and the remembered password,
    /// then show the login form. Nothing is fetched until the next login.
    pub fn logout(&mut self) {
        info!("Logging out");
        let email = self
            .navigator
            .session()
            .session
            .data
            .as_ref()
            .map(|d| d.email.clone());

        self.navigator.end_session(Arc::new(self.api.without_token()));
        self.navigator.renderer_mut().clear();
        if let Err(e) = self.navigator.session_mut().session.clear() {
            warn!(error = %e, "Failed to clear session on logout");
        }
        if let Some(email) = email {
            if let Err(e) = CredentialStore::delete(&email) {
                debug!(error = %e, "No stored password removed");
            }
        }
        self.selections.clear();
        self.login_password.clear();
        self.status_message = Some("Logged out".to_string());
        self.start_login();
    }

    // =========================================================================
    // Event loop hooks
    // =========================================================================

    /// Apply finished fetches and react to a lost session.
    pub fn tick(&mut self) {
        let applied = self.navigator.drain_completions();
        if applied > 0 {
            debug!(applied, "Applied fetch completions");
            self.clamp_selection();
        }

        if self.navigator.session_mut().take_login_request() {
            self.navigator.renderer_mut().clear();
            self.login_error = Some("Your session has ended. Please log in again.".to_string());
            self.start_login();
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn current_section(&self) -> Section {
        self.navigator.current_section()
    }

    /// While logged out, actions that would fetch bring up the login form.
    fn require_session(&mut self) -> bool {
        if self.navigator.is_session_lost() {
            self.start_login();
            return false;
        }
        true
    }

    pub fn navigate_to(&mut self, section: Section) {
        if !self.require_session() {
            return;
        }
        self.status_message = None;
        self.navigator.navigate_to(section);
        self.clamp_selection();
    }

    pub fn next_section(&mut self) {
        let next = self.current_section().next();
        self.navigate_to(next);
    }

    pub fn prev_section(&mut self) {
        let prev = self.current_section().prev();
        self.navigate_to(prev);
    }

    /// Force a reload of the current section.
    pub fn refresh_current(&mut self) {
        if !self.require_session() {
            return;
        }
        self.status_message = Some(format!("Refreshing {}...", self.current_section().title()));
        self.navigator.refresh_current();
    }

    /// Run the retry affordance of the visible error panel, if any.
    pub fn retry_visible(&mut self) -> bool {
        if !self.require_session() {
            return false;
        }
        match self.navigator.renderer().visible_retry() {
            Some(retry) => {
                self.status_message = None;
                self.navigator.retry(retry);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selection(&self) -> usize {
        self.selections
            .get(&self.current_section())
            .copied()
            .unwrap_or(0)
    }

    /// Number of rows in the visible section's list.
    pub fn visible_len(&self) -> usize {
        let data = match self.navigator.renderer().visible_view() {
            SectionView::Ready(data) => Some(data),
            SectionView::Loading { stale } => stale.as_ref(),
            _ => None,
        };
        data.and_then(|d| d.item_count()).unwrap_or(0)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let current = self.selection() as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.selections.insert(self.current_section(), next);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        let section = self.current_section();
        if let Some(sel) = self.selections.get_mut(&section) {
            *sel = (*sel).min(len.saturating_sub(1));
        }
    }

    /// Cache age of the current section for the status bar
    pub fn current_age(&self) -> String {
        let key = self.current_section().resource_key();
        self.navigator.cache().age_display(key)
    }
}

// ============================================================================
// Input Validation
// ============================================================================

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
