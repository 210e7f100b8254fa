use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{Completion, LoadOutcome, ResourceFetcher, Retry, SectionRenderer, SessionControl};
use crate::api::ApiError;
use crate::cache::ResourceCache;
use crate::models::SectionData;
use crate::section::{ResourceKey, Section};

/// Upper bound on a single section fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Section state machine with per-section request tracking.
///
/// Each section has a monotonically increasing request id. A fetch captures
/// the id when it is issued, and its result is committed only if that id is
/// still the latest for the section when it resolves. The cache therefore
/// always ends up holding the most recently *issued* fetch, not the most
/// recently resolved one.
///
/// Completions also carry the session generation they were issued under.
/// `reset`, `end_session` and `resume_session` start a new generation, and
/// anything from an earlier one is dropped, auth failures included.
///
/// `navigate_to`, `load_section_data`, `refresh_current` and `retry` spawn
/// tokio tasks and must be called from within a runtime.
pub struct Navigator<R, S> {
    current: Section,
    cache: ResourceCache<SectionData>,
    fetcher: Arc<dyn ResourceFetcher>,
    renderer: R,
    session: S,
    pending: HashMap<Section, u64>,
    loading: HashSet<Section>,
    /// Set by the first 401/403 or `end_session`, cleared by `resume_session`.
    session_lost: bool,
    generation: u64,
    fetch_timeout: Duration,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<R: SectionRenderer, S: SessionControl> Navigator<R, S> {
    pub fn new(
        cache: ResourceCache<SectionData>,
        fetcher: Arc<dyn ResourceFetcher>,
        renderer: R,
        session: S,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            current: Section::Dashboard,
            cache,
            fetcher,
            renderer,
            session,
            pending: HashMap::new(),
            loading: HashSet::new(),
            session_lost: false,
            generation: 0,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            completions_tx,
            completions_rx,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn current_section(&self) -> Section {
        self.current
    }

    pub fn cache(&self) -> &ResourceCache<SectionData> {
        &self.cache
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn is_loading(&self, section: Section) -> bool {
        self.loading.contains(&section)
    }

    /// Latest request id issued for `section` (0 if none).
    pub fn pending_request_id(&self, section: Section) -> u64 {
        self.pending.get(&section).copied().unwrap_or(0)
    }

    /// True while fetches are blocked waiting for a new login.
    pub fn is_session_lost(&self) -> bool {
        self.session_lost
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Switch to `section` and load its data.
    ///
    /// Re-entering the current section is not a no-op: the load step runs
    /// again, which is how a user forces a retry after an error.
    pub fn navigate_to(&mut self, section: Section) {
        if section == self.current {
            debug!(section = %section, "Re-entering current section");
        } else {
            debug!(from = %self.current, to = %section, "Navigating");
        }
        self.current = section;
        self.renderer.show_section(section);
        self.load_section_data(section);
    }

    /// Render from cache if fresh, otherwise issue a fetch.
    pub fn load_section_data(&mut self, section: Section) {
        let key = section.resource_key();
        if self.cache.is_fresh(key) {
            if let Some(data) = self.cache.get(key) {
                debug!(section = %section, key = %key, "Cache hit, rendering without fetch");
                self.renderer.render_section(section, data);
                return;
            }
        }
        self.issue_fetch(section);
    }

    /// Fetch the current section even if its entry is fresh.
    ///
    /// The entry is not invalidated up front, so a failed refresh leaves a
    /// fresh entry fresh.
    pub fn refresh_current(&mut self) {
        let section = self.current;
        info!(section = %section, "Refreshing section");
        self.issue_fetch(section);
    }

    /// Invoke the retry affordance handed to `render_section_error`.
    pub fn retry(&mut self, retry: Retry) {
        debug!(section = %retry.section, "Retrying section load");
        self.load_section_data(retry.section);
    }

    /// Mark one key (or all) stale so the next visit refetches.
    pub fn invalidate(&mut self, key: Option<ResourceKey>) {
        self.cache.invalidate(key);
    }

    /// Drop all cached data and supersede every in-flight fetch.
    pub fn reset(&mut self) {
        info!("Resetting navigator state");
        self.cache.clear();
        self.supersede_in_flight();
        self.generation += 1;
    }

    /// Log out: reset, install `fetcher` (normally tokenless) and block
    /// fetching until `resume_session`.
    pub fn end_session(&mut self, fetcher: Arc<dyn ResourceFetcher>) {
        info!("Session ended");
        self.reset();
        self.fetcher = fetcher;
        self.session_lost = true;
    }

    /// Install a fetcher for a new session and accept auth failures again.
    pub fn resume_session(&mut self, fetcher: Arc<dyn ResourceFetcher>) {
        info!("Session resumed");
        self.supersede_in_flight();
        self.generation += 1;
        self.fetcher = fetcher;
        self.session_lost = false;
    }

    fn issue_fetch(&mut self, section: Section) {
        if self.session_lost {
            debug!(section = %section, "Session lost, not fetching until login");
            return;
        }

        let key = section.resource_key();
        let request_id = {
            let id = self.pending.entry(section).or_insert(0);
            *id += 1;
            *id
        };
        self.loading.insert(section);
        self.renderer.render_loading(section, self.cache.get(key));
        info!(section = %section, key = %key, request_id, "Fetching section data");

        let fetch = self.fetcher.fetch(key);
        let tx = self.completions_tx.clone();
        let timeout = self.fetch_timeout;
        let generation = self.generation;

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, fetch).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout(timeout)),
            };
            if tx
                .send(Completion {
                    section,
                    request_id,
                    generation,
                    result,
                })
                .is_err()
            {
                debug!(section = %section, request_id, "Navigator dropped before fetch completed");
            }
        });
    }

    fn supersede_in_flight(&mut self) {
        for section in self.loading.drain() {
            *self.pending.entry(section).or_insert(0) += 1;
        }
    }

    // =========================================================================
    // Completions
    // =========================================================================

    /// Apply every completion that has already arrived. Never blocks.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply_completion(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it.
    ///
    /// Waits forever if nothing is in flight.
    pub async fn settle_next(&mut self) -> Option<Section> {
        let completion = self.completions_rx.recv().await?;
        let section = completion.section;
        self.apply_completion(completion);
        Some(section)
    }

    fn apply_completion(&mut self, completion: Completion) {
        let Completion {
            section,
            request_id,
            generation,
            result,
        } = completion;
        if generation != self.generation {
            debug!(
                section = %section,
                request_id,
                generation,
                current = self.generation,
                "Discarding response from an earlier session"
            );
            return;
        }
        let key = section.resource_key();
        let latest = self.pending_request_id(section);

        match LoadOutcome::classify(key, result) {
            // Auth loss affects every section, superseded or not.
            LoadOutcome::AuthFailed(err) => self.handle_auth_failure(section, &err),
            _ if request_id != latest => {
                warn!(
                    section = %section,
                    request_id,
                    latest,
                    "Discarding superseded response"
                );
            }
            LoadOutcome::Loaded(data) => {
                self.loading.remove(&section);
                info!(section = %section, key = %key, request_id, "Section data loaded");
                self.cache.put(key, data);
                if let Some(data) = self.cache.get(key) {
                    self.renderer.render_section(section, data);
                }
            }
            LoadOutcome::Failed(err) => {
                self.loading.remove(&section);
                warn!(section = %section, request_id, error = %err, "Section load failed");
                self.renderer
                    .render_section_error(section, &err, Retry { section });
            }
        }
    }

    fn handle_auth_failure(&mut self, section: Section, err: &ApiError) {
        if self.session_lost {
            debug!(section = %section, "Auth failure after session already lost, ignoring");
            return;
        }
        error!(section = %section, error = %err, "Session rejected by server, redirecting to login");
        self.session_lost = true;
        self.cache.clear();
        // Late successes issued under the dead session must not repopulate the cache.
        self.supersede_in_flight();
        self.session.clear_session();
        self.session.redirect_to_login();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use futures::future::{BoxFuture, FutureExt};
    use tokio::sync::oneshot;

    use crate::cache::TtlPolicy;
    use crate::clock::ManualClock;
    use crate::models::MemorialEvent;
    use crate::navigator::FetchResponse;

    // -------------------------------------------------------------------------
    // Fake collaborators
    // -------------------------------------------------------------------------

    type Reply = Result<FetchResponse, ApiError>;

    /// Fetcher whose calls stay pending until the test resolves them.
    #[derive(Default)]
    struct GatedFetcher {
        calls: Mutex<Vec<(ResourceKey, Option<oneshot::Sender<Reply>>)>>,
    }

    impl GatedFetcher {
        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn key_of(&self, index: usize) -> ResourceKey {
            self.calls.lock().unwrap()[index].0
        }

        fn resolve(&self, index: usize, reply: Reply) {
            let tx = self.calls.lock().unwrap()[index]
                .1
                .take()
                .expect("call already resolved");
            tx.send(reply).expect("fetch task gone");
        }
    }

    impl ResourceFetcher for GatedFetcher {
        fn fetch(&self, key: ResourceKey) -> BoxFuture<'static, Reply> {
            let (tx, rx) = oneshot::channel();
            self.calls.lock().unwrap().push((key, Some(tx)));
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(ApiError::Network("request abandoned".into())))
            }
            .boxed()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Rendered {
        Shown(Section),
        Loading(Section),
        Data(Section, SectionData),
        Error(Section, ApiError, Retry),
    }

    #[derive(Default)]
    struct RecordingRenderer {
        events: Vec<Rendered>,
    }

    impl RecordingRenderer {
        fn last(&self) -> Option<&Rendered> {
            self.events.last()
        }

        fn errors(&self) -> Vec<&Rendered> {
            self.events
                .iter()
                .filter(|e| matches!(e, Rendered::Error(..)))
                .collect()
        }
    }

    impl SectionRenderer for RecordingRenderer {
        fn show_section(&mut self, section: Section) {
            self.events.push(Rendered::Shown(section));
        }

        fn render_loading(&mut self, section: Section, _stale: Option<&SectionData>) {
            self.events.push(Rendered::Loading(section));
        }

        fn render_section(&mut self, section: Section, data: &SectionData) {
            self.events.push(Rendered::Data(section, data.clone()));
        }

        fn render_section_error(&mut self, section: Section, error: &ApiError, retry: Retry) {
            self.events.push(Rendered::Error(section, error.clone(), retry));
        }
    }

    #[derive(Default)]
    struct RecordingSession {
        cleared: u32,
        redirects: u32,
    }

    impl SessionControl for RecordingSession {
        fn clear_session(&mut self) {
            self.cleared += 1;
        }

        fn redirect_to_login(&mut self) {
            self.redirects += 1;
        }
    }

    type TestNavigator = Navigator<RecordingRenderer, RecordingSession>;

    fn navigator(policy: TtlPolicy) -> (TestNavigator, Arc<GatedFetcher>, ManualClock) {
        let clock = ManualClock::default();
        let cache = ResourceCache::with_clock(policy, Arc::new(clock.clone()));
        let fetcher = Arc::new(GatedFetcher::default());
        let nav = Navigator::new(
            cache,
            fetcher.clone(),
            RecordingRenderer::default(),
            RecordingSession::default(),
        );
        (nav, fetcher, clock)
    }

    fn ok(body: &str) -> Reply {
        Ok(FetchResponse::ok(body))
    }

    fn status(code: u16) -> Reply {
        Ok(FetchResponse {
            status: code,
            body: String::new(),
        })
    }

    fn event_ids(data: Option<&SectionData>) -> Vec<i64> {
        match data {
            Some(SectionData::Events(events)) => events.iter().map(|e| e.id).collect(),
            other => panic!("expected events payload, got {:?}", other),
        }
    }

    fn events_payload(ids: &[i64]) -> SectionData {
        SectionData::Events(
            ids.iter()
                .map(|id| MemorialEvent {
                    id: *id,
                    memorial_id: None,
                    title: format!("Service {}", id),
                    starts_at: None,
                    location: None,
                    is_livestreamed: false,
                })
                .collect(),
        )
    }

    // -------------------------------------------------------------------------
    // Cache-driven fetch decisions
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_fetch_then_fresh_until_ttl() {
        let (mut nav, fetcher, clock) =
            navigator(TtlPolicy::uniform(Duration::from_millis(30_000)));

        nav.navigate_to(Section::Memorials);
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(fetcher.key_of(0), ResourceKey::Memorials);
        assert!(nav.is_loading(Section::Memorials));

        clock.advance_ms(50);
        fetcher.resolve(0, ok(r#"[{"id": 1, "fullName": "Ada Byron"}]"#));
        assert_eq!(nav.settle_next().await, Some(Section::Memorials));

        assert!(!nav.is_loading(Section::Memorials));
        assert!(nav.cache().is_fresh(ResourceKey::Memorials));
        match nav.cache().get(ResourceKey::Memorials) {
            Some(SectionData::Memorials(m)) => {
                assert_eq!(m.len(), 1);
                assert_eq!(m[0].id, 1);
            }
            other => panic!("unexpected cache content: {:?}", other),
        }
        assert!(matches!(
            nav.renderer().last(),
            Some(Rendered::Data(Section::Memorials, _))
        ));

        clock.advance_ms(30_950);
        assert!(!nav.cache().is_fresh(ResourceKey::Memorials));
    }

    #[tokio::test]
    async fn test_fresh_entry_issues_zero_fetches() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());
        nav.cache.put(ResourceKey::Events, events_payload(&[3]));

        nav.navigate_to(Section::Events);

        assert_eq!(fetcher.call_count(), 0);
        assert!(!nav.is_loading(Section::Events));
        assert_eq!(
            nav.renderer().events,
            vec![
                Rendered::Shown(Section::Events),
                Rendered::Data(Section::Events, events_payload(&[3])),
            ]
        );
    }

    #[tokio::test]
    async fn test_stale_entry_issues_exactly_one_fetch() {
        let (mut nav, fetcher, clock) = navigator(TtlPolicy::standard());
        nav.cache.put(ResourceKey::Events, events_payload(&[3]));
        clock.advance_ms(31_000);

        nav.navigate_to(Section::Events);

        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(nav.pending_request_id(Section::Events), 1);
        assert_eq!(nav.renderer().last(), Some(&Rendered::Loading(Section::Events)));
    }

    #[tokio::test]
    async fn test_store_section_uses_products_key() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());
        nav.navigate_to(Section::Store);
        assert_eq!(fetcher.key_of(0), ResourceKey::Products);

        fetcher.resolve(0, ok(r#"[{"id": 4, "name": "Wreath", "priceCents": 4999}]"#));
        nav.settle_next().await;
        assert!(nav.cache().is_fresh(ResourceKey::Products));
    }

    #[tokio::test]
    async fn test_same_section_reentry_reloads() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Orders);
        fetcher.resolve(0, status(500));
        nav.settle_next().await;
        assert_eq!(nav.renderer().errors().len(), 1);

        // Clicking the same tab again runs the load step again
        nav.navigate_to(Section::Orders);
        assert_eq!(fetcher.call_count(), 2);
        fetcher.resolve(1, ok("[]"));
        nav.settle_next().await;
        assert!(nav.cache().is_fresh(ResourceKey::Orders));
    }

    // -------------------------------------------------------------------------
    // Out-of-order responses
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_late_older_response_is_discarded() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Events); // fetch A
        nav.navigate_to(Section::Memorials);
        nav.navigate_to(Section::Events); // fetch B
        assert_eq!(fetcher.call_count(), 3);
        assert_eq!(nav.pending_request_id(Section::Events), 2);

        fetcher.resolve(2, ok(r#"[{"id": 9, "title": "Celebration of life"}]"#));
        nav.settle_next().await;
        assert_eq!(event_ids(nav.cache().get(ResourceKey::Events)), vec![9]);

        fetcher.resolve(0, ok(r#"[{"id": 1, "title": "Viewing"}]"#));
        nav.settle_next().await;

        assert_eq!(event_ids(nav.cache().get(ResourceKey::Events)), vec![9]);
        // The stale payload never reached the renderer
        let rendered_events: Vec<_> = nav
            .renderer()
            .events
            .iter()
            .filter(|e| matches!(e, Rendered::Data(Section::Events, _)))
            .collect();
        assert_eq!(rendered_events.len(), 1);
    }

    #[tokio::test]
    async fn test_older_response_arriving_first_is_discarded() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Events); // fetch A
        nav.navigate_to(Section::Events); // fetch B

        fetcher.resolve(0, ok(r#"[{"id": 1, "title": "Viewing"}]"#));
        nav.settle_next().await;
        assert!(nav.cache().get(ResourceKey::Events).is_none());
        assert!(nav.is_loading(Section::Events));

        fetcher.resolve(1, ok(r#"[{"id": 2, "title": "Burial"}]"#));
        nav.settle_next().await;
        assert_eq!(event_ids(nav.cache().get(ResourceKey::Events)), vec![2]);
        assert!(!nav.is_loading(Section::Events));
    }

    #[tokio::test]
    async fn test_superseded_failure_renders_nothing() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Orders);
        nav.navigate_to(Section::Orders);
        fetcher.resolve(0, status(502));
        nav.settle_next().await;

        assert!(nav.renderer().errors().is_empty());
        assert!(nav.is_loading(Section::Orders));
    }

    #[tokio::test]
    async fn test_request_ids_are_per_section() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Orders);
        nav.navigate_to(Section::Events);
        assert_eq!(nav.pending_request_id(Section::Orders), 1);
        assert_eq!(nav.pending_request_id(Section::Events), 1);

        // Resolving orders after navigating elsewhere still commits
        fetcher.resolve(0, ok("[]"));
        nav.settle_next().await;
        assert!(nav.cache().is_fresh(ResourceKey::Orders));
        assert_eq!(nav.current_section(), Section::Events);
    }

    // -------------------------------------------------------------------------
    // Auth failures
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_forbidden_clears_cache_and_redirects_once() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());
        nav.cache.put(ResourceKey::Events, events_payload(&[1]));
        nav.cache.put(ResourceKey::Memorials, SectionData::Memorials(vec![]));

        nav.navigate_to(Section::Orders);
        fetcher.resolve(0, status(403));
        nav.settle_next().await;

        assert!(nav.cache().is_empty());
        for key in ResourceKey::ALL {
            assert!(nav.cache().get(key).is_none());
        }
        assert_eq!(nav.session().cleared, 1);
        assert_eq!(nav.session().redirects, 1);
        assert!(nav.is_session_lost());
        assert!(nav.renderer().errors().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_auth_failures_redirect_once() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Orders);
        nav.navigate_to(Section::Subscriptions);
        fetcher.resolve(0, status(401));
        nav.settle_next().await;
        fetcher.resolve(1, status(401));
        nav.settle_next().await;

        assert_eq!(nav.session().redirects, 1);
        assert_eq!(nav.session().cleared, 1);
    }

    #[tokio::test]
    async fn test_auth_failure_on_superseded_request_still_redirects() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Profile);
        nav.navigate_to(Section::Profile);
        fetcher.resolve(0, status(401));
        nav.settle_next().await;

        assert_eq!(nav.session().redirects, 1);
    }

    #[tokio::test]
    async fn test_late_success_after_auth_failure_not_cached() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Orders);
        nav.navigate_to(Section::Events);
        fetcher.resolve(0, status(401));
        nav.settle_next().await;
        fetcher.resolve(1, ok(r#"[{"id": 5, "title": "Wake"}]"#));
        nav.settle_next().await;

        assert!(nav.cache().is_empty());
        assert!(!nav.is_loading(Section::Orders));
        assert!(!nav.is_loading(Section::Events));
    }

    #[tokio::test]
    async fn test_no_fetch_until_session_resumed() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Orders);
        fetcher.resolve(0, status(401));
        nav.settle_next().await;

        nav.navigate_to(Section::Events);
        assert_eq!(fetcher.call_count(), 1);

        let fresh_fetcher = Arc::new(GatedFetcher::default());
        nav.resume_session(fresh_fetcher.clone());
        assert!(!nav.is_session_lost());

        nav.navigate_to(Section::Events);
        assert_eq!(fresh_fetcher.call_count(), 1);
        fresh_fetcher.resolve(0, ok("[]"));
        nav.settle_next().await;
        assert!(nav.cache().is_fresh(ResourceKey::Events));

        // A second expiry redirects again
        nav.navigate_to(Section::Orders);
        fresh_fetcher.resolve(1, status(401));
        nav.settle_next().await;
        assert_eq!(nav.session().redirects, 2);
    }

    #[tokio::test]
    async fn test_auth_failure_from_previous_session_is_ignored() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Orders); // A
        nav.navigate_to(Section::Events); // B
        fetcher.resolve(0, status(401));
        nav.settle_next().await;
        assert_eq!(nav.session().redirects, 1);

        let fresh_fetcher = Arc::new(GatedFetcher::default());
        nav.resume_session(fresh_fetcher.clone());
        nav.navigate_to(Section::Orders);
        fresh_fetcher.resolve(0, ok("[]"));
        nav.settle_next().await;
        assert!(nav.cache().is_fresh(ResourceKey::Orders));

        // B was issued under the dead session
        fetcher.resolve(1, status(401));
        nav.settle_next().await;

        assert_eq!(nav.session().redirects, 1);
        assert_eq!(nav.session().cleared, 1);
        assert!(nav.cache().is_fresh(ResourceKey::Orders));
        assert!(!nav.is_session_lost());
    }

    #[tokio::test]
    async fn test_resume_session_supersedes_old_fetches() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Events);
        nav.resume_session(Arc::new(GatedFetcher::default()));
        assert!(!nav.is_loading(Section::Events));

        fetcher.resolve(0, ok(r#"[{"id": 1, "title": "Viewing"}]"#));
        nav.settle_next().await;
        assert!(nav.cache().get(ResourceKey::Events).is_none());
    }

    #[tokio::test]
    async fn test_end_session_blocks_fetches_until_resume() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());
        nav.cache.put(ResourceKey::Events, events_payload(&[1]));

        nav.navigate_to(Section::Orders);
        let tokenless = Arc::new(GatedFetcher::default());
        nav.end_session(tokenless.clone());

        assert!(nav.is_session_lost());
        assert!(nav.cache().is_empty());
        assert!(!nav.is_loading(Section::Orders));

        nav.navigate_to(Section::Memorials);
        nav.refresh_current();
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(tokenless.call_count(), 0);

        // The request from before logout cannot repopulate anything
        fetcher.resolve(0, ok("[]"));
        nav.settle_next().await;
        assert!(nav.cache().is_empty());
        // Logging out is not an auth failure
        assert_eq!(nav.session().cleared, 0);
        assert_eq!(nav.session().redirects, 0);

        let next = Arc::new(GatedFetcher::default());
        nav.resume_session(next.clone());
        nav.navigate_to(Section::Memorials);
        assert_eq!(next.call_count(), 1);
    }

    // -------------------------------------------------------------------------
    // Transient failures
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_server_error_keeps_fresh_entry() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Store);
        fetcher.resolve(0, ok(r#"[{"id": 4, "name": "Wreath", "priceCents": 4999}]"#));
        nav.settle_next().await;
        let before = nav.cache().get(ResourceKey::Products).cloned();

        nav.refresh_current();
        assert_eq!(fetcher.call_count(), 2);
        fetcher.resolve(1, status(500));
        nav.settle_next().await;

        assert_eq!(nav.cache().get(ResourceKey::Products).cloned(), before);
        assert!(nav.cache().is_fresh(ResourceKey::Products));
        assert!(matches!(
            nav.renderer().last(),
            Some(Rendered::Error(Section::Store, ApiError::ServerError(_), Retry { section: Section::Store }))
        ));
    }

    #[tokio::test]
    async fn test_network_error_renders_retry_and_retry_refetches() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());

        nav.navigate_to(Section::Memorials);
        fetcher.resolve(0, Err(ApiError::Network("connection reset".into())));
        nav.settle_next().await;

        let retry = match nav.renderer().last() {
            Some(Rendered::Error(Section::Memorials, ApiError::Network(_), retry)) => *retry,
            other => panic!("expected error render, got {:?}", other),
        };
        assert!(nav.cache().get(ResourceKey::Memorials).is_none());
        assert!(!nav.is_loading(Section::Memorials));

        nav.retry(retry);
        assert_eq!(fetcher.call_count(), 2);
        fetcher.resolve(1, ok("[]"));
        nav.settle_next().await;
        assert!(nav.cache().is_fresh(ResourceKey::Memorials));
    }

    #[tokio::test]
    async fn test_malformed_body_is_transient() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());
        nav.cache.put(ResourceKey::Orders, SectionData::Orders(vec![]));
        nav.invalidate(Some(ResourceKey::Orders));

        nav.navigate_to(Section::Orders);
        fetcher.resolve(0, ok("<html>maintenance</html>"));
        nav.settle_next().await;

        assert_eq!(nav.cache().get(ResourceKey::Orders), Some(&SectionData::Orders(vec![])));
        assert!(matches!(
            nav.renderer().last(),
            Some(Rendered::Error(Section::Orders, ApiError::Malformed(_), _))
        ));
        assert_eq!(nav.session().redirects, 0);
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out() {
        let (nav, fetcher, _clock) = navigator(TtlPolicy::standard());
        let mut nav = nav.with_fetch_timeout(Duration::from_millis(20));

        nav.navigate_to(Section::Profile);
        nav.settle_next().await;

        assert_eq!(fetcher.call_count(), 1);
        assert!(matches!(
            nav.renderer().last(),
            Some(Rendered::Error(Section::Profile, ApiError::Timeout(_), _))
        ));
    }

    // -------------------------------------------------------------------------
    // Invalidation and reset
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());
        nav.cache.put(ResourceKey::Orders, SectionData::Orders(vec![]));

        nav.invalidate(None);
        nav.navigate_to(Section::Orders);

        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_and_supersedes() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());
        nav.cache.put(ResourceKey::Events, events_payload(&[1]));

        nav.navigate_to(Section::Orders);
        nav.reset();
        assert!(nav.cache().is_empty());
        assert!(!nav.is_loading(Section::Orders));

        fetcher.resolve(0, ok("[]"));
        nav.settle_next().await;
        assert!(nav.cache().get(ResourceKey::Orders).is_none());
    }

    #[tokio::test]
    async fn test_drain_completions_is_non_blocking() {
        let (mut nav, fetcher, _clock) = navigator(TtlPolicy::standard());
        assert_eq!(nav.drain_completions(), 0);

        nav.navigate_to(Section::Orders);
        assert_eq!(nav.drain_completions(), 0);

        fetcher.resolve(0, ok("[]"));
        // Give the fetch task a chance to forward its result
        let mut applied = 0;
        for _ in 0..100 {
            applied += nav.drain_completions();
            if applied > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(applied, 1);
        assert!(nav.cache().is_fresh(ResourceKey::Orders));
    }
}
