//! Generation orchestrator
//!
//! Drives one prep session through `empty -> loading -> dashboard | error`.
//! Cached entries are reused when the staleness validator allows it; otherwise
//! a credential check and the rate limiter gate a call to the generator.
//!
//! Every search, reset and teardown bumps the session epoch. Work started
//! under an older epoch (a full call, a match patch, the progress ticker)
//! drops its result instead of touching the session.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::cache::{CacheEntry, CacheKey, Section, Sections, SessionSnapshot, StalenessValidator, Verdict};
use crate::domain::context::LiveContext;
use crate::domain::generation::{ContentGenerator, GenerationRequest, GenerationSettings, Provider};
use crate::domain::profile::{Profile, ProfileStore};
use crate::domain::search::{parse_search_query, SearchParams, SearchTarget};
use crate::domain::session::{DashboardView, ErrorView, RestoreSource, ViewState};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_cache_lookup;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::timer::{repeat, schedule, ScheduledTask};

use super::resume_autosave::ResumeAutosaver;
use super::tiered_cache::TieredCacheStore;

const PROGRESS_CAP: u8 = 90;
const PROGRESS_STEP: u8 = 10;

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Identity the rate limiter tracks
    pub user_id: String,
    /// Provider and model used until the profile or the user picks another
    pub settings: GenerationSettings,
    /// Delay between a context gain and the match-only patch
    pub patch_debounce: Duration,
    /// Progress ticker period while loading
    pub progress_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
            settings: GenerationSettings::default(),
            patch_debounce: Duration::from_millis(1500),
            progress_interval: Duration::from_millis(400),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_patch_debounce(mut self, debounce: Duration) -> Self {
        self.patch_debounce = debounce;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

#[derive(Debug, Default)]
struct SessionState {
    view: DashboardView,
    context: LiveContext,
    profile: Profile,
    settings: GenerationSettings,
    url: SearchParams,
    job_url: Option<String>,
    job_context: Option<String>,
    active_key: Option<CacheKey>,
    last_request: Option<GenerationRequest>,
    /// Keys with a call outstanding, and the epoch that started it
    in_flight: HashMap<CacheKey, u64>,
    epoch: u64,
    patch_task: Option<ScheduledTask>,
    progress_task: Option<ScheduledTask>,
}

impl SessionState {
    fn cancel_timers(&mut self) {
        if let Some(mut task) = self.patch_task.take() {
            task.cancel();
        }
        self.stop_progress();
    }

    fn stop_progress(&mut self) {
        if let Some(mut task) = self.progress_task.take() {
            task.cancel();
        }
    }

    fn snapshot(&self, target: &SearchTarget, query: &str) -> SessionSnapshot {
        SessionSnapshot::new(query, target).with_job(self.job_url.clone(), self.job_context.clone())
    }

    fn finish_in_flight(&mut self, key: &CacheKey, epoch: u64) {
        if self.in_flight.get(key) == Some(&epoch) {
            self.in_flight.remove(key);
        }
    }
}

struct Inner {
    cache: Arc<TieredCacheStore>,
    limiter: Arc<RateLimiter>,
    generator: Arc<dyn ContentGenerator>,
    profile_store: Arc<dyn ProfileStore>,
    autosave: ResumeAutosaver,
    validator: StalenessValidator,
    config: OrchestratorConfig,
    state: Mutex<SessionState>,
}

/// Orchestrates cache reuse, gating and generation for one session
#[derive(Clone)]
pub struct GenerationOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl GenerationOrchestrator {
    pub fn new(
        cache: Arc<TieredCacheStore>,
        limiter: Arc<RateLimiter>,
        generator: Arc<dyn ContentGenerator>,
        profile_store: Arc<dyn ProfileStore>,
        autosave: ResumeAutosaver,
        config: OrchestratorConfig,
    ) -> Self {
        let state = SessionState {
            settings: config.settings.clone(),
            ..SessionState::default()
        };

        Self {
            inner: Arc::new(Inner {
                cache,
                limiter,
                generator,
                profile_store,
                autosave,
                validator: StalenessValidator,
                config,
                state: Mutex::new(state),
            }),
        }
    }

    fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    pub fn cache(&self) -> &Arc<TieredCacheStore> {
        &self.inner.cache
    }

    /// Current view
    pub async fn view(&self) -> DashboardView {
        self.inner.state.lock().await.view.clone()
    }

    /// Search parameters mirroring the active search
    pub async fn url_params(&self) -> SearchParams {
        self.inner.state.lock().await.url.clone()
    }

    /// Provider and model the next call will use
    pub async fn settings(&self) -> GenerationSettings {
        self.inner.state.lock().await.settings.clone()
    }

    pub async fn context(&self) -> LiveContext {
        self.inner.state.lock().await.context.clone()
    }

    /// Parses `query` and opens the search it names
    pub async fn analyze(&self, query: &str) -> Result<DashboardView, DomainError> {
        self.analyze_with(query, false).await
    }

    /// Like [`analyze`](Self::analyze), skipping the cache when `force` is set
    pub async fn analyze_with(&self, query: &str, force: bool) -> Result<DashboardView, DomainError> {
        let target = parse_search_query(query)?;
        info!(target = %target, force = force, "Analyzing search");

        Ok(self.open(target, query.trim().to_string(), force).await)
    }

    /// Regenerates the current dashboard, bypassing the cache
    pub async fn force_refresh(&self) -> Result<DashboardView, DomainError> {
        let (target, query) = {
            let state = self.inner.state.lock().await;
            match (&state.view.state, &state.view.target) {
                (ViewState::Dashboard, Some(target)) => (
                    target.clone(),
                    state
                        .view
                        .search_query
                        .clone()
                        .unwrap_or_else(|| target.query()),
                ),
                _ => return Err(DomainError::validation("No dashboard to refresh")),
            }
        };

        info!(target = %target, "Force refresh");
        Ok(self.open(target, query, true).await)
    }

    /// Replays the last request after a failure
    pub async fn retry(&self) -> Result<DashboardView, DomainError> {
        let request = {
            let state = self.inner.state.lock().await;
            if state.view.state != ViewState::Error {
                return Err(DomainError::validation("Nothing to retry"));
            }
            state
                .last_request
                .clone()
                .ok_or_else(|| DomainError::validation("Nothing to retry"))?
        };

        Ok(self.replay(request).await)
    }

    /// Replays the last request on another provider and keeps it for later calls
    pub async fn switch_provider(
        &self,
        provider: Provider,
        model: Option<String>,
    ) -> Result<DashboardView, DomainError> {
        let request = {
            let mut state = self.inner.state.lock().await;

            if state.view.state != ViewState::Error {
                return Err(DomainError::validation("Provider can only be switched after a failure"));
            }

            if !state.profile.has_credential(provider) {
                return Err(DomainError::authorization(
                    provider.as_str(),
                    format!("No API key configured for {}", provider),
                ));
            }

            let mut request = state
                .last_request
                .clone()
                .ok_or_else(|| DomainError::validation("Nothing to retry"))?;

            state.settings = GenerationSettings::new(provider).with_model(model);
            request.settings = state.settings.clone();
            request
        };

        info!(provider = %provider, "Switching provider");
        Ok(self.replay(request).await)
    }

    /// Clears the session, both cache tiers, the snapshot and the URL
    pub async fn reset(&self) -> DashboardView {
        let mut state = self.inner.state.lock().await;

        state.epoch += 1;
        state.cancel_timers();
        state.in_flight.clear();
        state.last_request = None;
        state.active_key = None;
        state.job_url = None;
        state.job_context = None;
        state.url = SearchParams::default();
        state.view = DashboardView::empty();

        let cleared = self.inner.cache.clear(self.inner.cache.namespace()).await;
        self.inner.cache.clear_snapshot().await;

        info!(cleared = cleared, "Session reset");
        state.view.clone()
    }

    /// Applies new resume/story data.
    ///
    /// A changed resume is queued for autosave. Gaining context while a
    /// dashboard without `match` is shown schedules the match-only patch.
    pub async fn on_context_changed(&self, context: LiveContext) -> DashboardView {
        let (resume_changed, view) = {
            let mut state = self.inner.state.lock().await;

            let had_context = state.context.fingerprint().has_context();
            let has_context = context.fingerprint().has_context();
            let resume_changed = state.context.resume_text != context.resume_text;
            state.context = context;

            if !had_context
                && has_context
                && state.view.state == ViewState::Dashboard
                && !state.view.sections.has(Section::Match)
            {
                debug!("Context gained, scheduling match patch");
                let delay = self.inner.config.patch_debounce;
                self.schedule_patch(&mut state, delay);
            }

            let resume = resume_changed.then(|| state.context.resume_text.clone());
            (resume, state.view.clone())
        };

        if let Some(resume_text) = resume_changed {
            self.inner.autosave.schedule(resume_text).await;
        }

        view
    }

    /// Loads the saved profile: credentials, provider preference and resume
    pub async fn load_profile(&self) -> Result<(), DomainError> {
        let profile = self.inner.profile_store.fetch_profile().await?;
        let mut state = self.inner.state.lock().await;

        if state.context.resume_text.is_empty() {
            state.context.resume_text = profile.resume_text.clone();
        }
        if let Some(provider) = profile.preferred_provider {
            state.settings =
                GenerationSettings::new(provider).with_model(profile.preferred_model.clone());
        }
        state.profile = profile;

        debug!(provider = %state.settings.provider, "Profile loaded");
        Ok(())
    }

    /// Records job posting details carried into the session snapshot
    pub async fn set_job(&self, job_url: Option<String>, job_context: Option<String>) {
        let mut state = self.inner.state.lock().await;
        state.job_url = job_url;
        state.job_context = job_context;
    }

    /// Opens a search resolved at startup and tags the view with its source
    pub async fn restore_target(
        &self,
        target: SearchTarget,
        query: String,
        source: RestoreSource,
    ) -> DashboardView {
        self.open(target, query, false).await;

        let mut state = self.inner.state.lock().await;
        state.view.restored_from = Some(source);
        state.view.clone()
    }

    /// Waits for scheduled match patches to finish. The task stays in the
    /// session while waiting, so a reset or new search can still abort it.
    pub async fn settle(&self) {
        loop {
            let finished = {
                let mut state = self.inner.state.lock().await;
                match &state.patch_task {
                    Some(task) if !task.is_finished() => task.finished(),
                    _ => {
                        state.patch_task = None;
                        return;
                    }
                }
            };
            finished.await;
        }
    }

    /// Cancels timers, drops outstanding results and flushes the autosave
    pub async fn teardown(&self) {
        {
            let mut state = self.inner.state.lock().await;
            state.epoch += 1;
            state.cancel_timers();
            state.in_flight.clear();
        }

        self.inner.autosave.flush().await;
        debug!("Session torn down");
    }

    async fn open(&self, target: SearchTarget, query: String, force: bool) -> DashboardView {
        let key = self.inner.cache.key(&target);

        let (epoch, live) = {
            let mut state = self.inner.state.lock().await;

            if state.view.state == ViewState::Loading && state.in_flight.contains_key(&key) {
                debug!(key = %key, "Generation already in flight, trigger suppressed");
                return state.view.clone();
            }

            let epoch = self.begin_loading(&mut state, &target, &query, &key);
            (epoch, state.context.fingerprint())
        };

        if !force {
            match self.inner.cache.lookup(&key).await {
                Some(found) => {
                    let verdict = self.inner.validator.validate(
                        &found.entry,
                        &live,
                        self.inner.cache.now_millis(),
                        self.inner.cache.ttl_for(found.tier),
                    );
                    record_cache_lookup(found.tier.as_str(), verdict.label());
                    debug!(key = %key, tier = %found.tier, verdict = verdict.label(), "Cache lookup");

                    match verdict {
                        Verdict::Fresh => {
                            return self
                                .show_cached(epoch, &key, target, query, found.entry.sections, false)
                                .await;
                        }
                        Verdict::Partial { .. } => {
                            return self
                                .show_cached(epoch, &key, target, query, found.entry.sections, true)
                                .await;
                        }
                        Verdict::Stale(_) => {}
                    }
                }
                None => record_cache_lookup("none", "miss"),
            }
        }

        let request = {
            let state = self.inner.state.lock().await;
            if state.epoch != epoch {
                return state.view.clone();
            }
            GenerationRequest::new(&target, &state.context, state.settings.clone(), force)
        };

        self.run_full(epoch, key, target, query, request).await
    }

    async fn replay(&self, request: GenerationRequest) -> DashboardView {
        let target = request.target();
        let key = self.inner.cache.key(&target);

        let (epoch, query) = {
            let mut state = self.inner.state.lock().await;

            if state.view.state == ViewState::Loading && state.in_flight.contains_key(&key) {
                return state.view.clone();
            }

            let query = state
                .view
                .search_query
                .clone()
                .unwrap_or_else(|| target.query());
            (self.begin_loading(&mut state, &target, &query, &key), query)
        };

        self.run_full(epoch, key, target, query, request).await
    }

    /// Moves to `loading` under a fresh epoch; pending patches and tickers are dropped
    fn begin_loading(
        &self,
        state: &mut SessionState,
        target: &SearchTarget,
        query: &str,
        key: &CacheKey,
    ) -> u64 {
        state.cancel_timers();
        state.epoch += 1;
        state.in_flight.clear();
        state.active_key = Some(key.clone());

        let mut view = DashboardView::loading(target.clone(), query.to_string());
        view.loading_text = Some(loading_text(target, 0));
        state.view = view;

        state.epoch
    }

    async fn show_cached(
        &self,
        epoch: u64,
        key: &CacheKey,
        target: SearchTarget,
        query: String,
        sections: Sections,
        needs_match: bool,
    ) -> DashboardView {
        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            return state.view.clone();
        }

        let snapshot = state.snapshot(&target, &query);
        state.url = SearchParams::from_target(&target);
        state.view = DashboardView::dashboard(target, query, sections);
        self.inner.cache.save_snapshot(&snapshot).await;

        if needs_match {
            debug!(key = %key, "Reusing partial entry, patching match");
            self.schedule_patch(&mut state, Duration::ZERO);
        }

        state.view.clone()
    }

    async fn run_full(
        &self,
        epoch: u64,
        key: CacheKey,
        target: SearchTarget,
        query: String,
        mut request: GenerationRequest,
    ) -> DashboardView {
        let provider = request.settings.provider;

        let credential = {
            let mut state = self.inner.state.lock().await;
            if state.epoch != epoch {
                return state.view.clone();
            }
            request.settings.api_key = None;
            state.last_request = Some(request.clone());
            state.profile.credential_for(provider).map(str::to_string)
        };

        let Some(credential) = credential else {
            let error = DomainError::authorization(
                provider.as_str(),
                format!("No API key configured for {}", provider),
            );
            return self.fail(epoch, target, query, error).await;
        };
        request.settings.api_key = Some(credential);

        let decision = self.inner.limiter.check_and_record(&self.inner.config.user_id).await;
        if !decision.allowed {
            let message = decision
                .message
                .unwrap_or_else(|| "Rate limit exceeded.".to_string());
            return self
                .fail(epoch, target, query, DomainError::rate_limited(message))
                .await;
        }

        {
            let mut state = self.inner.state.lock().await;
            if state.epoch != epoch {
                return state.view.clone();
            }
            state.in_flight.insert(key.clone(), epoch);
            state.progress_task = Some(self.start_progress(epoch));
        }

        let has_context = request.fingerprint().has_context();
        let result = self.inner.generator.generate(request).await;

        let mut state = self.inner.state.lock().await;
        state.finish_in_flight(&key, epoch);

        if state.epoch != epoch {
            debug!(key = %key, "Discarding result from a superseded generation");
            return state.view.clone();
        }

        match result {
            Ok(response) => {
                let entry = CacheEntry::new(
                    &target,
                    has_context,
                    response.sections,
                    self.inner.cache.now_millis(),
                );
                self.inner.cache.put(&key, &entry).await;

                let snapshot = state.snapshot(&target, &query);
                self.inner.cache.save_snapshot(&snapshot).await;

                state.stop_progress();
                state.url = SearchParams::from_target(&target);
                state.view = DashboardView::dashboard(target, query, entry.sections);

                info!(key = %key, "Generation complete");
                state.view.clone()
            }
            Err(error) => {
                drop(state);
                self.fail(epoch, target, query, error).await
            }
        }
    }

    async fn fail(
        &self,
        epoch: u64,
        target: SearchTarget,
        query: String,
        error: DomainError,
    ) -> DashboardView {
        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            return state.view.clone();
        }

        warn!(target = %target, error = %error, "Generation failed");

        let error_view = ErrorView::from_error(&error, &state.profile, state.settings.provider);
        state.stop_progress();
        state.view = DashboardView::failed(target, query, error_view);
        state.view.clone()
    }

    fn start_progress(&self, epoch: u64) -> ScheduledTask {
        let weak = self.downgrade();

        repeat(self.inner.config.progress_interval, move || {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                let mut state = inner.state.lock().await;

                if state.epoch != epoch || state.view.state != ViewState::Loading {
                    return ControlFlow::Break(());
                }

                let progress = state
                    .view
                    .progress
                    .saturating_add(PROGRESS_STEP)
                    .min(PROGRESS_CAP);
                state.view.progress = progress;
                state.view.loading_text = state
                    .view
                    .target
                    .as_ref()
                    .map(|target| loading_text(target, progress));

                if progress >= PROGRESS_CAP {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        })
    }

    fn schedule_patch(&self, state: &mut SessionState, delay: Duration) {
        let Some(key) = state.active_key.clone() else {
            return;
        };

        if let Some(mut previous) = state.patch_task.take() {
            previous.cancel();
        }

        let weak = self.downgrade();
        let epoch = state.epoch;
        state.view.match_pending = true;
        state.view.match_error = None;

        state.patch_task = Some(schedule(delay, async move {
            if let Some(inner) = weak.upgrade() {
                GenerationOrchestrator::from_inner(inner)
                    .run_patch(epoch, key)
                    .await;
            }
        }));
    }

    /// Generates only `match` and merges it into the shown dashboard
    async fn run_patch(&self, epoch: u64, key: CacheKey) {
        let (target, request, credential) = {
            let mut state = self.inner.state.lock().await;

            if state.epoch != epoch
                || state.view.state != ViewState::Dashboard
                || state.active_key.as_ref() != Some(&key)
            {
                return;
            }

            if state.view.sections.has(Section::Match)
                || !state.context.fingerprint().has_context()
            {
                state.view.match_pending = false;
                return;
            }

            if state.in_flight.contains_key(&key) {
                return;
            }

            let Some(target) = state.view.target.clone() else {
                return;
            };

            let provider = state.settings.provider;
            let request = GenerationRequest::new(&target, &state.context, state.settings.clone(), false)
                .scoped(Section::Match);
            let credential = state.profile.credential_for(provider).map(str::to_string);

            (target, request, credential)
        };

        let provider = request.settings.provider;
        let Some(credential) = credential else {
            self.patch_failed(epoch, format!("No API key configured for {}", provider))
                .await;
            return;
        };

        let decision = self.inner.limiter.check_and_record(&self.inner.config.user_id).await;
        if !decision.allowed {
            let message = decision
                .message
                .unwrap_or_else(|| "Rate limit exceeded.".to_string());
            self.patch_failed(epoch, message).await;
            return;
        }

        {
            let mut state = self.inner.state.lock().await;
            if state.epoch != epoch {
                return;
            }
            state.in_flight.insert(key.clone(), epoch);
        }

        let mut request = request;
        request.settings.api_key = Some(credential);
        let has_context = request.fingerprint().has_context();
        let result = self.inner.generator.generate(request).await;

        let mut state = self.inner.state.lock().await;
        state.finish_in_flight(&key, epoch);

        if state.epoch != epoch || state.view.state != ViewState::Dashboard {
            debug!(key = %key, "Discarding superseded match patch");
            return;
        }

        let patch = match result {
            Ok(mut response) => match response.sections.take(Section::Match) {
                Some(value) => Sections::default().with(Section::Match, value),
                None => {
                    drop(state);
                    self.patch_failed(epoch, "No match strategy was generated".to_string())
                        .await;
                    return;
                }
            },
            Err(error) => {
                drop(state);
                self.patch_failed(epoch, error.user_message().to_string())
                    .await;
                return;
            }
        };

        let sections = state.view.sections.merged_with(&patch);
        let entry = CacheEntry::new(&target, has_context, sections, self.inner.cache.now_millis());
        self.inner.cache.put(&key, &entry).await;

        state.view.sections = entry.sections;
        state.view.match_pending = false;
        state.view.match_error = None;

        info!(key = %key, "Match patch merged");
    }

    async fn patch_failed(&self, epoch: u64, message: String) {
        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            return;
        }

        warn!(error = %message, "Match patch failed");
        state.view.match_pending = false;
        state.view.match_error = Some(message);
    }
}

fn loading_text(target: &SearchTarget, progress: u8) -> String {
    match progress {
        0..=29 => format!("Researching {}...", target.company),
        30..=59 => format!("Analyzing the {} role...", target.position),
        60..=79 => format!("Drafting {} questions...", target.round),
        _ => "Finalizing your prep dashboard...".to_string(),
    }
}
