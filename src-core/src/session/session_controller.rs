//! Session Controller
//!
//! Owns the login/logout state machine
//! (`LoggedOut -> Authenticating -> LoggedIn -> LoggedOut`), the polling
//! timer and the trial countdown timer, and reconciles fetched data into the
//! published [`DashboardState`].
//!
//! Every login and logout bumps a session generation. A refresh captures the
//! generation together with the token before fetching and applies its results
//! only if the generation is unchanged, so responses that outlive their
//! session are dropped. Each refresh also gets a monotonic tick id; results
//! of a tick older than the last applied one are dropped as well.

use chrono::{Local, Utc};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::watch;

use crate::chart::change_gate::ChangeGate;
use crate::chart::chart_model::{normalize_series, RawChartPoint};
use crate::chart::render_sink::RenderSink;
use crate::config::ClientConfig;
use crate::dashboard::dashboard_state::{DashboardState, View};
use crate::errors::{Error, Result};
use crate::format::format_countdown;
use crate::gateway::fetch_gateway::FetchGateway;
use crate::gateway::gateway_model::{
    data_array, error_message, require_data, TransactionQuery, CATEGORIES_PATH,
    CHART_DAILY_PATH, SUMMARY_PATH, TRANSACTIONS_PATH,
};
use crate::gateway::transport::Transport;
use crate::reports::aggregation::{compute_report_metrics, derive_category_shares, month_window};
use crate::reports::pagination::paginate;
use crate::reports::reports_model::{
    CategoryTotal, PaginationView, SummaryTotals, Transaction, TypeFilter,
};
use crate::session::credential_store::{clear_session, persist_session, restore_session};
use crate::session::session_model::{AccessGate, Credentials, Session, SessionStatus};
use crate::session::session_traits::CredentialStore;
use crate::session::timers::{spawn_every, Timers};

/// Which endpoints one refresh touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct RefreshScope {
    summary: bool,
    chart: bool,
    categories: bool,
    transactions: Option<TransactionQuery>,
    report: bool,
}

impl RefreshScope {
    fn for_view(view: View, type_filter: TypeFilter) -> Self {
        let base = Self {
            summary: true,
            chart: true,
            ..Self::default()
        };
        match view {
            View::Overview => base,
            View::Transactions => Self {
                categories: true,
                transactions: Some(TransactionQuery::filtered(type_filter)),
                ..base
            },
            View::Reports => {
                let (from, to) = month_window(Local::now().date_naive());
                Self {
                    transactions: Some(TransactionQuery::window(from, to)),
                    report: true,
                    ..base
                }
            }
        }
    }

    fn transactions_only(type_filter: TypeFilter) -> Self {
        Self {
            transactions: Some(TransactionQuery::filtered(type_filter)),
            ..Self::default()
        }
    }
}

/// Bodies fetched by one refresh; `None` keeps the last known value
#[derive(Debug, Default)]
struct Fetched {
    summary: Option<Value>,
    chart: Option<Value>,
    categories: Option<Value>,
    transactions: Option<Value>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(rwlock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rwlock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(rwlock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rwlock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Server message of an error payload, a body with `error`/`message` and no
/// `data`.
fn payload_error(value: &Value) -> Option<String> {
    if value.get("data").is_some() {
        return None;
    }
    error_message(value)
}

struct ControllerInner {
    config: ClientConfig,
    gateway: FetchGateway,
    store: Arc<dyn CredentialStore>,
    sink: Mutex<Box<dyn RenderSink>>,
    gate: Mutex<ChangeGate>,
    session: RwLock<Session>,
    generation: AtomicU64,
    next_tick: AtomicU64,
    applied_tick: Mutex<u64>,
    timers: Mutex<Timers>,
    state: watch::Sender<DashboardState>,
}

impl ControllerInner {
    /// Token and generation of the live session, if any.
    fn current(&self) -> Option<(String, u64)> {
        let session = read(&self.session);
        if !session.is_logged_in() {
            return None;
        }
        Some((
            session.token().to_string(),
            self.generation.load(Ordering::SeqCst),
        ))
    }

    fn is_logged_in(&self) -> bool {
        read(&self.session).is_logged_in()
    }

    /// End the session. With `expected` set, only if that generation is
    /// still current, which makes concurrent unauthorized responses collapse
    /// into a single teardown. Returns whether this call ended it.
    fn end_session(&self, expected: Option<u64>) -> bool {
        let was_active = {
            let mut session = write(&self.session);
            let current = self.generation.load(Ordering::SeqCst);
            if expected.is_some_and(|g| g != current) {
                return false;
            }
            self.generation.store(current + 1, Ordering::SeqCst);
            let was_active = session.status != SessionStatus::LoggedOut;
            *session = Session::default();
            was_active
        };

        lock(&self.timers).cancel_all();

        if let Err(e) = clear_session(self.store.as_ref()) {
            warn!("Could not clear stored credentials: {}", e);
        }

        lock(&self.gate).reset();
        if was_active {
            lock(&self.sink).dispose();
        }

        let view = self.state.borrow().view;
        self.state.send_replace(DashboardState::logged_out(view));

        if was_active {
            info!("Session ended");
        }
        true
    }

    fn expire(&self, generation: u64) {
        if self.end_session(Some(generation)) {
            warn!("Session expired; logged out");
        }
    }

    async fn fetch(&self, token: &str, generation: u64, endpoint: &str) -> Option<Value> {
        match self.gateway.fetch_authenticated(token, endpoint).await.into_result() {
            Ok(value) => Some(value),
            Err(Error::SessionExpired) => {
                self.expire(generation);
                None
            }
            Err(_) => None,
        }
    }

    fn view_scope(&self) -> RefreshScope {
        let state = self.state.borrow();
        RefreshScope::for_view(state.view, state.type_filter)
    }

    /// Fetch everything `scope` names concurrently and apply what came back.
    ///
    /// Returns `false` when nothing was applied: no session, a gated
    /// profile, or results that went stale while in flight.
    async fn refresh(&self, scope: RefreshScope) -> bool {
        let Some((token, generation)) = self.current() else {
            debug!("Refresh skipped: logged out");
            return false;
        };
        if self.state.borrow().access != AccessGate::Dashboard {
            debug!("Refresh skipped: access gated");
            return false;
        }

        let tick = self.next_tick.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Refresh #{} (generation {})", tick, generation);

        let transactions_endpoint = scope.transactions.map(|q| q.endpoint());
        let token_ref = token.as_str();
        let wanted = move |flag: bool, endpoint: &'static str| async move {
            if flag {
                self.fetch(token_ref, generation, endpoint).await
            } else {
                None
            }
        };
        let transactions = async {
            match transactions_endpoint.as_deref() {
                Some(endpoint) => self.fetch(&token, generation, endpoint).await,
                None => None,
            }
        };

        let (summary, chart, categories, transactions) = futures::join!(
            wanted(scope.summary, SUMMARY_PATH),
            wanted(scope.chart, CHART_DAILY_PATH),
            wanted(scope.categories, CATEGORIES_PATH),
            transactions,
        );

        self.apply(
            generation,
            tick,
            scope,
            Fetched {
                summary,
                chart,
                categories,
                transactions,
            },
        )
    }

    fn apply(&self, generation: u64, tick: u64, scope: RefreshScope, fetched: Fetched) -> bool {
        // Held for the whole apply so a logout cannot interleave
        let session = read(&self.session);
        if !session.is_logged_in() || self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding refresh #{}: session changed", tick);
            return false;
        }

        let mut applied = lock(&self.applied_tick);
        if tick < *applied {
            debug!("Discarding refresh #{}: #{} already applied", tick, *applied);
            return false;
        }
        *applied = tick;

        let mut fetch_error = None;
        for (endpoint, body) in [
            (SUMMARY_PATH, &fetched.summary),
            (CHART_DAILY_PATH, &fetched.chart),
            (CATEGORIES_PATH, &fetched.categories),
            (TRANSACTIONS_PATH, &fetched.transactions),
        ] {
            if let Some(message) = body.as_ref().and_then(payload_error) {
                warn!("{} answered with an error: {}", endpoint, message);
                fetch_error.get_or_insert(message);
            }
        }

        // Lists degrade to empty on an error payload; the summary and the
        // chart keep their last known value
        let summary = fetched
            .summary
            .filter(|v| v.is_object() && payload_error(v).is_none())
            .map(|v| serde_json::from_value::<SummaryTotals>(v).unwrap_or_default());
        let categories = fetched
            .categories
            .map(|v| derive_category_shares(data_array::<CategoryTotal>(&v)));
        let transactions = fetched.transactions.map(|v| data_array::<Transaction>(&v));
        let series = fetched
            .chart
            .filter(|v| require_data(v).is_ok())
            .map(|v| normalize_series(data_array::<RawChartPoint>(&v)));

        if let Some(series) = &series {
            if lock(&self.gate).admit(series) {
                lock(&self.sink).render_or_update(series);
            } else {
                debug!("Chart unchanged; render skipped");
            }
        }

        let today = Local::now().date_naive();
        self.state.send_modify(|state| {
            if let Some(summary) = summary {
                state.summary = summary;
            }
            if let Some(categories) = categories {
                state.categories = categories;
            }
            if let Some(transactions) = transactions {
                if scope.report {
                    state.report = compute_report_metrics(&transactions, today);
                }
                state.transactions = transactions;
                let pages =
                    paginate(&state.transactions, state.type_filter, 1, self.config.page_size)
                        .total_pages;
                state.page = state.page.clamp(1, pages);
            }
            if let Some(series) = series {
                state.chart = series;
            }
            state.fetch_error = fetch_error;
            state.last_refreshed = Some(Utc::now());
        });

        true
    }

    fn start_polling(self: &Arc<Self>, interval: Duration) -> bool {
        // Checked under the timers lock: a logout that ends the session
        // afterwards still cancels what is spawned here
        let mut timers = lock(&self.timers);
        if !self.is_logged_in() {
            return false;
        }
        if Timers::is_live(&timers.polling) {
            debug!("Polling already active");
            return false;
        }

        timers.polling =
            spawn_every(self, interval, false, |inner: Arc<ControllerInner>| async move {
                // Ticks run detached so a slow one never delays the next firing
                tokio::spawn(async move {
                    let scope = inner.view_scope();
                    inner.refresh(scope).await;
                });
            });
        let started = timers.polling.is_some();
        if started {
            info!("Polling every {:?}", interval);
        }
        started
    }

    fn start_countdown(self: &Arc<Self>) -> bool {
        let mut timers = lock(&self.timers);
        let deadline = {
            let session = read(&self.session);
            match session.user.as_ref().and_then(|u| u.trial_deadline()) {
                Some(deadline) if session.is_logged_in() => deadline,
                _ => return false,
            }
        };
        if Timers::is_live(&timers.countdown) {
            return false;
        }

        timers.countdown = spawn_every(
            self,
            self.config.countdown_interval,
            true,
            move |inner: Arc<ControllerInner>| async move {
                let remaining = format_countdown(deadline, Utc::now());
                inner.state.send_if_modified(|state| {
                    if state.trial_countdown.as_deref() == Some(remaining.as_str()) {
                        return false;
                    }
                    state.trial_countdown = Some(remaining);
                    true
                });
            },
        );
        timers.countdown.is_some()
    }

    /// Bring a freshly established session to life.
    async fn activate(self: &Arc<Self>) {
        let access = self.state.borrow().access;
        if access != AccessGate::Dashboard {
            info!("Account gated ({:?}); not polling", access);
            return;
        }
        self.refresh(self.view_scope()).await;
        self.start_polling(self.config.poll_interval);
        self.start_countdown();
    }
}

/// Session and polling lifecycle for one dashboard.
///
/// One instance per process; dropping it cancels its timers but leaves the
/// stored credentials in place so the next run can resume.
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

impl SessionController {
    /// Create a controller, restoring any session a previous run stored.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        sink: Box<dyn RenderSink>,
    ) -> Self {
        let session = restore_session(store.as_ref());

        let mut state = DashboardState::logged_out(View::default());
        state.status = session.status;
        state.username = session.username.clone();
        state.profile = session.user.clone();
        state.access = session.access_gate();
        let (state, _) = watch::channel(state);

        if session.is_logged_in() {
            info!("Restored stored session");
        }

        Self {
            inner: Arc::new(ControllerInner {
                config,
                gateway: FetchGateway::new(transport),
                store,
                sink: Mutex::new(sink),
                gate: Mutex::new(ChangeGate::new()),
                session: RwLock::new(session),
                generation: AtomicU64::new(0),
                next_tick: AtomicU64::new(0),
                applied_tick: Mutex::new(0),
                timers: Mutex::new(Timers::default()),
                state,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Start refreshing a restored session. No-op when logged out.
    pub async fn resume(&self) {
        if self.inner.is_logged_in() {
            self.inner.activate().await;
        }
    }

    /// Authenticate, persist the session and start refreshing.
    ///
    /// On failure the controller is back to `LoggedOut`, `login_error` holds
    /// the message for the form, and the same message is returned.
    pub async fn login(&self, credentials: Credentials) -> Result<()> {
        if read(&self.inner.session).status != SessionStatus::LoggedOut {
            self.inner.end_session(None);
        }

        let generation = {
            let mut session = write(&self.inner.session);
            *session = Session::authenticating();
            self.inner.state.send_modify(|state| {
                state.status = SessionStatus::Authenticating;
                state.login_error = None;
            });
            self.inner.generation.load(Ordering::SeqCst)
        };

        let grant = match self.inner.gateway.login(&credentials).await {
            Ok(grant) => grant,
            Err(e) => {
                let message = e.to_string();
                info!("Login failed: {}", message);
                let mut session = write(&self.inner.session);
                if self.inner.generation.load(Ordering::SeqCst) == generation {
                    *session = Session::default();
                }
                self.inner.state.send_modify(|state| {
                    state.status = SessionStatus::LoggedOut;
                    state.login_error = Some(message);
                });
                return Err(e);
            }
        };

        let access = grant
            .user
            .as_ref()
            .map(|u| u.access_gate())
            .unwrap_or_default();

        {
            // Persisted and published under the guard so a concurrent logout
            // either precedes all of it or clears all of it
            let mut session = write(&self.inner.session);
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return Err(Error::Auth("Login cancelled".to_string()));
            }
            self.inner.generation.store(generation + 1, Ordering::SeqCst);
            *session = Session::new(
                grant.token.clone(),
                grant.username.clone(),
                grant.user.clone(),
            );

            if let Err(e) = persist_session(
                self.inner.store.as_ref(),
                &grant.token,
                grant.username.as_deref(),
                grant.user.as_ref(),
            ) {
                warn!("Could not persist session: {}", e);
            }

            self.inner.state.send_modify(|state| {
                state.status = SessionStatus::LoggedIn;
                state.username = grant.username.clone();
                state.profile = grant.user.clone();
                state.access = access;
                state.login_error = None;
            });
        }
        info!("Logged in as {}", grant.username.as_deref().unwrap_or("user"));

        self.inner.activate().await;
        Ok(())
    }

    /// Cancel timers, forget the session everywhere, dispose the chart.
    /// Safe to call when already logged out.
    pub fn logout(&self) {
        self.inner.end_session(None);
    }

    /// Start the background refresh. Returns `false` if a timer is already
    /// running or there is no session.
    pub fn start_polling(&self, interval: Duration) -> bool {
        self.inner.start_polling(interval)
    }

    pub fn stop_polling(&self) -> bool {
        Timers::cancel(&mut lock(&self.inner.timers).polling)
    }

    pub fn is_polling(&self) -> bool {
        Timers::is_live(&lock(&self.inner.timers).polling)
    }

    pub fn is_counting_down(&self) -> bool {
        Timers::is_live(&lock(&self.inner.timers).countdown)
    }

    /// Cancel every timer but keep the stored session.
    pub fn shutdown(&self) {
        lock(&self.inner.timers).cancel_all();
    }

    /// Run one tick for the current view. No-op when logged out.
    pub async fn poll_once(&self) -> bool {
        let scope = self.inner.view_scope();
        self.inner.refresh(scope).await
    }

    /// Switch the screen whose data the ticks refresh.
    pub fn set_view(&self, view: View) {
        self.inner.state.send_if_modified(|state| {
            if state.view == view {
                return false;
            }
            state.view = view;
            true
        });
    }

    /// Change the transaction type filter.
    ///
    /// The Transactions view refetches its list with the new filter. Other
    /// views keep their window and only filter locally, so the Reports view
    /// never trades its month window for a filtered all-time list.
    pub async fn set_filter(&self, type_filter: TypeFilter) -> bool {
        let mut view = View::default();
        self.inner.state.send_modify(|state| {
            state.type_filter = type_filter;
            state.page = 1;
            view = state.view;
        });
        if view != View::Transactions {
            return false;
        }
        self.inner
            .refresh(RefreshScope::transactions_only(type_filter))
            .await
    }

    /// Move the transaction list to `page`, clamped to the available pages.
    pub fn set_page(&self, page: usize) -> usize {
        let page_size = self.inner.config.page_size;
        let mut current = 1;
        self.inner.state.send_modify(|state| {
            let pages = state.page_view(page_size).total_pages;
            state.page = page.clamp(1, pages);
            current = state.page;
        });
        current
    }

    pub fn page_view(&self) -> PaginationView {
        self.inner.state.borrow().page_view(self.inner.config.page_size)
    }

    pub fn select_chart_date(&self, date: Option<chrono::NaiveDate>) {
        self.inner.state.send_modify(|state| state.selected_chart_date = date);
    }

    pub fn status(&self) -> SessionStatus {
        read(&self.inner.session).status
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.is_logged_in()
    }

    pub fn state(&self) -> DashboardState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.inner.state.subscribe()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        lock(&self.inner.timers).cancel_all();
    }
}
