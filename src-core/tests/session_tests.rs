/// Session lifecycle tests: login, logout, forced logout on 401, view-scoped
/// refreshes and the chart change gate, driven through a scripted transport.
mod common;

#[cfg(test)]
mod session_lifecycle_tests {
    use crate::common::{harness, harness_with_store, RecordingSink, ScriptedTransport};
    use chrono::NaiveDate;
    use ledgerpulse_core::errors::{Error, Result};
    use ledgerpulse_core::reports::TypeFilter;
    use ledgerpulse_core::session::{
        AccessGate, CredentialStore, Credentials, MemoryCredentialStore, SessionStatus,
        PROFILE_KEY, TOKEN_KEY, USERNAME_KEY,
    };
    use ledgerpulse_core::{ClientConfig, SessionController, View};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn ana() -> Credentials {
        Credentials::new("ana", "secret")
    }

    /// Store whose token writes block for a while
    struct SlowTokenStore {
        inner: MemoryCredentialStore,
        delay: Duration,
    }

    impl CredentialStore for SlowTokenStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if key == TOKEN_KEY {
                std::thread::sleep(self.delay);
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_login_success_loads_overview_and_starts_polling() {
        let h = harness(ScriptedTransport::healthy());

        h.controller.login(ana()).await.expect("login should succeed");

        let state = h.controller.state();
        assert_eq!(state.status, SessionStatus::LoggedIn);
        assert_eq!(state.username.as_deref(), Some("ana"));
        assert_eq!(state.summary.balance, 3800.0);
        assert_eq!(state.login_error, None);
        assert!(state.last_refreshed.is_some());
        assert!(h.controller.is_polling(), "Login should start the poll timer");
        assert!(!h.controller.is_counting_down(), "Active accounts have no countdown");

        assert_eq!(h.transport.calls_to("/api/summary"), 1);
        assert_eq!(h.transport.calls_to("/api/chart/daily"), 1);
        assert_eq!(
            h.transport.calls_to("/api/transactions"),
            0,
            "Overview should not fetch the transaction list"
        );

        assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("jwt-1"));
        assert_eq!(h.store.get(USERNAME_KEY).unwrap().as_deref(), Some("ana"));
        assert!(h.store.get(PROFILE_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_login_failure_reports_server_message() {
        let transport = ScriptedTransport::healthy();
        transport.login_reply(401, json!({ "error": "Invalid credentials" }));
        let h = harness(transport);

        let err = h.controller.login(ana()).await.unwrap_err();

        assert!(matches!(err, Error::Auth(ref m) if m == "Invalid credentials"));
        let state = h.controller.state();
        assert_eq!(state.status, SessionStatus::LoggedOut);
        assert_eq!(state.login_error.as_deref(), Some("Invalid credentials"));
        assert!(!h.controller.is_polling());
        assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(h.transport.calls_to("/api/summary"), 0);
    }

    #[tokio::test]
    async fn test_login_without_token_or_server_is_rejected() {
        let transport = ScriptedTransport::healthy();
        transport.login_reply(200, json!({ "user": { "username": "ana" } }));
        let h = harness(transport);

        let err = h.controller.login(ana()).await.unwrap_err();
        assert_eq!(err.to_string(), "Login failed");
        assert!(!h.controller.is_logged_in());

        h.transport.set_unreachable(true);
        let err = h.controller.login(ana()).await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to reach the server");
        assert_eq!(
            h.controller.state().login_error.as_deref(),
            Some("Unable to reach the server")
        );
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let h = harness(ScriptedTransport::healthy());

        h.controller.logout();
        assert_eq!(h.sink.disposals(), 0, "Nothing to dispose before a login");

        h.controller.login(ana()).await.unwrap();
        h.controller.logout();
        h.controller.logout();

        assert_eq!(h.sink.disposals(), 1, "Chart should be disposed exactly once");
        assert_eq!(h.controller.status(), SessionStatus::LoggedOut);
        assert!(!h.controller.is_polling());
        assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(h.controller.state().summary.balance, 0.0);
    }

    #[tokio::test]
    async fn test_unauthorized_response_forces_logout() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();

        h.transport.route("/api/summary", 401, json!({ "error": "token expired" }));
        assert!(!h.controller.poll_once().await, "Stale tick must not apply");

        assert_eq!(h.controller.status(), SessionStatus::LoggedOut);
        assert!(!h.controller.is_polling(), "Polling must stop on expiry");
        assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(h.sink.disposals(), 1);

        let calls = h.transport.calls().len();
        assert!(!h.controller.poll_once().await);
        assert_eq!(
            h.transport.calls().len(),
            calls,
            "A logged-out tick should not touch the network"
        );
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_responses_log_out_once() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();
        h.controller.set_view(View::Transactions);

        for path in ["/api/summary", "/api/chart/daily", "/api/categories", "/api/transactions"] {
            h.transport.route(path, 401, json!({ "error": "unauthorized" }));
        }
        assert!(!h.controller.poll_once().await);

        assert_eq!(h.sink.disposals(), 1, "Four 401s should collapse into one logout");
        assert_eq!(h.controller.status(), SessionStatus::LoggedOut);
        assert_eq!(h.controller.state().view, View::Transactions, "View survives logout");
    }

    #[tokio::test]
    async fn test_start_polling_twice_keeps_one_timer() {
        let h = harness(ScriptedTransport::healthy());
        assert!(
            !h.controller.start_polling(Duration::from_secs(5)),
            "No timer without a session"
        );

        h.controller.login(ana()).await.unwrap();
        assert!(!h.controller.start_polling(Duration::from_secs(5)));

        assert!(h.controller.stop_polling());
        assert!(!h.controller.is_polling());
        assert!(h.controller.start_polling(Duration::from_secs(5)));
        assert!(h.controller.is_polling());
    }

    #[tokio::test]
    async fn test_identical_chart_renders_once() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();
        assert_eq!(h.sink.renders(), 1);

        assert!(h.controller.poll_once().await);
        assert!(h.controller.poll_once().await);
        assert_eq!(h.sink.renders(), 1, "Unchanged series must not re-render");

        h.transport.route(
            "/api/chart/daily",
            200,
            json!({ "data": [ { "date": "2025-06-03", "income": "7", "expense": 0 } ] }),
        );
        h.controller.poll_once().await;
        assert_eq!(h.sink.renders(), 2);

        h.controller.logout();
        h.controller.login(ana()).await.unwrap();
        assert_eq!(h.sink.renders(), 3, "A new session renders its first series");
    }

    #[tokio::test]
    async fn test_chart_is_sorted_before_rendering() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();

        let series = h.sink.last_render().expect("series rendered");
        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            ]
        );
        assert_eq!(series[0].income, 3.0);
        assert_eq!(h.controller.state().chart, series);

        h.controller.select_chart_date(Some(dates[1]));
        assert_eq!(h.controller.state().selected_chart_date, Some(dates[1]));
        h.controller.logout();
        assert_eq!(h.controller.state().selected_chart_date, None);
    }

    #[tokio::test]
    async fn test_failed_fetches_keep_last_known_data() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();

        h.transport.route("/api/summary", 500, json!({ "error": "db down" }));
        h.transport.route("/api/chart/daily", 200, json!({ "unexpected": true }));
        h.controller.poll_once().await;

        let state = h.controller.state();
        assert_eq!(state.summary.balance, 3800.0, "Error payload must not zero the cards");
        assert_eq!(state.chart.len(), 2, "A body without data keeps the old chart");
        assert_eq!(state.status, SessionStatus::LoggedIn);
        assert_eq!(state.fetch_error.as_deref(), Some("db down"));

        h.transport.set_unreachable(true);
        h.controller.poll_once().await;
        assert_eq!(h.controller.state().summary.balance, 3800.0);
        assert!(h.controller.is_logged_in(), "Network failure is not a logout");
    }

    #[tokio::test]
    async fn test_error_payloads_empty_the_lists() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();
        h.controller.set_view(View::Transactions);
        h.controller.poll_once().await;
        assert_eq!(h.controller.state().transactions.len(), 4);
        assert_eq!(h.controller.state().categories.len(), 2);

        h.transport.route("/api/transactions", 422, json!({ "error": "bad range" }));
        h.transport.route("/api/categories", 500, json!({ "error": "db down" }));
        assert!(h.controller.poll_once().await);

        let state = h.controller.state();
        assert!(state.transactions.is_empty(), "Error payload means no transactions");
        assert!(state.categories.is_empty(), "Error payload means no categories");
        assert_eq!(state.fetch_error.as_deref(), Some("db down"));
        assert_eq!(state.summary.balance, 3800.0);
        assert_eq!(h.controller.page_view().total_pages, 1);

        h.transport.route(
            "/api/categories",
            200,
            json!({ "data": [ { "name": "Food", "total": 1 } ] }),
        );
        h.transport.route("/api/transactions", 200, json!({ "data": [] }));
        h.controller.poll_once().await;
        let state = h.controller.state();
        assert_eq!(state.categories.len(), 1);
        assert_eq!(state.fetch_error, None, "A clean refresh clears the message");
    }

    #[tokio::test]
    async fn test_unreachable_service_keeps_the_lists() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();
        h.controller.set_view(View::Transactions);
        h.controller.poll_once().await;

        h.transport.set_unreachable(true);
        h.controller.poll_once().await;

        let state = h.controller.state();
        assert_eq!(state.transactions.len(), 4);
        assert_eq!(state.categories.len(), 2);
        assert_eq!(state.fetch_error, None);
    }

    #[tokio::test]
    async fn test_transactions_view_ranks_categories_and_filters() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();
        h.controller.set_view(View::Transactions);

        assert!(h.controller.poll_once().await);
        let state = h.controller.state();
        assert_eq!(state.categories[0].name, "Food");
        assert!((state.categories[0].share - 60.0).abs() < 1e-9);
        assert_eq!(state.transactions.len(), 4);
        assert!(h.transport.calls().iter().any(|c| c == "/api/transactions"));

        assert!(h.controller.set_filter(TypeFilter::Expense).await);
        assert!(h
            .transport
            .calls()
            .iter()
            .any(|c| c == "/api/transactions?type=expense"));

        let state = h.controller.state();
        assert_eq!(state.type_filter, TypeFilter::Expense);
        assert_eq!(state.page, 1);

        let page = h.controller.page_view();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page_items.len(), 3, "Only expenses on the page");
        assert_eq!(h.controller.set_page(4), 1, "Page is clamped to what exists");
    }

    #[tokio::test]
    async fn test_reports_view_computes_month_metrics() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();
        h.controller.set_view(View::Reports);

        assert!(h.controller.poll_once().await);

        assert!(h
            .transport
            .calls()
            .iter()
            .any(|c| c.starts_with("/api/transactions?from=")));
        let report = h.controller.state().report;
        assert_eq!(report.total_month, 350.0);
        assert_eq!(report.highest_day_date, NaiveDate::from_ymd_opt(2025, 6, 2));
        assert_eq!(report.highest_day_amount, 200.0);
        assert_eq!(report.category_ranking[0].name, "catB");
        assert_eq!(report.category_ranking[0].percentage, 57.1);
        assert_eq!(report.category_ranking[1].percentage, 42.9);
    }

    #[tokio::test]
    async fn test_filter_in_reports_keeps_month_window() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();
        h.controller.set_view(View::Reports);
        assert!(h.controller.poll_once().await);
        let report = h.controller.state().report;
        let calls = h.transport.calls().len();

        assert!(!h.controller.set_filter(TypeFilter::Expense).await);

        assert_eq!(h.transport.calls().len(), calls, "No all-time list is fetched");
        let state = h.controller.state();
        assert_eq!(state.type_filter, TypeFilter::Expense);
        assert_eq!(state.report, report);
        assert_eq!(state.transactions.len(), 4, "Month window is kept");
        assert_eq!(h.controller.page_view().page_items.len(), 3);

        h.controller.poll_once().await;
        assert!(h
            .transport
            .calls()
            .iter()
            .skip(calls)
            .all(|c| !c.contains("type=")));
        assert_eq!(h.controller.state().report, report);
    }

    #[tokio::test]
    async fn test_stored_session_resumes() {
        let store = Arc::new(MemoryCredentialStore::with_entries([
            (TOKEN_KEY, "jwt-stored"),
            (USERNAME_KEY, "ana"),
            (PROFILE_KEY, r#"{"username":"ana","status":"active"}"#),
        ]));
        let h = harness_with_store(ScriptedTransport::healthy(), store);

        assert_eq!(h.controller.status(), SessionStatus::LoggedIn);
        assert_eq!(h.controller.state().username.as_deref(), Some("ana"));
        assert_eq!(h.transport.calls_to("/api/summary"), 0, "Nothing fetched before resume");

        h.controller.resume().await;
        assert_eq!(h.transport.calls_to("/api/summary"), 1);
        assert!(h.controller.is_polling());
    }

    #[tokio::test]
    async fn test_gated_account_never_fetches_data() {
        let store = Arc::new(MemoryCredentialStore::with_entries([
            (TOKEN_KEY, "jwt-stored"),
            (PROFILE_KEY, r#"{"username":"bo","status":"pending"}"#),
        ]));
        let h = harness_with_store(ScriptedTransport::healthy(), store);

        h.controller.resume().await;
        assert!(!h.controller.poll_once().await);

        assert_eq!(h.controller.state().access, AccessGate::AwaitingApproval);
        assert!(h.transport.calls().is_empty());
        assert!(!h.controller.is_polling());
    }

    #[tokio::test]
    async fn test_trial_account_gets_countdown() {
        let transport = ScriptedTransport::healthy();
        transport.login_reply(
            200,
            json!({
                "token": "jwt-trial",
                "user": {
                    "username": "ana",
                    "status": "trial",
                    "trial_ends_at": "2099-01-01T00:00:00Z"
                }
            }),
        );
        let h = harness(transport);
        let mut rx = h.controller.subscribe();

        h.controller.login(ana()).await.unwrap();
        assert!(h.controller.is_counting_down());

        let state = tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| s.trial_countdown.is_some()),
        )
        .await
        .expect("countdown should tick")
        .unwrap()
        .clone();
        assert!(state.trial_countdown.unwrap().contains('d'));

        h.controller.logout();
        assert!(!h.controller.is_counting_down());
        assert_eq!(h.controller.state().trial_countdown, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_discards_in_flight_refresh() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();

        h.transport.route("/api/summary", 200, json!({ "balance": 999 }));
        h.transport.delay("/api/summary", Duration::from_secs(2));

        let controller = Arc::new(h.controller);
        let ticking = controller.clone();
        let in_flight = tokio::spawn(async move { ticking.poll_once().await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.logout();

        assert!(!in_flight.await.unwrap(), "Result from the old session must be dropped");
        assert_eq!(controller.state().summary.balance, 0.0);
        assert_eq!(controller.state().status, SessionStatus::LoggedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_ignores_previous_session_results() {
        let h = harness(ScriptedTransport::healthy());
        h.controller.login(ana()).await.unwrap();

        h.transport.route("/api/summary", 200, json!({ "balance": 999 }));
        h.transport.delay("/api/summary", Duration::from_secs(2));

        let controller = Arc::new(h.controller);
        let ticking = controller.clone();
        let in_flight = tokio::spawn(async move { ticking.poll_once().await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        controller.logout();
        h.transport.route("/api/summary", 200, json!({ "balance": 111 }));
        h.transport.delay("/api/summary", Duration::ZERO);
        controller.login(ana()).await.unwrap();

        assert!(!in_flight.await.unwrap());
        assert_eq!(controller.state().summary.balance, 111.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_logout_while_login_persists_leaves_nothing_behind() {
        let store = Arc::new(SlowTokenStore {
            inner: MemoryCredentialStore::new(),
            delay: Duration::from_millis(300),
        });
        let sink = RecordingSink::default();
        let controller = Arc::new(SessionController::new(
            ClientConfig::default(),
            ScriptedTransport::healthy(),
            store.clone(),
            Box::new(sink.clone()),
        ));

        let logging_in = controller.clone();
        let login = tokio::spawn(async move { logging_in.login(ana()).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.logout();
        let _ = login.await.unwrap();

        assert_eq!(controller.status(), SessionStatus::LoggedOut);
        assert_eq!(
            controller.state().status,
            SessionStatus::LoggedOut,
            "Published state must agree with the session"
        );
        assert_eq!(
            store.get(TOKEN_KEY).unwrap(),
            None,
            "A logged-out session must not survive a restart"
        );
        assert!(!controller.is_polling());
        assert!(!controller.is_counting_down());
    }
}
