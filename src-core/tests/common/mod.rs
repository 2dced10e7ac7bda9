//! Shared doubles for the integration tests: a scripted transport standing in
//! for the remote service and a render sink that records what it was given.

#![allow(dead_code)]

use async_trait::async_trait;
use ledgerpulse_core::chart::{ChartPoint, RenderSink};
use ledgerpulse_core::errors::{Error, Result};
use ledgerpulse_core::gateway::{RawResponse, Transport};
use ledgerpulse_core::session::{CredentialStore, MemoryCredentialStore, SessionController};
use ledgerpulse_core::ClientConfig;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Script {
    login: Option<RawResponse>,
    routes: HashMap<String, RawResponse>,
    delays: HashMap<String, Duration>,
    unreachable: bool,
}

/// In-memory remote service. GET routes match the full path first, then the
/// path without its query string; unknown paths answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A service that accepts any login and serves a small data set.
    pub fn healthy() -> Arc<Self> {
        let transport = Self::new();
        transport.login_reply(
            200,
            json!({ "token": "jwt-1", "user": { "username": "ana", "status": "active" } }),
        );
        transport.route(
            "/api/summary",
            200,
            json!({ "total_income": 5000, "total_expense": 1200, "balance": 3800 }),
        );
        transport.route(
            "/api/chart/daily",
            200,
            json!({ "data": [
                { "date": "2025-06-02", "income": 5, "expense": 2 },
                { "date": "2025-06-01", "income": 3, "expense": 1 }
            ] }),
        );
        transport.route(
            "/api/categories",
            200,
            json!({ "data": [
                { "name": "Transport", "total": 200 },
                { "name": "Food", "total": 300 }
            ] }),
        );
        transport.route(
            "/api/transactions",
            200,
            json!({ "data": [
                { "id": 1, "type": "expense", "amount": 100, "category": "catA",
                  "date": "2025-06-01 08:00:00" },
                { "id": 2, "type": "expense", "amount": 50, "category": "catA",
                  "date": "2025-06-01 12:00:00" },
                { "id": 3, "type": "expense", "amount": 200, "category": "catB",
                  "date": "2025-06-02 09:30:00" },
                { "id": 4, "type": "income", "amount": 5000, "category": "Salary",
                  "date": "2025-06-01 07:00:00" }
            ] }),
        );
        transport
    }

    pub fn login_reply(&self, status: u16, body: Value) {
        self.script.lock().unwrap().login = Some(RawResponse::new(status, body.to_string()));
    }

    pub fn route(&self, path: &str, status: u16, body: Value) {
        self.script
            .lock()
            .unwrap()
            .routes
            .insert(path.to_string(), RawResponse::new(status, body.to_string()));
    }

    pub fn delay(&self, path: &str, delay: Duration) {
        self.script.lock().unwrap().delays.insert(path.to_string(), delay);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.script.lock().unwrap().unreachable = unreachable;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Requests whose path (query ignored) equals `path`.
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split('?').next() == Some(path))
            .count()
    }

    fn lookup(&self, path: &str) -> Result<(RawResponse, Option<Duration>)> {
        let script = self.script.lock().unwrap();
        if script.unreachable {
            return Err(Error::Transport("connection refused".to_string()));
        }
        let base = path.split('?').next().unwrap_or(path);
        let response = script
            .routes
            .get(path)
            .or_else(|| script.routes.get(base))
            .cloned()
            .unwrap_or_else(|| RawResponse::new(404, json!({ "error": "not found" }).to_string()));
        let delay = script
            .delays
            .get(path)
            .or_else(|| script.delays.get(base))
            .copied();
        Ok((response, delay))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, path: &str, _body: &Value) -> Result<RawResponse> {
        self.calls.lock().unwrap().push(path.to_string());
        let script = self.script.lock().unwrap();
        if script.unreachable {
            return Err(Error::Transport("connection refused".to_string()));
        }
        Ok(script.login.clone().unwrap_or_else(|| {
            RawResponse::new(401, json!({ "error": "Invalid credentials" }).to_string())
        }))
    }

    async fn get(&self, path: &str, _bearer: &str) -> Result<RawResponse> {
        self.calls.lock().unwrap().push(path.to_string());
        // the reply is fixed when the request is made, not when it lands
        let (response, delay) = self.lookup(path)?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(response)
    }
}

#[derive(Debug, Default)]
pub struct SinkLog {
    pub renders: Vec<Vec<ChartPoint>>,
    pub disposals: usize,
}

/// Render sink that records every call into a shared log
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub log: Arc<Mutex<SinkLog>>,
}

impl RecordingSink {
    pub fn renders(&self) -> usize {
        self.log.lock().unwrap().renders.len()
    }

    pub fn last_render(&self) -> Option<Vec<ChartPoint>> {
        self.log.lock().unwrap().renders.last().cloned()
    }

    pub fn disposals(&self) -> usize {
        self.log.lock().unwrap().disposals
    }
}

impl RenderSink for RecordingSink {
    fn render_or_update(&mut self, series: &[ChartPoint]) {
        self.log.lock().unwrap().renders.push(series.to_vec());
    }

    fn dispose(&mut self) {
        self.log.lock().unwrap().disposals += 1;
    }
}

pub struct Harness {
    pub controller: SessionController,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryCredentialStore>,
    pub sink: RecordingSink,
}

pub fn harness(transport: Arc<ScriptedTransport>) -> Harness {
    harness_with_store(transport, Arc::new(MemoryCredentialStore::new()))
}

pub fn harness_with_store(
    transport: Arc<ScriptedTransport>,
    store: Arc<MemoryCredentialStore>,
) -> Harness {
    let sink = RecordingSink::default();
    let config = ClientConfig::default().with_poll_interval(Duration::from_secs(5));
    let controller = SessionController::new(
        config,
        transport.clone(),
        store.clone() as Arc<dyn CredentialStore>,
        Box::new(sink.clone()),
    );
    Harness {
        controller,
        transport,
        store,
        sink,
    }
}
