use chrono::NaiveDate;
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::reports::reports_model::TypeFilter;
use crate::session::session_model::Profile;

pub const LOGIN_PATH: &str = "/login";
pub const SUMMARY_PATH: &str = "/api/summary";
pub const CATEGORIES_PATH: &str = "/api/categories";
pub const TRANSACTIONS_PATH: &str = "/api/transactions";
pub const CHART_DAILY_PATH: &str = "/api/chart/daily";

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";
pub const UNREACHABLE_MESSAGE: &str = "Unable to reach the server";

/// Status line and body of a finished HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Result of an authenticated call as seen by the session controller
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A JSON body, possibly an error payload from a non-2xx response
    Json(Value),
    /// The token was rejected; the session must be torn down
    Unauthorized,
    /// Transport failure or unusable body; keep the last known state
    Unavailable,
}

impl FetchOutcome {
    /// The body, or why there is none.
    pub fn into_result(self) -> Result<Value> {
        match self {
            FetchOutcome::Json(value) => Ok(value),
            FetchOutcome::Unauthorized => Err(Error::SessionExpired),
            FetchOutcome::Unavailable => {
                Err(Error::Transport("service unavailable".to_string()))
            }
        }
    }
}

/// What a successful login hands back
#[derive(Debug, Clone, PartialEq)]
pub struct LoginGrant {
    pub token: String,
    pub username: Option<String>,
    pub user: Option<Profile>,
}

/// `/api/transactions` with optional `type`, `from` and `to` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionQuery {
    pub type_filter: TypeFilter,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TransactionQuery {
    pub fn filtered(type_filter: TypeFilter) -> Self {
        Self {
            type_filter,
            ..Self::default()
        }
    }

    pub fn window(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            type_filter: TypeFilter::All,
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn endpoint(&self) -> String {
        let mut params: Vec<String> = Vec::new();
        if let Some(kind) = self.type_filter.as_query() {
            params.push(format!("type={}", urlencoding::encode(kind)));
        }
        if let Some(from) = self.from {
            let from = from.format("%Y-%m-%d").to_string();
            params.push(format!("from={}", urlencoding::encode(&from)));
        }
        if let Some(to) = self.to {
            params.push(format!("to={}", urlencoding::encode(&to.format("%Y-%m-%d").to_string())));
        }

        if params.is_empty() {
            TRANSACTIONS_PATH.to_string()
        } else {
            format!("{}?{}", TRANSACTIONS_PATH, params.join("&"))
        }
    }
}

/// Items of the `data` array in a list response.
///
/// A missing or non-array `data` yields an empty list; items that do not
/// match `T` are skipped.
pub fn data_array<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    match require_data(value) {
        Ok(items) => items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!("Skipping malformed list item: {}", e);
                    None
                }
            })
            .collect(),
        Err(e) => {
            debug!("{}", e);
            Vec::new()
        }
    }
}

/// The `data` array of a list response.
pub fn require_data(value: &Value) -> Result<&Vec<Value>> {
    value
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::DataShape("no data array in response".to_string()))
}

/// Server-side error message carried by a JSON payload, if any.
pub fn error_message(value: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
}
