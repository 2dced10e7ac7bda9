use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::reports::reports_model::parse_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SessionStatus {
    #[default]
    LoggedOut,
    Authenticating,
    LoggedIn,
}

/// Account lifecycle as reported by the login endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Trial,
    Pending,
    Suspended,
    /// Also any status this client does not know
    #[default]
    #[serde(other)]
    Active,
}

/// Where the dashboard may take a logged-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AccessGate {
    #[default]
    Dashboard,
    AwaitingApproval,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(rename = "status", default)]
    pub account_status: AccountStatus,
    #[serde(
        default,
        alias = "user_trial_ends_at",
        deserialize_with = "deserialize_instant"
    )]
    pub trial_ends_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn access_gate(&self) -> AccessGate {
        match self.account_status {
            AccountStatus::Suspended => AccessGate::Suspended,
            AccountStatus::Pending => AccessGate::AwaitingApproval,
            AccountStatus::Active | AccountStatus::Trial => AccessGate::Dashboard,
        }
    }

    /// End of the trial when a countdown should be shown.
    pub fn trial_deadline(&self) -> Option<DateTime<Utc>> {
        match self.account_status {
            AccountStatus::Trial => self.trial_ends_at,
            _ => None,
        }
    }
}

/// Offset-less timestamps are read as UTC.
fn deserialize_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|ts| ts.with_timezone(&Utc))
            .ok()
            .or_else(|| parse_timestamp(&s).map(|naive| Utc.from_utc_datetime(&naive))),
        _ => None,
    })
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Authenticated identity. The token is the sole authority for "logged in".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    token: String,
    pub username: Option<String>,
    pub user: Option<Profile>,
    pub status: SessionStatus,
}

impl Session {
    /// A session for `token`; an empty token yields a logged-out session.
    pub fn new(token: impl Into<String>, username: Option<String>, user: Option<Profile>) -> Self {
        let token = token.into();
        if token.is_empty() {
            return Self::default();
        }
        Self {
            token,
            username,
            user,
            status: SessionStatus::LoggedIn,
        }
    }

    pub fn authenticating() -> Self {
        Self {
            status: SessionStatus::Authenticating,
            ..Self::default()
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_logged_in(&self) -> bool {
        self.status == SessionStatus::LoggedIn && !self.token.is_empty()
    }

    pub fn access_gate(&self) -> AccessGate {
        self.user
            .as_ref()
            .map(Profile::access_gate)
            .unwrap_or_default()
    }
}
