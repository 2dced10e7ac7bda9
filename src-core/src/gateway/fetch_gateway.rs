//! Single entry point for calls to the remote data service.
//!
//! The gateway never lets a transport failure escape an authenticated call:
//! it logs and reports [`FetchOutcome::Unavailable`] so one failed poll tick
//! cannot stop the next. Tearing the session down on
//! [`FetchOutcome::Unauthorized`] is the session controller's job.

use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::gateway::gateway_model::{
    error_message, FetchOutcome, LoginGrant, LOGIN_FAILED_MESSAGE, LOGIN_PATH,
    UNREACHABLE_MESSAGE,
};
use crate::gateway::transport::Transport;
use crate::session::session_model::{Credentials, Profile};

pub struct FetchGateway {
    transport: Arc<dyn Transport>,
}

impl FetchGateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Exchange credentials for a token.
    ///
    /// Every failure comes back as [`Error::Auth`] carrying a message fit
    /// for the login form.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginGrant> {
        let body = serde_json::to_value(credentials)?;
        let response = match self.transport.post_json(LOGIN_PATH, &body).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Login request failed: {}", e);
                return Err(Error::Auth(UNREACHABLE_MESSAGE.to_string()));
            }
        };

        let data = response.json();
        let token = data
            .as_ref()
            .and_then(|d| d.get("token"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty());

        match (response.is_success(), token) {
            (true, Some(token)) => {
                let user = data
                    .as_ref()
                    .and_then(|d| d.get("user"))
                    .filter(|u| u.is_object())
                    .and_then(|u| serde_json::from_value::<Profile>(u.clone()).ok());
                let username = data
                    .as_ref()
                    .and_then(|d| d.get("username"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| user.as_ref().map(|u| u.username.clone()))
                    .filter(|name| !name.is_empty());

                Ok(LoginGrant {
                    token: token.to_string(),
                    username,
                    user,
                })
            }
            _ => {
                debug!("Login rejected with status {}", response.status);
                let message = data
                    .as_ref()
                    .and_then(error_message)
                    .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
                Err(Error::Auth(message))
            }
        }
    }

    /// GET `endpoint` with the bearer token.
    ///
    /// Non-2xx responses that still carry JSON are returned as
    /// [`FetchOutcome::Json`] so callers can read an `error` field.
    pub async fn fetch_authenticated(&self, token: &str, endpoint: &str) -> FetchOutcome {
        if token.is_empty() {
            debug!("Skipping {} without a token", endpoint);
            return FetchOutcome::Unavailable;
        }

        let response = match self.transport.get(endpoint, token).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Fetch {} failed: {}", endpoint, e);
                return FetchOutcome::Unavailable;
            }
        };

        if response.is_unauthorized() {
            return FetchOutcome::Unauthorized;
        }

        if !response.is_success() {
            warn!("HTTP {} from {}: {}", response.status, endpoint, response.body);
        }

        match response.json() {
            Some(value) => FetchOutcome::Json(value),
            None => {
                warn!("Unreadable body from {} (HTTP {})", endpoint, response.status);
                FetchOutcome::Unavailable
            }
        }
    }
}
