use log::warn;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::{Error, Result};
use crate::session::session_model::{Profile, Session};
use crate::session::session_traits::CredentialStore;

pub const TOKEN_KEY: &str = "jwt_token";
pub const USERNAME_KEY: &str = "username";
pub const PROFILE_KEY: &str = "user";

/// Credentials kept in the OS keyring, one entry per key.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, key)?)
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store for tests and hosts without a keyring.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::CredentialStore("store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::CredentialStore("store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::CredentialStore("store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Rebuild the session persisted by a previous run.
///
/// Store failures and an unreadable profile degrade to what could be read;
/// a missing token means logged out.
pub fn restore_session(store: &dyn CredentialStore) -> Session {
    let token = match store.get(TOKEN_KEY) {
        Ok(Some(token)) => token,
        Ok(None) => return Session::default(),
        Err(e) => {
            warn!("Could not read stored token: {}", e);
            return Session::default();
        }
    };

    let username = store.get(USERNAME_KEY).ok().flatten();
    let user = match store.get(PROFILE_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<Profile>(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Ignoring unreadable stored profile: {}", e);
                None
            }
        },
        _ => None,
    };

    Session::new(token, username, user)
}

pub fn persist_session(
    store: &dyn CredentialStore,
    token: &str,
    username: Option<&str>,
    user: Option<&Profile>,
) -> Result<()> {
    store.set(TOKEN_KEY, token)?;
    match username {
        Some(name) => store.set(USERNAME_KEY, name)?,
        None => store.remove(USERNAME_KEY)?,
    }
    match user {
        Some(profile) => store.set(PROFILE_KEY, &serde_json::to_string(profile)?)?,
        None => store.remove(PROFILE_KEY)?,
    }
    Ok(())
}

/// Remove every stored credential, attempting all keys even if one fails.
pub fn clear_session(store: &dyn CredentialStore) -> Result<()> {
    let mut first_error = None;
    for key in [TOKEN_KEY, USERNAME_KEY, PROFILE_KEY] {
        if let Err(e) = store.remove(key) {
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
