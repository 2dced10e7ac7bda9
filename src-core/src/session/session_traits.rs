use crate::errors::Result;

/// Durable key-value storage for the session token and profile.
///
/// Implementations must survive a process restart. `remove` on a missing
/// key is not an error.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}
