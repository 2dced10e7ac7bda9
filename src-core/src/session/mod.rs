pub mod credential_store;
pub mod session_controller;
pub mod session_model;
pub mod session_traits;
mod timers;

pub use credential_store::{
    clear_session, persist_session, restore_session, KeyringCredentialStore,
    MemoryCredentialStore, PROFILE_KEY, TOKEN_KEY, USERNAME_KEY,
};
pub use session_controller::SessionController;
pub use session_model::{
    AccessGate, AccountStatus, Credentials, Profile, Session, SessionStatus,
};
pub use session_traits::CredentialStore;
