//! LedgerPulse core: session lifecycle, background sync and local reporting
//! for the finance dashboard.

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod format;
pub mod gateway;
pub mod reports;
pub mod session;

pub use config::ClientConfig;
pub use dashboard::{DashboardState, View};
pub use errors::{Error, Result};
pub use session::SessionController;
