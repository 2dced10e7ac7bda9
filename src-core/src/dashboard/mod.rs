pub mod dashboard_state;

pub use dashboard_state::{DashboardState, View};
