pub mod change_gate;
pub mod chart_model;
pub mod render_sink;

pub use change_gate::{fingerprint, ChangeGate};
pub use chart_model::{normalize_series, ChartFrame, ChartPoint, RawChartPoint};
pub use render_sink::RenderSink;
