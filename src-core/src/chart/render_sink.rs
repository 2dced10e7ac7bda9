use crate::chart::chart_model::ChartPoint;

/// Chart-drawing capability the session controller feeds.
///
/// The series handed over is always sorted ascending by date and holds only
/// finite numbers. Adapters update a live chart in place (without animation)
/// when its surface is still attached; otherwise they dispose the stale
/// instance and build a new one.
pub trait RenderSink: Send {
    fn render_or_update(&mut self, series: &[ChartPoint]);

    /// Release the chart instance. Called on logout.
    fn dispose(&mut self);
}
