use ledgerpulse_core::chart::{ChartFrame, ChartPoint, RenderSink};
use ledgerpulse_core::format::compact_axis_label;
use log::debug;

const BAR_WIDTH: usize = 30;

/// Draws the daily income/expense series as horizontal bars on stdout.
#[derive(Debug, Default)]
pub struct TerminalChartSink {
    drawn: bool,
}

impl TerminalChartSink {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len.clamp(1, BAR_WIDTH))
}

impl RenderSink for TerminalChartSink {
    fn render_or_update(&mut self, series: &[ChartPoint]) {
        let frame = ChartFrame::from(series);
        let max = frame
            .income
            .iter()
            .chain(frame.expense.iter())
            .copied()
            .fold(0.0_f64, f64::max);

        println!();
        println!("Daily cash flow (max {})", compact_axis_label(max));
        if frame.labels.is_empty() {
            println!("  no data");
        }
        let rows = frame.labels.iter().zip(&frame.income).zip(&frame.expense);
        for ((label, income), expense) in rows {
            println!(
                "  {:>6}  + {:<width$}  {}",
                label,
                bar(*income, max),
                compact_axis_label(*income),
                width = BAR_WIDTH
            );
            println!(
                "  {:>6}  - {:<width$}  {}",
                "",
                bar(*expense, max),
                compact_axis_label(*expense),
                width = BAR_WIDTH
            );
        }
        self.drawn = true;
    }

    fn dispose(&mut self) {
        if self.drawn {
            debug!("Chart cleared");
        }
        self.drawn = false;
    }
}
