//! Display helpers shared by hosts and chart adapters.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Rupiah amount without decimals: `Rp 1.234.567`.
pub fn format_idr(amount: f64) -> String {
    let amount = if amount.is_finite() { amount.round() } else { 0.0 };
    let digits = format!("{}", amount.abs() as u64);

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if amount < 0.0 {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

/// Y-axis tick label: millions as `jt`, thousands as `rb`.
pub fn compact_axis_label(value: f64) -> String {
    if value >= 1_000_000.0 || value <= -1_000_000.0 {
        format!("{}jt", value / 1_000_000.0)
    } else if value >= 1_000.0 || value <= -1_000.0 {
        format!("{}rb", value / 1_000.0)
    } else {
        format!("{}", value)
    }
}

/// X-axis label for a chart day, e.g. `05 Jan`.
pub fn chart_label(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

/// Transaction timestamp for lists, `-` when unknown.
pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    match ts {
        Some(ts) => ts.format("%d %b %Y, %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Remaining trial time as `{days}d HH:MM:SS`, or `00:00:00` once over.
pub fn format_countdown(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = ends_at - now;
    if remaining.num_milliseconds() < 0 {
        return "00:00:00".to_string();
    }

    let total = remaining.num_seconds();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}
