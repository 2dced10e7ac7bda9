use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError, DisplayFromStr, PickFirst};

use crate::format::chart_label;
use crate::reports::aggregation::finite_or_zero;
use crate::reports::reports_model::parse_timestamp;

/// Daily point as sent by `/api/chart/daily`, before sanitizing
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChartPoint {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub date: Option<String>,
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub income: f64,
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub expense: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub income: f64,
    pub expense: f64,
}

/// Sanitize and order a fetched series.
///
/// Points without a readable date are dropped, non-finite values become zero
/// and the result is sorted ascending by date (stable for duplicate dates).
pub fn normalize_series(raw: Vec<RawChartPoint>) -> Vec<ChartPoint> {
    let mut series: Vec<ChartPoint> = raw
        .into_iter()
        .filter_map(|p| {
            let date = parse_timestamp(p.date.as_deref()?)?.date();
            Some(ChartPoint {
                date,
                income: finite_or_zero(p.income),
                expense: finite_or_zero(p.expense),
            })
        })
        .collect();
    series.sort_by_key(|p| p.date);
    series
}

/// The three observable fields a chart adapter draws from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartFrame {
    pub labels: Vec<String>,
    pub income: Vec<f64>,
    pub expense: Vec<f64>,
}

impl From<&[ChartPoint]> for ChartFrame {
    fn from(series: &[ChartPoint]) -> Self {
        ChartFrame {
            labels: series.iter().map(|p| chart_label(p.date)).collect(),
            income: series.iter().map(|p| p.income).collect(),
            expense: series.iter().map(|p| p.expense).collect(),
        }
    }
}
