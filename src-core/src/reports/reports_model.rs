use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, DefaultOnError, DisplayFromStr, PickFirst};
use std::fmt;

/// Direction of a transaction as reported by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[serde(alias = "Income", alias = "INCOME")]
    Income,
    #[serde(alias = "Expense", alias = "EXPENSE")]
    Expense,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Unknown => "unknown",
        }
    }
}

/// Transaction list filter. `All` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeFilter {
    pub fn matches(&self, kind: TransactionKind) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Income => kind == TransactionKind::Income,
            TypeFilter::Expense => kind == TransactionKind::Expense,
        }
    }

    /// Value of the `type` query parameter, `None` for `All`.
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            TypeFilter::All => None,
            TypeFilter::Income => Some("income"),
            TypeFilter::Expense => Some("expense"),
        }
    }
}

/// Server-assigned identifier; numeric or textual depending on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionId {
    Number(i64),
    Text(String),
}

impl Default for TransactionId {
    fn default() -> Self {
        TransactionId::Text(String::new())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionId::Number(n) => write!(f, "{}", n),
            TransactionId::Text(s) => f.write_str(s),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub id: TransactionId,
    #[serde(rename = "type", default)]
    pub kind: TransactionKind,
    /// Non-numeric amounts count as zero
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub amount: f64,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(
        rename = "date",
        alias = "occurred_at",
        alias = "created_at",
        default,
        deserialize_with = "deserialize_timestamp"
    )]
    pub occurred_at: Option<NaiveDateTime>,
}

impl Transaction {
    /// Calendar day the transaction belongs to, in the timestamp's own offset.
    pub fn day(&self) -> Option<NaiveDate> {
        self.occurred_at.map(|ts| ts.date())
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryTotals {
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub total_income: f64,
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub total_expense: f64,
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub balance: f64,
}

/// Category total as sent by `/api/categories`, with the locally derived share
#[serde_as]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryTotal {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, alias = "category")]
    pub name: String,
    #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub total: f64,
    /// Percentage of the grand total, 0..=100
    #[serde(default, skip_deserializing)]
    pub share: f64,
}

/// One row of the monthly category ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub name: String,
    pub amount: f64,
    /// Percentage of the month total, rounded to one decimal
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReportMetrics {
    pub total_month: f64,
    /// `None` when there is no expense in the window
    pub highest_day_date: Option<NaiveDate>,
    pub highest_day_amount: f64,
    /// Month-to-date average: total divided by today's day of month
    pub daily_average: f64,
    pub category_ranking: Vec<CategoryShare>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaginationView {
    pub page_items: Vec<Transaction>,
    pub total_pages: usize,
}

/// Parse the timestamp shapes the remote service is known to emit.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}
