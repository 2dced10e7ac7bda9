use chrono::{DateTime, NaiveDate, Utc};

use crate::chart::chart_model::ChartPoint;
use crate::reports::pagination::paginate;
use crate::reports::reports_model::{
    CategoryTotal, PaginationView, ReportMetrics, SummaryTotals, Transaction, TypeFilter,
};
use crate::session::session_model::{AccessGate, Profile, SessionStatus};

/// Dashboard screen whose data the poll tick keeps fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Summary cards and the daily chart
    #[default]
    Overview,
    /// Overview plus category breakdown and the filtered transaction list
    Transactions,
    /// Overview plus month-to-date transactions and report metrics
    Reports,
}

/// Everything a UI renders, published as one value per change
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    pub status: SessionStatus,
    pub username: Option<String>,
    pub profile: Option<Profile>,
    pub access: AccessGate,
    pub view: View,
    pub summary: SummaryTotals,
    /// Ranked by total, shares attached
    pub categories: Vec<CategoryTotal>,
    pub transactions: Vec<Transaction>,
    pub type_filter: TypeFilter,
    /// 1-based page of the transaction list
    pub page: usize,
    pub report: ReportMetrics,
    /// Last series handed to the render sink
    pub chart: Vec<ChartPoint>,
    pub selected_chart_date: Option<NaiveDate>,
    pub login_error: Option<String>,
    /// Server message from the last refresh that got an error payload
    pub fetch_error: Option<String>,
    pub trial_countdown: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// Fresh logged-out state that remembers which screen was open.
    pub fn logged_out(view: View) -> Self {
        Self {
            view,
            page: 1,
            ..Self::default()
        }
    }

    pub fn page_view(&self, page_size: usize) -> PaginationView {
        paginate(&self.transactions, self.type_filter, self.page, page_size)
    }
}
