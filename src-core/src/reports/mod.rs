pub mod aggregation;
pub mod pagination;
pub mod reports_model;

pub use aggregation::{
    compute_report_metrics, derive_category_shares, month_window, summarize, UNCATEGORIZED,
};
pub use pagination::paginate;
pub use reports_model::{
    parse_timestamp, CategoryShare, CategoryTotal, PaginationView, ReportMetrics, SummaryTotals,
    Transaction, TransactionId, TransactionKind, TypeFilter,
};
