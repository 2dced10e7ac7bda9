//! Pure aggregation over the currently loaded transaction window.
//!
//! Every function here is total: empty input yields a zeroed value and
//! non-finite numbers are read as zero.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use crate::reports::reports_model::{
    CategoryShare, CategoryTotal, ReportMetrics, SummaryTotals, Transaction, TransactionKind,
};

pub const UNCATEGORIZED: &str = "Uncategorized";

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Attach each category's share of the grand total and rank them by total.
///
/// Ties keep the order in which the service sent them.
pub fn derive_category_shares(categories: Vec<CategoryTotal>) -> Vec<CategoryTotal> {
    let sum: f64 = categories
        .iter()
        .map(|c| finite_or_zero(c.total).max(0.0))
        .sum();
    let total_all = if sum > 0.0 { sum } else { 1.0 };

    let mut ranked: Vec<CategoryTotal> = categories
        .into_iter()
        .map(|c| {
            let total = finite_or_zero(c.total);
            CategoryTotal {
                share: total.max(0.0) / total_all * 100.0,
                total,
                name: c.name,
            }
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
    ranked
}

/// Month-to-date expense report for the given window.
///
/// `daily_average` divides by today's day of month, so it is a running
/// average rather than a whole-month one.
pub fn compute_report_metrics(transactions: &[Transaction], today: NaiveDate) -> ReportMetrics {
    let expenses: Vec<&Transaction> = transactions.iter().filter(|t| t.is_expense()).collect();
    if expenses.is_empty() {
        return ReportMetrics::default();
    }

    let total_month: f64 = expenses.iter().map(|t| finite_or_zero(t.amount)).sum();

    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for tx in &expenses {
        if let Some(day) = tx.day() {
            *by_day.entry(day).or_insert(0.0) += finite_or_zero(tx.amount);
        }
    }

    // Earliest day wins ties
    let mut highest: Option<(NaiveDate, f64)> = None;
    for (day, amount) in by_day {
        match highest {
            Some((_, best)) if amount <= best => {}
            _ => highest = Some((day, amount)),
        }
    }

    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut per_category: Vec<(String, f64)> = Vec::new();
    for tx in &expenses {
        let name = if tx.category.trim().is_empty() {
            UNCATEGORIZED
        } else {
            tx.category.as_str()
        };
        match order.get(name) {
            Some(&idx) => per_category[idx].1 += finite_or_zero(tx.amount),
            None => {
                order.insert(name, per_category.len());
                per_category.push((name.to_string(), finite_or_zero(tx.amount)));
            }
        }
    }
    per_category.sort_by(|a, b| b.1.total_cmp(&a.1));

    let category_ranking = per_category
        .into_iter()
        .map(|(name, amount)| CategoryShare {
            percentage: if total_month > 0.0 {
                round_one_decimal(amount / total_month * 100.0)
            } else {
                0.0
            },
            name,
            amount,
        })
        .collect();

    ReportMetrics {
        total_month,
        highest_day_date: highest.map(|(day, _)| day),
        highest_day_amount: highest.map(|(_, amount)| amount).unwrap_or(0.0),
        daily_average: total_month / f64::from(today.day()),
        category_ranking,
    }
}

/// Totals derived locally from a transaction window.
pub fn summarize(transactions: &[Transaction]) -> SummaryTotals {
    let mut summary = SummaryTotals::default();
    for tx in transactions {
        let amount = finite_or_zero(tx.amount);
        match tx.kind {
            TransactionKind::Income => summary.total_income += amount,
            TransactionKind::Expense => summary.total_expense += amount,
            TransactionKind::Unknown => {}
        }
    }
    summary.balance = summary.total_income - summary.total_expense;
    summary
}

/// First day of `today`'s month through `today`, inclusive.
pub fn month_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    (first, today)
}
