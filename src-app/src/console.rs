//! Plain-text rendering of the published dashboard state.

use ledgerpulse_core::format::{format_idr, format_timestamp};
use ledgerpulse_core::reports::summarize;
use ledgerpulse_core::session::AccessGate;
use ledgerpulse_core::{DashboardState, View};

/// Message shown instead of data when the account may not use the dashboard.
pub fn gate_notice(access: AccessGate) -> Option<&'static str> {
    match access {
        AccessGate::Dashboard => None,
        AccessGate::AwaitingApproval => Some("Your account is waiting for approval."),
        AccessGate::Suspended => Some("Your account has been suspended."),
    }
}

pub fn print_state(state: &DashboardState, page_size: usize) {
    if let Some(notice) = gate_notice(state.access) {
        println!("{}", notice);
        return;
    }

    let refreshed = state
        .last_refreshed
        .map(|ts| ts.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!();
    println!(
        "[{}] {}  refreshed {}",
        state.username.as_deref().unwrap_or("user"),
        view_title(state.view),
        refreshed
    );
    if let Some(message) = &state.fetch_error {
        println!("  Server error: {}", message);
    }
    if let Some(countdown) = &state.trial_countdown {
        println!("  Trial ends in {}", countdown);
    }
    println!("  Income   {}", format_idr(state.summary.total_income));
    println!("  Expense  {}", format_idr(state.summary.total_expense));
    println!("  Balance  {}", format_idr(state.summary.balance));

    match state.view {
        View::Overview => {}
        View::Transactions => print_transactions(state, page_size),
        View::Reports => print_report(state),
    }
}

fn view_title(view: View) -> &'static str {
    match view {
        View::Overview => "Overview",
        View::Transactions => "Transactions",
        View::Reports => "Reports",
    }
}

fn print_transactions(state: &DashboardState, page_size: usize) {
    println!("  Categories");
    for category in &state.categories {
        println!(
            "    {:<16} {:>18} {:>5.1}%",
            category.name,
            format_idr(category.total),
            category.share
        );
    }

    let page = state.page_view(page_size);
    println!("  Transactions (page {}/{})", state.page, page.total_pages);
    for tx in &page.page_items {
        println!(
            "    {:<18} {:<8} {:<16} {:>18}",
            format_timestamp(tx.occurred_at),
            tx.kind.as_str(),
            tx.category,
            format_idr(tx.amount)
        );
    }
}

fn print_report(state: &DashboardState) {
    let report = &state.report;
    println!("  This month  {}", format_idr(report.total_month));
    match report.highest_day_date {
        Some(day) => println!(
            "  Peak day    {} ({})",
            day.format("%d %b"),
            format_idr(report.highest_day_amount)
        ),
        None => println!("  Peak day    -"),
    }
    println!("  Daily avg   {}", format_idr(report.daily_average));
    let month = summarize(&state.transactions);
    println!("  Month net   {}", format_idr(month.balance));
    for share in &report.category_ranking {
        println!(
            "    {:<16} {:>18} {:>5.1}%",
            share.name,
            format_idr(share.amount),
            share.percentage
        );
    }
}
