//! Terminal presentation of the dashboard state.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use core_types::{AnalyticsSnapshot, RecentOrder, SnapshotPair};
use rust_decimal::Decimal;
use orchestrator::FetchState;
use report::csv::money;

/// Prints whatever the orchestrator currently shows.
pub fn render_state(state: &FetchState) {
    match state {
        FetchState::Idle => println!("Dashboard idle. Select a period to load data."),
        FetchState::Loading { period } => println!("⏳ Loading {} dashboard...", period),
        FetchState::Ready(pair) => render_pair(pair),
        FetchState::Failed { period, reason } => {
            println!("⚠️  Unable to load the {} dashboard", period);
            println!("    {}", reason);
            println!("    Retry to load it again.");
        }
    }
}

pub fn render_pair(pair: &SnapshotPair) {
    let dashboard = &pair.dashboard;
    println!(
        "\nWelcome, {} (vendor {}) | period: {} | fetched {}",
        dashboard.vendor_name,
        dashboard.vendor_id,
        pair.period,
        pair.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    println!("{}", metrics_table(pair));
    println!("\nRecent orders");
    println!("{}", orders_table(&dashboard.recent_orders));
    println!("\nSales & commission trend");
    println!("{}", trend_table(pair));
    println!("\nTop products");
    println!("{}", top_products_table(pair));
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn amount_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

pub fn metrics_table(pair: &SnapshotPair) -> Table {
    let d = &pair.dashboard;
    let mut table = new_table(vec!["Metric", "Value"]);
    let transactions = d
        .total_transactions
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    let refunds = d.total_refunds.map(money).unwrap_or_else(|| "-".to_string());

    let rows = [
        ("Total Sales", format!("${}", money(d.total_sales))),
        ("Net Revenue", format!("${}", money(d.net_revenue))),
        ("Commission Paid", format!("${}", money(d.total_commission_paid))),
        ("Completed Orders", d.completed_orders.to_string()),
        ("Pending Orders", d.pending_orders.to_string()),
        ("Refunded Orders", d.refunded_orders.to_string()),
        ("Refund Rate", format!("{}%", money(d.refund_rate))),
        ("Average Order Value", format!("${}", money(d.average_order_value))),
        ("Total Transactions", transactions),
        ("Total Refunds", refunds),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), amount_cell(value)]);
    }
    table
}

pub fn orders_table(orders: &[RecentOrder]) -> Table {
    let mut table = new_table(vec!["Order ID", "Date", "Product", "Amount", "Status"]);
    if orders.is_empty() {
        table.add_row(vec!["No orders yet", "", "", "", ""]);
    }
    for order in orders {
        table.add_row(vec![
            Cell::new(&order.id),
            Cell::new(order.date),
            Cell::new(&order.product),
            amount_cell(format!("${}", money(order.amount))),
            Cell::new(&order.status),
        ]);
    }
    table
}

fn trend_table(pair: &SnapshotPair) -> Table {
    let analytics = &pair.analytics;
    let mut table = new_table(vec!["Date", "Sales", "Commission"]);

    // The two series share dates in practice, but are not required to.
    let mut dates: Vec<_> = analytics
        .sales_trend
        .iter()
        .map(|p| p.date)
        .chain(analytics.commission_trend.iter().map(|p| p.date))
        .collect();
    dates.sort();
    dates.dedup();

    for date in &dates {
        let date = *date;
        let sales = analytics
            .sales_trend
            .iter()
            .find(|p| p.date == date)
            .map(|p| format!("${}", money(p.amount)))
            .unwrap_or_default();
        let commission = analytics
            .commission_trend
            .iter()
            .find(|p| p.date == date)
            .map(|p| format!("${}", money(p.commission)))
            .unwrap_or_default();
        table.add_row(vec![Cell::new(date), amount_cell(sales), amount_cell(commission)]);
    }

    if !dates.is_empty() {
        let (total_sales, total_commission) = trend_totals(analytics);
        table.add_row(vec![
            Cell::new("Total"),
            amount_cell(format!("${}", money(total_sales))),
            amount_cell(format!("${}", money(total_commission))),
        ]);
    }
    table
}

fn trend_totals(analytics: &AnalyticsSnapshot) -> (Decimal, Decimal) {
    let sales = analytics.sales_trend.iter().map(|p| p.amount).sum();
    let commission = analytics.commission_trend.iter().map(|p| p.commission).sum();
    (sales, commission)
}

fn top_products_table(pair: &SnapshotPair) -> Table {
    let mut table = new_table(vec!["#", "Product", "Revenue", "Orders", "Units"]);
    for (rank, product) in pair.analytics.top_products.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&product.name),
            amount_cell(format!("${}", money(product.revenue))),
            amount_cell(product.orders.to_string()),
            amount_cell(product.quantity.to_string()),
        ]);
    }
    table
}
