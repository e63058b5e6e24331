use chrono::{DateTime, SecondsFormat, Utc};
use core_types::SnapshotPair;
use rust_decimal::{Decimal, RoundingStrategy};
use crate::{COMMISSION_RATE, NET_RATE};
use std::borrow::Cow;
use std::fmt::Write;

const ORDER_HEADER: &str =
    "Order ID,Date,Product,Gross Amount,Commission (10%),Net Amount,Status";

/// Renders the CSV report: a title, a synopsis block of aggregate figures, then one
/// row per recent order.
///
/// Per-order commission and net are derived from the gross amount at the platform's
/// flat rate. They are independent of the aggregate figures reported by the backend.
pub fn render(pair: &SnapshotPair, generated_at: DateTime<Utc>) -> String {
    let dashboard = &pair.dashboard;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "Vendor Finance Report - Generated {}",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    out.push('\n');
    let _ = writeln!(out, "Period,{}", pair.period);
    let _ = writeln!(out, "Total Sales,{}", money(dashboard.total_sales));
    let _ = writeln!(out, "Net Revenue,{}", money(dashboard.net_revenue));
    let _ = writeln!(out, "Commission Paid,{}", money(dashboard.total_commission_paid));
    let _ = writeln!(out, "Completed Orders,{}", dashboard.completed_orders);
    let _ = writeln!(out, "Pending Orders,{}", dashboard.pending_orders);
    let _ = writeln!(out, "Refunded Orders,{}", dashboard.refunded_orders);
    let _ = writeln!(out, "Refund Rate,{}", money(dashboard.refund_rate));
    let _ = writeln!(out, "Average Order Value,{}", money(dashboard.average_order_value));
    out.push('\n');
    out.push_str("Order Details:\n");
    out.push_str(ORDER_HEADER);
    out.push('\n');

    for order in &dashboard.recent_orders {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            field(&order.id),
            order.date.format("%Y-%m-%d"),
            field(&order.product),
            money(order.amount),
            money(order.amount * COMMISSION_RATE),
            money(order.amount * NET_RATE),
            field(&order.status),
        );
    }

    out
}

/// Rounds half away from zero and always shows two decimals, e.g. `100` -> `100.00`.
pub fn money(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Quotes a field when it contains a delimiter, a quote or a line break.
fn field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
