use chrono::{DateTime, Utc};
use core_types::{AnalyticsSnapshot, Period, RecentOrder, SnapshotPair};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ExportError;

/// The JSON report document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDocument<'a> {
    generated_at: DateTime<Utc>,
    period: Period,
    summary: Summary<'a>,
    recent_orders: &'a [RecentOrder],
    analytics: &'a AnalyticsSnapshot,
}

/// Aggregate figures copied verbatim from the dashboard snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    vendor_id: &'a str,
    vendor_name: &'a str,
    total_sales: Decimal,
    net_revenue: Decimal,
    commission_paid: Decimal,
    completed_orders: u64,
    pending_orders: u64,
    refunded_orders: u64,
    refund_rate: Decimal,
    average_order_value: Decimal,
}

pub fn render(pair: &SnapshotPair, generated_at: DateTime<Utc>) -> Result<Vec<u8>, ExportError> {
    let dashboard = &pair.dashboard;
    let document = ReportDocument {
        generated_at,
        period: pair.period,
        summary: Summary {
            vendor_id: &dashboard.vendor_id,
            vendor_name: &dashboard.vendor_name,
            total_sales: dashboard.total_sales,
            net_revenue: dashboard.net_revenue,
            commission_paid: dashboard.total_commission_paid,
            completed_orders: dashboard.completed_orders,
            pending_orders: dashboard.pending_orders,
            refunded_orders: dashboard.refunded_orders,
            refund_rate: dashboard.refund_rate,
            average_order_value: dashboard.average_order_value,
        },
        recent_orders: &dashboard.recent_orders,
        analytics: &pair.analytics,
    };

    Ok(serde_json::to_vec_pretty(&document)?)
}
