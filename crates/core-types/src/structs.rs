use crate::enums::Period;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Using `#[serde(rename_all = "camelCase")]` to map the API's camelCase JSON onto snake_case fields.
// Nothing here carries `#[serde(default)]` on a required figure: a missing metric is a
// contract violation and must fail deserialization rather than read as zero.

/// A single order as shown in the "recent orders" table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: String,
    pub date: NaiveDate,
    pub product: String,
    /// Gross amount charged to the customer.
    pub amount: Decimal,
    /// Status as reported by the backend (e.g. "Completed", "Pending", "Refunded").
    pub status: String,
}

/// Aggregate metrics for one vendor over one period, from `GET /dashboard`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub vendor_id: String,
    pub vendor_name: String,
    /// Gross sales before commission.
    pub total_sales: Decimal,
    /// Net revenue after commission, as computed by the backend.
    #[serde(rename = "monthlyRevenue")]
    pub net_revenue: Decimal,
    pub total_commission_paid: Decimal,
    pub completed_orders: u64,
    pub pending_orders: u64,
    pub refunded_orders: u64,
    /// Refund rate in percent.
    pub refund_rate: Decimal,
    pub average_order_value: Decimal,
    pub recent_orders: Vec<RecentOrder>,

    // Not every backend revision reports these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_transactions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_refunds: Option<Decimal>,
    /// The period the backend computed these figures for, when it echoes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

/// One point of the sales trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// One point of the commission trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionPoint {
    pub date: NaiveDate,
    pub commission: Decimal,
}

/// A ranked product entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub name: String,
    pub revenue: Decimal,
    /// Number of orders containing the product.
    pub orders: u64,
    /// Number of units sold.
    pub quantity: u64,
}

/// Time-series and ranking data for one period, from `GET /analytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub sales_trend: Vec<SalesPoint>,
    pub commission_trend: Vec<CommissionPoint>,
    pub top_products: Vec<TopProduct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

/// The atomic result of one successful fetch cycle.
///
/// Both snapshots were requested for `period` by the cycle numbered `generation`;
/// a pair is never assembled from two different cycles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotPair {
    pub generation: u64,
    pub period: Period,
    pub fetched_at: DateTime<Utc>,
    pub dashboard: DashboardSnapshot,
    pub analytics: AnalyticsSnapshot,
}
