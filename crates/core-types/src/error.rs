use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid period '{0}': expected one of week, month, quarter, all")]
    InvalidPeriod(String),

    #[error("Invalid order status filter '{0}': expected one of all, completed, pending, refunded")]
    InvalidStatusFilter(String),
}
