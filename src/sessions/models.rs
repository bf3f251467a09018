use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of a service session
///
/// `Closing` is held only while `close()` aggregates; no order can be
/// tagged to a session once it leaves `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closing,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Closing => "closing",
            SessionStatus::Closed => "closed",
        }
    }

    /// Open or Closing: blocks a new session from opening
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionStatus::Closed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a service session in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ServiceSession {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub total_revenue: Decimal,
    pub order_count: i64,
    pub average_ticket: Decimal,
    pub top_item: Option<String>,
}

impl ServiceSession {
    pub fn open_at(start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time,
            end_time: None,
            status: SessionStatus::Open,
            total_revenue: Decimal::ZERO,
            order_count: 0,
            average_ticket: Decimal::ZERO,
            top_item: None,
        }
    }
}

/// Result of a successful `open()`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenedSession {
    pub session: ServiceSession,
    /// Same-day orphan orders attached on open
    pub reconciled_orders: u64,
}

/// Revenue and order count of the orders tagged to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRow)]
pub struct SessionTotals {
    pub revenue: Decimal,
    pub order_count: i64,
}

/// Summed quantity of one product across a session's orders
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ItemQuantity {
    pub product_id: i32,
    pub name: String,
    pub quantity: i64,
}

/// Statistics written when a session closes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_revenue: Decimal,
    pub order_count: i64,
    pub average_ticket: Decimal,
    pub top_item: Option<String>,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            total_revenue: Decimal::ZERO,
            order_count: 0,
            average_ticket: Decimal::ZERO,
            top_item: None,
        }
    }
}

/// Response DTO for `close()`
#[derive(Debug, Clone, Serialize)]
pub struct ClosedSession {
    pub session: ServiceSession,
    pub stats: SessionStats,
}

#[derive(Debug, Deserialize)]
pub struct SessionHistoryQuery {
    pub limit: Option<i64>,
}
