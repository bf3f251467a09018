use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::business_rules::{Address, CartLine, OrderMode, PricedOrder};

/// Order status enum representing the lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Delivered or picked up; loyalty points are credited on entry
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_fulfilled() || *self == OrderStatus::Cancelled
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Invalid order status: {}", s))
    }
}

/// Domain model representing an order in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: i32,
    /// Session the order was accounted to; `None` while orphaned
    pub service_id: Option<Uuid>,
    pub mode: OrderMode,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
    pub redeemed_points: i32,
    pub delivery_address: Option<Json<Address>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted order line, snapshot of the catalog at submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
    pub order_id: Uuid,
    pub product_id: i32,
    pub name: String,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub is_free: bool,
    pub is_reward: bool,
}

impl OrderLine {
    pub fn from_cart_line(order_id: Uuid, line: &CartLine) -> Self {
        Self {
            order_id,
            product_id: line.product_id,
            name: line.name.clone(),
            category: line.category.clone(),
            unit_price: line.unit_price,
            quantity: i32::try_from(line.quantity).unwrap_or(i32::MAX),
            is_free: line.is_free,
            is_reward: line.is_reward,
        }
    }

    pub fn to_cart_line(&self) -> CartLine {
        CartLine {
            product_id: self.product_id,
            name: self.name.clone(),
            category: self.category.clone(),
            unit_price: self.unit_price,
            quantity: u32::try_from(self.quantity).unwrap_or(0),
            is_free: self.is_free,
            is_reward: self.is_reward,
        }
    }
}

/// Order with its lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OrderDetails {
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.lines.iter().map(OrderLine::to_cart_line).collect()
    }
}

/// A priced order ready to be inserted
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub customer_id: i32,
    pub priced: PricedOrder,
    pub delivery_address: Option<Address>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for one cart item
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: i32,
    #[validate(range(min = 1, max = 100, message = "Quantity must be between 1 and 100"))]
    pub quantity: u32,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub is_reward: bool,
}

/// Request DTO for quoting or submitting an order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitOrderRequest {
    pub customer_id: i32,
    pub mode: OrderMode,
    #[validate]
    pub items: Vec<OrderItemRequest>,
    #[validate]
    pub address: Option<Address>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Request DTO for updating order status
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}
