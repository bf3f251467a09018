// Persistence adapter
//
// Everything the services need from storage goes through `PizzeriaStore`.
// Operations that must be atomic (single open session, conditional points
// decrement, status compare-and-set with credit, fenced tagging) are atomic
// inside each implementation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::business_rules::{Address, RulesResult, SettingEntry};
use crate::customers::models::Customer;
use crate::models::{CreateProductRequest, Product};
use crate::orders::models::{NewOrder, Order, OrderDetails, OrderStatus};
use crate::sessions::models::{
    ItemQuantity, OpenedSession, ServiceSession, SessionStats, SessionTotals,
};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait PizzeriaStore: Send + Sync {
    // Settings

    async fn load_settings(&self) -> RulesResult<Vec<SettingEntry>>;

    /// Upsert one key; the entry's version is incremented
    async fn save_setting(&self, key: &str, value: &str) -> RulesResult<SettingEntry>;

    // Catalog

    async fn create_product(&self, product: CreateProductRequest) -> RulesResult<Product>;

    async fn list_products(&self) -> RulesResult<Vec<Product>>;

    async fn find_products(&self, ids: &[i32]) -> RulesResult<Vec<Product>>;

    // Customers

    /// `DuplicateCustomer` when the phone or email is taken
    async fn create_customer(&self, phone: &str, email: Option<&str>) -> RulesResult<Customer>;

    async fn find_customer(&self, id: i32) -> RulesResult<Option<Customer>>;

    async fn find_customer_by_phone(&self, phone: &str) -> RulesResult<Option<Customer>>;

    async fn add_customer_address(&self, id: i32, address: Address) -> RulesResult<Customer>;

    async fn get_customer_points(&self, id: i32) -> RulesResult<i32>;

    async fn increment_points(&self, id: i32, amount: i32) -> RulesResult<i32>;

    /// Atomic conditional decrement; `InsufficientLoyaltyBalance` when the
    /// balance is below `amount`
    async fn decrement_points(&self, id: i32, amount: i32) -> RulesResult<i32>;

    // Orders

    /// Insert the order and its lines, consuming `redeemed_points` in the same
    /// transaction
    async fn place_order(&self, order: NewOrder) -> RulesResult<OrderDetails>;

    async fn find_order(&self, id: Uuid) -> RulesResult<Option<OrderDetails>>;

    /// Compare-and-set `from -> to`, crediting `earned_points` to the customer
    /// atomically. `None` when the order is no longer in `from`.
    async fn update_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        earned_points: i32,
    ) -> RulesResult<Option<Order>>;

    /// Attach an order to a session; `false` unless the session is `Open`
    async fn tag_order(&self, order_id: Uuid, session_id: Uuid) -> RulesResult<bool>;

    // Sessions

    async fn find_open_session(&self) -> RulesResult<Option<ServiceSession>>;

    /// Insert an open session and reconcile same-day orphans. `None` when a
    /// session is already active.
    async fn open_session(&self, now: DateTime<Utc>) -> RulesResult<Option<OpenedSession>>;

    /// Flip the open session to `Closing` and return it. A session already
    /// `Closing` (an earlier close that failed after the fence) is returned
    /// as is so the close can be finished. `None` when no session is active.
    async fn begin_close(&self) -> RulesResult<Option<ServiceSession>>;

    async fn sum_orders_for_session(&self, session_id: Uuid) -> RulesResult<SessionTotals>;

    async fn session_item_quantities(&self, session_id: Uuid) -> RulesResult<Vec<ItemQuantity>>;

    async fn finish_close(
        &self,
        session_id: Uuid,
        stats: &SessionStats,
        end_time: DateTime<Utc>,
    ) -> RulesResult<ServiceSession>;

    /// Most recent first
    async fn list_sessions(&self, limit: i64) -> RulesResult<Vec<ServiceSession>>;
}
