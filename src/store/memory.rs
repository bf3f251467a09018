// In-memory persistence
//
// All state sits behind one async mutex, so every trait operation is atomic
// with respect to the others. Used by the test suite and by the server when no
// database is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::PizzeriaStore;
use crate::business_rules::{Address, LoyaltyLedger, RulesError, RulesResult, SettingEntry};
use crate::customers::models::Customer;
use crate::models::{CreateProductRequest, Product};
use crate::orders::models::{NewOrder, Order, OrderDetails, OrderLine, OrderStatus};
use crate::sessions::models::{
    ItemQuantity, OpenedSession, ServiceSession, SessionStats, SessionStatus, SessionTotals,
};

#[derive(Debug, Default)]
struct State {
    settings: BTreeMap<String, SettingEntry>,
    products: BTreeMap<i32, Product>,
    customers: BTreeMap<i32, Customer>,
    orders: BTreeMap<Uuid, OrderDetails>,
    sessions: Vec<ServiceSession>,
    next_product_id: i32,
    next_customer_id: i32,
}

impl State {
    fn customer_mut(&mut self, id: i32) -> RulesResult<&mut Customer> {
        self.customers
            .get_mut(&id)
            .ok_or(RulesError::CustomerNotFound(id))
    }

    fn session_orders(&self, session_id: Uuid) -> impl Iterator<Item = &OrderDetails> {
        self.orders
            .values()
            .filter(move |details| details.order.service_id == Some(session_id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PizzeriaStore for InMemoryStore {
    async fn load_settings(&self) -> RulesResult<Vec<SettingEntry>> {
        let state = self.state.lock().await;
        Ok(state.settings.values().cloned().collect())
    }

    async fn save_setting(&self, key: &str, value: &str) -> RulesResult<SettingEntry> {
        let mut state = self.state.lock().await;
        let version = state
            .settings
            .values()
            .map(|entry| entry.version)
            .max()
            .unwrap_or(0)
            + 1;
        let entry = SettingEntry {
            key: key.to_string(),
            value: value.to_string(),
            version,
        };
        state.settings.insert(key.to_string(), entry.clone());
        Ok(entry)
    }

    async fn create_product(&self, product: CreateProductRequest) -> RulesResult<Product> {
        let mut state = self.state.lock().await;
        state.next_product_id += 1;
        let product = Product {
            id: state.next_product_id,
            name: product.name,
            category: product.category,
            price: product.price,
            available: product.available,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn list_products(&self) -> RulesResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state.products.values().cloned().collect())
    }

    async fn find_products(&self, ids: &[i32]) -> RulesResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .values()
            .filter(|product| ids.contains(&product.id))
            .cloned()
            .collect())
    }

    async fn create_customer(&self, phone: &str, email: Option<&str>) -> RulesResult<Customer> {
        let mut state = self.state.lock().await;
        let clash = state.customers.values().any(|customer| {
            customer.phone == phone
                || matches!((email, customer.email.as_deref()), (Some(a), Some(b)) if a == b)
        });
        if clash {
            return Err(RulesError::DuplicateCustomer(phone.to_string()));
        }

        state.next_customer_id += 1;
        let customer = Customer {
            id: state.next_customer_id,
            phone: phone.to_string(),
            email: email.map(str::to_string),
            loyalty_points: 0,
            addresses: Json(Vec::new()),
            created_at: Utc::now(),
        };
        state.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn find_customer(&self, id: i32) -> RulesResult<Option<Customer>> {
        let state = self.state.lock().await;
        Ok(state.customers.get(&id).cloned())
    }

    async fn find_customer_by_phone(&self, phone: &str) -> RulesResult<Option<Customer>> {
        let state = self.state.lock().await;
        Ok(state
            .customers
            .values()
            .find(|customer| customer.phone == phone)
            .cloned())
    }

    async fn add_customer_address(&self, id: i32, address: Address) -> RulesResult<Customer> {
        let mut state = self.state.lock().await;
        let customer = state.customer_mut(id)?;
        if !customer.addresses.0.contains(&address) {
            customer.addresses.0.push(address);
        }
        Ok(customer.clone())
    }

    async fn get_customer_points(&self, id: i32) -> RulesResult<i32> {
        let mut state = self.state.lock().await;
        Ok(state.customer_mut(id)?.loyalty_points)
    }

    async fn increment_points(&self, id: i32, amount: i32) -> RulesResult<i32> {
        let mut state = self.state.lock().await;
        let customer = state.customer_mut(id)?;
        customer.loyalty_points = LoyaltyLedger::apply_earn(customer.loyalty_points, amount);
        Ok(customer.loyalty_points)
    }

    async fn decrement_points(&self, id: i32, amount: i32) -> RulesResult<i32> {
        let mut state = self.state.lock().await;
        let customer = state.customer_mut(id)?;
        if customer.loyalty_points < amount {
            return Err(RulesError::InsufficientLoyaltyBalance {
                customer_id: id,
                required: amount,
            });
        }
        customer.loyalty_points -= amount;
        Ok(customer.loyalty_points)
    }

    async fn place_order(&self, order: NewOrder) -> RulesResult<OrderDetails> {
        let mut state = self.state.lock().await;
        let redeemed = order.priced.redeemed_points;

        let customer = state.customer_mut(order.customer_id)?;
        if redeemed > 0 {
            if customer.loyalty_points < redeemed {
                return Err(RulesError::InsufficientLoyaltyBalance {
                    customer_id: order.customer_id,
                    required: redeemed,
                });
            }
            customer.loyalty_points -= redeemed;
        }

        let lines = order
            .priced
            .lines
            .iter()
            .map(|line| OrderLine::from_cart_line(order.id, line))
            .collect();
        let details = OrderDetails {
            order: Order {
                id: order.id,
                customer_id: order.customer_id,
                service_id: None,
                mode: order.priced.mode,
                status: OrderStatus::Pending,
                subtotal: order.priced.subtotal,
                delivery_fee: order.priced.delivery_fee,
                total_amount: order.priced.total_amount,
                redeemed_points: redeemed,
                delivery_address: order.delivery_address.map(Json),
                scheduled_at: order.scheduled_at,
                created_at: order.created_at,
                updated_at: order.created_at,
            },
            lines,
        };
        state.orders.insert(order.id, details.clone());
        Ok(details)
    }

    async fn find_order(&self, id: Uuid) -> RulesResult<Option<OrderDetails>> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&id).cloned())
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        earned_points: i32,
    ) -> RulesResult<Option<Order>> {
        let mut state = self.state.lock().await;
        let order = match state.orders.get_mut(&id) {
            Some(details) if details.order.status == from => {
                details.order.status = to;
                details.order.updated_at = Utc::now();
                details.order.clone()
            }
            Some(_) => return Ok(None),
            None => return Err(RulesError::OrderNotFound(id)),
        };

        if earned_points > 0 {
            let customer = state.customer_mut(order.customer_id)?;
            customer.loyalty_points = LoyaltyLedger::apply_earn(customer.loyalty_points, earned_points);
        }
        Ok(Some(order))
    }

    async fn tag_order(&self, order_id: Uuid, session_id: Uuid) -> RulesResult<bool> {
        let mut state = self.state.lock().await;
        let is_open = state
            .sessions
            .iter()
            .any(|session| session.id == session_id && session.status == SessionStatus::Open);
        if !is_open {
            return Ok(false);
        }
        match state.orders.get_mut(&order_id) {
            Some(details) => {
                details.order.service_id = Some(session_id);
                Ok(true)
            }
            None => Err(RulesError::OrderNotFound(order_id)),
        }
    }

    async fn find_open_session(&self) -> RulesResult<Option<ServiceSession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .iter()
            .find(|session| session.status == SessionStatus::Open)
            .cloned())
    }

    async fn open_session(&self, now: DateTime<Utc>) -> RulesResult<Option<OpenedSession>> {
        let mut state = self.state.lock().await;
        if state.sessions.iter().any(|session| session.status.is_active()) {
            return Ok(None);
        }

        let session = ServiceSession::open_at(now);
        let today = now.date_naive();
        let mut reconciled_orders = 0;
        for details in state.orders.values_mut() {
            if details.order.service_id.is_none() && details.order.created_at.date_naive() == today {
                details.order.service_id = Some(session.id);
                reconciled_orders += 1;
            }
        }
        state.sessions.push(session.clone());

        Ok(Some(OpenedSession {
            session,
            reconciled_orders,
        }))
    }

    async fn begin_close(&self) -> RulesResult<Option<ServiceSession>> {
        let mut state = self.state.lock().await;
        Ok(state
            .sessions
            .iter_mut()
            .find(|session| session.status.is_active())
            .map(|session| {
                session.status = SessionStatus::Closing;
                session.clone()
            }))
    }

    async fn sum_orders_for_session(&self, session_id: Uuid) -> RulesResult<SessionTotals> {
        let state = self.state.lock().await;
        Ok(state
            .session_orders(session_id)
            .fold(SessionTotals::default(), |totals, details| SessionTotals {
                revenue: totals.revenue + details.order.total_amount,
                order_count: totals.order_count + 1,
            }))
    }

    async fn session_item_quantities(&self, session_id: Uuid) -> RulesResult<Vec<ItemQuantity>> {
        let state = self.state.lock().await;
        let mut quantities: BTreeMap<i32, ItemQuantity> = BTreeMap::new();
        for line in state.session_orders(session_id).flat_map(|details| &details.lines) {
            quantities
                .entry(line.product_id)
                .or_insert_with(|| ItemQuantity {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    quantity: 0,
                })
                .quantity += i64::from(line.quantity);
        }
        Ok(quantities.into_values().collect())
    }

    async fn finish_close(
        &self,
        session_id: Uuid,
        stats: &SessionStats,
        end_time: DateTime<Utc>,
    ) -> RulesResult<ServiceSession> {
        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .iter_mut()
            .find(|session| session.id == session_id && session.status == SessionStatus::Closing)
            .ok_or(RulesError::NoSessionOpen)?;

        session.status = SessionStatus::Closed;
        session.end_time = Some(end_time);
        session.total_revenue = stats.total_revenue;
        session.order_count = stats.order_count;
        session.average_ticket = stats.average_ticket;
        session.top_item = stats.top_item.clone();
        Ok(session.clone())
    }

    async fn list_sessions(&self, limit: i64) -> RulesResult<Vec<ServiceSession>> {
        let state = self.state.lock().await;
        let mut sessions = state.sessions.clone();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(sessions)
    }
}
