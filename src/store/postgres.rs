// PostgreSQL persistence
//
// Runtime-checked sqlx queries. Atomicity relies on the schema in
// `migrations/`: the partial unique index on active sessions, the
// non-negative points check and row locks taken inside transactions.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::PizzeriaStore;
use crate::business_rules::{Address, RulesError, RulesResult, SettingEntry};
use crate::customers::models::Customer;
use crate::models::{CreateProductRequest, Product};
use crate::orders::models::{NewOrder, Order, OrderDetails, OrderLine, OrderStatus};
use crate::sessions::models::{
    ItemQuantity, OpenedSession, ServiceSession, SessionStats, SessionStatus, SessionTotals,
};

const CUSTOMER_COLUMNS: &str = "id, phone, email, loyalty_points, addresses, created_at";

const ORDER_COLUMNS: &str = "id, customer_id, service_id, mode, status, subtotal, delivery_fee, \
     total_amount, redeemed_points, delivery_address, scheduled_at, created_at, updated_at";

const SESSION_COLUMNS: &str =
    "id, start_time, end_time, status, total_revenue, order_count, average_ticket, top_item";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn order_lines(&self, order_id: Uuid) -> RulesResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT order_id, product_id, name, category, unit_price, quantity, is_free, is_reward
            FROM order_lines
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl PizzeriaStore for PgStore {
    async fn load_settings(&self) -> RulesResult<Vec<SettingEntry>> {
        let entries = sqlx::query_as::<_, SettingEntry>(
            "SELECT key, value, version FROM settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn save_setting(&self, key: &str, value: &str) -> RulesResult<SettingEntry> {
        let entry = sqlx::query_as::<_, SettingEntry>(
            r#"
            INSERT INTO settings (key, value, version)
            VALUES ($1, $2, nextval('settings_version_seq'))
            ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, version = EXCLUDED.version, updated_at = NOW()
            RETURNING key, value, version
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn create_product(&self, product: CreateProductRequest) -> RulesResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, category, price, available)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, category, price, available
            "#,
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.available)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn list_products(&self) -> RulesResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, category, price, available FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn find_products(&self, ids: &[i32]) -> RulesResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, category, price, available FROM products WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn create_customer(&self, phone: &str, email: Option<&str>) -> RulesResult<Customer> {
        let result = sqlx::query_as::<_, Customer>(&format!(
            "INSERT INTO customers (phone, email) VALUES ($1, $2) RETURNING {}",
            CUSTOMER_COLUMNS
        ))
        .bind(phone)
        .bind(email)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(customer) => Ok(customer),
            Err(err) if is_unique_violation(&err) => {
                Err(RulesError::DuplicateCustomer(phone.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_customer(&self, id: i32) -> RulesResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn find_customer_by_phone(&self, phone: &str) -> RulesResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE phone = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn add_customer_address(&self, id: i32, address: Address) -> RulesResult<Customer> {
        // Append only when the exact address is not stored yet
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET addresses = CASE WHEN addresses @> $2 THEN addresses ELSE addresses || $2 END
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .bind(Json(vec![address]))
        .fetch_optional(&self.pool)
        .await?;

        customer.ok_or(RulesError::CustomerNotFound(id))
    }

    async fn get_customer_points(&self, id: i32) -> RulesResult<i32> {
        let points: Option<i32> =
            sqlx::query_scalar("SELECT loyalty_points FROM customers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        points.ok_or(RulesError::CustomerNotFound(id))
    }

    async fn increment_points(&self, id: i32, amount: i32) -> RulesResult<i32> {
        let points: Option<i32> = sqlx::query_scalar(
            "UPDATE customers SET loyalty_points = loyalty_points + $2 WHERE id = $1 RETURNING loyalty_points",
        )
        .bind(id)
        .bind(amount.max(0))
        .fetch_optional(&self.pool)
        .await?;

        points.ok_or(RulesError::CustomerNotFound(id))
    }

    async fn decrement_points(&self, id: i32, amount: i32) -> RulesResult<i32> {
        let points: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE customers SET loyalty_points = loyalty_points - $2
            WHERE id = $1 AND loyalty_points >= $2
            RETURNING loyalty_points
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        match points {
            Some(points) => Ok(points),
            None => {
                // Distinguish a missing customer from a short balance
                self.get_customer_points(id).await?;
                Err(RulesError::InsufficientLoyaltyBalance {
                    customer_id: id,
                    required: amount,
                })
            }
        }
    }

    async fn place_order(&self, order: NewOrder) -> RulesResult<OrderDetails> {
        let mut tx = self.pool.begin().await?;
        let priced = &order.priced;

        if priced.redeemed_points > 0 {
            let result = sqlx::query(
                r#"
                UPDATE customers SET loyalty_points = loyalty_points - $2
                WHERE id = $1 AND loyalty_points >= $2
                "#,
            )
            .bind(order.customer_id)
            .bind(priced.redeemed_points)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(RulesError::InsufficientLoyaltyBalance {
                    customer_id: order.customer_id,
                    required: priced.redeemed_points,
                });
            }
        }

        let inserted = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (id, customer_id, mode, status, subtotal, delivery_fee, total_amount,
                                redeemed_points, delivery_address, scheduled_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order.id)
        .bind(order.customer_id)
        .bind(priced.mode)
        .bind(OrderStatus::Pending)
        .bind(priced.subtotal)
        .bind(priced.delivery_fee)
        .bind(priced.total_amount)
        .bind(priced.redeemed_points)
        .bind(order.delivery_address.clone().map(Json))
        .bind(order.scheduled_at)
        .bind(order.created_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(priced.lines.len());
        for cart_line in &priced.lines {
            let line = OrderLine::from_cart_line(inserted.id, cart_line);
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, product_id, name, category, unit_price, quantity, is_free, is_reward)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(line.order_id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(&line.category)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(line.is_free)
            .bind(line.is_reward)
            .execute(&mut *tx)
            .await?;
            lines.push(line);
        }

        tx.commit().await?;

        Ok(OrderDetails {
            order: inserted,
            lines,
        })
    }

    async fn find_order(&self, id: Uuid) -> RulesResult<Option<OrderDetails>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(order) => {
                let lines = self.order_lines(order.id).await?;
                Ok(Some(OrderDetails { order, lines }))
            }
            None => Ok(None),
        }
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        earned_points: i32,
    ) -> RulesResult<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        if earned_points > 0 {
            sqlx::query("UPDATE customers SET loyalty_points = loyalty_points + $2 WHERE id = $1")
                .bind(order.customer_id)
                .bind(earned_points)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(order))
    }

    async fn tag_order(&self, order_id: Uuid, session_id: Uuid) -> RulesResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Shared row lock: blocks begin_close() until this tag commits
        let status: Option<SessionStatus> =
            sqlx::query_scalar("SELECT status FROM service_sessions WHERE id = $1 FOR SHARE")
                .bind(session_id)
                .fetch_optional(&mut *tx)
                .await?;

        if status != Some(SessionStatus::Open) {
            tx.rollback().await?;
            return Ok(false);
        }

        let result = sqlx::query("UPDATE orders SET service_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(order_id)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RulesError::OrderNotFound(order_id));
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn find_open_session(&self) -> RulesResult<Option<ServiceSession>> {
        let session = sqlx::query_as::<_, ServiceSession>(&format!(
            "SELECT {} FROM service_sessions WHERE status = 'open' LIMIT 1",
            SESSION_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn open_session(&self, now: DateTime<Utc>) -> RulesResult<Option<OpenedSession>> {
        let mut tx = self.pool.begin().await?;
        let candidate = ServiceSession::open_at(now);

        // The partial unique index on active sessions turns a second open into a no-op
        let inserted = sqlx::query_as::<_, ServiceSession>(&format!(
            r#"
            INSERT INTO service_sessions (id, start_time, status)
            VALUES ($1, $2, 'open')
            ON CONFLICT DO NOTHING
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(candidate.id)
        .bind(candidate.start_time)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(session) = inserted else {
            tx.rollback().await?;
            return Ok(None);
        };

        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|start| start.and_utc())
            .unwrap_or(now);
        let day_end = day_start + Duration::days(1);

        let reconciled = sqlx::query(
            r#"
            UPDATE orders SET service_id = $1, updated_at = NOW()
            WHERE service_id IS NULL AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(session.id)
        .bind(day_start)
        .bind(day_end)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(OpenedSession {
            session,
            reconciled_orders: reconciled.rows_affected(),
        }))
    }

    async fn begin_close(&self) -> RulesResult<Option<ServiceSession>> {
        let session = sqlx::query_as::<_, ServiceSession>(&format!(
            "UPDATE service_sessions SET status = 'closing' WHERE status IN ('open', 'closing') RETURNING {}",
            SESSION_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn sum_orders_for_session(&self, session_id: Uuid) -> RulesResult<SessionTotals> {
        let totals = sqlx::query_as::<_, SessionTotals>(
            r#"
            SELECT COALESCE(SUM(total_amount), 0) AS revenue, COUNT(*) AS order_count
            FROM orders
            WHERE service_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    async fn session_item_quantities(&self, session_id: Uuid) -> RulesResult<Vec<ItemQuantity>> {
        let items = sqlx::query_as::<_, ItemQuantity>(
            r#"
            SELECT l.product_id, MIN(l.name) AS name, SUM(l.quantity)::BIGINT AS quantity
            FROM order_lines l
            JOIN orders o ON o.id = l.order_id
            WHERE o.service_id = $1
            GROUP BY l.product_id
            ORDER BY l.product_id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn finish_close(
        &self,
        session_id: Uuid,
        stats: &SessionStats,
        end_time: DateTime<Utc>,
    ) -> RulesResult<ServiceSession> {
        let session = sqlx::query_as::<_, ServiceSession>(&format!(
            r#"
            UPDATE service_sessions
            SET status = 'closed', end_time = $2, total_revenue = $3, order_count = $4,
                average_ticket = $5, top_item = $6
            WHERE id = $1 AND status = 'closing'
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .bind(end_time)
        .bind(stats.total_revenue)
        .bind(stats.order_count)
        .bind(stats.average_ticket)
        .bind(&stats.top_item)
        .fetch_optional(&self.pool)
        .await?;

        session.ok_or(RulesError::NoSessionOpen)
    }

    async fn list_sessions(&self, limit: i64) -> RulesResult<Vec<ServiceSession>> {
        let sessions = sqlx::query_as::<_, ServiceSession>(&format!(
            "SELECT {} FROM service_sessions ORDER BY start_time DESC LIMIT $1",
            SESSION_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    // Run against a real database when TEST_DATABASE_URL is set, skipped otherwise

    use super::*;
    use crate::business_rules::{CartLine, OrderMode, PricedOrder};
    use crate::sessions::SessionService;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tokio::sync::Mutex;

    /// Session tests share the single active-session slot of the database
    static SESSION_LOCK: Mutex<()> = Mutex::const_new(());

    /// Helper function to create a test store, `None` without a test database
    async fn create_test_store() -> Option<PgStore> {
        let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set, skipping Postgres test");
            return None;
        };

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Some(PgStore::new(pool))
    }

    fn unique_suffix() -> String {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        format!("{}{}", timestamp % 1_000_000_000, COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Helper function to create a customer with a unique phone number
    async fn create_test_customer(store: &PgStore) -> Customer {
        let suffix = unique_suffix();
        let phone = format!("+9{}", &suffix[suffix.len().saturating_sub(14)..]);
        store.create_customer(&phone, None).await.unwrap()
    }

    /// Close whatever session an earlier run left active
    async fn reset_sessions(store: &PgStore) {
        sqlx::query("UPDATE service_sessions SET status = 'closed', end_time = NOW() WHERE status IN ('open', 'closing')")
            .execute(&store.pool)
            .await
            .unwrap();
    }

    fn new_order(customer_id: i32, total: Decimal, redeemed_points: i32) -> NewOrder {
        NewOrder {
            id: Uuid::new_v4(),
            customer_id,
            priced: PricedOrder {
                mode: OrderMode::Pickup,
                lines: vec![CartLine {
                    product_id: 1,
                    name: "Margherita".to_string(),
                    category: "pizza".to_string(),
                    unit_price: total,
                    quantity: 1,
                    is_free: false,
                    is_reward: false,
                }],
                subtotal: total,
                delivery_fee: Decimal::ZERO,
                total_amount: total,
                redeemed_points,
                free_allowance: 0,
                delivery_tier_id: None,
            },
            delivery_address: None,
            scheduled_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_concurrent_opens_yield_one_session() {
        let Some(store) = create_test_store().await else {
            return;
        };
        let _guard = SESSION_LOCK.lock().await;
        reset_sessions(&store).await;

        let store = Arc::new(store);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.open_session(Utc::now()).await }));
        }

        let mut opened = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                opened += 1;
            }
        }
        assert_eq!(opened, 1);

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM service_sessions WHERE status IN ('open', 'closing')",
        )
        .fetch_one(&store.pool)
        .await
        .unwrap();
        assert_eq!(active, 1);

        reset_sessions(&store).await;
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_never_overdraw() {
        let Some(store) = create_test_store().await else {
            return;
        };
        let store = Arc::new(store);
        let customer = create_test_customer(&store).await;
        store.increment_points(customer.id, 10).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let store = store.clone();
            let order = new_order(customer.id, dec!(10), 10);
            handles.push(tokio::spawn(async move { store.place_order(order).await }));
        }

        let mut placed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(RulesError::InsufficientLoyaltyBalance { .. }) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(placed, 1);
        assert_eq!(store.get_customer_points(customer.id).await.unwrap(), 0);

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
            .bind(customer.id)
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(orders, 1);
    }

    #[tokio::test]
    async fn test_tag_refused_once_closing() {
        let Some(store) = create_test_store().await else {
            return;
        };
        let _guard = SESSION_LOCK.lock().await;
        reset_sessions(&store).await;

        let customer = create_test_customer(&store).await;
        let session = store.open_session(Utc::now()).await.unwrap().unwrap().session;
        let first = store.place_order(new_order(customer.id, dec!(12), 0)).await.unwrap();
        assert!(store.tag_order(first.order.id, session.id).await.unwrap());

        store.begin_close().await.unwrap().unwrap();
        let late = store.place_order(new_order(customer.id, dec!(12), 0)).await.unwrap();
        assert!(!store.tag_order(late.order.id, session.id).await.unwrap());
        let late = store.find_order(late.order.id).await.unwrap().unwrap();
        assert!(late.order.service_id.is_none());

        reset_sessions(&store).await;
    }

    #[tokio::test]
    async fn test_close_counts_every_order_tagged_during_close() {
        let Some(store) = create_test_store().await else {
            return;
        };
        let _guard = SESSION_LOCK.lock().await;
        reset_sessions(&store).await;

        let store = Arc::new(store);
        let customer = create_test_customer(&store).await;
        let session_id = store.open_session(Utc::now()).await.unwrap().unwrap().session.id;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            let order = new_order(customer.id, dec!(10), 0);
            handles.push(tokio::spawn(async move {
                let placed = store.place_order(order).await.unwrap();
                store.tag_order(placed.order.id, session_id).await.unwrap()
            }));
        }
        let closed = SessionService::new(store.clone()).close().await.unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        let tagged: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE service_id = $1")
            .bind(session_id)
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(closed.stats.order_count, tagged);
        assert_eq!(closed.session.status, SessionStatus::Closed);
    }

    #[tokio::test]
    async fn test_close_resumes_session_left_closing() {
        let Some(store) = create_test_store().await else {
            return;
        };
        let _guard = SESSION_LOCK.lock().await;
        reset_sessions(&store).await;

        let store = Arc::new(store);
        let session = store.open_session(Utc::now()).await.unwrap().unwrap().session;
        store.begin_close().await.unwrap().unwrap();

        let closed = SessionService::new(store.clone()).close().await.unwrap();
        assert_eq!(closed.session.id, session.id);
        assert!(store.open_session(Utc::now()).await.unwrap().is_some());

        reset_sessions(&store).await;
    }

    #[tokio::test]
    async fn test_concurrent_setting_writes_get_distinct_versions() {
        let Some(store) = create_test_store().await else {
            return;
        };
        let store = Arc::new(store);
        let suffix = unique_suffix();

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            let key = format!("test_{}_{}", suffix, n);
            handles.push(tokio::spawn(async move { store.save_setting(&key, "true").await }));
        }

        let mut versions = Vec::new();
        for handle in handles {
            versions.push(handle.await.unwrap().unwrap().version);
        }
        versions.sort_unstable();
        versions.dedup();
        assert_eq!(versions.len(), 8);
    }
}
