use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::business_rules::{RulesError, RulesResult};
use crate::sessions::models::{ClosedSession, OpenedSession, ServiceSession};
use crate::sessions::stats::SessionStatsCalculator;
use crate::store::PizzeriaStore;

/// Default page size for the session history
pub const DEFAULT_HISTORY_LIMIT: i64 = 30;
const MAX_HISTORY_LIMIT: i64 = 365;

/// Drives the service session state machine
///
/// `NoSessionOpen -> Open -> Closing -> Closed`. Uniqueness of the active
/// session and the close fence are enforced by the store.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn PizzeriaStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn PizzeriaStore>) -> Self {
        Self { store }
    }

    pub async fn open(&self) -> RulesResult<OpenedSession> {
        self.open_at(Utc::now()).await
    }

    /// Open a session and attach the same-day orphan orders to it
    pub async fn open_at(&self, now: DateTime<Utc>) -> RulesResult<OpenedSession> {
        match self.store.open_session(now).await? {
            Some(opened) => {
                tracing::info!(
                    "Service session {} opened, {} orphan order(s) reconciled",
                    opened.session.id,
                    opened.reconciled_orders
                );
                Ok(opened)
            }
            None => Err(RulesError::SessionAlreadyOpen),
        }
    }

    pub async fn close(&self) -> RulesResult<ClosedSession> {
        self.close_at(Utc::now()).await
    }

    /// Fence the open session, aggregate its orders and close it
    ///
    /// Safe to retry: a session left in `Closing` by a failed attempt is
    /// picked up again and finished.
    pub async fn close_at(&self, now: DateTime<Utc>) -> RulesResult<ClosedSession> {
        let closing = self
            .store
            .begin_close()
            .await?
            .ok_or(RulesError::NoSessionOpen)?;
        tracing::debug!("Service session {} is closing", closing.id);

        let totals = self.store.sum_orders_for_session(closing.id).await?;
        let items = self.store.session_item_quantities(closing.id).await?;
        let stats = SessionStatsCalculator::compute(totals, &items);

        let session = self.store.finish_close(closing.id, &stats, now).await?;
        tracing::info!(
            "Service session {} closed: {} order(s), revenue {}, average ticket {}",
            session.id,
            stats.order_count,
            stats.total_revenue,
            stats.average_ticket
        );

        Ok(ClosedSession { session, stats })
    }

    pub async fn current(&self) -> RulesResult<ServiceSession> {
        self.store
            .find_open_session()
            .await?
            .ok_or(RulesError::NoSessionOpen)
    }

    pub async fn history(&self, limit: Option<i64>) -> RulesResult<Vec<ServiceSession>> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        self.store.list_sessions(limit).await
    }
}
