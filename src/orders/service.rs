use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::business_rules::{
    LoyaltyLedger, OrderRulesEngine, PricedOrder, RulesError, RulesResult, SettingsSnapshot,
    SettingsStore,
};
use crate::orders::{
    CartBuilder, NewOrder, OrderDetails, OrderStatus, StatusMachine, SubmitOrderRequest,
};
use crate::store::PizzeriaStore;

/// Service for order business logic
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn PizzeriaStore>,
    settings: Arc<SettingsStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn PizzeriaStore>, settings: Arc<SettingsStore>) -> Self {
        Self { store, settings }
    }

    /// Price a request without persisting anything
    pub async fn quote(&self, request: &SubmitOrderRequest) -> RulesResult<PricedOrder> {
        let settings = self.settings.snapshot().await?;
        self.price(request, &settings).await
    }

    async fn price(
        &self,
        request: &SubmitOrderRequest,
        settings: &SettingsSnapshot,
    ) -> RulesResult<PricedOrder> {
        request.validate()?;

        let products = self
            .store
            .find_products(&CartBuilder::product_ids(&request.items))
            .await?;
        let cart = CartBuilder::build(&request.items, &products)?;

        let customer = self
            .store
            .find_customer(request.customer_id)
            .await?
            .ok_or(RulesError::CustomerNotFound(request.customer_id))?;

        OrderRulesEngine::validate_and_price(
            &cart,
            customer.loyalty_points,
            request.address.as_ref(),
            request.mode,
            settings,
        )
    }

    /// Validate, price and persist an order, then account it to the open
    /// session if there is one
    ///
    /// # Validation
    /// - Every rule of `OrderRulesEngine::validate_and_price`
    /// - `scheduled_at`, when given, must be in the future and within opening hours
    /// - A reward consumes the points atomically with the insert; a concurrent
    ///   redemption that drained the balance fails with `InsufficientLoyaltyBalance`
    pub async fn submit(&self, request: SubmitOrderRequest) -> RulesResult<OrderDetails> {
        self.submit_at(request, Utc::now()).await
    }

    pub async fn submit_at(
        &self,
        request: SubmitOrderRequest,
        now: DateTime<Utc>,
    ) -> RulesResult<OrderDetails> {
        let settings = self.settings.snapshot().await?;
        self.submit_with_settings(request, &settings, now).await
    }

    /// Submit against one settings snapshot, used for both pricing and the
    /// schedule check
    pub async fn submit_with_settings(
        &self,
        request: SubmitOrderRequest,
        settings: &SettingsSnapshot,
        now: DateTime<Utc>,
    ) -> RulesResult<OrderDetails> {
        let priced = self.price(&request, settings).await?;

        if let Some(scheduled_at) = request.scheduled_at {
            if scheduled_at < now {
                return Err(RulesError::ValidationError(
                    "scheduled_at must be in the future".to_string(),
                ));
            }
            if !settings.is_open_at(scheduled_at.naive_utc())? {
                return Err(RulesError::OutsideOpeningHours(scheduled_at.to_rfc3339()));
            }
        }

        let new_order = NewOrder {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            priced,
            delivery_address: request.address,
            scheduled_at: request.scheduled_at,
            created_at: now,
        };

        let mut details = match self.store.place_order(new_order).await {
            Ok(details) => details,
            Err(err @ RulesError::InsufficientLoyaltyBalance { .. }) => {
                tracing::warn!("Redemption lost a race: {}", err);
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        tracing::info!(
            "Order {} placed for customer {}: total {}",
            details.order.id,
            details.order.customer_id,
            details.order.total_amount
        );

        // Orders placed while no session is open stay orphans until the next open()
        if let Some(session) = self.store.find_open_session().await? {
            if self.store.tag_order(details.order.id, session.id).await? {
                details.order.service_id = Some(session.id);
            } else {
                tracing::debug!(
                    "Session {} closed before order {} could be tagged",
                    session.id,
                    details.order.id
                );
            }
        }

        Ok(details)
    }

    pub async fn get_order(&self, id: Uuid) -> RulesResult<OrderDetails> {
        self.store
            .find_order(id)
            .await?
            .ok_or(RulesError::OrderNotFound(id))
    }

    /// Move an order along its lifecycle, crediting loyalty points when it is
    /// delivered or picked up
    ///
    /// # Arguments
    /// * `id` - Order to update
    /// * `to` - Target status; the current one is a no-op
    ///
    /// # Returns
    /// * `Ok(OrderDetails)` - The order after the change
    /// * `Err(InvalidTransition)` - Not allowed from the current status or for
    ///   the order's mode, or another request changed the status first
    pub async fn update_status(&self, id: Uuid, to: OrderStatus) -> RulesResult<OrderDetails> {
        let details = self.get_order(id).await?;
        let from = details.order.status;

        if from == to {
            return Ok(details);
        }

        StatusMachine::transition_for_mode(details.order.mode, from, to)?;

        let earned = if to.is_fulfilled() {
            let settings = self.settings.snapshot().await?;
            LoyaltyLedger::points_earned(&details.cart_lines(), &settings.loyalty_program)
        } else {
            0
        };

        match self.store.update_order_status(id, from, to, earned).await? {
            Some(order) => {
                tracing::info!("Order {} moved from {} to {}", id, from, to);
                if earned > 0 {
                    tracing::info!(
                        "Credited {} loyalty points to customer {}",
                        earned,
                        order.customer_id
                    );
                }
                Ok(OrderDetails {
                    order,
                    lines: details.lines,
                })
            }
            None => {
                tracing::warn!("Order {} changed status concurrently", id);
                Err(RulesError::InvalidTransition(format!(
                    "order {} is no longer {}",
                    id, from
                )))
            }
        }
    }
}
