use crate::business_rules::{OrderMode, RulesError, RulesResult};
use crate::orders::OrderStatus;

/// Service for managing order status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Confirmed
    /// - Confirmed → Preparing
    /// - Preparing → Ready
    /// - Ready → OutForDelivery (delivery) or Completed (pickup)
    /// - OutForDelivery → Delivered
    /// - Any non-terminal status → Cancelled
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        if from == to {
            return true;
        }

        match (from, to) {
            (OrderStatus::Pending, OrderStatus::Confirmed) => true,
            (OrderStatus::Confirmed, OrderStatus::Preparing) => true,
            (OrderStatus::Preparing, OrderStatus::Ready) => true,
            (OrderStatus::Ready, OrderStatus::OutForDelivery) => true,
            (OrderStatus::Ready, OrderStatus::Completed) => true,
            (OrderStatus::OutForDelivery, OrderStatus::Delivered) => true,

            (from, OrderStatus::Cancelled) => !from.is_terminal(),

            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Arguments
    /// * `from` - Current order status
    /// * `to` - Desired new status
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `InvalidTransition` otherwise
    ///
    /// # Example
    /// ```
    /// use pizzeria_api::orders::{OrderStatus, StatusMachine};
    ///
    /// assert!(StatusMachine::transition(OrderStatus::Pending, OrderStatus::Confirmed).is_ok());
    /// assert!(StatusMachine::transition(OrderStatus::Delivered, OrderStatus::Cancelled).is_err());
    /// ```
    pub fn transition(from: OrderStatus, to: OrderStatus) -> RulesResult<OrderStatus> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(RulesError::InvalidTransition(format!("{} to {}", from, to)))
        }
    }

    /// Like `transition`, and also keeps delivery statuses off pickup orders
    /// (and `Completed` off delivery orders)
    pub fn transition_for_mode(
        mode: OrderMode,
        from: OrderStatus,
        to: OrderStatus,
    ) -> RulesResult<OrderStatus> {
        let allowed = match (mode, to) {
            (OrderMode::Pickup, OrderStatus::OutForDelivery | OrderStatus::Delivered) => false,
            (OrderMode::Delivery, OrderStatus::Completed) => false,
            _ => true,
        };
        if !allowed {
            return Err(RulesError::InvalidTransition(format!(
                "{} order cannot become {}",
                mode, to
            )));
        }
        Self::transition(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_path() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ];
        for pair in path.windows(2) {
            assert!(
                StatusMachine::is_valid_transition(pair[0], pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_pickup_completion() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Ready,
            OrderStatus::Completed
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::OutForDelivery,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn test_skip_transitions_rejected() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Ready
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Confirmed,
            OrderStatus::Delivered
        ));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Ready,
            OrderStatus::Preparing
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Delivered,
            OrderStatus::OutForDelivery
        ));
    }

    #[test]
    fn test_fulfilled_orders_cannot_be_cancelled() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Delivered,
            OrderStatus::Cancelled
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Completed,
            OrderStatus::Cancelled
        ));
    }

    #[test]
    fn test_transition_invalid_returns_typed_error() {
        let result = StatusMachine::transition(OrderStatus::Pending, OrderStatus::Delivered);
        match result {
            Err(RulesError::InvalidTransition(message)) => {
                assert_eq!(message, "pending to delivered")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_mode_specific_statuses() {
        assert!(StatusMachine::transition_for_mode(
            OrderMode::Delivery,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery
        )
        .is_ok());
        assert!(StatusMachine::transition_for_mode(
            OrderMode::Delivery,
            OrderStatus::Ready,
            OrderStatus::Completed
        )
        .is_err());
        assert!(StatusMachine::transition_for_mode(
            OrderMode::Pickup,
            OrderStatus::Ready,
            OrderStatus::OutForDelivery
        )
        .is_err());
        assert!(StatusMachine::transition_for_mode(
            OrderMode::Pickup,
            OrderStatus::Ready,
            OrderStatus::Completed
        )
        .is_ok());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
        proptest::sample::select(OrderStatus::ALL.to_vec())
    }

    proptest! {
        /// Same status transitions are always valid (idempotent)
        #[test]
        fn prop_same_status_is_valid(status in order_status_strategy()) {
            prop_assert!(StatusMachine::is_valid_transition(status, status));
        }

        /// Terminal statuses only accept themselves
        #[test]
        fn prop_terminal_statuses_are_final(from in order_status_strategy(), to in order_status_strategy()) {
            if from.is_terminal() && from != to {
                prop_assert!(!StatusMachine::is_valid_transition(from, to));
            }
        }

        /// Every non-terminal status can be cancelled
        #[test]
        fn prop_can_cancel_until_terminal(from in order_status_strategy()) {
            if !from.is_terminal() {
                prop_assert!(StatusMachine::is_valid_transition(from, OrderStatus::Cancelled));
            }
        }

        /// transition() and is_valid_transition() agree
        #[test]
        fn prop_transition_consistency(from in order_status_strategy(), to in order_status_strategy()) {
            let is_valid = StatusMachine::is_valid_transition(from, to);
            prop_assert_eq!(StatusMachine::transition(from, to).is_ok(), is_valid);
        }
    }
}
