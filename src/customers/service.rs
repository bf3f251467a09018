use std::sync::Arc;

use crate::business_rules::{Address, RulesError, RulesResult};
use crate::customers::models::{Customer, PointsResponse};
use crate::customers::verification::PhoneVerifier;
use crate::store::PizzeriaStore;

/// Customer lifecycle: guest checkout, phone login and point adjustments
#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn PizzeriaStore>,
    verifier: Arc<dyn PhoneVerifier>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn PizzeriaStore>, verifier: Arc<dyn PhoneVerifier>) -> Self {
        Self { store, verifier }
    }

    pub async fn send_code(&self, phone: &str) -> RulesResult<()> {
        self.verifier.send_code(phone.trim()).await
    }

    /// Check the code and return the customer owning `phone`, creating it on
    /// first login
    pub async fn verify_login(&self, phone: &str, code: &str) -> RulesResult<Customer> {
        let phone = phone.trim();
        if !self.verifier.check_code(phone, code).await? {
            return Err(RulesError::InvalidVerificationCode);
        }

        if let Some(customer) = self.store.find_customer_by_phone(phone).await? {
            return Ok(customer);
        }

        match self.store.create_customer(phone, None).await {
            Ok(customer) => {
                tracing::info!("Customer {} created on first login", customer.id);
                Ok(customer)
            }
            // Another login for the same phone won the insert
            Err(RulesError::DuplicateCustomer(_)) => self
                .store
                .find_customer_by_phone(phone)
                .await?
                .ok_or_else(|| RulesError::DuplicateCustomer(phone.to_string())),
            Err(err) => Err(err),
        }
    }

    pub async fn create_guest(&self, phone: &str, email: Option<&str>) -> RulesResult<Customer> {
        let email = email.map(str::trim).filter(|email| !email.is_empty());
        let customer = self.store.create_customer(phone.trim(), email).await?;
        tracing::info!("Guest customer {} created", customer.id);
        Ok(customer)
    }

    pub async fn get(&self, id: i32) -> RulesResult<Customer> {
        self.store
            .find_customer(id)
            .await?
            .ok_or(RulesError::CustomerNotFound(id))
    }

    pub async fn add_address(&self, id: i32, address: Address) -> RulesResult<Customer> {
        self.store.add_customer_address(id, address).await
    }

    /// Manual adjustment; a negative delta never takes the balance below 0
    pub async fn adjust_points(&self, id: i32, delta: i32) -> RulesResult<PointsResponse> {
        let loyalty_points = if delta >= 0 {
            self.store.increment_points(id, delta).await?
        } else {
            self.store.decrement_points(id, delta.saturating_neg()).await?
        };
        tracing::info!("Loyalty points of customer {} adjusted by {}", id, delta);

        Ok(PointsResponse {
            customer_id: id,
            loyalty_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customers::verification::InMemoryPhoneVerifier;
    use crate::store::InMemoryStore;

    const PHONE: &str = "+33655555555";

    fn service() -> (Arc<InMemoryPhoneVerifier>, CustomerService) {
        let verifier = Arc::new(InMemoryPhoneVerifier::new());
        let service = CustomerService::new(Arc::new(InMemoryStore::new()), verifier.clone());
        (verifier, service)
    }

    #[tokio::test]
    async fn test_first_login_creates_customer_once() {
        let (verifier, service) = service();

        let code = verifier.issue_code(PHONE).await;
        let first = service.verify_login(PHONE, &code).await.unwrap();

        let code = verifier.issue_code(PHONE).await;
        let second = service.verify_login(PHONE, &code).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.loyalty_points, 0);
    }

    #[tokio::test]
    async fn test_wrong_code_rejected() {
        let (verifier, service) = service();
        let code = verifier.issue_code(PHONE).await;
        let wrong = if code == "999999" { "000000" } else { "999999" };
        let err = service.verify_login(PHONE, wrong).await.unwrap_err();
        assert!(matches!(err, RulesError::InvalidVerificationCode));
    }

    #[tokio::test]
    async fn test_guest_duplicate_email_rejected() {
        let (_, service) = service();
        service
            .create_guest("+33600000010", Some("lea@example.com"))
            .await
            .unwrap();
        let err = service
            .create_guest("+33600000011", Some("lea@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RulesError::DuplicateCustomer(_)));
    }

    #[tokio::test]
    async fn test_adjust_points_cannot_go_negative() {
        let (_, service) = service();
        let customer = service.create_guest(PHONE, None).await.unwrap();

        let balance = service.adjust_points(customer.id, 4).await.unwrap();
        assert_eq!(balance.loyalty_points, 4);

        let err = service.adjust_points(customer.id, -5).await.unwrap_err();
        assert!(matches!(err, RulesError::InsufficientLoyaltyBalance { .. }));

        let balance = service.adjust_points(customer.id, -4).await.unwrap();
        assert_eq!(balance.loyalty_points, 0);
    }

    #[tokio::test]
    async fn test_addresses_are_deduplicated() {
        let (_, service) = service();
        let customer = service.create_guest(PHONE, None).await.unwrap();
        let address = Address {
            street: "8 cours Julien".to_string(),
            postal_code: "13006".to_string(),
            city: "Marseille".to_string(),
        };
        service.add_address(customer.id, address.clone()).await.unwrap();
        let updated = service.add_address(customer.id, address).await.unwrap();
        assert_eq!(updated.addresses.0.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_customer_not_found() {
        let (_, service) = service();
        assert!(matches!(
            service.get(404).await.unwrap_err(),
            RulesError::CustomerNotFound(404)
        ));
    }
}
