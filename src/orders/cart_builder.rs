use std::collections::HashMap;

use crate::business_rules::{Cart, CartLine, RulesError, RulesResult};
use crate::models::Product;
use crate::orders::OrderItemRequest;

/// Prices requested items from the catalog
pub struct CartBuilder;

impl CartBuilder {
    /// Build a cart, snapshotting name, category and price of each product
    ///
    /// Unknown products fail with `ProductNotFound`, unavailable ones with
    /// `ProductUnavailable`. Line order follows the request.
    pub fn build(items: &[OrderItemRequest], products: &[Product]) -> RulesResult<Cart> {
        let catalog: HashMap<i32, &Product> =
            products.iter().map(|product| (product.id, product)).collect();

        let lines = items
            .iter()
            .map(|item| {
                let product = catalog
                    .get(&item.product_id)
                    .ok_or(RulesError::ProductNotFound(item.product_id))?;
                if !product.available {
                    return Err(RulesError::ProductUnavailable(product.id));
                }
                Ok(CartLine {
                    product_id: product.id,
                    name: product.name.clone(),
                    category: product.category.clone(),
                    unit_price: product.price,
                    quantity: item.quantity,
                    is_free: item.is_free,
                    is_reward: item.is_reward,
                })
            })
            .collect::<RulesResult<Vec<_>>>()?;

        Ok(Cart::new(lines))
    }

    /// Distinct product ids referenced by the request
    pub fn product_ids(items: &[OrderItemRequest]) -> Vec<i32> {
        let mut ids: Vec<i32> = items.iter().map(|item| item.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
