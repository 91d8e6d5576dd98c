//! Cart store.
//!
//! The server owns the cart. Every mutation sends its request and then calls
//! [`CartStore::reconcile`], which rebuilds the local view from `GET /cart`
//! joined with `GET /product/list`. Nothing is updated optimistically.

use std::collections::HashMap;
use std::sync::Arc;

use bakery_core::{CartItemId, Price, ProductId, Quantity};
use parking_lot::RwLock;
use tracing::instrument;

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::models::{CartItem, CartItemRequest, Product};

/// A cart item joined with the product it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: CartItem,
    /// `None` when the product has left the catalog.
    pub product: Option<Product>,
}

impl CartLine {
    #[must_use]
    pub const fn id(&self) -> CartItemId {
        self.item.id
    }

    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.item.quantity
    }

    /// Product name, or a placeholder naming the product id.
    #[must_use]
    pub fn name(&self) -> String {
        self.product.as_ref().map_or_else(
            || format!("Product #{}", self.item.product_id),
            |product| product.name.clone(),
        )
    }

    /// Unit price times quantity; zero when the product is unknown.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product
            .as_ref()
            .map_or(Price::ZERO, |product| product.price.times(self.item.quantity))
    }
}

/// What the cart view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    pub items: Vec<CartLine>,
    pub is_loading: bool,
}

impl CartState {
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|line| u64::from(line.quantity().get()))
            .sum()
    }

    #[must_use]
    pub fn contains(&self, id: CartItemId) -> bool {
        self.items.iter().any(|line| line.id() == id)
    }
}

/// Join server cart items with the current product list, keeping cart order.
#[must_use]
pub fn join_lines(items: Vec<CartItem>, products: &[Product]) -> Vec<CartLine> {
    let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    items
        .into_iter()
        .map(|item| CartLine {
            product: by_id.get(&item.product_id).map(|p| (*p).clone()),
            item,
        })
        .collect()
}

/// Client-side mirror of the server cart.
#[derive(Debug, Clone)]
pub struct CartStore {
    gateway: ApiGateway,
    state: Arc<RwLock<CartState>>,
}

impl CartStore {
    #[must_use]
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(CartState::default())),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.read().clone()
    }

    fn require_login(&self) -> Result<(), ApiError> {
        if self.gateway.session().is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::NotAuthenticated)
        }
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` without a request when nobody is logged in,
    /// otherwise the gateway error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.require_login()?;
        let body = CartItemRequest {
            product_id,
            quantity: Quantity::ONE,
        };
        let _: serde_json::Value = self.gateway.post("/cart/add", &body).await?;
        self.reconcile().await
    }

    /// Remove a line entirely.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` without a request when nobody is logged in,
    /// otherwise the gateway error.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        self.require_login()?;
        let _: serde_json::Value = self
            .gateway
            .delete(&format!("/cart/delete/{item_id}"))
            .await?;
        self.reconcile().await
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` or `InvalidQuantity` (target below 1) without a
    /// request, otherwise the gateway error.
    #[instrument(skip(self), fields(item_id = %item_id, product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        item_id: CartItemId,
        product_id: ProductId,
        target: i64,
    ) -> Result<(), ApiError> {
        self.require_login()?;
        let quantity = Quantity::from_target(target)?;
        let body = CartItemRequest {
            product_id,
            quantity,
        };
        let _: serde_json::Value = self
            .gateway
            .put(&format!("/cart/update/{item_id}"), &body)
            .await?;
        self.reconcile().await
    }

    /// Delete every line, one request per line.
    ///
    /// Not atomic: on the first failed delete the store reconciles to show
    /// what is left and the failure is returned.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` without a request when nobody is logged in,
    /// otherwise the first gateway error.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        self.require_login()?;
        let items: Option<Vec<CartItem>> = self.gateway.get("/cart").await?;

        for item in items.unwrap_or_default() {
            let deleted: Result<serde_json::Value, ApiError> = self
                .gateway
                .delete(&format!("/cart/delete/{}", item.id))
                .await;
            if let Err(e) = deleted {
                tracing::warn!(item_id = %item.id, error = %e, "Clearing cart stopped early");
                if let Err(reconcile_error) = self.reconcile().await {
                    tracing::warn!(error = %reconcile_error, "Reconcile after partial clear failed");
                }
                return Err(e);
            }
        }

        self.reconcile().await
    }

    /// Load the cart; empties it when nobody is logged in.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the local cart is emptied in that case.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<(), ApiError> {
        if !self.gateway.session().is_authenticated() {
            *self.state.write() = CartState::default();
            return Ok(());
        }
        self.reconcile().await
    }

    /// Rebuild local state from the server cart and product list.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the local cart is emptied in that case.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<(), ApiError> {
        self.state.write().is_loading = true;

        match self.load_lines().await {
            Ok(items) => {
                tracing::debug!(lines = items.len(), "Cart reconciled");
                *self.state.write() = CartState {
                    items,
                    is_loading: false,
                };
                Ok(())
            }
            Err(e) => {
                *self.state.write() = CartState::default();
                Err(e)
            }
        }
    }

    async fn load_lines(&self) -> Result<Vec<CartLine>, ApiError> {
        let items: Option<Vec<CartItem>> = self.gateway.get("/cart").await?;
        let products: Option<Vec<Product>> = self.gateway.get("/product/list").await?;
        Ok(join_lines(
            items.unwrap_or_default(),
            &products.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use bakery_core::UserId;

    use super::*;

    fn item(id: i32, product_id: i32, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            user_id: UserId::new(1),
            product_id: ProductId::new(product_id),
            quantity: Quantity::new(quantity).unwrap_or(Quantity::ONE),
        }
    }

    fn product(id: i32, name: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            short_description: String::new(),
            full_description: String::new(),
            price: Price::from_cents(cents),
            weight: 500.0,
            composition: String::new(),
            photo: String::new(),
            storage_rule_id: None,
        }
    }

    #[test]
    fn test_join_keeps_cart_order_and_missing_products() {
        let lines = join_lines(
            vec![item(7, 2, 1), item(8, 99, 3), item(9, 1, 2)],
            &[product(1, "Croissant", 150), product(2, "Baguette", 220)],
        );
        let names: Vec<String> = lines.iter().map(CartLine::name).collect();
        assert_eq!(names, ["Baguette", "Product #99", "Croissant"]);
        assert!(lines[1].product.is_none());
    }

    #[test]
    fn test_totals() {
        let state = CartState {
            items: join_lines(
                vec![item(7, 1, 2), item(8, 2, 1), item(9, 3, 4)],
                &[product(1, "Croissant", 150), product(2, "Baguette", 220)],
            ),
            is_loading: false,
        };
        assert_eq!(state.items[0].line_total(), Price::from_cents(300));
        assert_eq!(state.items[2].line_total(), Price::ZERO);
        assert_eq!(state.total(), Price::from_cents(520));
        assert_eq!(state.item_count(), 7);
        assert!(state.contains(CartItemId::new(8)));
        assert!(!state.contains(CartItemId::new(10)));
    }

    #[test]
    fn test_item_count_does_not_overflow() {
        let state = CartState {
            items: join_lines(vec![item(7, 1, u32::MAX), item(8, 2, 2)], &[]),
            is_loading: false,
        };
        assert_eq!(state.item_count(), u64::from(u32::MAX) + 2);
    }
}
