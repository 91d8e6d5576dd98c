//! Order history.

use tracing::instrument;

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::models::Order;

/// Client for `/orders`.
#[derive(Debug, Clone)]
pub struct OrderService {
    gateway: ApiGateway,
}

impl OrderService {
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// The logged-in user's orders.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` without a request when nobody is logged in,
    /// otherwise the gateway error.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Order>, ApiError> {
        if !self.gateway.session().is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }
        let list: Option<Vec<Order>> = self.gateway.get("/orders").await?;
        Ok(list.unwrap_or_default())
    }
}
