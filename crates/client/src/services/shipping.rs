//! Shipments.

use bakery_core::ShipmentStatus;
use tracing::instrument;

use crate::error::ApiError;
use crate::gateway::{ApiGateway, ApiPath};
use crate::models::{NewShipment, Shipment, ShipmentStatusUpdate};

/// Client for `/shipping`.
#[derive(Debug, Clone)]
pub struct ShippingService {
    gateway: ApiGateway,
}

impl ShippingService {
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, shipment), fields(order_id = %shipment.order_id))]
    pub async fn create(&self, shipment: &NewShipment) -> Result<Shipment, ApiError> {
        self.gateway.post("/shipping", shipment).await
    }

    /// Shipments, optionally only those in one status.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn list(&self, status: Option<ShipmentStatus>) -> Result<Vec<Shipment>, ApiError> {
        let query: Vec<(&str, String)> = status
            .map(|s| ("status", s.as_str().to_string()))
            .into_iter()
            .collect();
        let list: Option<Vec<Shipment>> =
            self.gateway.get_with_query("/shipping/list", &query).await?;
        Ok(list.unwrap_or_default())
    }

    /// Move a shipment to a new status, optionally assigning a courier.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, update), fields(status = %update.status))]
    pub async fn update_status(
        &self,
        tracking_code: &str,
        update: &ShipmentStatusUpdate,
    ) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .gateway
            .patch(
                ApiPath::new("/shipping")
                    .segment(tracking_code)
                    .segment("status"),
                update,
            )
            .await?;
        Ok(())
    }
}
