//! Warehouses, bins, storage rules and the WMS stock endpoints.

use bakery_core::{BinId, StorageRuleId, WarehouseId};
use reqwest::Method;
use tracing::instrument;

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::models::{
    BinInput, BinLocation, StorageRule, StorageRuleInput, Warehouse, WarehouseInput,
    WmsCheckResponse, WmsCommitResponse, WmsItem, WmsRequest,
};

/// Client for `/warehouse/*`.
#[derive(Debug, Clone)]
pub struct WarehouseService {
    gateway: ApiGateway,
}

impl WarehouseService {
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    // =========================================================================
    // Warehouses
    // =========================================================================

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn warehouses(&self) -> Result<Vec<Warehouse>, ApiError> {
        let list: Option<Vec<Warehouse>> = self.gateway.get("/warehouse/warehouses").await?;
        Ok(list.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_warehouse(&self, input: &WarehouseInput) -> Result<Warehouse, ApiError> {
        self.gateway.post("/warehouse/warehouses", input).await
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input), fields(warehouse_id = %id))]
    pub async fn update_warehouse(
        &self,
        id: WarehouseId,
        input: &WarehouseInput,
    ) -> Result<Warehouse, ApiError> {
        self.gateway
            .put(&format!("/warehouse/warehouses/{id}"), input)
            .await
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self), fields(warehouse_id = %id))]
    pub async fn delete_warehouse(&self, id: WarehouseId) -> Result<(), ApiError> {
        self.gateway
            .send(Method::DELETE, &format!("/warehouse/warehouses/{id}"))
            .await
    }

    // =========================================================================
    // Bins
    // =========================================================================

    /// Bins, optionally limited to one warehouse.
    ///
    /// A non-array answer reads as no bins.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn bins(&self, warehouse: Option<WarehouseId>) -> Result<Vec<BinLocation>, ApiError> {
        let query: Vec<(&str, String)> = warehouse
            .map(|id| ("warehouse_id", id.to_string()))
            .into_iter()
            .collect();
        let answer: serde_json::Value = self
            .gateway
            .get_with_query("/warehouse/locations/bins", &query)
            .await?;
        if answer.is_array() {
            Ok(serde_json::from_value(answer)?)
        } else {
            Ok(Vec::new())
        }
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input), fields(bin_code = %input.bin_code))]
    pub async fn create_bin(&self, input: &BinInput) -> Result<BinLocation, ApiError> {
        self.gateway.post("/warehouse/locations/bins", input).await
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input), fields(bin_id = %id))]
    pub async fn update_bin(&self, id: BinId, input: &BinInput) -> Result<BinLocation, ApiError> {
        self.gateway
            .put(&format!("/warehouse/locations/bins/{id}"), input)
            .await
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self), fields(bin_id = %id))]
    pub async fn delete_bin(&self, id: BinId) -> Result<(), ApiError> {
        self.gateway
            .send(Method::DELETE, &format!("/warehouse/locations/bins/{id}"))
            .await
    }

    // =========================================================================
    // Storage rules
    // =========================================================================

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn storage_rules(&self) -> Result<Vec<StorageRule>, ApiError> {
        let list: Option<Vec<StorageRule>> = self.gateway.get("/warehouse/storage-rules").await?;
        Ok(list.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_storage_rule(
        &self,
        input: &StorageRuleInput,
    ) -> Result<StorageRule, ApiError> {
        self.gateway.post("/warehouse/storage-rules", input).await
    }

    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self), fields(rule_id = %id))]
    pub async fn delete_storage_rule(&self, id: StorageRuleId) -> Result<(), ApiError> {
        self.gateway
            .send(Method::DELETE, &format!("/warehouse/storage-rules/{id}"))
            .await
    }

    // =========================================================================
    // WMS
    // =========================================================================

    /// Whether the items are in stock, without reserving anything.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn check_stock(&self, items: &[WmsItem]) -> Result<WmsCheckResponse, ApiError> {
        self.gateway
            .post("/warehouse/wms/check", &WmsRequest { items })
            .await
    }

    /// Deduct the items from stock.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn commit_stock(&self, items: &[WmsItem]) -> Result<WmsCommitResponse, ApiError> {
        let answer: WmsCommitResponse = self
            .gateway
            .post("/warehouse/wms/commit", &WmsRequest { items })
            .await?;
        if !answer.ok {
            tracing::warn!(shortages = answer.shortages.len(), "Stock commit short");
        }
        Ok(answer)
    }
}
