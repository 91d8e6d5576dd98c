//! Product catalog.

use bakery_core::ProductId;
use reqwest::StatusCode;
use tracing::instrument;

use crate::error::ApiError;
use crate::gateway::{ApiGateway, ApiPath};
use crate::models::{NameCheck, NewProduct, Product, ProductInfoResponse};

/// Product list, details and admin edits.
#[derive(Debug, Clone)]
pub struct CatalogService {
    gateway: ApiGateway,
}

impl CatalogService {
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, ApiError> {
        let products: Option<Vec<Product>> = self.gateway.get("/product/list").await?;
        Ok(products.unwrap_or_default())
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// `Rejected` with 404 when the answer carries no product, otherwise the
    /// gateway error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn info(&self, id: ProductId) -> Result<Product, ApiError> {
        let answer: ProductInfoResponse = self.gateway.get(&format!("/product/info/{id}")).await?;
        answer.product.ok_or_else(|| ApiError::Rejected {
            status: StatusCode::NOT_FOUND,
            message: format!("Product {id} not found"),
        })
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns the gateway error, e.g. a duplicate name.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn add(&self, product: &NewProduct) -> Result<(), ApiError> {
        let _: serde_json::Value = self.gateway.post("/product/add", product).await?;
        Ok(())
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self, product), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, product: &NewProduct) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .gateway
            .put(&format!("/product/update/{id}"), product)
            .await?;
        Ok(())
    }

    /// Whether a product with this name exists.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn verify_name(&self, name: &str) -> Result<NameCheck, ApiError> {
        self.gateway
            .get(ApiPath::new("/product/verify").segment(name.trim()))
            .await
    }
}
