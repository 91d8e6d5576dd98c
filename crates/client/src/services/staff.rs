//! Staff accounts.

use bakery_core::UserRole;
use tracing::instrument;

use crate::cookies::ACCESS_TOKEN_COOKIE;
use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::models::{RegisterRequest, Registration, Staff};

/// Client for the staff side of `/auth`.
#[derive(Debug, Clone)]
pub struct StaffService {
    gateway: ApiGateway,
}

impl StaffService {
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// Every non-client account.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Staff>, ApiError> {
        let list: Option<Vec<Staff>> = self.gateway.get("/auth/staff").await?;
        Ok(list.unwrap_or_default())
    }

    /// Staff with the `courier` role.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn couriers(&self) -> Result<Vec<Staff>, ApiError> {
        let mut staff = self.list().await?;
        staff.retain(|s| s.user_role == UserRole::Courier);
        Ok(staff)
    }

    /// Create an account for someone else.
    ///
    /// The auth service answers a registration with a cookie for the new
    /// account; the caller's own token is put back afterwards so the current
    /// session is untouched.
    ///
    /// # Errors
    ///
    /// Returns the gateway error, e.g. a taken username.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn create(&self, registration: &Registration) -> Result<(), ApiError> {
        let own_token = self.gateway.cookies().get(ACCESS_TOKEN_COOKIE);
        let result: Result<serde_json::Value, ApiError> = self
            .gateway
            .post("/auth/register", &RegisterRequest::from(registration))
            .await;

        // A 401 has already invalidated the session; keep it that way.
        if !matches!(result, Err(ApiError::Unauthorized)) {
            match own_token {
                Some(token) => self.gateway.cookies().set(ACCESS_TOKEN_COOKIE, token),
                None => self.gateway.cookies().remove(ACCESS_TOKEN_COOKIE),
            }
        }
        result.map(drop)
    }
}
