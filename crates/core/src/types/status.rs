//! Role and status enums shared by the stores and views.

use serde::{Deserialize, Serialize};

/// Account role as issued by the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Storefront customer.
    #[default]
    Client,
    /// Shop floor employee.
    Staff,
    /// Warehouse employee.
    Warehouse,
    /// Delivery courier.
    Courier,
    /// Full administrative access.
    Admin,
}

impl UserRole {
    /// All roles, in the order they are offered in forms.
    pub const ALL: [Self; 5] = [
        Self::Client,
        Self::Staff,
        Self::Warehouse,
        Self::Courier,
        Self::Admin,
    ];

    /// Whether the role may open the admin console.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        !matches!(self, Self::Client)
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Staff => "staff",
            Self::Warehouse => "warehouse",
            Self::Courier => "courier",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("invalid user role: {s}"))
    }
}

/// Delivery state of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Created, no courier yet.
    #[default]
    Created,
    /// A courier has been assigned.
    Assigned,
    /// Out for delivery.
    InTransit,
    /// Handed to the customer.
    Delivered,
    /// Cancelled before delivery.
    Cancelled,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ShipmentStatus {
    /// Statuses an operator can set.
    pub const SETTABLE: [Self; 5] = [
        Self::Created,
        Self::Assigned,
        Self::InTransit,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SETTABLE
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid shipment status: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("baker".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_only_clients_are_not_staff() {
        assert!(!UserRole::Client.is_staff());
        assert!(UserRole::Courier.is_staff());
        assert!(UserRole::Admin.is_staff());
    }

    #[test]
    fn test_unknown_shipment_status_is_tolerated() {
        let status: ShipmentStatus = serde_json::from_str("\"lost_in_space\"").unwrap();
        assert_eq!(status, ShipmentStatus::Unknown);
        let status: ShipmentStatus = serde_json::from_str("\"in_transit\"").unwrap();
        assert_eq!(status, ShipmentStatus::InTransit);
        assert!("unknown".parse::<ShipmentStatus>().is_err());
    }
}
