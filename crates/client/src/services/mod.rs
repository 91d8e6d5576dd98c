//! Typed wrappers over the gateway for catalog, admin and account pages.
//!
//! Services hold no state; every call is one independent request.

mod catalog;
mod orders;
mod shipping;
mod staff;
mod warehouse;

pub use catalog::CatalogService;
pub use orders::OrderService;
pub use shipping::ShippingService;
pub use staff::StaffService;
pub use warehouse::WarehouseService;
