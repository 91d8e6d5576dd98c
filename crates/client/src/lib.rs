//! Bakery storefront client.
//!
//! Talks to the bakery API gateway on behalf of a storefront or admin UI:
//!
//! - [`ApiGateway`] attaches the bearer token, keeps cookies and turns any 401
//!   into a cleared session and a redirect to the login page.
//! - [`SessionStore`] logs users in and out and bootstraps a saved session.
//! - [`CartStore`] mirrors the server cart, reconciling after every change.
//! - [`services`] wrap the catalog, warehouse, shipping, staff and order APIs.
//!
//! [`Storefront`] wires them together around one [`ClientConfig`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod cart;
pub mod config;
pub mod cookies;
pub mod error;
pub mod gateway;
pub mod models;
pub mod navigation;
pub mod services;
pub mod session;

pub use app::Storefront;
pub use cart::{CartLine, CartState, CartStore};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorKind};
pub use gateway::{ApiGateway, ApiPath};
pub use navigation::{AdminPage, Navigator, Route};
pub use session::{SessionState, SessionStatus, SessionStore};
