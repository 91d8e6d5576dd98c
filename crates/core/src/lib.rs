//! Bakery Core - Shared types library.
//!
//! This crate provides common types used across all bakery storefront components:
//! - `client` - API gateway wrapper, session and cart stores, admin services
//! - `cli` - Terminal storefront and admin console
//! - `integration-tests` - Mock backend and end-to-end store tests
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, quantities, emails, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
