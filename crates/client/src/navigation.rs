//! Page routes and the navigator that tracks which page is showing.
//!
//! Views move between pages with [`Navigator::navigate`]. Only the gateway can
//! force a redirect, and only to the login page after a 401.

use std::fmt;
use std::sync::Arc;

use bakery_core::ProductId;
use parking_lot::RwLock;

/// Admin console sub-pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminPage {
    Home,
    Products,
    Warehouses,
    StorageRules,
    Shipments,
    Staff,
}

/// A page of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    Catalog,
    Product(ProductId),
    Cart,
    Login,
    Register,
    Profile,
    Orders,
    Admin(AdminPage),
}

impl Route {
    /// Path of the page, as it would appear in a browser.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Catalog => "/".to_string(),
            Self::Product(id) => format!("/product/{id}"),
            Self::Cart => "/cart".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Profile => "/profile".to_string(),
            Self::Orders => "/orders".to_string(),
            Self::Admin(page) => match page {
                AdminPage::Home => "/admin".to_string(),
                AdminPage::Products => "/admin/products".to_string(),
                AdminPage::Warehouses => "/admin/warehouses".to_string(),
                AdminPage::StorageRules => "/admin/storage-rules".to_string(),
                AdminPage::Shipments => "/admin/shipments".to_string(),
                AdminPage::Staff => "/admin/staff".to_string(),
            },
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Shared current-page state.
#[derive(Clone, Default)]
pub struct Navigator {
    current: Arc<RwLock<Route>>,
}

impl Navigator {
    /// The page currently showing.
    #[must_use]
    pub fn current(&self) -> Route {
        *self.current.read()
    }

    /// Move to another page.
    pub fn navigate(&self, route: Route) {
        let mut current = self.current.write();
        let from = *current;
        if from != route {
            tracing::debug!(from = %from, to = %route, "navigate");
            *current = route;
        }
    }

    /// Send the user to the login page unless already there.
    ///
    /// Returns `true` if a redirect happened.
    pub(crate) fn redirect_to_login(&self) -> bool {
        let mut current = self.current.write();
        let from = *current;
        if from == Route::Login {
            return false;
        }
        tracing::info!(from = %from, "redirecting to login");
        *current = Route::Login;
        true
    }
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("current", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_to_login_once() {
        let navigator = Navigator::default();
        navigator.navigate(Route::Cart);
        assert!(navigator.redirect_to_login());
        assert_eq!(navigator.current(), Route::Login);
        assert!(!navigator.redirect_to_login());
    }

    #[test]
    fn test_clones_share_state() {
        let navigator = Navigator::default();
        let view = navigator.clone();
        navigator.navigate(Route::Product(ProductId::new(42)));
        assert_eq!(view.current().path(), "/product/42");
    }
}
