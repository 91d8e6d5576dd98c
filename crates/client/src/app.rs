//! Application state shared across views.

use std::sync::Arc;

use crate::cart::CartStore;
use crate::config::ClientConfig;
use crate::cookies::{CookieStore, MemoryCookieStore};
use crate::gateway::ApiGateway;
use crate::navigation::Navigator;
use crate::services::{
    CatalogService, OrderService, ShippingService, StaffService, WarehouseService,
};
use crate::session::{FileSessionCache, SessionCache, SessionHandle, SessionStore};

/// Everything a view needs: stores, services and the navigator.
///
/// This struct is cheaply cloneable via `Arc`. Build one per process (or per
/// test) and pass it down; nothing is global.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    gateway: ApiGateway,
    session: SessionStore,
    cart: CartStore,
    catalog: CatalogService,
    warehouse: WarehouseService,
    shipping: ShippingService,
    staff: StaffService,
    orders: OrderService,
}

impl Storefront {
    /// Build the storefront with a file session cache at `config.session_file`.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let cache = Arc::new(FileSessionCache::new(config.session_file.clone()));
        Self::with_cache(config, cache)
    }

    /// Build the storefront with a caller-provided session cache.
    #[must_use]
    pub fn with_cache(config: ClientConfig, cache: Arc<dyn SessionCache>) -> Self {
        let cookies: Arc<dyn CookieStore> = Arc::new(MemoryCookieStore::new());
        let gateway = ApiGateway::new(
            &config,
            cookies,
            SessionHandle::new(cache),
            Navigator::default(),
        );

        Self {
            inner: Arc::new(StorefrontInner {
                session: SessionStore::new(gateway.clone()),
                cart: CartStore::new(gateway.clone()),
                catalog: CatalogService::new(gateway.clone()),
                warehouse: WarehouseService::new(gateway.clone()),
                shipping: ShippingService::new(gateway.clone()),
                staff: StaffService::new(gateway.clone()),
                orders: OrderService::new(gateway.clone()),
                gateway,
                config,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn gateway(&self) -> &ApiGateway {
        &self.inner.gateway
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        self.inner.gateway.navigator()
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn warehouse(&self) -> &WarehouseService {
        &self.inner.warehouse
    }

    #[must_use]
    pub fn shipping(&self) -> &ShippingService {
        &self.inner.shipping
    }

    #[must_use]
    pub fn staff(&self) -> &StaffService {
        &self.inner.staff
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("session", &self.inner.gateway.session())
            .finish_non_exhaustive()
    }
}
