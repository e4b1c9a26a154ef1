//! Service wiring: pick a store backend and build the application services
//! the handlers run against.

use std::sync::Arc;

use storefront_infra::store::memory::InMemoryStore;
use storefront_infra::store::postgres::PostgresStores;
use storefront_infra::{
    AddressStore, CartManager, CatalogStore, CouponRedemption, CouponStore, OrderService,
    SupportStore,
};

pub struct AppServices {
    pub carts: CartManager,
    pub redemption: CouponRedemption,
    pub orders: OrderService,
    pub catalog: Arc<dyn CatalogStore>,
    pub coupons: Arc<dyn CouponStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub support: Arc<dyn SupportStore>,
}

/// Wire services against Postgres when `DATABASE_URL` is set, otherwise
/// against the in-memory backend (tests, local development).
pub async fn build_services() -> AppServices {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            tracing::info!("using postgres store backend");
            postgres_services(&url).await
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set; using in-memory store backend");
            in_memory_services()
        }
    }
}

pub fn in_memory_services() -> AppServices {
    let store = Arc::new(InMemoryStore::new());
    AppServices {
        carts: CartManager::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        ),
        redemption: CouponRedemption::new(store.clone()),
        orders: OrderService::new(store.clone(), store.clone()),
        catalog: store.clone(),
        coupons: store.clone(),
        addresses: store.clone(),
        support: store,
    }
}

async fn postgres_services(database_url: &str) -> AppServices {
    // Startup failure is fatal; nothing useful can run without the database.
    let stores = PostgresStores::connect(database_url)
        .await
        .expect("failed to connect to DATABASE_URL");
    stores
        .run_migrations()
        .await
        .expect("failed to apply database schema");

    let catalog = Arc::new(stores.catalog());
    let carts = Arc::new(stores.carts());
    let coupons = Arc::new(stores.coupons());
    let orders = Arc::new(stores.orders());
    let addresses = Arc::new(stores.addresses());
    let support = Arc::new(stores.support());

    AppServices {
        carts: CartManager::new(
            carts.clone(),
            catalog.clone(),
            coupons.clone(),
            addresses.clone(),
        ),
        redemption: CouponRedemption::new(coupons.clone()),
        orders: OrderService::new(carts, orders),
        catalog,
        coupons,
        addresses,
        support,
    }
}
