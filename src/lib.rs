//! Product catalog: pooled PostgreSQL store, CRUD contract and a thin HTTP surface.

pub mod config;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod model;
pub mod pool;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;

pub use config::{Credentials, DatabaseConfig, PoolSettings};
pub use error::{
    AppError, ConfigError, ConnectionError, MappingError, PersistenceError, SeedError, StoreError,
    ValidationError,
};
pub use generator::{unique_code, ProductGenerator, TEST_CATEGORY};
pub use model::{NewProduct, Product, ProductFields, ProductId};
pub use pool::ConnectionManager;
pub use response::{created, listed, ok};
pub use routes::{build_app, common_routes, product_routes};
pub use state::AppState;
pub use store::{
    ensure_products_table, seed_products, MemoryProductStore, PgProductStore, ProductRepository,
};
