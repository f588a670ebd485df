//! Product store: the CRUD contract and its implementations.
//!
//! Absence is a normal outcome: `get_by_id` yields `None` and `update`/`delete` yield
//! `false` when no row matches. Errors are reserved for connection, statement and
//! mapping failures.

mod memory;
mod postgres;

pub use memory::MemoryProductStore;
pub use postgres::{ensure_products_table, product_from_row, PgProductStore, PRODUCTS_TABLE};

use crate::error::{SeedError, StoreError};
use crate::generator::ProductGenerator;
use crate::model::{NewProduct, Product, ProductId};
use async_trait::async_trait;
use rand::Rng;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert every field; the store assigns and returns the id.
    async fn create(&self, product: &NewProduct) -> Result<ProductId, StoreError>;

    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Full replace of every field. `Ok(false)` when no row has `id`.
    async fn update(&self, id: ProductId, product: &NewProduct) -> Result<bool, StoreError>;

    /// `Ok(false)` when no row has `id`.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;

    /// Every row, in no particular order. Empty table gives an empty vec.
    async fn list_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Readiness check; returns the backing store's version string.
    async fn health_check(&self) -> Result<String, StoreError>;
}

/// Insert `count` synthesized products. Returns the assigned ids in insertion order.
pub async fn seed_products<R>(
    repo: &dyn ProductRepository,
    generator: &mut ProductGenerator<R>,
    count: usize,
) -> Result<Vec<ProductId>, SeedError>
where
    R: Rng + Send,
{
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let product = NewProduct::new(generator.synthesize_product())?;
        ids.push(repo.create(&product).await?);
    }
    tracing::info!(count = ids.len(), "seeded products");
    Ok(ids)
}
