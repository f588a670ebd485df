//! In-process product store with the same contract as the PostgreSQL one.
//! Used to exercise the HTTP layer without a database.

use crate::error::{ConnectionError, StoreError};
use crate::model::{NewProduct, Product, ProductId};
use crate::store::ProductRepository;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock};

pub struct MemoryProductStore {
    rows: RwLock<BTreeMap<ProductId, NewProduct>>,
    // Ids are never handed out twice, even after delete.
    next_id: AtomicI64,
    available: AtomicBool,
}

impl Default for MemoryProductStore {
    fn default() -> Self {
        MemoryProductStore {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) the store; while unavailable every call fails
    /// with a connection error.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ConnectionError::NotConnected.into())
        }
    }
}

#[async_trait]
impl ProductRepository for MemoryProductStore {
    async fn create(&self, product: &NewProduct) -> Result<ProductId, StoreError> {
        self.check_available()?;
        let id = ProductId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.rows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, product.clone());
        Ok(id)
    }

    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.check_available()?;
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.get(&id).map(|data| Product::new(id, data.clone())))
    }

    async fn update(&self, id: ProductId, product: &NewProduct) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        match rows.get_mut(&id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        Ok(rows.remove(&id).is_some())
    }

    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        self.check_available()?;
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rows
            .iter()
            .map(|(id, data)| Product::new(*id, data.clone()))
            .collect())
    }

    async fn health_check(&self) -> Result<String, StoreError> {
        self.check_available()?;
        Ok(format!("in-memory {}", env!("CARGO_PKG_VERSION")))
    }
}
