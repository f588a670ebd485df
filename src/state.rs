//! Shared application state for all routes.

use crate::generator::ProductGenerator;
use crate::store::ProductRepository;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    /// Built once at startup; every handler goes through this store.
    pub store: Arc<dyn ProductRepository>,
    /// Source of synthesized products for `POST /products/random`.
    pub generator: Arc<Mutex<ProductGenerator>>,
}

impl AppState {
    /// State with an entropy-seeded generator.
    pub fn new(store: Arc<dyn ProductRepository>) -> Self {
        Self::with_generator(store, ProductGenerator::from_entropy())
    }

    pub fn with_generator(store: Arc<dyn ProductRepository>, generator: ProductGenerator) -> Self {
        AppState {
            store,
            generator: Arc::new(Mutex::new(generator)),
        }
    }
}
