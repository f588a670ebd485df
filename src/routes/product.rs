//! Product CRUD routes.

use crate::handlers::product::{
    create, create_random, delete as delete_handler, list, read, update,
};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn product_routes(state: AppState) -> Router {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/random", post(create_random))
        .route(
            "/products/:id",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}
