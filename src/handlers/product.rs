//! Product CRUD handlers: list, create, create_random, read, update, delete.

use crate::error::AppError;
use crate::model::{NewProduct, Product, ProductId};
use crate::response::{created, listed, ok};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::sync::PoisonError;

fn parse_id(id_str: &str) -> Result<ProductId, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product id '{}'", id_str)))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = state.store.list_all().await?;
    Ok(listed(rows))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let product = NewProduct::from_json(&body)?;
    let id = state.store.create(&product).await?;
    tracing::info!(id = %id, code = %product.code(), "product created");
    Ok(created(Product::new(id, product)))
}

/// Synthesize a product server-side, store it and return it.
pub async fn create_random(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let fields = state
        .generator
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .synthesize_product();
    let product = NewProduct::new(fields)?;
    let id = state.store.create(&product).await?;
    tracing::info!(id = %id, code = %product.code(), "random product created");
    Ok(created(Product::new(id, product)))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let product = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str))?;
    Ok(ok(product))
}

/// Full replace: every field must be supplied.
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    let product = NewProduct::from_json(&body)?;
    if !state.store.update(id, &product).await? {
        return Err(AppError::NotFound(id_str));
    }
    Ok(ok(Product::new(id, product)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    if !state.store.delete(id).await? {
        return Err(AppError::NotFound(id_str));
    }
    tracing::info!(id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
