//! Success envelopes for product responses: `{data}` for one record,
//! `{data, meta: {count}}` for a listing.

use crate::model::Product;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Serialize)]
pub struct Listing {
    pub data: Vec<Product>,
    pub meta: ListingMeta,
}

#[derive(Serialize)]
pub struct ListingMeta {
    pub count: usize,
}

/// 201 with the freshly stored product, id included.
pub fn created(product: Product) -> (StatusCode, Json<Data<Product>>) {
    (StatusCode::CREATED, Json(Data { data: product }))
}

pub fn ok<T: Serialize>(data: T) -> Json<Data<T>> {
    Json(Data { data })
}

pub fn listed(products: Vec<Product>) -> Json<Listing> {
    let count = products.len();
    Json(Listing {
        data: products,
        meta: ListingMeta { count },
    })
}
