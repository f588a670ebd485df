//! PostgreSQL-backed product store. One pooled connection and one statement per call.

use crate::error::{MappingError, PersistenceError, StoreError};
use crate::model::{NewProduct, Product, ProductFields, ProductId};
use crate::pool::ConnectionManager;
use crate::store::ProductRepository;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Decode, Postgres, Row, Type};
use std::sync::Arc;

pub const PRODUCTS_TABLE: &str = "products";

const INSERT_SQL: &str = "INSERT INTO products \
     (name, code, description, category, price, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING id";
const SELECT_BY_ID_SQL: &str =
    "SELECT id, name, code, description, category, price, created_at FROM products WHERE id = $1";
const SELECT_ALL_SQL: &str =
    "SELECT id, name, code, description, category, price, created_at FROM products";
const UPDATE_SQL: &str = "UPDATE products SET name = $1, code = $2, description = $3, \
     category = $4, price = $5, created_at = $6 WHERE id = $7";
const DELETE_SQL: &str = "DELETE FROM products WHERE id = $1";

/// Create the products table if missing. `code` carries no unique constraint.
pub async fn ensure_products_table(manager: &ConnectionManager) -> Result<(), StoreError> {
    let mut conn = manager.acquire().await?;
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            price NUMERIC(12, 2) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
        PRODUCTS_TABLE
    );
    sqlx::query(&ddl)
        .execute(&mut *conn)
        .await
        .map_err(|e| PersistenceError::new("create products table", e))?;
    Ok(())
}

/// Map one row to a product, column by column. Missing columns, undecodable values
/// and values the entity model rejects are all reported, never coerced.
pub fn product_from_row(row: &PgRow) -> Result<Product, MappingError> {
    let id: i64 = column(row, "id")?;
    let fields = ProductFields {
        name: column(row, "name")?,
        code: column(row, "code")?,
        description: column(row, "description")?,
        category: column(row, "category")?,
        price: column(row, "price")?,
        created_at: column(row, "created_at")?,
    };
    Ok(Product::new(ProductId(id), NewProduct::new(fields)?))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, MappingError>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<T, _>(name)
        .map_err(|e| MappingError::from_column(name, e))
}

/// Product store over the shared connection manager.
#[derive(Clone)]
pub struct PgProductStore {
    manager: Arc<ConnectionManager>,
}

impl PgProductStore {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        PgProductStore { manager }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }
}

#[async_trait]
impl ProductRepository for PgProductStore {
    async fn create(&self, product: &NewProduct) -> Result<ProductId, StoreError> {
        let mut conn = self.manager.acquire().await?;
        tracing::debug!(sql = %INSERT_SQL, name = %product.name(), code = %product.code(), "query");
        let id: i64 = sqlx::query_scalar(INSERT_SQL)
            .bind(product.name())
            .bind(product.code())
            .bind(product.description())
            .bind(product.category())
            .bind(product.price())
            .bind(product.created_at())
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| PersistenceError::new("insert product", e))?;
        Ok(ProductId(id))
    }

    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let mut conn = self.manager.acquire().await?;
        tracing::debug!(sql = %SELECT_BY_ID_SQL, id = id.0, "query");
        let row = sqlx::query(SELECT_BY_ID_SQL)
            .bind(id.0)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| PersistenceError::new("select product", e))?;
        Ok(row.as_ref().map(product_from_row).transpose()?)
    }

    async fn update(&self, id: ProductId, product: &NewProduct) -> Result<bool, StoreError> {
        let mut conn = self.manager.acquire().await?;
        tracing::debug!(sql = %UPDATE_SQL, id = id.0, "query");
        let result = sqlx::query(UPDATE_SQL)
            .bind(product.name())
            .bind(product.code())
            .bind(product.description())
            .bind(product.category())
            .bind(product.price())
            .bind(product.created_at())
            .bind(id.0)
            .execute(&mut *conn)
            .await
            .map_err(|e| PersistenceError::new("update product", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut conn = self.manager.acquire().await?;
        tracing::debug!(sql = %DELETE_SQL, id = id.0, "query");
        let result = sqlx::query(DELETE_SQL)
            .bind(id.0)
            .execute(&mut *conn)
            .await
            .map_err(|e| PersistenceError::new("delete product", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        let mut conn = self.manager.acquire().await?;
        tracing::debug!(sql = %SELECT_ALL_SQL, "query");
        let rows = sqlx::query(SELECT_ALL_SQL)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| PersistenceError::new("list products", e))?;
        let products = rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    async fn health_check(&self) -> Result<String, StoreError> {
        Ok(self.manager.health_check().await?)
    }
}
