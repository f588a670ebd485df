//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Malformed entity fields. Raised before any store access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{field} {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("invalid range for {field}: {reason}")]
    InvalidRange { field: &'static str, reason: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing { field }
            | ValidationError::WrongType { field, .. }
            | ValidationError::Invalid { field, .. }
            | ValidationError::InvalidRange { field, .. } => *field,
        }
    }
}

/// The pool cannot be established, is gone, or cannot hand out a connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error("no connection pool established")]
    NotConnected,
    #[error("connection pool is closed")]
    Closed,
    #[error("timed out waiting for a pooled connection")]
    AcquireTimeout,
    #[error("acquire connection: {0}")]
    Acquire(#[source] sqlx::Error),
    #[error("health check: {0}")]
    HealthCheck(#[source] sqlx::Error),
}

impl ConnectionError {
    /// Classify an error returned by `Pool::acquire`.
    pub(crate) fn from_acquire(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => ConnectionError::AcquireTimeout,
            sqlx::Error::PoolClosed => ConnectionError::Closed,
            other => ConnectionError::Acquire(other),
        }
    }
}

/// A statement failed after a connection was acquired.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("{operation}: constraint {constraint} violated")]
    Constraint {
        operation: &'static str,
        constraint: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("{operation}: {source}")]
    Statement {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl PersistenceError {
    pub(crate) fn new(operation: &'static str, source: sqlx::Error) -> Self {
        let constraint = match &source {
            sqlx::Error::Database(db) => db.constraint().map(String::from),
            _ => None,
        };
        match constraint {
            Some(constraint) => PersistenceError::Constraint {
                operation,
                constraint,
                source,
            },
            None => PersistenceError::Statement { operation, source },
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            PersistenceError::Constraint { operation, .. }
            | PersistenceError::Statement { operation, .. } => *operation,
        }
    }
}

/// A returned row does not fit the entity model (schema drift).
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("row is missing column {0}")]
    MissingColumn(String),
    #[error("column {column} holds an incompatible value: {reason}")]
    IncompatibleValue { column: String, reason: String },
    #[error("row fails entity validation: {0}")]
    InvalidEntity(#[from] ValidationError),
}

impl MappingError {
    /// Classify a `Row::try_get` failure for `column`.
    pub(crate) fn from_column(column: &str, e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnNotFound(name) => MappingError::MissingColumn(name),
            sqlx::Error::ColumnDecode { source, .. } => MappingError::IncompatibleValue {
                column: column.to_string(),
                reason: source.to_string(),
            },
            other => MappingError::IncompatibleValue {
                column: column.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Failure of a product store operation. Absence is not an error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Failure while inserting synthesized products.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Body is not JSON, or not declared as JSON.
    #[error("invalid body: {}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SeedError> for AppError {
    fn from(e: SeedError) -> Self {
        match e {
            SeedError::Validation(e) => AppError::Validation(e),
            SeedError::Store(e) => AppError::Store(e),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Body(rejection) => (rejection.status(), "invalid_body"),
            AppError::Store(StoreError::Connection(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "connection_error")
            }
            AppError::Store(StoreError::Persistence(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error")
            }
            AppError::Store(StoreError::Mapping(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "mapping_error")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, code, "request failed");
        }
        let details = match &self {
            AppError::Validation(e) => Some(serde_json::json!({ "field": e.field() })),
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
