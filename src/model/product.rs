//! Product record shape. `NewProduct` can only be built through validation.

use crate::error::ValidationError;
use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Prices are stored as NUMERIC(12, 2).
const PRICE_SCALE: u32 = 2;
const PRICE_LIMIT: i64 = 10_000_000_000;

/// Store-assigned product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ProductId)
    }
}

/// Raw, unvalidated product fields, as synthesized or received from a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductFields {
    pub name: String,
    pub code: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl ProductFields {
    /// Parse a JSON object field by field. `created_at` defaults to now when absent.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let obj = body.as_object().ok_or(ValidationError::WrongType {
            field: "body",
            expected: "a JSON object",
        })?;
        let created_at = match obj.get("created_at") {
            None | Some(Value::Null) => Utc::now(),
            Some(v) => timestamp_field("created_at", v)?,
        };
        Ok(ProductFields {
            name: text_field(obj, "name")?,
            code: text_field(obj, "code")?,
            description: text_field(obj, "description")?,
            category: text_field(obj, "category")?,
            price: decimal_field("price", obj.get("price"))?,
            created_at,
        })
    }
}

fn text_field(
    obj: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing { field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongType { field, expected: "a string" }),
    }
}

fn decimal_field(field: &'static str, v: Option<&Value>) -> Result<Decimal, ValidationError> {
    let wrong = ValidationError::WrongType { field, expected: "a decimal number" };
    let text = match v {
        None | Some(Value::Null) => return Err(ValidationError::Missing { field }),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(wrong),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| wrong)
}

fn timestamp_field(field: &'static str, v: &Value) -> Result<DateTime<Utc>, ValidationError> {
    let wrong = ValidationError::WrongType { field, expected: "an RFC 3339 timestamp" };
    let s = v.as_str().ok_or(wrong.clone())?;
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| wrong)
}

/// Validated product fields without an id: the input to create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    name: String,
    code: String,
    description: String,
    category: String,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl NewProduct {
    /// Validate structural constraints. Does not check uniqueness or existence.
    /// `created_at` is truncated to microseconds, the precision of the column.
    pub fn new(fields: ProductFields) -> Result<Self, ValidationError> {
        if fields.name.trim().is_empty() {
            return Err(ValidationError::Invalid {
                field: "name",
                reason: "must not be empty".into(),
            });
        }
        let mut price = fields.price;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ValidationError::Invalid {
                field: "price",
                reason: "must not be negative".into(),
            });
        }
        if price.normalize().scale() > PRICE_SCALE {
            return Err(ValidationError::Invalid {
                field: "price",
                reason: format!("must have at most {} decimal places", PRICE_SCALE),
            });
        }
        if price >= Decimal::from(PRICE_LIMIT) {
            return Err(ValidationError::Invalid {
                field: "price",
                reason: format!("must be less than {}", PRICE_LIMIT),
            });
        }
        price.rescale(PRICE_SCALE);
        price.set_sign_positive(true);
        Ok(NewProduct {
            name: fields.name,
            code: fields.code,
            description: fields.description,
            category: fields.category,
            price,
            created_at: fields.created_at.trunc_subsecs(6),
        })
    }

    /// Parse and validate a JSON request body.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        Self::new(ProductFields::from_json(body)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn into_fields(self) -> ProductFields {
        ProductFields {
            name: self.name,
            code: self.code,
            description: self.description,
            category: self.category,
            price: self.price,
            created_at: self.created_at,
        }
    }
}

impl TryFrom<ProductFields> for NewProduct {
    type Error = ValidationError;

    fn try_from(fields: ProductFields) -> Result<Self, Self::Error> {
        NewProduct::new(fields)
    }
}

/// A persisted product: store-assigned id plus validated fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(flatten)]
    pub data: NewProduct,
}

impl Product {
    pub fn new(id: ProductId, data: NewProduct) -> Self {
        Product { id, data }
    }
}
