//! Code derivation and synthetic product data for seeding and tests.
//!
//! [`unique_code`] is pure. Everything random goes through [`ProductGenerator`], which
//! owns its RNG so tests can ask for a seeded, repeatable sequence.

use crate::error::ValidationError;
use crate::model::ProductFields;
use chrono::Utc;
use md5::{Digest, Md5};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Category given to every synthesized product.
pub const TEST_CATEGORY: &str = "test";

pub const LABEL_MIN_LEN: usize = 8;
pub const LABEL_MAX_LEN: usize = 18;

/// Synthesized prices fall in 0.01..=10000.00.
const SYNTH_MIN_CENTS: i64 = 1;
const SYNTH_MAX_CENTS: i64 = 1_000_000;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// MD5 of `name` followed by `category`, as 32 lowercase hex digits.
///
/// Not a security primitive: collisions can be constructed on purpose.
pub fn unique_code(name: &str, category: &str) -> String {
    let digest = Md5::new()
        .chain_update(name.as_bytes())
        .chain_update(category.as_bytes())
        .finalize();
    format!("{:x}", digest)
}

pub struct ProductGenerator<R = StdRng> {
    rng: R,
}

impl ProductGenerator<StdRng> {
    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        ProductGenerator::new(StdRng::from_entropy())
    }

    /// Same seed, same sequence.
    pub fn seeded(seed: u64) -> Self {
        ProductGenerator::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ProductGenerator<R> {
    pub fn new(rng: R) -> Self {
        ProductGenerator { rng }
    }

    /// ASCII letters with one interior space; length in `LABEL_MIN_LEN..=LABEL_MAX_LEN`.
    pub fn random_label(&mut self) -> String {
        let len = self.rng.gen_range(LABEL_MIN_LEN..=LABEL_MAX_LEN);
        let space_at = self.rng.gen_range(1..len - 1);
        (0..len)
            .map(|i| {
                if i == space_at {
                    ' '
                } else {
                    LETTERS[self.rng.gen_range(0..LETTERS.len())] as char
                }
            })
            .collect()
    }

    /// Uniform over the two-decimal values in `[min, max]`.
    pub fn random_price(&mut self, min: Decimal, max: Decimal) -> Result<Decimal, ValidationError> {
        let range_err = |reason: String| ValidationError::InvalidRange { field: "price", reason };
        if min.is_sign_negative() && !min.is_zero() {
            return Err(range_err(format!("min {} is negative", min)));
        }
        if min > max {
            return Err(range_err(format!("min {} exceeds max {}", min, max)));
        }
        let hundred = Decimal::from(100);
        let low = min
            .checked_mul(hundred)
            .and_then(|v| v.ceil().to_i64())
            .ok_or_else(|| range_err(format!("min {} is out of range", min)))?;
        let high = max
            .checked_mul(hundred)
            .and_then(|v| v.floor().to_i64())
            .ok_or_else(|| range_err(format!("max {} is out of range", max)))?;
        if low > high {
            return Err(range_err(format!("no two-decimal value between {} and {}", min, max)));
        }
        Ok(self.cents_between(low, high))
    }

    /// A full random field set with `category = TEST_CATEGORY` and a derived code.
    pub fn synthesize_product(&mut self) -> ProductFields {
        let name = self.random_label();
        let description = self.random_label();
        let code = unique_code(&name, TEST_CATEGORY);
        ProductFields {
            name,
            code,
            description,
            category: TEST_CATEGORY.to_string(),
            price: self.cents_between(SYNTH_MIN_CENTS, SYNTH_MAX_CENTS),
            created_at: Utc::now(),
        }
    }

    fn cents_between(&mut self, low: i64, high: i64) -> Decimal {
        Decimal::new(self.rng.gen_range(low..=high), 2)
    }
}
