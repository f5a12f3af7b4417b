//! Explicit payload validation.
//!
//! Each payload type turns itself into an entity through a function that
//! checks its fields in declaration order and collects one [`Violation`] per
//! failed constraint.

use rust_decimal::Decimal;

use crate::api::problem::Violation;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.0.push(Violation::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }

    /// Required text: present and not blank.
    pub fn not_empty(&mut self, field: &str, value: Option<String>, message: &str) -> Option<String> {
        match value {
            Some(text) if !text.trim().is_empty() => Some(text),
            _ => {
                self.push(field, message);
                None
            }
        }
    }

    /// Required non-text value.
    pub fn not_null<T>(&mut self, field: &str, value: Option<T>, message: &str) -> Option<T> {
        if value.is_none() {
            self.push(field, message);
        }
        value
    }

    /// Required number within an inclusive range.
    pub fn in_range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64, message: &str) -> Option<f64> {
        match value {
            Some(v) if v >= min && v <= max => Some(v),
            _ => {
                self.push(field, message);
                None
            }
        }
    }

    pub fn not_negative(&mut self, field: &str, value: Decimal, message: &str) -> Option<Decimal> {
        if value.is_sign_negative() && !value.is_zero() {
            self.push(field, message);
            None
        } else {
            Some(value)
        }
    }

    /// Fits a `NUMERIC(precision, scale)` column without rounding or overflow.
    pub fn fits_numeric(
        &mut self,
        field: &str,
        value: Decimal,
        precision: u32,
        scale: u32,
        message: &str,
    ) -> Option<Decimal> {
        let whole_digits = precision.saturating_sub(scale);
        let below_limit = 10i128
            .checked_pow(whole_digits)
            .and_then(|n| Decimal::try_from_i128_with_scale(n, 0).ok())
            .map_or(true, |limit| value.abs() < limit);

        if value.normalize().scale() <= scale && below_limit {
            Some(value)
        } else {
            self.push(field, message);
            None
        }
    }

    /// `Ok(value)` when no constraint failed so far, otherwise the collected violations.
    pub fn finish<T>(self, value: Option<T>) -> Result<T, Violations> {
        match value {
            Some(v) if self.is_empty() => Ok(v),
            _ => Err(self),
        }
    }
}

impl From<Violations> for Vec<Violation> {
    fn from(violations: Violations) -> Self {
        violations.0
    }
}
