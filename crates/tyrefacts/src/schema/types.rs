//! Core type definitions for cells and columns.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for canonical period dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single cell value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// True missing-value marker.
    #[default]
    Missing,
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    /// Parse a trimmed string as a number. Non-finite results are rejected so
    /// that literals like `nan` or `inf` never become numbers.
    pub fn parse_number(raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Some(Value::Integer(n));
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Value::Decimal(f)),
            _ => None,
        }
    }

    /// Build a value from a canonical date string; non-ISO strings stay text.
    pub fn from_date_str(raw: &str) -> Value {
        match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
            Ok(date) => Value::Date(date),
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Decimal(_))
    }

    /// Numeric view of the cell. Text is not coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Decimal(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric view that also accepts text holding a number.
    pub fn to_number(&self) -> Option<Value> {
        match self {
            Value::Integer(_) | Value::Decimal(_) => Some(self.clone()),
            Value::Text(s) => Value::parse_number(s),
            _ => None,
        }
    }

    /// True when the cell holds a number equal to zero, including text such as `"0.0"`.
    pub fn is_zero(&self) -> bool {
        self.to_number()
            .and_then(|v| v.as_f64())
            .map(|f| f == 0.0)
            .unwrap_or(false)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(x) => write!(f, "{}", x),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => decimal_bits(*a) == decimal_bits(*b),
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

// Decimals are always finite (see `parse_number`), so bitwise equality is total.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Missing => {}
            Value::Integer(n) => n.hash(state),
            Value::Decimal(x) => decimal_bits(*x).hash(state),
            Value::Date(d) => d.hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

fn decimal_bits(x: f64) -> u64 {
    if x == 0.0 { 0.0f64.to_bits() } else { x.to_bits() }
}

/// Column type derived from the cells it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers only.
    Integer,
    /// Numbers, at least one with a fractional representation.
    Decimal,
    /// Calendar dates.
    Date,
    /// Text values.
    Text,
    /// A mix of incompatible kinds (e.g. dates and numbers).
    Mixed,
    /// Every cell is missing.
    Empty,
}

impl ColumnType {
    /// Derive the column type from its cells, ignoring missing values.
    pub fn of<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
        let mut current = ColumnType::Empty;
        for value in values {
            let kind = match value {
                Value::Missing => continue,
                Value::Integer(_) => ColumnType::Integer,
                Value::Decimal(_) => ColumnType::Decimal,
                Value::Date(_) => ColumnType::Date,
                Value::Text(_) => ColumnType::Text,
            };
            current = current.merge(kind);
        }
        current
    }

    fn merge(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (Empty, t) | (t, Empty) => t,
            (a, b) if a == b => a,
            (Integer, Decimal) | (Decimal, Integer) => Decimal,
            (Text, _) | (_, Text) => Text,
            _ => Mixed,
        }
    }

    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Decimal)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Decimal => "decimal",
            ColumnType::Date => "date",
            ColumnType::Text => "text",
            ColumnType::Mixed => "mixed",
            ColumnType::Empty => "empty",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Role a column plays in the long/wide fact model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Part of the composite key (size, brand, country, date...).
    Identifier,
    /// Holds the name of the fact a row represents.
    MetricName,
    /// Holds the measured number (a period column or the generic value column).
    MetricValue,
}
