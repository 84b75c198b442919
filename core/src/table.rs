//! Loosely-typed input tables.
//!
//! The collaborator that reads source files hands the core a RawTable per
//! input: a table name plus one JSON object per row, keyed by column name.
//! Typed accessors here are the only place that inspects raw cell values.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    types::Timestamp,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

pub const CUSTOMERS: &str = "customers";
pub const PRODUCTS: &str = "products";
pub const TRANSACTIONS: &str = "transactions";

// ── Column names ──────────────────────────────────────────────

pub const CUSTOMER_ID: &str = "CustomerID";
pub const CUSTOMER_NAME: &str = "CustomerName";
pub const REGION: &str = "Region";
pub const SIGNUP_DATE: &str = "SignupDate";

pub const PRODUCT_ID: &str = "ProductID";
pub const PRODUCT_NAME: &str = "ProductName";
pub const CATEGORY: &str = "Category";
pub const PRICE: &str = "Price";

pub const TRANSACTION_ID: &str = "TransactionID";
pub const TRANSACTION_DATE: &str = "TransactionDate";
pub const QUANTITY: &str = "Quantity";
pub const TOTAL_VALUE: &str = "TotalValue";

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub rows: Vec<Map<String, Value>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, rows: Vec<Map<String, Value>>) -> Self {
        Self { name: name.into(), rows }
    }

    /// Parse a JSON array of objects.
    pub fn from_json_str(name: impl Into<String>, json: &str) -> AnalyticsResult<Self> {
        let rows: Vec<Map<String, Value>> = serde_json::from_str(json)?;
        Ok(Self::new(name, rows))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A column is missing when no row carries it. An empty table has no
    /// rows to inspect and passes.
    pub fn require_columns(&self, columns: &[&str]) -> AnalyticsResult<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        for column in columns {
            if !self.rows.iter().any(|r| r.contains_key(*column)) {
                return Err(AnalyticsError::MissingColumn {
                    table: self.name.clone(),
                    column: (*column).to_string(),
                });
            }
        }
        Ok(())
    }

    fn cell(&self, row: usize, column: &str) -> AnalyticsResult<&Value> {
        match self.rows[row].get(column) {
            Some(Value::Null) | None => Err(self.invalid(row, column)),
            Some(v) => Ok(v),
        }
    }

    fn invalid(&self, row: usize, column: &str) -> AnalyticsError {
        AnalyticsError::InvalidValue {
            table: self.name.clone(),
            column: column.to_string(),
            row,
        }
    }

    /// Identifiers and categories may arrive as strings or bare numbers.
    pub fn str_at(&self, row: usize, column: &str) -> AnalyticsResult<String> {
        match self.cell(row, column)? {
            Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(self.invalid(row, column)),
        }
    }

    pub fn opt_str_at(&self, row: usize, column: &str) -> Option<String> {
        self.str_at(row, column).ok()
    }

    pub fn f64_at(&self, row: usize, column: &str) -> AnalyticsResult<f64> {
        let value = match self.cell(row, column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(row, column))
    }

    /// Whole numbers only; `3.0` is accepted, `2.5` is not.
    pub fn u64_at(&self, row: usize, column: &str) -> AnalyticsResult<u64> {
        let value = match self.cell(row, column)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        value.ok_or_else(|| self.invalid(row, column))
    }

    pub fn timestamp_at(&self, row: usize, column: &str) -> AnalyticsResult<Timestamp> {
        match self.cell(row, column)? {
            Value::String(s) => parse_timestamp(s).ok_or_else(|| self.invalid(row, column)),
            _ => Err(self.invalid(row, column)),
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC) and bare dates
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_all_timestamp_shapes() {
        let rfc = parse_timestamp("2024-01-19T03:12:55Z").unwrap();
        assert_eq!((rfc.year(), rfc.hour()), (2024, 3));

        let spaced = parse_timestamp("2024-08-25 12:38:23").unwrap();
        assert_eq!((spaced.month(), spaced.minute()), (8, 38));

        let date = parse_timestamp("2022-07-10").unwrap();
        assert_eq!((date.day(), date.hour()), (10, 0));

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn numeric_cells_are_read_leniently() {
        let table = RawTable::from_json_str(
            "t",
            r#"[{"id": 17, "q": "3", "v": 2.5, "whole": 4.0, "frac": 1.5}]"#,
        )
        .unwrap();
        assert_eq!(table.str_at(0, "id").unwrap(), "17");
        assert_eq!(table.u64_at(0, "q").unwrap(), 3);
        assert_eq!(table.u64_at(0, "whole").unwrap(), 4);
        assert!(table.u64_at(0, "frac").is_err());
        assert!((table.f64_at(0, "v").unwrap() - 2.5).abs() < 1e-12);
    }
}
