//! Typed input records and the Dataset that groups them.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    table::{self, RawTable},
    types::{CustomerId, ProductId, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub name:        Option<String>,
    pub region:      String,
    pub signup_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: ProductId,
    pub name:       Option<String>,
    pub category:   String,
    pub price:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id:   Option<String>,
    pub customer_id:      CustomerId,
    pub product_id:       ProductId,
    pub quantity:         u32,
    pub total_value:      f64,
    pub transaction_date: Timestamp,
}

/// The three input tables, already parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub customers:    Vec<CustomerRecord>,
    pub products:     Vec<ProductRecord>,
    pub transactions: Vec<TransactionRecord>,
}

impl Dataset {
    pub fn new(
        customers: Vec<CustomerRecord>,
        products: Vec<ProductRecord>,
        transactions: Vec<TransactionRecord>,
    ) -> Self {
        Self { customers, products, transactions }
    }

    /// Convert the three raw tables into typed records.
    /// Column presence is checked before any row is read.
    pub fn from_tables(
        customers: &RawTable,
        products: &RawTable,
        transactions: &RawTable,
    ) -> AnalyticsResult<Self> {
        customers.require_columns(&[table::CUSTOMER_ID, table::REGION, table::SIGNUP_DATE])?;
        products.require_columns(&[table::PRODUCT_ID, table::CATEGORY, table::PRICE])?;
        transactions.require_columns(&[
            table::CUSTOMER_ID,
            table::PRODUCT_ID,
            table::TRANSACTION_DATE,
            table::QUANTITY,
            table::TOTAL_VALUE,
        ])?;

        let customers = (0..customers.len())
            .map(|row| {
                Ok(CustomerRecord {
                    customer_id: customers.str_at(row, table::CUSTOMER_ID)?,
                    name:        customers.opt_str_at(row, table::CUSTOMER_NAME),
                    region:      customers.str_at(row, table::REGION)?,
                    signup_date: customers.timestamp_at(row, table::SIGNUP_DATE)?,
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;

        let products = (0..products.len())
            .map(|row| {
                Ok(ProductRecord {
                    product_id: products.str_at(row, table::PRODUCT_ID)?,
                    name:       products.opt_str_at(row, table::PRODUCT_NAME),
                    category:   products.str_at(row, table::CATEGORY)?,
                    price:      products.f64_at(row, table::PRICE)?,
                })
            })
            .collect::<AnalyticsResult<Vec<_>>>()?;

        let transactions = (0..transactions.len())
            .map(|row| parse_transaction(transactions, row))
            .collect::<AnalyticsResult<Vec<_>>>()?;

        Ok(Self { customers, products, transactions })
    }

    pub fn has_customer(&self, customer_id: &str) -> bool {
        self.customers.iter().any(|c| c.customer_id == customer_id)
    }
}

fn parse_transaction(t: &RawTable, row: usize) -> AnalyticsResult<TransactionRecord> {
    let invalid = |column: &str| AnalyticsError::InvalidValue {
        table: t.name.clone(),
        column: column.to_string(),
        row,
    };

    let quantity = t.u64_at(row, table::QUANTITY)?;
    if quantity == 0 || quantity > u32::MAX as u64 {
        return Err(invalid(table::QUANTITY));
    }
    let total_value = t.f64_at(row, table::TOTAL_VALUE)?;
    if total_value < 0.0 {
        return Err(invalid(table::TOTAL_VALUE));
    }

    Ok(TransactionRecord {
        transaction_id:   t.opt_str_at(row, table::TRANSACTION_ID),
        customer_id:      t.str_at(row, table::CUSTOMER_ID)?,
        product_id:       t.str_at(row, table::PRODUCT_ID)?,
        quantity:         quantity as u32,
        total_value,
        transaction_date: t.timestamp_at(row, table::TRANSACTION_DATE)?,
    })
}
