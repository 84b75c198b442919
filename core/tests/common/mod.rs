//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use lookalike_core::{
    dataset::{CustomerRecord, Dataset, ProductRecord, TransactionRecord},
    rng::StreamRng,
    table::parse_timestamp,
};

/// Route library `log` output to the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn customer(id: &str, region: &str) -> CustomerRecord {
    CustomerRecord {
        customer_id: id.into(),
        name: None,
        region: region.into(),
        signup_date: parse_timestamp("2023-01-01").unwrap(),
    }
}

pub fn product(id: &str, category: &str, price: f64) -> ProductRecord {
    ProductRecord {
        product_id: id.into(),
        name: None,
        category: category.into(),
        price,
    }
}

pub fn txn(customer_id: &str, product_id: &str, quantity: u32, total_value: f64, date: &str) -> TransactionRecord {
    TransactionRecord {
        transaction_id: None,
        customer_id: customer_id.into(),
        product_id: product_id.into(),
        quantity,
        total_value,
        transaction_date: parse_timestamp(date).unwrap(),
    }
}

/// C1: two transactions worth 100 in "A". C2: one of 50 in "B". C3: none.
pub fn three_customer_dataset() -> Dataset {
    Dataset::new(
        vec![
            customer("C1", "Europe"),
            customer("C2", "Asia"),
            customer("C3", "Europe"),
        ],
        vec![product("P1", "A", 30.0), product("P2", "B", 50.0)],
        vec![
            txn("C1", "P1", 2, 60.0, "2024-01-05 10:00:00"),
            txn("C1", "P1", 1, 40.0, "2024-01-06 11:30:00"),
            txn("C2", "P2", 1, 50.0, "2024-01-05 09:15:00"),
        ],
    )
}

/// A varied, reproducible population: `n` customers, six products in three
/// categories, zero to five transactions each.
pub fn synthetic_dataset(n: usize, seed: u64) -> Dataset {
    let mut rng = StreamRng::new(seed, 0);
    let regions = ["Asia", "Europe", "North America", "South America"];
    let products = vec![
        product("P01", "Books", 12.0),
        product("P02", "Books", 25.0),
        product("P03", "Electronics", 180.0),
        product("P04", "Electronics", 420.0),
        product("P05", "Home Decor", 35.0),
        product("P06", "Home Decor", 60.0),
    ];

    let customers: Vec<CustomerRecord> = (0..n)
        .map(|i| customer(&format!("C{:04}", i + 1), regions[i % regions.len()]))
        .collect();

    let mut transactions = Vec::new();
    for c in &customers {
        let count = rng.next_index(6);
        for day in 0..count {
            let p = &products[rng.next_index(products.len())];
            let qty = 1 + rng.next_index(4) as u32;
            transactions.push(txn(
                &c.customer_id,
                &p.product_id,
                qty,
                p.price * qty as f64,
                &format!("2024-03-{:02} 12:00:00", day + 1),
            ));
        }
    }

    Dataset::new(customers, products, transactions)
}

pub fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

pub fn population_std(xs: &[f64]) -> f64 {
    let m = mean(xs);
    (xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
}
