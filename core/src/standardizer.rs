//! Standardizer — zero mean, unit variance per column.
//!
//! RULE: There is no fitted scaler object. Every caller passes the rows it
//! wants scaled and gets a fresh fit back; nothing is kept between calls.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    feature_builder::FeatureSchema,
};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedMatrix {
    pub schema: FeatureSchema,
    /// One row per input row, one column per schema column.
    pub values: Array2<f64>,
}

impl StandardizedMatrix {
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }
}

/// Per-column parameters of one fit. Returned for inspection only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameters {
    pub means:  Vec<f64>,
    /// Population standard deviation, or 1.0 for a constant column.
    pub scales: Vec<f64>,
    /// True where every row held the same value; those columns map to 0.
    pub constant: Vec<bool>,
}

pub fn standardize(
    schema: &FeatureSchema,
    rows: &[Vec<f64>],
) -> AnalyticsResult<(StandardizedMatrix, FitParameters)> {
    if rows.is_empty() {
        return Err(AnalyticsError::EmptyPopulation);
    }
    let width = schema.len();
    if let Some(bad) = rows.iter().find(|r| r.len() != width) {
        return Err(AnalyticsError::SchemaMismatch {
            expected: width,
            actual: bad.len(),
        });
    }

    let mut values = Array2::from_shape_fn((rows.len(), width), |(i, j)| rows[i][j]);
    let n = rows.len() as f64;

    let mut means = Vec::with_capacity(width);
    let mut scales = Vec::with_capacity(width);
    let mut constant = Vec::with_capacity(width);
    for mut column in values.axis_iter_mut(Axis(1)) {
        // Exact comparison. The summed mean of a repeated value drifts by
        // a few ulps, so the computed std cannot decide constancy.
        let first = column[0];
        if column.iter().all(|&x| x == first) {
            means.push(first);
            scales.push(1.0);
            constant.push(true);
            column.fill(0.0);
            continue;
        }

        let mean = column.sum() / n;
        let std = (column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
        if std > 0.0 && std.is_finite() {
            column.mapv_inplace(|x| (x - mean) / std);
            scales.push(std);
            constant.push(false);
        } else {
            column.fill(0.0);
            scales.push(1.0);
            constant.push(true);
        }
        means.push(mean);
    }

    Ok((
        StandardizedMatrix {
            schema: schema.clone(),
            values,
        },
        FitParameters { means, scales, constant },
    ))
}
