//! 2-D PCA projection of a standardized matrix, for scatter displays.
//!
//! Not part of the clustering contract: labels and the quality score never
//! depend on it. The two leading eigenvectors of the covariance matrix are
//! found by power iteration with deflation.

use crate::{
    config::ProjectionConfig,
    error::{AnalyticsError, AnalyticsResult},
    rng::StreamRng,
    standardizer::StandardizedMatrix,
    types::CustomerId,
};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub customer_id: CustomerId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub points: Vec<ProjectedPoint>,
    /// Variance captured by each of the two components.
    pub explained_variance: [f64; 2],
}

pub fn project_2d(
    matrix: &StandardizedMatrix,
    customer_ids: &[CustomerId],
    config: &ProjectionConfig,
    rng: &mut StreamRng,
) -> AnalyticsResult<Projection> {
    if matrix.is_empty() {
        return Err(AnalyticsError::EmptyPopulation);
    }
    if customer_ids.len() != matrix.len() {
        return Err(AnalyticsError::SchemaMismatch {
            expected: matrix.len(),
            actual: customer_ids.len(),
        });
    }

    let n = matrix.len();
    let centered = match matrix.values.mean_axis(Axis(0)) {
        Some(means) => &matrix.values - &means,
        None => return Err(AnalyticsError::EmptyPopulation),
    };

    let mut cov = centered.t().dot(&centered) / (n.max(2) - 1) as f64;
    let first = leading_component(&cov, &[], config, rng);
    deflate(&mut cov, &first);
    let second = leading_component(&cov, std::slice::from_ref(&first.vector), config, rng);

    let xs = centered.dot(&first.vector);
    let ys = centered.dot(&second.vector);
    let points = customer_ids
        .iter()
        .zip(xs.iter().zip(ys.iter()))
        .map(|(id, (&x, &y))| ProjectedPoint {
            customer_id: id.clone(),
            x,
            y,
        })
        .collect();

    log::debug!(
        "projection[{}]: {n} points, explained variance {:.4} / {:.4}",
        rng.name,
        first.eigenvalue,
        second.eigenvalue
    );

    Ok(Projection {
        points,
        explained_variance: [first.eigenvalue, second.eigenvalue],
    })
}

struct Component {
    vector:     Array1<f64>,
    eigenvalue: f64,
}

/// Power iteration, kept orthogonal to `previous`. A matrix with no
/// remaining variance yields the zero vector.
fn leading_component(
    cov: &Array2<f64>,
    previous: &[Array1<f64>],
    config: &ProjectionConfig,
    rng: &mut StreamRng,
) -> Component {
    let dim = cov.nrows();
    let zero = Component { vector: Array1::zeros(dim), eigenvalue: 0.0 };
    let trace = cov.diag().sum();
    if dim == 0 || trace <= 0.0 {
        return zero;
    }

    let mut v: Array1<f64> = (0..dim).map(|_| rng.next_f64() - 0.5).collect();
    orthogonalize(&mut v, previous);
    if !normalize(&mut v) {
        return zero;
    }

    for _ in 0..config.max_iterations {
        let mut w = cov.dot(&v);
        orthogonalize(&mut w, previous);
        if w.dot(&w).sqrt() <= 1e-12 * trace {
            return zero;
        }
        normalize(&mut w);
        let delta = (&w - &v).fold(0.0_f64, |acc, d| acc.max(d.abs()));
        v = w;
        if delta <= config.tolerance {
            break;
        }
    }

    // Orient so the largest-magnitude loading is positive.
    let pivot = v.fold(0.0_f64, |acc, &x| if x.abs() > acc.abs() { x } else { acc });
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }

    let eigenvalue = v.dot(&cov.dot(&v)).max(0.0);
    Component { vector: v, eigenvalue }
}

fn deflate(cov: &mut Array2<f64>, c: &Component) {
    let dim = c.vector.len();
    let outer = Array2::from_shape_fn((dim, dim), |(i, j)| c.vector[i] * c.vector[j]);
    cov.scaled_add(-c.eigenvalue, &outer);
}

fn orthogonalize(v: &mut Array1<f64>, basis: &[Array1<f64>]) {
    for b in basis {
        let proj = v.dot(b);
        v.scaled_add(-proj, b);
    }
}

fn normalize(v: &mut Array1<f64>) -> bool {
    let len = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if len == 0.0 {
        return false;
    }
    v.mapv_inplace(|x| x / len);
    true
}
