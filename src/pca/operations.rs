//! Core linear-algebra steps of the EOF analysis
//!
//! Every function here is pure and works on `f64` data laid out as
//! `(time, space)` once the field has been flattened.

use crate::errors::{HsDycoreError, Result};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};
use std::cmp::Ordering;

/// Iteration budget per matrix row for the symmetric eigensolver
const EIGEN_ITERATIONS_PER_ROW: usize = 1000;

/// Flatten a `(lon, lat, time)` field into a `(time, space)` matrix.
///
/// Grid point `(ilon, ilat)` maps to column `ilon * nlat + ilat`.
#[must_use]
pub fn flatten_space(field: ArrayView3<'_, f64>) -> Array2<f64> {
    let (nlon, nlat, ntime) = field.dim();
    Array2::from_shape_fn((ntime, nlon * nlat), |(t, j)| field[[j / nlat, j % nlat, t]])
}

/// Expand `(space, k)` columns back to `(lon, lat, k)` maps.
///
/// Inverse of [`flatten_space`] for the spatial axes.
///
/// # Errors
///
/// Returns [`HsDycoreError::InvalidArgument`] if the row count is not
/// `nlon * nlat`.
pub fn unflatten_space(
    columns: ArrayView2<'_, f64>,
    nlon: usize,
    nlat: usize,
) -> Result<Array3<f64>> {
    let (space, k) = columns.dim();
    if space != nlon * nlat {
        return Err(HsDycoreError::invalid(format!(
            "cannot unflatten {} space points onto a {}x{} grid",
            space, nlon, nlat
        )));
    }
    Ok(Array3::from_shape_fn((nlon, nlat, k), |(i, l, m)| {
        columns[[i * nlat + l, m]]
    }))
}

/// Subtract the temporal mean from each column.
///
/// Returns `(anomalies, time_mean)` where `time_mean` has shape `(1, space)`.
///
/// # Errors
///
/// Returns [`HsDycoreError::InvalidArgument`] if the matrix has no rows.
pub fn remove_time_mean(x: ArrayView2<'_, f64>) -> Result<(Array2<f64>, Array2<f64>)> {
    let mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| HsDycoreError::invalid("cannot average over zero time steps"))?
        .insert_axis(Axis(0));
    let anomalies = &x - &mean;
    Ok((anomalies, mean))
}

/// Unbiased spatial covariance `Xᵀ X / (ntime - 1)` of an anomaly matrix.
///
/// # Errors
///
/// Returns [`HsDycoreError::InvalidArgument`] for fewer than two time steps
/// and [`HsDycoreError::Computation`] if any entry is not finite.
pub fn spatial_covariance(anomalies: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let ntime = anomalies.nrows();
    if ntime <= 1 {
        return Err(HsDycoreError::invalid(format!(
            "covariance needs at least 2 time steps, got {}",
            ntime
        )));
    }

    #[allow(clippy::cast_precision_loss)]
    let cov = anomalies.t().dot(&anomalies) / (ntime - 1) as f64;

    if let Some(bad) = cov.iter().position(|v| !v.is_finite()) {
        let n = cov.ncols();
        return Err(HsDycoreError::Computation(format!(
            "covariance entry ({}, {}) is not finite",
            bad / n,
            bad % n
        )));
    }
    Ok(cov)
}

/// Eigenvalues and column eigenvectors sorted by descending eigenvalue
#[derive(Debug, Clone)]
pub struct EigenPairs {
    pub values: Array1<f64>,
    /// Column `i` is the unit eigenvector for `values[i]`
    pub vectors: Array2<f64>,
}

/// Eigendecompose a symmetric matrix and sort the pairs by descending
/// eigenvalue.
///
/// Ties keep the solver's order. Eigenvector signs are whatever the solver
/// returns.
///
/// # Errors
///
/// Returns [`HsDycoreError::InvalidArgument`] for a non-square matrix and
/// [`HsDycoreError::Computation`] for non-finite entries or when the solver
/// does not converge.
pub fn sorted_eigen(matrix: ArrayView2<'_, f64>) -> Result<EigenPairs> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(HsDycoreError::invalid(format!(
            "eigendecomposition needs a square matrix, got {}x{}",
            rows, cols
        )));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(HsDycoreError::Computation(
            "matrix contains non-finite entries".to_string(),
        ));
    }

    let n = rows;
    let dense = DMatrix::from_fn(n, n, |i, j| matrix[[i, j]]);
    let eig = SymmetricEigen::try_new(dense, f64::EPSILON, EIGEN_ITERATIONS_PER_ROW * n.max(1))
        .ok_or_else(|| {
            HsDycoreError::Computation(format!(
                "symmetric eigensolver did not converge for a {}x{} matrix",
                n, n
            ))
        })?;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b]
            .partial_cmp(&eig.eigenvalues[a])
            .unwrap_or(Ordering::Equal)
    });

    let values = order.iter().map(|&i| eig.eigenvalues[i]).collect::<Array1<f64>>();
    let vectors = Array2::from_shape_fn((n, n), |(r, c)| eig.eigenvectors[(r, order[c])]);

    Ok(EigenPairs { values, vectors })
}
