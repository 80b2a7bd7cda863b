//! Empirical orthogonal function (EOF) analysis of spatio-temporal fields
//!
//! This module computes EOFs and principal component (PC) time series of a
//! `(lon, lat, time)` field from the eigendecomposition of its spatial
//! covariance matrix.
//!
//! # Organization
//!
//! - [`operations`]: reshaping, anomalies, covariance and the sorted eigensolver
//! - [`analysis`]: [`prepare_pca_analysis`] and the [`PcaAnalysis`] result
//! - [`parallel`]: parallel evaluation of reconstruction errors
//!
//! # Space ordering
//!
//! The two horizontal axes are flattened row-major over `(lon, lat)`: grid
//! point `(ilon, ilat)` becomes space index `ilon * nlat + ilat`.
//! [`flatten_space`] and [`unflatten_space`] are exact inverses under this
//! convention.

pub mod analysis;
pub mod operations;
pub mod parallel;

pub use analysis::{prepare_pca_analysis, PcaAnalysis};
pub use operations::{
    flatten_space, remove_time_mean, sorted_eigen, spatial_covariance, unflatten_space, EigenPairs,
};
pub use parallel::parallel_reconstruction_errors;
