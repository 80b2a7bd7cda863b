//! Parallel evaluation of truncated reconstructions
//!
//! Each truncation level is independent, so the sweep over `k` is spread
//! across the rayon pool.

use super::analysis::PcaAnalysis;
use crate::errors::Result;
use log::debug;
use rayon::prelude::*;

/// Reconstruction error of `analysis` for every `k` in `1..=space`.
///
/// Entry `k - 1` holds the Frobenius norm of the anomalies minus their
/// reconstruction from the leading `k` modes. The sequence is non-increasing
/// up to rounding and ends near zero.
///
/// # Errors
///
/// Propagates errors from [`PcaAnalysis::reconstruction_error`].
pub fn parallel_reconstruction_errors(analysis: &PcaAnalysis) -> Result<Vec<f64>> {
    let space = analysis.n_space();

    debug!(
        "evaluating {} truncation levels across {} threads",
        space,
        rayon::current_num_threads()
    );

    (1..=space)
        .into_par_iter()
        .map(|k| analysis.reconstruction_error(k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pca::prepare_pca_analysis;
    use ndarray::Array3;

    #[test]
    fn errors_shrink_with_more_modes() {
        let field = Array3::from_shape_fn((3, 3, 25), |(i, j, t)| {
            let t = t as f64;
            (i as f64 + 1.0) * (0.3 * t).sin() + (j as f64) * (0.11 * t * t).cos()
                + ((i * j + 1) as f64) * (0.05 * t).cos()
        });
        let pca = prepare_pca_analysis(field.view(), 1).unwrap();
        let errors = parallel_reconstruction_errors(&pca).unwrap();

        assert_eq!(errors.len(), 9);
        for pair in errors.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9, "{} > {}", pair[1], pair[0]);
        }
        assert!(errors[8] < 1e-8);
    }
}
