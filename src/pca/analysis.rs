//! EOF/PC decomposition of a `(lon, lat, time)` field

use super::operations::{
    flatten_space, remove_time_mean, sorted_eigen, spatial_covariance, unflatten_space,
};
use super::parallel::parallel_reconstruction_errors;
use crate::errors::{HsDycoreError, Result};
use log::{debug, info};
use ndarray::{s, Array1, Array2, Array3, ArrayView3};

/// Result of [`prepare_pca_analysis`]
///
/// `space = nlon * nlat`, `k` is the number of retained modes.
#[derive(Debug, Clone)]
pub struct PcaAnalysis {
    /// Leading PC time series, shape `(k, time)`
    pub a: Array2<f64>,
    /// All PC time series, shape `(time, space)`
    pub pcs: Array2<f64>,
    /// Leading EOFs as columns, shape `(space, k)`
    pub eofs: Array2<f64>,
    /// Field anomalies, shape `(time, space)`
    pub anomalies: Array2<f64>,
    /// Temporal mean, shape `(1, space)`
    pub time_mean: Array2<f64>,
    /// Fraction of total variance per mode, length `space`
    pub frac_var: Array1<f64>,
    /// Covariance eigenvalues in descending order, length `space`
    pub eigenvalues: Array1<f64>,
    /// All eigenvectors as columns, shape `(space, space)`
    pub eigenvectors: Array2<f64>,
    /// `(nlon, nlat)` of the analysed field
    pub grid_shape: (usize, usize),
}

/// Compute EOFs and principal components of a `(lon, lat, time)` field.
///
/// The spatial axes are flattened row-major over `(lon, lat)`, the temporal
/// mean is removed, and the unbiased spatial covariance is eigendecomposed.
/// The first `n_modes` eigenvectors become `eofs` and the matching PCs become
/// `a`; `pcs`, `frac_var` and `eigenvalues` keep every mode.
///
/// # Errors
///
/// Returns [`HsDycoreError::InvalidArgument`] if the field has fewer than two
/// time steps or no grid points, or if `n_modes` is outside `1..=nlon*nlat`.
/// Returns [`HsDycoreError::Computation`] if the covariance is not finite, the
/// eigensolver fails, or the field has no variance.
pub fn prepare_pca_analysis(field: ArrayView3<'_, f64>, n_modes: usize) -> Result<PcaAnalysis> {
    let (nlon, nlat, ntime) = field.dim();
    let space = nlon * nlat;

    if space == 0 {
        return Err(HsDycoreError::invalid(format!(
            "field has an empty spatial grid ({}x{})",
            nlon, nlat
        )));
    }
    if ntime <= 1 {
        return Err(HsDycoreError::invalid(format!(
            "PCA needs at least 2 time steps, got {}",
            ntime
        )));
    }
    if n_modes == 0 || n_modes > space {
        return Err(HsDycoreError::invalid(format!(
            "number of modes must lie in 1..={}, got {}",
            space, n_modes
        )));
    }

    info!(
        "computing {} EOFs of a {}x{} field over {} time steps",
        n_modes, nlon, nlat, ntime
    );

    let x = flatten_space(field);
    let (anomalies, time_mean) = remove_time_mean(x.view())?;
    let covariance = spatial_covariance(anomalies.view())?;
    debug!("covariance matrix: {:?}", covariance.dim());

    let eig = sorted_eigen(covariance.view())?;

    let total: f64 = eig.values.sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(HsDycoreError::Computation(format!(
            "total variance is {}, field has no temporal variability",
            total
        )));
    }
    let frac_var = &eig.values / total;

    let pcs = anomalies.dot(&eig.vectors);
    let eofs = eig.vectors.slice(s![.., ..n_modes]).to_owned();
    let a = pcs.slice(s![.., ..n_modes]).t().to_owned();

    debug!(
        "leading {} modes explain {:.4} of the variance",
        n_modes,
        frac_var.slice(s![..n_modes]).sum()
    );

    Ok(PcaAnalysis {
        a,
        pcs,
        eofs,
        anomalies,
        time_mean,
        frac_var,
        eigenvalues: eig.values,
        eigenvectors: eig.vectors,
        grid_shape: (nlon, nlat),
    })
}

impl PcaAnalysis {
    /// Number of retained modes
    #[must_use]
    pub fn n_modes(&self) -> usize {
        self.eofs.ncols()
    }

    #[must_use]
    pub fn n_times(&self) -> usize {
        self.anomalies.nrows()
    }

    /// Number of grid points (`nlon * nlat`)
    #[must_use]
    pub fn n_space(&self) -> usize {
        self.anomalies.ncols()
    }

    /// Anomalies rebuilt from the retained modes, shape `(time, space)`
    #[must_use]
    pub fn reconstruct(&self) -> Array2<f64> {
        self.a.t().dot(&self.eofs.t())
    }

    /// Anomalies rebuilt from the leading `k` modes, shape `(time, space)`.
    ///
    /// `k` may exceed the retained mode count, up to the full space dimension.
    ///
    /// # Errors
    ///
    /// Returns [`HsDycoreError::InvalidArgument`] if `k > space`.
    pub fn reconstruct_with(&self, k: usize) -> Result<Array2<f64>> {
        if k > self.n_space() {
            return Err(HsDycoreError::invalid(format!(
                "cannot reconstruct from {} modes, only {} exist",
                k,
                self.n_space()
            )));
        }
        let pcs = self.pcs.slice(s![.., ..k]);
        let vectors = self.eigenvectors.slice(s![.., ..k]);
        Ok(pcs.dot(&vectors.t()))
    }

    /// Frobenius norm of `anomalies - reconstruct_with(k)`
    pub fn reconstruction_error(&self, k: usize) -> Result<f64> {
        let approx = self.reconstruct_with(k)?;
        let err = (&self.anomalies - &approx).mapv(|v| v * v).sum().sqrt();
        Ok(err)
    }

    /// Reconstruction error for every `k` in `1..=space`, computed in parallel
    pub fn reconstruction_errors(&self) -> Result<Vec<f64>> {
        parallel_reconstruction_errors(self)
    }

    /// Fraction of variance explained by the leading `k` modes
    #[must_use]
    pub fn cumulative_variance(&self, k: usize) -> f64 {
        let k = k.min(self.frac_var.len());
        self.frac_var.slice(s![..k]).sum()
    }

    /// Retained EOFs as maps, shape `(lon, lat, k)`
    pub fn eof_maps(&self) -> Result<Array3<f64>> {
        let (nlon, nlat) = self.grid_shape;
        unflatten_space(self.eofs.view(), nlon, nlat)
    }

    /// Temporal mean as a `(lon, lat)` map
    pub fn mean_map(&self) -> Result<Array2<f64>> {
        let (nlon, nlat) = self.grid_shape;
        let maps = unflatten_space(self.time_mean.t(), nlon, nlat)?;
        Ok(maps.index_axis_move(ndarray::Axis(2), 0))
    }

    /// Print explained variance of the retained modes
    pub fn print_summary(&self) {
        let (nlon, nlat) = self.grid_shape;
        println!("\n EOF Analysis");
        println!("================");
        println!("   Grid: {} x {} ({} points)", nlon, nlat, self.n_space());
        println!("   Time steps: {}", self.n_times());
        println!("   Retained modes: {}", self.n_modes());
        for (mode, frac) in self.frac_var.iter().take(self.n_modes()).enumerate() {
            println!(
                "    EOF {:>3}: {:>6.2}% (cumulative {:>6.2}%)",
                mode + 1,
                frac * 100.0,
                self.cumulative_variance(mode + 1) * 100.0
            );
        }
    }
}
