//! hs_dycore: Held–Suarez dynamical core runs and their post-processing
//!
//! The crate drives an external atmospheric model through a Held–Suarez-forced
//! dry dynamical core experiment and provides two numerical helpers for the
//! resulting data:
//!
//! - **EOF/PCA analysis** of `(lon, lat, time)` fields ([`pca`])
//! - **Train/validation batching** of time series for machine learning
//!   ([`batching`])
//!
//! ## Module Organization
//!
//! - [`batching`]: split and window time series datasets
//! - [`pca`]: anomalies, covariance, sorted eigendecomposition, EOFs and PCs
//! - [`simulation`]: run configuration, engine trait and the spin-up/record driver
//! - [`netcdf_io`]: load fields from engine datasets, write EOF results
//! - [`inspect`]: dataset structure summaries
//! - [`parallel`]: rayon pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hs_dycore::prelude::*;
//! use ndarray::Array3;
//!
//! let field = Array3::from_shape_fn((16, 8, 400), |(i, j, t)| {
//!     280.0 + ((i + 2 * j) as f64 * 0.1 + t as f64 * 0.05).sin()
//! });
//! let pca = prepare_pca_analysis(field.view(), 3)?;
//! let features = pca.a.t().to_owned();
//! let time = ndarray::Array1::range(0.0, 400.0, 1.0);
//! let split = prepare_data_batches(time.view(), features.view(), 0.8, 10)?;
//! println!("{} training batches", split.train.len());
//! # Ok::<(), hs_dycore::HsDycoreError>(())
//! ```

pub mod batching;
pub mod errors;
pub mod inspect;
pub mod netcdf_io;
pub mod parallel;
pub mod pca;
pub mod simulation;

pub use batching::{prepare_data_batches, prepare_data_batches_with};
pub use errors::{HsDycoreError, Result};
pub use pca::{prepare_pca_analysis, PcaAnalysis};
pub use simulation::run_held_suarez;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::batching::{
        prepare_data_batches, prepare_data_batches_with, Batch, BatchConfig, BatchSplit,
        TimeSeriesDataset,
    };
    pub use crate::errors::{HsDycoreError, Result};
    pub use crate::netcdf_io::{load_field, load_time_index, FieldSelector, PcaWriter};
    pub use crate::parallel::ParallelConfig;
    pub use crate::pca::{prepare_pca_analysis, PcaAnalysis};
    pub use crate::simulation::{
        find_output_artifacts, run_held_suarez, CommandEngine, SimulationConfig, SimulationEngine,
    };
}
