//! Rayon thread pool configuration
//!
//! Only the data-parallel parts of the analysis (see
//! [`parallel_reconstruction_errors`](crate::pca::parallel_reconstruction_errors))
//! use the pool; the numerical helpers themselves are sequential.

use crate::errors::{HsDycoreError, Result};
use log::info;
use rayon::ThreadPoolBuilder;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// `None` keeps rayon's default (one thread per core)
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Use every available CPU core
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Build the global rayon pool.
    ///
    /// # Errors
    ///
    /// Returns [`HsDycoreError::InvalidArgument`] for zero threads and
    /// [`HsDycoreError::ThreadPoolError`] if the global pool was already built.
    pub fn setup_global_pool(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => Err(HsDycoreError::invalid("thread count must be positive")),
            Some(num_threads) => {
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        HsDycoreError::ThreadPoolError(format!(
                            "Failed to initialize thread pool with {} threads: {}",
                            num_threads, e
                        ))
                    })?;
                info!("configured parallel processing with {} threads", num_threads);
                Ok(())
            }
            None => {
                info!(
                    "using default thread pool ({} threads)",
                    rayon::current_num_threads()
                );
                Ok(())
            }
        }
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
}

/// Snapshot of the current pool size and core count
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
    }
}

impl ParallelInfo {
    pub fn print_info(&self) {
        println!("📊 Parallel Processing Information:");
        println!("   Current threads: {}", self.current_threads);
        println!("   Available CPU cores: {}", self.available_cores);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        assert!(ParallelConfig::default().num_threads.is_none());
        assert_eq!(ParallelConfig::with_threads(4).num_threads, Some(4));
        assert!(ParallelConfig::all_cores().num_threads.unwrap() > 0);
    }

    #[test]
    fn zero_threads_rejected() {
        let err = ParallelConfig::with_threads(0).setup_global_pool().unwrap_err();
        assert!(matches!(err, HsDycoreError::InvalidArgument(_)));
    }

    #[test]
    fn info_reports_positive_counts() {
        let info = get_parallel_info();
        assert!(info.current_threads > 0);
        assert!(info.available_cores > 0);
    }
}
