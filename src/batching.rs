//! Train/validation splitting and fixed-size batching of time series
//!
//! A dataset is a time index of length `N` paired with an `N × M` feature
//! matrix. [`prepare_data_batches`] splits it at `floor(N * train_fraction)`
//! into a training and a validation partition and cuts each partition into
//! windows of `batch_size` consecutive rows.
//!
//! Window starts advance by [`BatchConfig::stride`] (2 by default), so
//! consecutive windows overlap by `batch_size - 2` rows when `batch_size > 2`.
//! A window starting at offset `s` of a partition of length `L` is emitted only
//! when `s + batch_size <= L - 1`; the last row of a partition never closes a
//! window and trailing partial windows are dropped.

use crate::errors::{HsDycoreError, Result};
use log::debug;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

/// Default fraction of rows assigned to the training partition
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Default number of rows per batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default offset between consecutive batch starts
pub const DEFAULT_STRIDE: usize = 2;

/// Batching parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    /// Fraction of rows in the training partition, in `(0, 1]`
    pub train_fraction: f64,
    /// Rows per batch
    pub batch_size: usize,
    /// Offset between consecutive batch starts
    pub stride: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            train_fraction: DEFAULT_TRAIN_FRACTION,
            batch_size: DEFAULT_BATCH_SIZE,
            stride: DEFAULT_STRIDE,
        }
    }
}

impl BatchConfig {
    /// Create a configuration with the default stride
    pub fn new(train_fraction: f64, batch_size: usize) -> Self {
        Self {
            train_fraction,
            batch_size,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.train_fraction.is_finite()
            || self.train_fraction <= 0.0
            || self.train_fraction > 1.0
        {
            return Err(HsDycoreError::invalid(format!(
                "train_fraction must lie in (0, 1], got {}",
                self.train_fraction
            )));
        }
        if self.batch_size == 0 {
            return Err(HsDycoreError::invalid("batch_size must be positive"));
        }
        if self.stride == 0 {
            return Err(HsDycoreError::invalid("stride must be positive"));
        }
        Ok(())
    }
}

/// A time index paired row-for-row with a feature matrix
#[derive(Debug, Clone)]
pub struct TimeSeriesDataset<T, F> {
    time: Array1<T>,
    features: Array2<F>,
}

impl<T: Clone, F: Clone> TimeSeriesDataset<T, F> {
    /// Pair a time index with a feature matrix.
    ///
    /// # Errors
    ///
    /// Returns [`HsDycoreError::InvalidArgument`] if the matrix row count
    /// differs from the time index length.
    pub fn new(time: Array1<T>, features: Array2<F>) -> Result<Self> {
        check_lengths(time.len(), features.nrows())?;
        Ok(Self { time, features })
    }

    /// Number of time steps
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn time(&self) -> ArrayView1<'_, T> {
        self.time.view()
    }

    pub fn features(&self) -> ArrayView2<'_, F> {
        self.features.view()
    }
}

/// One window of consecutive rows
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T, F> {
    /// 0-based row offset of the first row, relative to the whole dataset
    pub start: usize,
    /// Time index slice
    pub time: Array1<T>,
    /// Feature rows matching `time`
    pub features: Array2<F>,
}

impl<T, F> Batch<T, F> {
    /// Number of rows in the batch
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// 0-based offset one past the last row, relative to the whole dataset
    pub fn end(&self) -> usize {
        self.start + self.len()
    }
}

/// Result of [`prepare_data_batches`]
#[derive(Debug, Clone)]
pub struct BatchSplit<T, F> {
    /// Training batches in increasing-offset order
    pub train: Vec<Batch<T, F>>,
    /// Validation batches in increasing-offset order
    pub valid: Vec<Batch<T, F>>,
    /// Number of rows in the training partition (`floor(N * train_fraction)`)
    pub split_index: usize,
}

impl<T, F> BatchSplit<T, F> {
    /// Print a short overview of the split
    pub fn print_summary(&self, total_rows: usize) {
        println!("\n Batch Split");
        println!("===============");
        println!("   Rows: {}", total_rows);
        println!("   Split index: {}", self.split_index);
        println!(
            "   Training: {} rows, {} batches",
            self.split_index,
            self.train.len()
        );
        println!(
            "   Validation: {} rows, {} batches",
            total_rows.saturating_sub(self.split_index),
            self.valid.len()
        );
    }
}

/// Split a time series into training and validation batches.
///
/// Uses the default stride of [`DEFAULT_STRIDE`].
///
/// # Errors
///
/// Returns [`HsDycoreError::InvalidArgument`] if the lengths of `time_index`
/// and `features` differ, `train_fraction` lies outside `(0, 1]`, or
/// `batch_size` is zero. Oversized batches are not an error; they yield empty
/// batch lists.
pub fn prepare_data_batches<T: Clone, F: Clone>(
    time_index: ArrayView1<'_, T>,
    features: ArrayView2<'_, F>,
    train_fraction: f64,
    batch_size: usize,
) -> Result<BatchSplit<T, F>> {
    let config = BatchConfig::new(train_fraction, batch_size);
    split_and_batch(time_index, features, &config)
}

/// Split a validated dataset using an explicit configuration.
pub fn prepare_data_batches_with<T: Clone, F: Clone>(
    dataset: &TimeSeriesDataset<T, F>,
    config: &BatchConfig,
) -> Result<BatchSplit<T, F>> {
    split_and_batch(dataset.time(), dataset.features(), config)
}

/// `floor(n_rows * train_fraction)`
pub fn split_index(n_rows: usize, train_fraction: f64) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let split = (n_rows as f64 * train_fraction).floor() as usize;
    split.min(n_rows)
}

/// 0-based start offsets of the windows cut from a partition of `len` rows
pub fn window_starts(len: usize, batch_size: usize, stride: usize) -> Vec<usize> {
    if batch_size == 0 || stride == 0 || len <= batch_size {
        return Vec::new();
    }
    let last_start = len - 1 - batch_size;
    (0..=last_start).step_by(stride).collect()
}

fn split_and_batch<T: Clone, F: Clone>(
    time_index: ArrayView1<'_, T>,
    features: ArrayView2<'_, F>,
    config: &BatchConfig,
) -> Result<BatchSplit<T, F>> {
    check_lengths(time_index.len(), features.nrows())?;
    config.validate()?;

    let n_rows = time_index.len();
    let split = split_index(n_rows, config.train_fraction);

    let train = cut_partition(time_index, features, 0, split, config);
    let valid = cut_partition(time_index, features, split, n_rows, config);

    debug!(
        "split {} rows at {}: {} training / {} validation batches of {}",
        n_rows,
        split,
        train.len(),
        valid.len(),
        config.batch_size
    );

    Ok(BatchSplit {
        train,
        valid,
        split_index: split,
    })
}

fn cut_partition<T: Clone, F: Clone>(
    time_index: ArrayView1<'_, T>,
    features: ArrayView2<'_, F>,
    from: usize,
    to: usize,
    config: &BatchConfig,
) -> Vec<Batch<T, F>> {
    let time_part = time_index.slice(s![from..to]);
    let feature_part = features.slice(s![from..to, ..]);

    window_starts(to - from, config.batch_size, config.stride)
        .into_iter()
        .map(|offset| {
            let rows = offset..offset + config.batch_size;
            Batch {
                start: from + offset,
                time: time_part.slice(s![rows.clone()]).to_owned(),
                features: feature_part.slice(s![rows, ..]).to_owned(),
            }
        })
        .collect()
}

fn check_lengths(time_len: usize, n_rows: usize) -> Result<()> {
    if time_len != n_rows {
        return Err(HsDycoreError::invalid(format!(
            "time index has {} entries but feature matrix has {} rows",
            time_len, n_rows
        )));
    }
    Ok(())
}
