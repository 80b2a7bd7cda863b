//! NetCDF input for the analysis helpers and output of EOF results
//!
//! Engine datasets store 3-D prognostic variables as `(time, layer, lat, lon)`.
//! [`load_field`] picks one horizontal `(lon, lat, time)` field out of such a
//! variable, and [`PcaWriter`] stores a [`PcaAnalysis`] next to the source
//! coordinates.

use crate::errors::{HsDycoreError, Result};
use crate::pca::PcaAnalysis;
use chrono::Utc;
use log::{debug, warn};
use ndarray::{Array1, Array3, ArrayD, Axis, Ix3};
use netcdf::{create, AttributeValue, File};
use std::{fs, path::Path};

/// Which variable and which slice of it to read as a `(lon, lat, time)` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    pub variable: String,
    pub lon_dim: String,
    pub lat_dim: String,
    pub time_dim: String,
    /// Index to take along every other dimension, e.g. `("layer", 7)`
    pub fixed: Vec<(String, usize)>,
}

impl FieldSelector {
    /// Select `variable` with the engine's default dimension names
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            lon_dim: "lon".to_string(),
            lat_dim: "lat".to_string(),
            time_dim: "time".to_string(),
            fixed: Vec::new(),
        }
    }

    /// Pin `dim` to `index`
    #[must_use]
    pub fn with_index(mut self, dim: impl Into<String>, index: usize) -> Self {
        self.fixed.push((dim.into(), index));
        self
    }

    fn is_field_axis(&self, name: &str) -> bool {
        name == self.lon_dim || name == self.lat_dim || name == self.time_dim
    }
}

/// Read a `(lon, lat, time)` field from a NetCDF variable.
///
/// Dimensions other than lon/lat/time are reduced by the index given in
/// [`FieldSelector::fixed`]; a dimension of length 1 may be left unpinned.
/// Values equal to the variable's `_FillValue` become NaN.
///
/// # Errors
///
/// Returns [`HsDycoreError::VariableNotFound`] or
/// [`HsDycoreError::DimensionNotFound`] for missing names and
/// [`HsDycoreError::InvalidArgument`] for unpinned or out-of-range extra
/// dimensions.
pub fn load_field(file: &File, selector: &FieldSelector) -> Result<Array3<f64>> {
    let var = file
        .variable(&selector.variable)
        .ok_or_else(|| HsDycoreError::VariableNotFound {
            var: selector.variable.clone(),
        })?;

    let mut dim_names: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let shape: Vec<usize> = var
        .dimensions()
        .iter()
        .map(netcdf::Dimension::len)
        .collect();

    let mut values = var.get_values::<f64, _>(..)?;
    if let Some(fill) = fill_value(&var) {
        let mut replaced = 0_usize;
        for v in values.iter_mut().filter(|v| **v == fill) {
            *v = f64::NAN;
            replaced += 1;
        }
        if replaced > 0 {
            warn!(
                "{} fill values in '{}' replaced by NaN",
                replaced, selector.variable
            );
        }
    }

    debug!(
        "loaded '{}' with dimensions {:?} and shape {:?}",
        selector.variable, dim_names, shape
    );
    let mut data = ArrayD::from_shape_vec(shape, values)?;

    // Highest axis first so the remaining axis numbers stay valid.
    for axis in (0..dim_names.len()).rev() {
        if selector.is_field_axis(&dim_names[axis]) {
            continue;
        }
        let len = data.len_of(Axis(axis));
        let index = match selector.fixed.iter().find(|(d, _)| *d == dim_names[axis]) {
            Some(&(_, index)) => index,
            None if len == 1 => 0,
            None => {
                return Err(HsDycoreError::invalid(format!(
                    "dimension '{}' of '{}' has length {}; choose an index for it",
                    dim_names[axis], selector.variable, len
                )))
            }
        };
        if index >= len {
            return Err(HsDycoreError::invalid(format!(
                "index {} out of range for dimension '{}' of length {}",
                index, dim_names[axis], len
            )));
        }
        data = data.index_axis_move(Axis(axis), index);
        dim_names.remove(axis);
    }

    let position = |dim: &str| {
        dim_names
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| HsDycoreError::DimensionNotFound {
                var: selector.variable.clone(),
                dim: dim.to_string(),
            })
    };
    let order = vec![
        position(&selector.lon_dim)?,
        position(&selector.lat_dim)?,
        position(&selector.time_dim)?,
    ];

    let field = data.permuted_axes(order).into_dimensionality::<Ix3>()?;
    Ok(field.as_standard_layout().into_owned())
}

/// Read a 1-D coordinate variable as `f64`.
pub fn load_time_index(file: &File, var_name: &str) -> Result<Array1<f64>> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| HsDycoreError::VariableNotFound {
            var: var_name.to_string(),
        })?;
    if var.dimensions().len() != 1 {
        return Err(HsDycoreError::invalid(format!(
            "'{}' has {} dimensions, expected a 1-D coordinate",
            var_name,
            var.dimensions().len()
        )));
    }
    Ok(Array1::from(var.get_values::<f64, _>(..)?))
}

fn fill_value(var: &netcdf::Variable) -> Option<f64> {
    var.attribute("_FillValue")
        .and_then(|attr| match attr.value().ok()? {
            AttributeValue::Float(v) => Some(f64::from(v)),
            AttributeValue::Double(v) => Some(v),
            AttributeValue::Short(v) => Some(f64::from(v)),
            AttributeValue::Int(v) => Some(f64::from(v)),
            _ => None,
        })
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    var.attribute(name)
        .and_then(|attr| match attr.value().ok()? {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

/// Writes a [`PcaAnalysis`] to a new NetCDF file
///
/// Layout of the output:
///
/// | variable    | dimensions          |
/// |-------------|---------------------|
/// | `eof`       | `(mode, lat, lon)`  |
/// | `pc`        | `(mode, time)`      |
/// | `frac_var`  | `(eigen)`           |
/// | `eigenvalue`| `(eigen)`           |
/// | `time_mean` | `(lat, lon)`        |
///
/// `lon`, `lat` and `time` coordinates are copied from the source file when it
/// has them with matching lengths.
pub struct PcaWriter<'a> {
    input_file: &'a File,
    output_path: &'a Path,
}

impl<'a> PcaWriter<'a> {
    pub fn new(input_file: &'a File, output_path: &'a Path) -> Self {
        Self {
            input_file,
            output_path,
        }
    }

    /// Write `analysis` of the field described by `selector`, replacing any
    /// existing file.
    pub fn write(&self, analysis: &PcaAnalysis, selector: &FieldSelector) -> Result<()> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        let (nlon, nlat) = analysis.grid_shape;
        let n_modes = analysis.n_modes();
        let n_times = analysis.n_times();

        let mut file = create(self.output_path)?;
        file.add_dimension("lon", nlon)?;
        file.add_dimension("lat", nlat)?;
        file.add_dimension("time", n_times)?;
        file.add_dimension("mode", n_modes)?;
        file.add_dimension("eigen", analysis.n_space())?;

        for (source, target, len) in [
            (&selector.lon_dim, "lon", nlon),
            (&selector.lat_dim, "lat", nlat),
            (&selector.time_dim, "time", n_times),
        ] {
            self.copy_coordinate(&mut file, source, target, len)?;
        }

        let eofs = analysis
            .eof_maps()?
            .permuted_axes([2, 1, 0])
            .as_standard_layout()
            .into_owned();
        {
            let mut var = file.add_variable::<f64>("eof", &["mode", "lat", "lon"])?;
            var.put_attribute("long_name", "empirical orthogonal function")?;
            var.put(eofs.view(), ..)?;
        }

        {
            let mut var = file.add_variable::<f64>("pc", &["mode", "time"])?;
            var.put_attribute("long_name", "principal component time series")?;
            var.put(analysis.a.view(), ..)?;
        }

        {
            let mut var = file.add_variable::<f64>("frac_var", &["eigen"])?;
            var.put_attribute("long_name", "fraction of total variance")?;
            var.put(analysis.frac_var.view(), ..)?;
        }

        {
            let mut var = file.add_variable::<f64>("eigenvalue", &["eigen"])?;
            var.put_attribute("long_name", "covariance eigenvalue")?;
            var.put(analysis.eigenvalues.view(), ..)?;
        }

        {
            let mean = analysis
                .mean_map()?
                .reversed_axes()
                .as_standard_layout()
                .into_owned();
            let mut var = file.add_variable::<f64>("time_mean", &["lat", "lon"])?;
            if let Some(source) = self.input_file.variable(&selector.variable) {
                for name in ["units", "long_name"] {
                    if let Some(value) = string_attribute(&source, name) {
                        var.put_attribute(name, value)?;
                    }
                }
            }
            var.put(mean.view(), ..)?;
        }

        file.add_attribute("source_variable", selector.variable.as_str())?;
        file.add_attribute(
            "history",
            format!("Created by hs_dycore on {}", Utc::now().to_rfc3339()),
        )?;

        Ok(())
    }

    fn copy_coordinate(
        &self,
        file: &mut netcdf::FileMut,
        source: &str,
        target: &str,
        len: usize,
    ) -> Result<()> {
        let Some(var) = self.input_file.variable(source) else {
            return Ok(());
        };
        if var.dimensions().len() != 1 || var.dimensions()[0].len() != len {
            warn!("coordinate '{}' does not match the field, not copied", source);
            return Ok(());
        }
        let values = Array1::from(var.get_values::<f64, _>(..)?);
        let mut coord = file.add_variable::<f64>(target, &[target])?;
        if let Some(units) = string_attribute(&var, "units") {
            coord.put_attribute("units", units)?;
        }
        coord.put(values.view(), ..)?;
        Ok(())
    }
}
