//! Run configuration for the Held–Suarez dynamical core
//!
//! Everything the engine needs is collected into a [`ModelConfig`] before the
//! engine sees it. Nothing is adjusted after handoff.

use crate::errors::{HsDycoreError, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TRUNCATION: u32 = 31;
pub const DEFAULT_LAYER_COUNT: u32 = 8;
pub const DEFAULT_SPINUP_DAYS: u32 = 100;
pub const DEFAULT_SIM_DAYS: u32 = 400;

/// Time step at T31; other resolutions scale it by `31 / truncation`
pub const DEFAULT_TIME_STEP_AT_T31: Duration = Duration::from_secs(40 * 60);

/// Name of the dataset file written into each run directory
pub const OUTPUT_FILE_NAME: &str = "output.nc";

/// Caller-facing options for a Held–Suarez run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Spectral truncation (maximum resolved wavenumber)
    pub truncation: u32,
    /// Number of vertical sigma layers
    pub layer_count: u32,
    /// Days integrated before output starts
    pub spinup_days: u32,
    /// Days integrated with output
    pub sim_days: u32,
    /// Directory that receives the `run_NNNN` folders
    pub output_dir: PathBuf,
    /// Reference time step at T31
    pub time_step_at_t31: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            truncation: DEFAULT_TRUNCATION,
            layer_count: DEFAULT_LAYER_COUNT,
            spinup_days: DEFAULT_SPINUP_DAYS,
            sim_days: DEFAULT_SIM_DAYS,
            output_dir: PathBuf::from("."),
            time_step_at_t31: DEFAULT_TIME_STEP_AT_T31,
        }
    }
}

impl SimulationConfig {
    /// Check the options before any engine call.
    ///
    /// # Errors
    ///
    /// Returns [`HsDycoreError::InvalidArgument`] for a zero truncation, zero
    /// layers or a zero reference time step.
    pub fn validate(&self) -> Result<()> {
        if self.truncation == 0 {
            return Err(HsDycoreError::invalid("truncation must be positive"));
        }
        if self.layer_count == 0 {
            return Err(HsDycoreError::invalid("layer_count must be positive"));
        }
        if self.time_step_at_t31.is_zero() {
            return Err(HsDycoreError::invalid("time step must be positive"));
        }
        Ok(())
    }

    /// Time step for this truncation, rounded to whole seconds (at least 1 s)
    #[must_use]
    pub fn time_step(&self) -> Duration {
        let seconds = self.time_step_at_t31.as_secs_f64() * 31.0 / f64::from(self.truncation);
        Duration::from_secs_f64(seconds.round().max(1.0))
    }
}

/// Spectral resolution and vertical layering of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    truncation: u32,
    layer_count: u32,
}

impl Grid {
    /// # Errors
    ///
    /// Returns [`HsDycoreError::InvalidArgument`] if either value is zero.
    pub fn new(truncation: u32, layer_count: u32) -> Result<Self> {
        if truncation == 0 || layer_count == 0 {
            return Err(HsDycoreError::invalid(format!(
                "grid needs positive truncation and layer count, got T{} L{}",
                truncation, layer_count
            )));
        }
        Ok(Self {
            truncation,
            layer_count,
        })
    }

    pub fn truncation(&self) -> u32 {
        self.truncation
    }

    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    /// Gaussian latitudes of the output grid (`2 * ceil(3 * (T + 1) / 4)`)
    pub fn nlat(&self) -> usize {
        let half = (3 * (self.truncation as usize + 1) + 3) / 4;
        2 * half
    }

    /// Longitudes of the full output grid
    pub fn nlon(&self) -> usize {
        2 * self.nlat()
    }

    /// Layer-independent dataset dimensions `(nlon, nlat, layers)`
    pub fn output_shape(&self) -> (usize, usize, usize) {
        (self.nlon(), self.nlat(), self.layer_count as usize)
    }
}

/// Held–Suarez (1994) Newtonian temperature relaxation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRelaxation {
    /// Top of the boundary layer in sigma coordinates
    pub sigma_b: f64,
    /// Relaxation time in the free atmosphere, days
    pub relax_time_free: f64,
    /// Relaxation time at the equatorial surface, days
    pub relax_time_surface: f64,
    /// Equator-to-pole temperature difference, K
    pub delta_t_y: f64,
    /// Vertical potential temperature difference, K
    pub delta_theta_z: f64,
    /// Equilibrium surface temperature at the equator, K
    pub temp_equator: f64,
    /// Lower bound of the equilibrium temperature, K
    pub temp_min: f64,
}

/// Rayleigh friction in the boundary layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearDrag {
    /// Top of the boundary layer in sigma coordinates
    pub sigma_b: f64,
    /// Damping time at the surface, days
    pub time_scale: f64,
}

/// Parameterized processes known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsProcess {
    TemperatureRelaxation,
    BoundaryLayerDrag,
    Convection,
    LargeScaleCondensation,
    ShortwaveRadiation,
    LongwaveRadiation,
    VerticalDiffusion,
    SurfaceFluxes,
}

impl PhysicsProcess {
    pub const ALL: [PhysicsProcess; 8] = [
        PhysicsProcess::TemperatureRelaxation,
        PhysicsProcess::BoundaryLayerDrag,
        PhysicsProcess::Convection,
        PhysicsProcess::LargeScaleCondensation,
        PhysicsProcess::ShortwaveRadiation,
        PhysicsProcess::LongwaveRadiation,
        PhysicsProcess::VerticalDiffusion,
        PhysicsProcess::SurfaceFluxes,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TemperatureRelaxation => "temperature_relaxation",
            Self::BoundaryLayerDrag => "boundary_layer_drag",
            Self::Convection => "convection",
            Self::LargeScaleCondensation => "large_scale_condensation",
            Self::ShortwaveRadiation => "shortwave_radiation",
            Self::LongwaveRadiation => "longwave_radiation",
            Self::VerticalDiffusion => "vertical_diffusion",
            Self::SurfaceFluxes => "surface_fluxes",
        }
    }
}

/// Dry-core physics: Held–Suarez relaxation plus linear drag, everything else off.
///
/// Only constructible through [`PhysicsConfig::held_suarez`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConfig {
    temperature_relaxation: TemperatureRelaxation,
    boundary_layer_drag: LinearDrag,
}

impl PhysicsConfig {
    #[must_use]
    pub fn held_suarez() -> Self {
        Self {
            temperature_relaxation: TemperatureRelaxation {
                sigma_b: 0.7,
                relax_time_free: 40.0,
                relax_time_surface: 4.0,
                delta_t_y: 60.0,
                delta_theta_z: 10.0,
                temp_equator: 315.0,
                temp_min: 200.0,
            },
            boundary_layer_drag: LinearDrag {
                sigma_b: 0.7,
                time_scale: 1.0,
            },
        }
    }

    pub fn temperature_relaxation(&self) -> &TemperatureRelaxation {
        &self.temperature_relaxation
    }

    pub fn boundary_layer_drag(&self) -> &LinearDrag {
        &self.boundary_layer_drag
    }

    #[must_use]
    pub fn is_enabled(&self, process: PhysicsProcess) -> bool {
        matches!(
            process,
            PhysicsProcess::TemperatureRelaxation | PhysicsProcess::BoundaryLayerDrag
        )
    }

    fn to_json(self) -> Value {
        let processes: serde_json::Map<String, Value> = PhysicsProcess::ALL
            .iter()
            .map(|p| (p.as_str().to_string(), Value::Bool(self.is_enabled(*p))))
            .collect();
        let hs = self.temperature_relaxation;
        let drag = self.boundary_layer_drag;
        json!({
            "processes": processes,
            "temperature_relaxation": {
                "sigma_b": hs.sigma_b,
                "relax_time_free_days": hs.relax_time_free,
                "relax_time_surface_days": hs.relax_time_surface,
                "delta_t_y": hs.delta_t_y,
                "delta_theta_z": hs.delta_theta_z,
                "temp_equator": hs.temp_equator,
                "temp_min": hs.temp_min,
            },
            "boundary_layer_drag": {
                "sigma_b": drag.sigma_b,
                "time_scale_days": drag.time_scale,
            },
        })
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::held_suarez()
    }
}

/// Where a run writes its dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub run_dir: PathBuf,
    pub file_name: String,
}

impl OutputConfig {
    pub fn new(run_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_dir: run_dir.into(),
            file_name: OUTPUT_FILE_NAME.to_string(),
        }
    }

    /// Full path of the dataset file
    pub fn dataset_path(&self) -> PathBuf {
        self.run_dir.join(&self.file_name)
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

/// Complete model description handed to an engine
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub grid: Grid,
    pub physics: PhysicsConfig,
    pub time_step: Duration,
    pub output: OutputConfig,
}

impl ModelConfig {
    /// JSON form used by out-of-process engines
    pub fn to_json(&self) -> Value {
        json!({
            "grid": {
                "truncation": self.grid.truncation(),
                "layer_count": self.grid.layer_count(),
                "nlat": self.grid.nlat(),
                "nlon": self.grid.nlon(),
            },
            "physics": self.physics.to_json(),
            "time_step_seconds": self.time_step.as_secs(),
            "output": {
                "run_dir": self.output.run_dir.display().to_string(),
                "file": self.output.dataset_path().display().to_string(),
            },
        })
    }
}
