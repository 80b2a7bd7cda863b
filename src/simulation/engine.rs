//! The seam between the driver and an atmospheric model implementation

use super::config::{Grid, ModelConfig, OutputConfig, PhysicsConfig};
use crate::errors::Result;
use std::time::Duration;

/// An external simulation engine.
///
/// The driver calls the methods in order: `configure`, `build_model`,
/// `initialize`, then `advance` once per phase. Engines report their own
/// failures through [`HsDycoreError::Engine`](crate::errors::HsDycoreError::Engine);
/// the driver never retries or rewrites them.
pub trait SimulationEngine {
    /// Running simulation state returned by `initialize` and threaded through `advance`
    type Simulation;

    /// Resolve the spectral grid.
    fn configure(&self, truncation: u32, layer_count: u32) -> Result<Grid> {
        Grid::new(truncation, layer_count)
    }

    /// Assemble the full model description from its parts.
    fn build_model(
        &self,
        grid: Grid,
        physics: PhysicsConfig,
        time_step: Duration,
        output: OutputConfig,
    ) -> Result<ModelConfig> {
        Ok(ModelConfig {
            grid,
            physics,
            time_step,
            output,
        })
    }

    /// Create the initial simulation state for a model.
    fn initialize(&self, model: ModelConfig) -> Result<Self::Simulation>;

    /// Integrate `days` forward, writing the dataset when `emit_output` is set.
    fn advance(
        &self,
        simulation: Self::Simulation,
        days: u32,
        emit_output: bool,
    ) -> Result<Self::Simulation>;
}
