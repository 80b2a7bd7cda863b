//! Held–Suarez dry dynamical core runs through an external engine
//!
//! The model itself lives outside this crate. This module owns the
//! configuration handed to it, the [`SimulationEngine`] seam, the
//! spin-up/record sequence in [`run_held_suarez`], and the `run_NNNN`
//! directories the engine writes into.
//!
//! - [`config`]: run options, grid, fixed Held–Suarez physics, model description
//! - [`engine`]: the engine trait
//! - [`driver`]: the run sequence and run-directory helpers
//! - [`command`]: an engine adapter for external executables

pub mod command;
pub mod config;
pub mod driver;
pub mod engine;

pub use command::{CommandEngine, CommandFailure, CommandSimulation};
pub use config::{
    Grid, LinearDrag, ModelConfig, OutputConfig, PhysicsConfig, PhysicsProcess, SimulationConfig,
    TemperatureRelaxation, OUTPUT_FILE_NAME,
};
pub use driver::{create_run_dir, find_output_artifacts, run_held_suarez};
pub use engine::SimulationEngine;
