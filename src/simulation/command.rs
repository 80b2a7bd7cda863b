//! Out-of-process engine driven through a JSON request on stdin
//!
//! Each `advance` call spawns the configured program once and writes a single
//! JSON object to its standard input:
//!
//! ```json
//! {
//!   "phase": "spinup" | "record",
//!   "days": 100,
//!   "start_day": 0,
//!   "emit_output": false,
//!   "restart_in": null | "<path>",
//!   "restart_out": "<path>",
//!   "output": null | "<path>/output.nc",
//!   "model": { "grid": {..}, "physics": {..}, "time_step_seconds": 2400, "output": {..} }
//! }
//! ```
//!
//! The program continues from `restart_in` when given, should leave its state
//! in `restart_out`, and must write `output` when `emit_output` is true. Its
//! standard output is passed through; standard error is captured for error
//! reports.

use super::config::ModelConfig;
use super::engine::SimulationEngine;
use crate::errors::{HsDycoreError, Result};
use log::{debug, info};
use serde_json::json;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Engine backed by an external executable
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument passed before the request is written
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// State of a run driven by [`CommandEngine`]
#[derive(Debug, Clone)]
pub struct CommandSimulation {
    model: ModelConfig,
    elapsed_days: u32,
    phases: u32,
    restart: Option<PathBuf>,
    outputs: Vec<PathBuf>,
}

impl CommandSimulation {
    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Simulated days completed so far
    pub fn elapsed_days(&self) -> u32 {
        self.elapsed_days
    }

    /// Dataset files written by recorded phases
    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    pub fn run_dir(&self) -> &Path {
        self.model.output.run_dir()
    }
}

/// Non-zero exit of the engine program
#[derive(Debug)]
pub struct CommandFailure {
    pub program: PathBuf,
    pub status: ExitStatus,
    pub stderr: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' exited with {}", self.program.display(), self.status)?;
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            write!(f, ": {}", stderr)?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandFailure {}

impl SimulationEngine for CommandEngine {
    type Simulation = CommandSimulation;

    fn initialize(&self, model: ModelConfig) -> Result<CommandSimulation> {
        debug!(
            "engine '{}' initialized for {}",
            self.program.display(),
            model.output.run_dir.display()
        );
        Ok(CommandSimulation {
            model,
            elapsed_days: 0,
            phases: 0,
            restart: None,
            outputs: Vec::new(),
        })
    }

    fn advance(
        &self,
        mut simulation: CommandSimulation,
        days: u32,
        emit_output: bool,
    ) -> Result<CommandSimulation> {
        let phase = simulation.phases + 1;
        let restart_out = simulation
            .run_dir()
            .join(format!("restart_{:02}.state", phase));
        let output = emit_output.then(|| simulation.model.output.dataset_path());
        let phase_name = if emit_output { "record" } else { "spinup" };

        let request = json!({
            "phase": phase_name,
            "days": days,
            "start_day": simulation.elapsed_days,
            "emit_output": emit_output,
            "restart_in": simulation.restart.as_ref().map(|p| p.display().to_string()),
            "restart_out": restart_out.display().to_string(),
            "output": output.as_ref().map(|p| p.display().to_string()),
            "model": simulation.model.to_json(),
        });

        info!(
            "engine phase {}: {} days from day {}",
            phase, days, simulation.elapsed_days
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()?;

        // Closing stdin at the end of this block signals end of request.
        let written = match child.stdin.take() {
            Some(mut stdin) => serde_json::to_writer(&mut stdin, &request)
                .map_err(HsDycoreError::from)
                .and_then(|()| stdin.flush().map_err(HsDycoreError::from)),
            None => Err(HsDycoreError::engine("engine stdin was not captured")),
        };

        let finished = child.wait_with_output()?;
        if !finished.status.success() {
            return Err(HsDycoreError::engine(CommandFailure {
                program: self.program.clone(),
                status: finished.status,
                stderr: String::from_utf8_lossy(&finished.stderr).into_owned(),
            }));
        }
        written?;

        if let Some(path) = output {
            if !path.is_file() {
                return Err(HsDycoreError::engine(format!(
                    "engine finished but did not write {}",
                    path.display()
                )));
            }
            simulation.outputs.push(path);
        }

        simulation.phases = phase;
        simulation.elapsed_days += days;
        simulation.restart = restart_out.is_file().then_some(restart_out);
        Ok(simulation)
    }
}
