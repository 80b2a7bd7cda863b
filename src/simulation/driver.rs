//! Spin-up then recorded run of a Held–Suarez model, plus run-directory handling

use super::config::{OutputConfig, PhysicsConfig, SimulationConfig, OUTPUT_FILE_NAME};
use super::engine::SimulationEngine;
use crate::errors::Result;
use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const RUN_DIR_PREFIX: &str = "run_";

/// Run a Held–Suarez simulation through `engine`.
///
/// A fresh `run_NNNN` directory is created under `config.output_dir`, the
/// model is built once, integrated for `spinup_days` without output and then
/// for `sim_days` with output. A zero-length spin-up is skipped.
///
/// # Errors
///
/// Returns [`HsDycoreError::InvalidArgument`](crate::errors::HsDycoreError::InvalidArgument)
/// for an invalid configuration, I/O errors from creating the run directory,
/// and whatever the engine returns, unchanged.
pub fn run_held_suarez<E: SimulationEngine>(
    engine: &E,
    config: &SimulationConfig,
) -> Result<E::Simulation> {
    config.validate()?;

    let run_dir = create_run_dir(&config.output_dir)?;
    info!(
        "starting T{} L{} Held-Suarez run in {}",
        config.truncation,
        config.layer_count,
        run_dir.display()
    );

    let grid = engine.configure(config.truncation, config.layer_count)?;
    let model = engine.build_model(
        grid,
        PhysicsConfig::held_suarez(),
        config.time_step(),
        OutputConfig::new(run_dir),
    )?;
    debug!("model time step: {:?}", model.time_step);

    let mut simulation = engine.initialize(model)?;

    if config.spinup_days > 0 {
        info!("spin-up: {} days without output", config.spinup_days);
        simulation = engine.advance(simulation, config.spinup_days, false)?;
    } else {
        debug!("no spin-up requested");
    }

    info!("recording: {} days with output", config.sim_days);
    simulation = engine.advance(simulation, config.sim_days, true)?;

    Ok(simulation)
}

/// Create the next free `run_NNNN` directory below `base`.
///
/// Numbering continues after the highest existing run. A directory that
/// appears concurrently is skipped rather than reused.
pub fn create_run_dir(base: &Path) -> Result<PathBuf> {
    fs::create_dir_all(base)?;

    let mut id = existing_run_ids(base)?.into_iter().max().unwrap_or(0);
    loop {
        id += 1;
        let candidate = base.join(format!("{}{:04}", RUN_DIR_PREFIX, id));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Dataset files of all finished runs below `base`, ordered by run number.
pub fn find_output_artifacts(base: &Path) -> Result<Vec<PathBuf>> {
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut ids = existing_run_ids(base)?;
    ids.sort_unstable();

    Ok(ids
        .into_iter()
        .map(|id| {
            base.join(format!("{}{:04}", RUN_DIR_PREFIX, id))
                .join(OUTPUT_FILE_NAME)
        })
        .filter(|path| path.is_file())
        .collect())
}

fn existing_run_ids(base: &Path) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(id) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.strip_prefix(RUN_DIR_PREFIX))
            .and_then(|digits| digits.parse::<u32>().ok())
        {
            ids.push(id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn run_dirs_are_numbered_consecutively() {
        let dir = tempdir().unwrap();
        let first = create_run_dir(dir.path()).unwrap();
        let second = create_run_dir(dir.path()).unwrap();
        assert!(first.ends_with("run_0001"));
        assert!(second.ends_with("run_0002"));
    }

    #[test]
    fn numbering_continues_after_gaps() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("run_0007")).unwrap();
        fs::create_dir(dir.path().join("unrelated")).unwrap();
        let next = create_run_dir(dir.path()).unwrap();
        assert!(next.ends_with("run_0008"));
    }

    #[test]
    fn artifacts_only_listed_when_dataset_exists() {
        let dir = tempdir().unwrap();
        let empty = create_run_dir(dir.path()).unwrap();
        let full = create_run_dir(dir.path()).unwrap();
        fs::write(full.join(OUTPUT_FILE_NAME), b"").unwrap();

        let found = find_output_artifacts(dir.path()).unwrap();
        assert_eq!(found, vec![full.join(OUTPUT_FILE_NAME)]);
        assert!(!found.iter().any(|p| p.starts_with(&empty)));
    }

    #[test]
    fn missing_base_has_no_artifacts() {
        let dir = tempdir().unwrap();
        let found = find_output_artifacts(&dir.path().join("nope")).unwrap();
        assert!(found.is_empty());
    }
}
