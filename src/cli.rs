//! Defines command-line interface options using `clap` for the hsdycore application.

use clap::{Args as ClapArgs, Parser, Subcommand};
use hs_dycore::batching::{DEFAULT_BATCH_SIZE, DEFAULT_STRIDE, DEFAULT_TRAIN_FRACTION};
use hs_dycore::netcdf_io::FieldSelector;
use hs_dycore::simulation::config::{
    DEFAULT_LAYER_COUNT, DEFAULT_SIM_DAYS, DEFAULT_SPINUP_DAYS, DEFAULT_TRUNCATION,
};
use std::path::PathBuf;

/// Held-Suarez dynamical core runs, EOF analysis and ML batching
#[derive(Parser, Debug)]
#[command(
    version,
    name = "hsdycore",
    about = "Run Held-Suarez dry dynamical core experiments and analyse their output"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Spin up and run the model through an external engine program
    Run(RunArgs),
    /// Compute EOFs and principal components of a field
    Pca(PcaArgs),
    /// Split the leading principal components into training and validation batches
    Batches(BatchArgs),
    /// List dimensions, variables and attributes of a dataset
    Inspect(InspectArgs),
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// Engine executable that receives one JSON request per phase on stdin
    #[arg(long)]
    pub engine: PathBuf,

    /// Extra argument for the engine executable (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Spectral truncation
    #[arg(long, default_value_t = DEFAULT_TRUNCATION)]
    pub truncation: u32,

    /// Number of vertical layers
    #[arg(long, default_value_t = DEFAULT_LAYER_COUNT)]
    pub layers: u32,

    /// Days to integrate before output starts
    #[arg(long, default_value_t = DEFAULT_SPINUP_DAYS)]
    pub spinup_days: u32,

    /// Days to integrate with output
    #[arg(long, default_value_t = DEFAULT_SIM_DAYS)]
    pub sim_days: u32,

    /// Directory receiving the run_NNNN folders
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

/// Options shared by every command that reads a field
#[derive(ClapArgs, Debug)]
pub struct FieldArgs {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Variable to analyse
    #[arg(long)]
    pub var: String,

    /// Fix a non-horizontal dimension to one index, formatted as <dim>:<index>
    #[arg(long = "fix", value_parser = parse_fix_arg)]
    pub fix: Vec<(String, usize)>,

    /// Name of the longitude dimension
    #[arg(long, default_value = "lon")]
    pub lon_dim: String,

    /// Name of the latitude dimension
    #[arg(long, default_value = "lat")]
    pub lat_dim: String,

    /// Name of the time dimension
    #[arg(long, default_value = "time")]
    pub time_dim: String,
}

impl FieldArgs {
    pub fn selector(&self) -> FieldSelector {
        FieldSelector {
            variable: self.var.clone(),
            lon_dim: self.lon_dim.clone(),
            lat_dim: self.lat_dim.clone(),
            time_dim: self.time_dim.clone(),
            fixed: self.fix.clone(),
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct PcaArgs {
    #[command(flatten)]
    pub field: FieldArgs,

    /// Number of leading modes to keep
    #[arg(short = 'k', long, default_value_t = 3)]
    pub modes: usize,

    /// Print reconstruction errors for every truncation level
    #[arg(long)]
    pub errors: bool,

    /// Path to save the EOFs and PCs as NetCDF. If not set, prints to terminal.
    #[arg(long)]
    pub output_netcdf: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub field: FieldArgs,

    /// Number of principal components used as features
    #[arg(short = 'k', long, default_value_t = 3)]
    pub modes: usize,

    /// Fraction of time steps used for training
    #[arg(long, default_value_t = DEFAULT_TRAIN_FRACTION)]
    pub train_fraction: f64,

    /// Rows per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Offset between consecutive batch starts
    #[arg(long, default_value_t = DEFAULT_STRIDE)]
    pub stride: usize,
}

#[derive(ClapArgs, Debug)]
pub struct InspectArgs {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,
}

fn parse_fix_arg(s: &str) -> Result<(String, usize), String> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [dim, index] if !dim.is_empty() => {
            let index = index
                .parse::<usize>()
                .map_err(|_| format!("Invalid index for dimension '{}'", dim))?;
            Ok((dim.to_string(), index))
        }
        _ => Err("Invalid format: Expected '<dimension>:<index>'.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fix_arguments() {
        assert_eq!(parse_fix_arg("layer:7"), Ok(("layer".to_string(), 7)));
        assert!(parse_fix_arg("layer").is_err());
        assert!(parse_fix_arg("layer:x").is_err());
        assert!(parse_fix_arg(":3").is_err());
    }

    #[test]
    fn pca_command_line() {
        let args = Args::parse_from([
            "hsdycore", "pca", "--file", "out.nc", "--var", "temp", "--fix", "layer:7", "-k",
            "4",
        ]);
        match args.command {
            Command::Pca(pca) => {
                assert_eq!(pca.modes, 4);
                let selector = pca.field.selector();
                assert_eq!(selector.variable, "temp");
                assert_eq!(selector.fixed, vec![("layer".to_string(), 7)]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn run_defaults() {
        let args = Args::parse_from(["hsdycore", "run", "--engine", "./engine"]);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.truncation, 31);
                assert_eq!(run.layers, 8);
                assert_eq!(run.spinup_days, 100);
                assert_eq!(run.sim_days, 400);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
