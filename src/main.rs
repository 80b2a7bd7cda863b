//! Entry point for the hsdycore application.
//! Handles CLI parsing and dispatches model runs, EOF analysis, batching and inspection.

use clap::Parser;
use env_logger::Env;
use hs_dycore::batching::{prepare_data_batches_with, BatchConfig, TimeSeriesDataset};
use hs_dycore::inspect::summarize_dataset;
use hs_dycore::netcdf_io::{load_field, load_time_index, PcaWriter};
use hs_dycore::parallel::{get_parallel_info, ParallelConfig};
use hs_dycore::pca::prepare_pca_analysis;
use hs_dycore::simulation::{run_held_suarez, CommandEngine, SimulationConfig};
use hs_dycore::HsDycoreError;
use log::{debug, warn};
use ndarray::Array1;
use netcdf::open;

mod cli;

use cli::{Args, BatchArgs, Command, InspectArgs, PcaArgs, RunArgs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    println!(
        r#"
------------------------------------------------------------------
     _   _ ____        ____
    | | | / ___|      |  _ \ _   _  ___ ___  _ __ ___
    | |_| \___ \ _____| | | | | | |/ __/ _ \| '__/ _ \
    |  _  |___) |_____| |_| | |_| | (_| (_) | | |  __/
    |_| |_|____/      |____/ \__, |\___\___/|_|  \___|
                             |___/
           Held-Suarez dry dynamical core toolkit
------------------------------------------------------------------
                        "#
    );

    ParallelConfig::new(args.threads).setup_global_pool()?;
    if args.verbose {
        get_parallel_info().print_info();
    }

    match args.command {
        Command::Run(run) => run_command(run)?,
        Command::Pca(pca) => pca_command(pca)?,
        Command::Batches(batches) => batches_command(batches)?,
        Command::Inspect(inspect) => inspect_command(inspect)?,
    }

    Ok(())
}

fn run_command(args: RunArgs) -> Result<(), HsDycoreError> {
    let engine = CommandEngine::new(&args.engine).args(args.engine_args);
    let config = SimulationConfig {
        truncation: args.truncation,
        layer_count: args.layers,
        spinup_days: args.spinup_days,
        sim_days: args.sim_days,
        output_dir: args.output_dir,
        ..SimulationConfig::default()
    };

    println!(
        "🌍 Running T{} L{}: {} days spin-up, {} days recorded",
        config.truncation, config.layer_count, config.spinup_days, config.sim_days
    );
    let simulation = run_held_suarez(&engine, &config)?;

    println!(
        "✅ Completed {} days in {}",
        simulation.elapsed_days(),
        simulation.run_dir().display()
    );
    for output in simulation.outputs() {
        println!("   📄 {}", output.display());
    }
    Ok(())
}

fn pca_command(args: PcaArgs) -> Result<(), HsDycoreError> {
    let file = open(&args.field.file)?;
    println!(
        "Successfully opened NetCDF file: {}",
        args.field.file.display()
    );

    let selector = args.field.selector();
    let field = load_field(&file, &selector)?;
    debug!("field shape (lon, lat, time): {:?}", field.dim());

    let analysis = prepare_pca_analysis(field.view(), args.modes)?;
    analysis.print_summary();

    if args.errors {
        println!("\n Reconstruction Error");
        println!("========================");
        for (k, err) in analysis.reconstruction_errors()?.iter().enumerate() {
            println!("    k = {:>4}: {:.6e}", k + 1, err);
        }
    }

    if let Some(output_path) = args.output_netcdf {
        PcaWriter::new(&file, &output_path).write(&analysis, &selector)?;
        println!("✅ Saved EOF analysis to {}", output_path.display());
    }
    Ok(())
}

fn batches_command(args: BatchArgs) -> Result<(), HsDycoreError> {
    let file = open(&args.field.file)?;
    let selector = args.field.selector();
    let field = load_field(&file, &selector)?;
    let analysis = prepare_pca_analysis(field.view(), args.modes)?;

    let n_times = analysis.n_times();
    let time = match load_time_index(&file, &selector.time_dim) {
        Ok(time) if time.len() == n_times => time,
        Ok(time) => {
            warn!(
                "time coordinate has {} values for {} steps, using step numbers",
                time.len(),
                n_times
            );
            step_numbers(n_times)
        }
        Err(HsDycoreError::VariableNotFound { .. }) => {
            warn!("no '{}' coordinate, using step numbers", selector.time_dim);
            step_numbers(n_times)
        }
        Err(e) => return Err(e),
    };

    // One row per time step, one column per retained principal component.
    let features = analysis.a.t().to_owned();
    let dataset = TimeSeriesDataset::new(time, features)?;
    let config = BatchConfig {
        stride: args.stride,
        ..BatchConfig::new(args.train_fraction, args.batch_size)
    };
    let split = prepare_data_batches_with(&dataset, &config)?;
    split.print_summary(dataset.len());

    for (label, batches) in [("train", &split.train), ("valid", &split.valid)] {
        for batch in batches.iter().take(3) {
            println!(
                "    {} rows {}..{}: time {:?} .. {:?}",
                label,
                batch.start,
                batch.end(),
                batch.time.first(),
                batch.time.last()
            );
        }
    }
    Ok(())
}

fn inspect_command(args: InspectArgs) -> Result<(), HsDycoreError> {
    let file = open(&args.file)?;
    println!("Successfully opened NetCDF file: {}", args.file.display());
    summarize_dataset(&file)?.print();
    Ok(())
}

fn step_numbers(n: usize) -> Array1<f64> {
    Array1::range(0.0, n as f64, 1.0)
}
