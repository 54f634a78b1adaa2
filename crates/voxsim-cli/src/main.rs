//! voxsim CLI: simulation, tensile testing, benchmarking and inspection.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "voxsim")]
#[command(version, about = "voxsim: voxel lattice mechanics simulator")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a run config.
    Simulate {
        /// Path to the run config (TOML).
        #[arg(short, long, default_value = "run.toml")]
        config: PathBuf,
    },

    /// Run a tensile test on a structure and boundary document.
    Tensile {
        /// Structure document (.vxc).
        structure: PathBuf,

        /// Boundary-condition document (.bcx).
        boundaries: PathBuf,

        /// Number of strain increments.
        #[arg(short, long, default_value_t = 10)]
        steps: usize,

        /// Convergence preset (fast, balanced, accurate).
        #[arg(long, default_value = "balanced")]
        preset: String,

        /// Tab-separated results table.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the benchmark suite.
    Benchmark {
        /// Which scenario to run (fixed_block, tensile_bar, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Override the scenario step count.
        #[arg(long)]
        steps: Option<u64>,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a summary of a structure document.
    Info {
        /// Structure document (.vxc).
        path: PathBuf,
    },

    /// Validate a run config, structure document or boundary document.
    Validate {
        /// Path to a .toml, .vxc or .bcx file.
        path: PathBuf,
    },

    /// Inspect a kinematic snapshot file.
    Inspect {
        /// Path to snapshot file.
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Simulate { config } => commands::simulate(&config),
        Commands::Tensile {
            structure,
            boundaries,
            steps,
            preset,
            output,
        } => commands::tensile(&structure, &boundaries, steps, &preset, output.as_deref()),
        Commands::Benchmark {
            scenario,
            steps,
            output,
        } => commands::benchmark(&scenario, steps, output.as_deref()),
        Commands::Info { path } => commands::info(&path),
        Commands::Validate { path } => commands::validate(&path),
        Commands::Inspect { path } => commands::inspect(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}
