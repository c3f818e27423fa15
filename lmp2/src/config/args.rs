//! Command-line argument parsing

use clap::Parser;

/// Local MP2 pair-amplitude solver with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of worker threads (0 = all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Override maximum amplitude optimization cycles
    #[arg(long)]
    pub max_cycles: Option<usize>,

    /// Override convergence threshold on the largest residual element
    #[arg(long)]
    pub max_residual: Option<f64>,

    /// Use density-fitted instead of four-center exchange integrals
    #[arg(long)]
    pub density_fitting: bool,

    /// Override DIIS history size
    #[arg(long)]
    pub diis_max_store: Option<usize>,

    /// Write the per-pair energy table to this file
    #[arg(long)]
    pub pair_report: Option<String>,
}
