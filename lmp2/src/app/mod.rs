mod report;
mod runner;

pub use runner::run_local_mp2;

use self::report::{report_summary, write_pair_report};
use crate::config::{Args, Config};
use crate::io::setup_output;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use tracing::info;

pub struct Lmp2Application {
    args: Args,
    config: Config,
}

impl Lmp2Application {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref())?;
        info!("Configuration loaded from: {}", self.args.config_file);

        let (lmp2, energy) = run_local_mp2(&self.config, &self.args)?;
        report_summary(&lmp2, &energy);

        if let Some(path) = &self.args.pair_report {
            write_pair_report(path, &lmp2, &energy)?;
        }
        Ok(())
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}
