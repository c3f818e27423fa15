//! Local MP2 Command-Line Interface
//!
//! This is the main entry point for running local MP2 calculations with YAML configuration.

use color_eyre::eyre::Result;

mod app;
mod config;
mod io;

fn main() -> Result<()> {
    color_eyre::install()?;
    app::Lmp2Application::from_cli()?.run()
}
