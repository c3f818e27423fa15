//! Input/Output operations for local MP2 calculations
//!
//! This module handles logging setup, result tables and loading the
//! correlated system from the configuration.

mod output;
mod system_loader;

pub use output::{setup_output, write_pair_energies};
pub use system_loader::{load_system, LoadedSystem};
