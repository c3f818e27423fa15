use crate::config::{Args, Config};
use crate::io::{load_system, LoadedSystem};
use color_eyre::eyre::{Result, WrapErr};
use lmp2::{CorrelationEnergy, ExecutionContext, LocalCorrelationController, LocalMp2};
use tracing::info;

/// Load the system described by `config`, then run the local MP2 calculation.
pub fn run_local_mp2(config: &Config, args: &Args) -> Result<(LocalMp2, CorrelationEnergy)> {
    let lmp2_settings = config.local_mp2_settings(args)?;
    let correlation_settings = config.local_correlation_settings(args);

    let LoadedSystem {
        system,
        metric,
        four_center,
        density_fitted,
    } = load_system(&config.system, &correlation_settings)?;
    info!(
        "System: {} occupied, {} virtual orbitals",
        system.n_occupied(),
        system.n_virtual()
    );

    let mut controller = LocalCorrelationController::new(system, correlation_settings, metric);
    if let Some(transformer) = four_center {
        controller = controller.with_four_center_integrals(transformer);
    }
    if let Some(transformer) = density_fitted {
        controller = controller.with_density_fitting(transformer);
    }

    let context = ExecutionContext::new(config.threads(args))?;
    let mut lmp2 = LocalMp2::new(controller, lmp2_settings, context)?;
    let energy = lmp2
        .calculate_energy_correction(None)
        .wrap_err("Local MP2 calculation failed")?;
    Ok((lmp2, energy))
}
