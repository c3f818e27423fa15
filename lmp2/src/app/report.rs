use crate::io::write_pair_energies;
use color_eyre::eyre::{Result, WrapErr};
use lmp2::{CorrelationEnergy, LocalMp2, PairType};
use std::fs::File;
use tracing::info;

pub fn report_summary(lmp2: &LocalMp2, energy: &CorrelationEnergy) {
    info!("\nLocal MP2 calculation finished.");

    if let Some(report) = lmp2.convergence_report() {
        info!(
            "Converged in {} cycles, max. residual {:.3e}",
            report.cycles, report.largest_residual
        );
    }

    let count = |tier: PairType| lmp2.pairs().iter().filter(|p| p.pair_type == tier).count();
    info!("\nPairs:");
    for tier in [PairType::Close, PairType::Distant, PairType::VeryDistant] {
        info!("  {:<13} {:>8}", tier.to_string(), count(tier));
    }

    info!("\nCorrelation energy components (Hartree):");
    info!("  Local pairs:        {:>18.10}", energy.local);
    info!("  Very distant pairs: {:>18.10}", energy.dipole);
    info!("  PNO truncation:     {:>18.10}", energy.pno_truncation);
    info!("  ----------------------------------------");
    info!("  Total:              {:>18.10}", energy.total());
}

pub fn write_pair_report(path: &str, lmp2: &LocalMp2, energy: &CorrelationEnergy) -> Result<()> {
    let mut file =
        File::create(path).wrap_err_with(|| format!("Unable to create pair report: {}", path))?;
    write_pair_energies(&mut file, lmp2.pairs(), energy)?;
    info!("Pair energies written to: {}", path);
    Ok(())
}
