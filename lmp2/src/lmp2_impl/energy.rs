//! Pair and total correlation energies

extern crate nalgebra as na;

use crate::pairs::OrbitalPair;
use na::{DMatrix, Vector3};
use serde::Serialize;

/// Correlation energy split into its three sources.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CorrelationEnergy {
    /// Σ E_ij over optimized pairs
    pub local: f64,
    /// Contribution of very distant pairs
    pub dipole: f64,
    /// Σ ΔE_PNO over optimized pairs
    pub pno_truncation: f64,
}

impl CorrelationEnergy {
    pub fn total(&self) -> f64 {
        self.local + self.dipole + self.pno_truncation
    }

    /// (local, dipole, PNO truncation)
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.local, self.dipole, self.pno_truncation)
    }
}

/// Same-spin and opposite-spin parts of a pair energy:
/// E_ss = f Σ (T - Tᵀ) ⊙ K, E_os = f Σ T ⊙ K, f = 1 for i = j and 2 otherwise.
pub fn pair_energy_components(
    amplitudes: &DMatrix<f64>,
    exchange_integrals: &DMatrix<f64>,
    diagonal: bool,
) -> (f64, f64) {
    let f = if diagonal { 1.0 } else { 2.0 };
    let ss = f * (amplitudes - amplitudes.transpose())
        .component_mul(exchange_integrals)
        .sum();
    let os = f * amplitudes.component_mul(exchange_integrals).sum();
    (ss, os)
}

/// Evaluate and store the pair energies of optimized pairs.
///
/// Returns (Σ E_ij, Σ ΔE_PNO). The stored pair energy includes the PNO
/// correction.
pub fn local_pair_energies(pairs: &mut [OrbitalPair], ss_scaling: f64, os_scaling: f64) -> (f64, f64) {
    let mut local = 0.0;
    let mut truncation = 0.0;
    for pair in pairs.iter_mut() {
        let (ss, os) =
            pair_energy_components(&pair.amplitudes, &pair.exchange_integrals, pair.is_diagonal());
        let energy = ss_scaling * ss + os_scaling * os;
        pair.pair_energy = Some(energy + pair.delta_pno);
        local += energy;
        truncation += pair.delta_pno;
    }
    (local, truncation)
}

/// Very distant pairs contribute their semicanonical energy when one is
/// available and the dipole estimate otherwise.
pub fn very_distant_pair_energies(pairs: &mut [OrbitalPair]) -> f64 {
    let mut total = 0.0;
    for pair in pairs.iter_mut() {
        let energy = if pair.semicanonical_pair_energy != 0.0 {
            pair.semicanonical_pair_energy
        } else {
            pair.dipole_pair_energy
        };
        pair.pair_energy = Some(energy);
        total += energy;
    }
    total
}

/// Evaluate the correlation energy of a converged pair set.
pub fn calculate_energy(
    optimized: &mut [OrbitalPair],
    very_distant: &mut [OrbitalPair],
    ss_scaling: f64,
    os_scaling: f64,
) -> CorrelationEnergy {
    let (local, pno_truncation) = local_pair_energies(optimized, ss_scaling, os_scaling);
    let dipole = very_distant_pair_energies(very_distant);
    CorrelationEnergy {
        local,
        dipole,
        pno_truncation,
    }
}
