use super::PnoConstructor;
use crate::error::CorrelationError;
use crate::lmp2_impl::pair_energy_components;
use crate::math::symmetrize;
use crate::pairs::{OrbitalPair, PairType};
use crate::system::CorrelationSystem;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Pair natural orbitals from semicanonical first-order amplitudes.
#[derive(Debug, Clone)]
pub struct SemicanonicalPnoConstructor {
    pub pno_threshold: f64,
    pub distant_pno_scaling: f64,
    pub ss_scaling: f64,
    pub os_scaling: f64,
}

impl SemicanonicalPnoConstructor {
    fn threshold_for(&self, pair_type: PairType) -> f64 {
        match pair_type {
            PairType::Distant => self.pno_threshold * self.distant_pno_scaling,
            _ => self.pno_threshold,
        }
    }

    fn semicanonical_energy(&self, k: &DMatrix<f64>, u: &DMatrix<f64>, diagonal: bool) -> f64 {
        let t = -k.component_div(u);
        let (ss, os) = pair_energy_components(&t, k, diagonal);
        self.ss_scaling * ss + self.os_scaling * os
    }
}

/// ε_a + ε_b - f_ii - f_jj
fn uncoupled_term(energies: &DVector<f64>, f_ii: f64, f_jj: f64) -> DMatrix<f64> {
    let n = energies.len();
    DMatrix::from_fn(n, n, |a, b| energies[a] + energies[b] - f_ii - f_jj)
}

impl PnoConstructor for SemicanonicalPnoConstructor {
    fn construct(
        &self,
        pair: &mut OrbitalPair,
        canonical_integrals: &DMatrix<f64>,
        system: &CorrelationSystem,
    ) -> Result<(), CorrelationError> {
        let n_virt = system.n_virtual();
        if canonical_integrals.shape() != (n_virt, n_virt) {
            return Err(CorrelationError::configuration(format!(
                "pair {}: canonical exchange block {:?} does not match {} virtual orbitals",
                pair.key(),
                canonical_integrals.shape(),
                n_virt
            )));
        }
        let diagonal = pair.is_diagonal();
        let f_ii = system.occupied_fock()[(pair.i, pair.i)];
        let f_jj = system.occupied_fock()[(pair.j, pair.j)];
        let eps = system.virtual_energies();

        let u_canonical = uncoupled_term(eps, f_ii, f_jj);
        let t0 = -canonical_integrals.component_div(&u_canonical);
        let full_energy = self.semicanonical_energy(canonical_integrals, &u_canonical, diagonal);

        // Pair density from the contravariant amplitudes 4T - 2Tᵀ
        let t_tilde = &t0 * 4.0 - t0.transpose() * 2.0;
        let norm = if diagonal { 0.5 } else { 1.0 };
        let density = symmetrize(&((t_tilde.transpose() * &t0 + &t_tilde * t0.transpose()) * norm));

        let eigen = density.symmetric_eigen();
        let threshold = self.threshold_for(pair.pair_type);
        let mut kept: Vec<usize> = (0..n_virt)
            .filter(|&a| threshold <= 0.0 || eigen.eigenvalues[a] >= threshold)
            .collect();
        kept.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let mut pnos = DMatrix::zeros(n_virt, kept.len());
        for (col, &idx) in kept.iter().enumerate() {
            pnos.set_column(col, &eigen.eigenvectors.column(idx));
        }

        // Semicanonicalize the virtual Fock block in the kept space
        let pno_fock = symmetrize(&(pnos.transpose() * DMatrix::from_diagonal(eps) * &pnos));
        let fock_eigen = pno_fock.symmetric_eigen();
        let mut order: Vec<usize> = (0..kept.len()).collect();
        order.sort_by(|&a, &b| fock_eigen.eigenvalues[a].total_cmp(&fock_eigen.eigenvalues[b]));
        let rotation = DMatrix::from_fn(kept.len(), kept.len(), |r, c| {
            fock_eigen.eigenvectors[(r, order[c])]
        });
        let pno_energies = DVector::from_iterator(
            kept.len(),
            order.iter().map(|&idx| fock_eigen.eigenvalues[idx]),
        );
        let pnos = pnos * rotation;

        let k_pno = pnos.transpose() * canonical_integrals * &pnos;
        let u_pno = uncoupled_term(&pno_energies, f_ii, f_jj);
        let truncated_energy = self.semicanonical_energy(&k_pno, &u_pno, diagonal);

        debug!(
            "Pair {} ({}): {} of {} PNOs kept, truncation error {:.3e}",
            pair.key(),
            pair.pair_type,
            kept.len(),
            n_virt,
            full_energy - truncated_energy
        );

        pair.exchange_integrals = k_pno;
        pair.uncoupled_term = u_pno;
        pair.pno_coefficients = pnos;
        pair.pno_energies = pno_energies;
        pair.semicanonical_pair_energy = full_energy;
        pair.delta_pno = full_energy - truncated_energy;
        pair.reset_amplitudes();
        Ok(())
    }
}
