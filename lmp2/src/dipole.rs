//! Dipole estimate of the pair energy of very distant pairs
//!
//! For well separated orbitals i and j the exchange integral reduces to the
//! interaction of two transition dipoles μ_ia = <i|r|a> and μ_jb:
//!
//! (ia|jb) ≈ [μ_ia·μ_jb - 3 (μ_ia·R̂)(μ_jb·R̂)] / R³
//!
//! with R the separation of the orbital centroids.

use crate::pairs::OrbitalPair;
use crate::system::CorrelationSystem;
use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::{info, warn};

pub struct DipoleApproximation<'a> {
    system: &'a CorrelationSystem,
    ss_scaling: f64,
    os_scaling: f64,
}

impl<'a> DipoleApproximation<'a> {
    pub fn new(system: &'a CorrelationSystem, ss_scaling: f64, os_scaling: f64) -> Self {
        DipoleApproximation {
            system,
            ss_scaling,
            os_scaling,
        }
    }

    /// Approximate (ia|jb) block, or `None` without transition dipoles or for
    /// coinciding centroids.
    pub fn exchange_integrals(&self, i: usize, j: usize) -> Option<DMatrix<f64>> {
        let dipoles = self.system.transition_dipoles()?;
        let r = self.system.centroid(j) - self.system.centroid(i);
        let distance = r.norm();
        if distance <= 0.0 {
            return None;
        }
        let direction = r / distance;
        let r3 = distance.powi(3);
        let n_virt = self.system.n_virtual();

        Some(DMatrix::from_fn(n_virt, n_virt, |a, b| {
            let mu_ia = &dipoles[i][a];
            let mu_jb = &dipoles[j][b];
            (mu_ia.dot(mu_jb) - 3.0 * mu_ia.dot(&direction) * mu_jb.dot(&direction)) / r3
        }))
    }

    /// E_ij = -2 (ss + os) Σ_ab (ia|jb)² / (ε_a + ε_b - f_ii - f_jj)
    pub fn pair_energy(&self, i: usize, j: usize) -> f64 {
        let Some(k) = self.exchange_integrals(i, j) else {
            return 0.0;
        };
        let f = self.system.occupied_fock();
        let eps = self.system.virtual_energies();
        let f_ij = f[(i, i)] + f[(j, j)];

        let mut sum = 0.0;
        for b in 0..k.ncols() {
            for a in 0..k.nrows() {
                sum += k[(a, b)] * k[(a, b)] / (eps[a] + eps[b] - f_ij);
            }
        }
        -2.0 * (self.ss_scaling + self.os_scaling) * sum
    }

    /// Store the dipole pair energy on every very distant pair.
    pub fn apply(&self, pairs: &mut [OrbitalPair]) {
        if pairs.is_empty() {
            return;
        }
        if self.system.transition_dipoles().is_none() {
            warn!(
                "No transition dipoles available, {} very distant pairs contribute no dipole energy",
                pairs.len()
            );
        }
        pairs
            .par_iter_mut()
            .for_each(|pair| pair.dipole_pair_energy = self.pair_energy(pair.i, pair.j));

        let total: f64 = pairs.iter().map(|p| p.dipole_pair_energy).sum();
        info!("Dipole correction for {} very distant pairs: {:.10}", pairs.len(), total);
    }
}
