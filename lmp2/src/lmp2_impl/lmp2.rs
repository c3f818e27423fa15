//! Local MP2 driver and amplitude optimization

extern crate nalgebra as na;

use super::energy::{calculate_energy, local_pair_energies, CorrelationEnergy};
use super::settings::{LocalCorrelationSettings, LocalMp2Settings};
use crate::context::ExecutionContext;
use crate::diis_impl::PairDiis;
use crate::dipole::DipoleApproximation;
use crate::error::CorrelationError;
use crate::integrals::{
    build_coupling_map, DomainOverlapProvider, ExchangeIntegralTransformer, IntegralOperator,
    PnoConstructor, PnoOverlapProvider, SemicanonicalPnoConstructor,
};
use crate::pairs::{OrbitalPair, PairArena, PairType};
use crate::screening::{PairClassifier, PairDistanceMetric, PairPartition};
use crate::system::CorrelationSystem;
use na::DMatrix;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Owner of the system and of every collaborator a local correlation
/// calculation needs.
pub struct LocalCorrelationController {
    system: CorrelationSystem,
    settings: LocalCorrelationSettings,
    metric: Box<dyn PairDistanceMetric>,
    four_center: Option<Box<dyn ExchangeIntegralTransformer>>,
    density_fitted: Option<Box<dyn ExchangeIntegralTransformer>>,
    overlaps: Box<dyn DomainOverlapProvider>,
}

impl LocalCorrelationController {
    /// Create a controller with no integral source attached
    ///
    /// # Arguments
    ///
    /// * `system` - Occupied and virtual orbital data
    /// * `settings` - Screening, PNO and prescreening thresholds
    /// * `metric` - Pair distance or overlap used to classify pairs
    ///
    /// # Returns
    ///
    /// A controller using PNO overlaps; attach four-center or density-fitted
    /// integrals before generating pairs
    pub fn new(
        system: CorrelationSystem,
        settings: LocalCorrelationSettings,
        metric: Box<dyn PairDistanceMetric>,
    ) -> Self {
        LocalCorrelationController {
            system,
            settings,
            metric,
            four_center: None,
            density_fitted: None,
            overlaps: Box::new(PnoOverlapProvider),
        }
    }

    pub fn with_four_center_integrals(
        mut self,
        transformer: impl ExchangeIntegralTransformer + 'static,
    ) -> Self {
        self.four_center = Some(Box::new(transformer));
        self
    }

    pub fn with_density_fitting(mut self, transformer: impl ExchangeIntegralTransformer + 'static) -> Self {
        self.density_fitted = Some(Box::new(transformer));
        self
    }

    pub fn with_overlap_provider(mut self, provider: impl DomainOverlapProvider + 'static) -> Self {
        self.overlaps = Box::new(provider);
        self
    }

    pub fn system(&self) -> &CorrelationSystem {
        &self.system
    }

    pub fn settings(&self) -> &LocalCorrelationSettings {
        &self.settings
    }

    pub fn overlap_provider(&self) -> &dyn DomainOverlapProvider {
        self.overlaps.as_ref()
    }

    pub fn classify_pairs(&self) -> Result<PairPartition, CorrelationError> {
        PairClassifier::new(self.settings.close_pair_cutoff, self.settings.very_distant_pair_cutoff)?
            .partition(self.system.n_occupied(), self.metric.as_ref())
    }

    /// The integral source for the requested path, checked against `operator`.
    pub fn transformer(
        &self,
        use_four_center_integrals: bool,
        operator: IntegralOperator,
    ) -> Result<&dyn ExchangeIntegralTransformer, CorrelationError> {
        let (transformer, path) = if use_four_center_integrals {
            (self.four_center.as_deref(), "four-center")
        } else {
            (self.density_fitted.as_deref(), "density-fitted")
        };
        let transformer = transformer.ok_or_else(|| {
            CorrelationError::configuration(format!("no {path} integral source configured"))
        })?;
        if !transformer.supports(operator) {
            return Err(CorrelationError::UnsupportedOperator {
                operator,
                path: transformer.name(),
            });
        }
        Ok(transformer)
    }

    pub fn produce_pno_constructor(&self, ss_scaling: f64, os_scaling: f64) -> SemicanonicalPnoConstructor {
        SemicanonicalPnoConstructor {
            pno_threshold: self.settings.pno_threshold,
            distant_pno_scaling: self.settings.distant_pno_scaling,
            ss_scaling,
            os_scaling,
        }
    }
}

/// Outcome of an amplitude optimization
#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceReport {
    pub cycles: usize,
    pub largest_residual: f64,
    /// max |R| of every cycle
    pub residual_history: Vec<f64>,
    /// Σ E_ij after the last cycle, without PNO and dipole corrections
    pub correlation_energy: f64,
}

pub struct LocalMp2 {
    pub settings: LocalMp2Settings,
    controller: LocalCorrelationController,
    context: ExecutionContext,
    report: Option<ConvergenceReport>,
    pairs: Vec<OrbitalPair>,
}

impl LocalMp2 {
    /// Create a local MP2 solver
    ///
    /// # Arguments
    ///
    /// * `controller` - System and collaborators of the calculation
    /// * `settings` - Scaling factors, convergence and DIIS parameters
    /// * `context` - Thread pool every parallel step runs in
    ///
    /// # Returns
    ///
    /// The solver, or a configuration error if either settings block is invalid
    pub fn new(
        controller: LocalCorrelationController,
        settings: LocalMp2Settings,
        context: ExecutionContext,
    ) -> Result<Self, CorrelationError> {
        settings.validate()?;
        controller.settings().validate()?;
        Ok(LocalMp2 {
            settings,
            controller,
            context,
            report: None,
            pairs: Vec::new(),
        })
    }

    pub fn controller(&self) -> &LocalCorrelationController {
        &self.controller
    }

    pub fn convergence_report(&self) -> Option<&ConvergenceReport> {
        self.report.as_ref()
    }

    /// All pairs of the last calculation, optimized pairs first.
    pub fn pairs(&self) -> &[OrbitalPair] {
        &self.pairs
    }

    /// Local MP2 correlation energy as (local, dipole, PNO truncation).
    ///
    /// Without `pairs` the occupied pairs are classified and their integrals
    /// generated here. Otherwise the given pairs must already carry their
    /// tier, integrals and coupling sets.
    pub fn calculate_energy_correction(
        &mut self,
        pairs: Option<Vec<OrbitalPair>>,
    ) -> Result<CorrelationEnergy, CorrelationError> {
        info!("Local MP2 calculation");
        info!("  Same-spin scaling:     {:>10.4}", self.settings.ss_scaling);
        info!("  Opposite-spin scaling: {:>10.4}", self.settings.os_scaling);
        info!("  Worker threads:        {:>10}", self.context.num_threads());

        let (mut arena, mut very_distant) = match pairs {
            None => {
                let partition = self.controller.classify_pairs()?;
                let (optimized, mut very_distant) = partition.into_optimized_and_very_distant();
                let dipole = DipoleApproximation::new(
                    self.controller.system(),
                    self.settings.ss_scaling,
                    self.settings.os_scaling,
                );
                self.context.install(|| dipole.apply(&mut very_distant));
                (self.generate_exchange_integrals(optimized)?, very_distant)
            }
            Some(pairs) => {
                let (optimized, very_distant): (Vec<_>, Vec<_>) = pairs
                    .into_iter()
                    .partition(|p| p.pair_type != PairType::VeryDistant);
                let arena = PairArena::from_pairs(optimized)?;
                check_pair_set(&arena, self.controller.system().n_occupied())?;
                (arena, very_distant)
            }
        };

        let report = self.optimize_amplitudes(&mut arena)?;
        let energy = calculate_energy(
            arena.pairs_mut(),
            &mut very_distant,
            self.settings.ss_scaling,
            self.settings.os_scaling,
        );

        info!("Local MP2 correlation energy:");
        info!("  Local pairs:        {:>18.10}", energy.local);
        info!("  Very distant pairs: {:>18.10}", energy.dipole);
        info!("  PNO truncation:     {:>18.10}", energy.pno_truncation);
        info!("  Total:              {:>18.10}", energy.total());

        self.report = Some(report);
        self.pairs = arena.into_pairs();
        self.pairs.extend(very_distant);
        Ok(energy)
    }

    /// Exchange integrals, PNO spaces and coupling sets for CLOSE and DISTANT
    /// pairs.
    pub fn generate_exchange_integrals(
        &self,
        mut pairs: Vec<OrbitalPair>,
    ) -> Result<PairArena, CorrelationError> {
        let transformer = self
            .controller
            .transformer(self.settings.use_four_center_integrals, self.settings.operator)?;
        let pno = self
            .controller
            .produce_pno_constructor(self.settings.ss_scaling, self.settings.os_scaling);
        let system = self.controller.system();

        info!("Generating {} exchange integrals", transformer.name());
        self.context.install(|| {
            pairs.par_iter_mut().try_for_each(|pair| {
                let block = transformer.exchange_block(pair.i, pair.j)?;
                pair.n_aux_functions = block.n_aux_functions;
                pno.construct(pair, &block.integrals, system)
            })
        })?;

        let mut arena = PairArena::from_pairs(pairs)?;
        let fock_threshold = self.controller.settings().fock_prescreening_threshold;
        let overlaps = self.controller.overlap_provider();
        let n_sets = self.context.install(|| {
            build_coupling_map(&mut arena, system.occupied_fock(), fock_threshold, overlaps)
        })?;

        let n_pairs = arena.len().max(1) as f64;
        let total_pnos: usize = arena.pairs().iter().map(|p| p.n_pno()).sum();
        let total_aux: usize = arena.pairs().iter().map(|p| p.n_aux_functions).sum();
        let semicanonical: f64 = arena.pairs().iter().map(|p| p.semicanonical_pair_energy).sum();
        info!("Pair statistics:");
        info!("  Optimized pairs:             {:>12}", arena.len());
        info!("  Coupling sets:               {:>12}", n_sets);
        info!("  Average PNOs per pair:       {:>12.2}", total_pnos as f64 / n_pairs);
        info!("  Semicanonical MP2 energy:    {:>12.8}", semicanonical);
        info!("  Average aux. functions/pair: {:>12.2}", total_aux as f64 / n_pairs);
        info!("  Total aux. functions:        {:>12}", transformer.total_aux_functions());

        Ok(arena)
    }

    /// Iterate the pair amplitudes to self-consistency.
    ///
    /// Every cycle is a Jacobi sweep: all residuals are built from the
    /// amplitudes of the previous cycle before any amplitude changes.
    pub fn optimize_amplitudes(&self, arena: &mut PairArena) -> Result<ConvergenceReport, CorrelationError> {
        let correlation = self.controller.settings();
        let fock = self.controller.system().occupied_fock();
        let fock_threshold = correlation.fock_prescreening_threshold;
        let mut diis = PairDiis::new(correlation.diis_max_store);
        let mut residual_history = Vec::new();
        let mut old_energy = 0.0;

        info!("Optimizing amplitudes of {} pairs", arena.len());
        info!("{:>6} {:>18} {:>14} {:>14}", "Cycle", "Energy", "Change", "Max |R|");

        let mut cycle = 0;
        loop {
            cycle += 1;

            let shared: &PairArena = arena;
            let residuals: Vec<DMatrix<f64>> = self.context.install(|| {
                shared
                    .pairs()
                    .par_iter()
                    .map(|pair| self.pair_residual(pair, shared, fock, fock_threshold))
                    .collect()
            });
            let max_residual = residuals
                .iter()
                .flat_map(|r| r.iter())
                .fold(0.0_f64, |max, r| max.max(r.abs()));

            self.context.install(|| {
                arena
                    .pairs_mut()
                    .par_iter_mut()
                    .zip(residuals)
                    .for_each(|(pair, residual)| {
                        pair.amplitudes -= residual.component_div(&pair.uncoupled_term);
                        pair.residual = residual;
                    })
            });

            if correlation.diis_start_residual > max_residual && diis.update(arena.pairs_mut()) {
                debug!("Cycle {}: DIIS extrapolation over {} snapshots", cycle, diis.len());
            }

            let (energy, _) =
                local_pair_energies(arena.pairs_mut(), self.settings.ss_scaling, self.settings.os_scaling);
            info!(
                "{:>6} {:>18.10} {:>14.3e} {:>14.3e}",
                cycle,
                energy,
                energy - old_energy,
                max_residual
            );
            old_energy = energy;
            residual_history.push(max_residual);

            if max_residual <= self.settings.max_residual {
                info!("Amplitudes converged after {} cycles", cycle);
                return Ok(ConvergenceReport {
                    cycles: cycle,
                    largest_residual: max_residual,
                    residual_history,
                    correlation_energy: energy,
                });
            }
            if cycle >= self.settings.max_cycles {
                return Err(CorrelationError::NotConverged {
                    cycles: cycle,
                    residual: max_residual,
                });
            }
        }
    }

    /// R_ij = K_ij + U_ij ⊙ T_ij - Σ_k [f_ik S T_kj Sᵀ + f_kj S T_ik Sᵀ]
    fn pair_residual(
        &self,
        pair: &OrbitalPair,
        arena: &PairArena,
        fock: &DMatrix<f64>,
        fock_threshold: f64,
    ) -> DMatrix<f64> {
        let (i, j) = (pair.i, pair.j);
        let n = pair.n_pno();
        let mut residual = &pair.exchange_integrals + pair.uncoupled_term.component_mul(&pair.amplitudes);
        if pair.coupled_pairs.is_empty() {
            return residual;
        }

        let chunk_len = self.context.worker_chunk_len(pair.coupled_pairs.len());
        let partial_sums: Vec<DMatrix<f64>> = pair
            .coupled_pairs
            .par_chunks(chunk_len)
            .map(|chunk| {
                let mut coupling = DMatrix::zeros(n, n);
                for set in chunk {
                    let k = set.k;
                    if set.kj_pair().is_some() && i != k {
                        let f_ik = fock[(i, k)];
                        if f_ik.abs() >= fock_threshold {
                            if let Some(t_kj) = arena.projected_amplitudes(k, j, set.s_ij_kj()) {
                                coupling -= t_kj * f_ik;
                            }
                        }
                    }
                    if set.ik_pair().is_some() && j != k {
                        let f_kj = fock[(k, j)];
                        if f_kj.abs() >= fock_threshold {
                            if let Some(t_ik) = arena.projected_amplitudes(i, k, set.s_ij_ik()) {
                                coupling -= t_ik * f_kj;
                            }
                        }
                    }
                }
                coupling
            })
            .collect();

        for partial in partial_sums {
            residual += partial;
        }
        residual
    }
}

/// Externally built pairs must index occupied orbitals of the system, and
/// their overlaps must match every companion present in the arena. Absent
/// companions were screened away and contribute nothing.
fn check_pair_set(arena: &PairArena, n_occ: usize) -> Result<(), CorrelationError> {
    for pair in arena.pairs() {
        if pair.i >= n_occ || pair.j >= n_occ {
            return Err(CorrelationError::configuration(format!(
                "pair {} is outside the {} occupied orbitals",
                pair.key(),
                n_occ
            )));
        }
        let shape = pair.exchange_integrals.shape();
        if pair.uncoupled_term.shape() != shape || pair.amplitudes.shape() != shape {
            return Err(CorrelationError::configuration(format!(
                "pair {}: integrals, uncoupled term and amplitudes differ in shape",
                pair.key()
            )));
        }
        if pair.residual.shape() != shape {
            return Err(CorrelationError::configuration(format!(
                "pair {}: residual does not match the integral block",
                pair.key()
            )));
        }
        for set in &pair.coupled_pairs {
            if set.k >= n_occ {
                return Err(CorrelationError::configuration(format!(
                    "pair {} couples through orbital {} of {} occupied orbitals",
                    pair.key(),
                    set.k,
                    n_occ
                )));
            }
            for (companion, overlap) in [(set.ik_pair(), set.s_ij_ik()), (set.kj_pair(), set.s_ij_kj())] {
                let Some(other) = companion.and_then(|key| arena.get(key)) else {
                    continue;
                };
                let key = other.key();
                if overlap.shape() != (pair.n_pno(), other.n_pno()) {
                    return Err(CorrelationError::configuration(format!(
                        "pair {}: overlap with {} has shape {:?}, expected {:?}",
                        pair.key(),
                        key,
                        overlap.shape(),
                        (pair.n_pno(), other.n_pno())
                    )));
                }
            }
        }
    }
    Ok(())
}
