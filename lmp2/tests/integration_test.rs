//! Integration tests for the local MP2 solver
//!
//! A model system is built from canonical fitted integrals B^Q_ia. Rotating
//! the occupied orbitals gives a non-diagonal occupied Fock block, so the pair
//! equations couple. Without PNO truncation and prescreening the local
//! energy must reproduce canonical MP2 exactly.

use lmp2::{
    CentroidDistanceMetric, CorrelationSystem, DensityFittedTransformer, ExecutionContext,
    FourCenterTransformer, LocalCorrelationController, LocalCorrelationSettings, LocalMp2,
    LocalMp2Settings, PairType,
};
use nalgebra::{DMatrix, DVector, Vector3};

const N_AUX: usize = 4;
const VIRTUAL_ENERGIES: [f64; 3] = [0.5, 0.7, 1.1];

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Canonical B^Q (n_occ x n_virt) for every auxiliary function Q
    fn canonical_fitted(n_occ: usize) -> Vec<DMatrix<f64>> {
        (0..N_AUX)
            .map(|q| {
                DMatrix::from_fn(n_occ, VIRTUAL_ENERGIES.len(), |i, a| {
                    0.1 * (1.3 * q as f64 + 0.7 * i as f64 + 0.4 * a as f64 + 0.2).sin()
                })
            })
            .collect()
    }

    fn exchange(b: &[DMatrix<f64>], i: usize, j: usize) -> DMatrix<f64> {
        let n_virt = b[0].ncols();
        DMatrix::from_fn(n_virt, n_virt, |a, c| {
            b.iter().map(|bq| bq[(i, a)] * bq[(j, c)]).sum()
        })
    }

    /// Closed-shell MP2 energy Σ_ij Σ_ab T(2K - Kᵀ) over the given orbitals
    fn canonical_mp2(b: &[DMatrix<f64>], occupied_energies: &[f64], orbitals: &[usize]) -> f64 {
        let mut energy = 0.0;
        for &i in orbitals {
            for &j in orbitals {
                let k = exchange(b, i, j);
                for a in 0..k.nrows() {
                    for c in 0..k.ncols() {
                        let denominator = VIRTUAL_ENERGIES[a] + VIRTUAL_ENERGIES[c]
                            - occupied_energies[i]
                            - occupied_energies[j];
                        let t = -k[(a, c)] / denominator;
                        energy += t * (2.0 * k[(a, c)] - k[(c, a)]);
                    }
                }
            }
        }
        energy
    }

    /// Rotation mixing occupied orbitals 0 and 1, other orbitals untouched
    fn rotation(n_occ: usize, theta: f64) -> DMatrix<f64> {
        let mut c = DMatrix::identity(n_occ, n_occ);
        c[(0, 0)] = theta.cos();
        c[(1, 0)] = theta.sin();
        c[(0, 1)] = -theta.sin();
        c[(1, 1)] = theta.cos();
        c
    }

    fn localize(b: &[DMatrix<f64>], c: &DMatrix<f64>) -> Vec<DMatrix<f64>> {
        b.iter().map(|bq| c.transpose() * bq).collect()
    }

    fn exact_settings() -> (LocalMp2Settings, LocalCorrelationSettings) {
        let lmp2 = LocalMp2Settings {
            max_residual: 1e-10,
            ..LocalMp2Settings::default()
        };
        let correlation = LocalCorrelationSettings {
            pno_threshold: 0.0,
            fock_prescreening_threshold: 0.0,
            ..LocalCorrelationSettings::default()
        };
        (lmp2, correlation)
    }

    struct Model {
        system: CorrelationSystem,
        local_b: Vec<DMatrix<f64>>,
        centroids: Vec<Vector3<f64>>,
    }

    fn rotated_model(occupied_energies: &[f64], centroids: Vec<Vector3<f64>>) -> (Model, Vec<DMatrix<f64>>) {
        let n_occ = occupied_energies.len();
        let canonical = canonical_fitted(n_occ);
        let c = rotation(n_occ, 0.3);
        let fock = DMatrix::from_diagonal(&DVector::from_column_slice(occupied_energies));
        let system = CorrelationSystem::new(
            c.clone(),
            fock,
            DVector::from_column_slice(&VIRTUAL_ENERGIES),
            centroids.clone(),
        )
        .unwrap();
        let local_b = localize(&canonical, &c);
        (
            Model {
                system,
                local_b,
                centroids,
            },
            canonical,
        )
    }

    fn four_center(model: &Model) -> FourCenterTransformer {
        let n_occ = model.system.n_occupied();
        let mut transformer = FourCenterTransformer::new(VIRTUAL_ENERGIES.len());
        for i in 0..n_occ {
            for j in i..n_occ {
                transformer.insert(i, j, exchange(&model.local_b, i, j)).unwrap();
            }
        }
        transformer
    }

    fn run(controller: LocalCorrelationController, settings: LocalMp2Settings, threads: usize) -> (LocalMp2, lmp2::CorrelationEnergy) {
        let mut lmp2 = LocalMp2::new(controller, settings, ExecutionContext::new(threads).unwrap()).unwrap();
        let energy = lmp2.calculate_energy_correction(None).unwrap();
        (lmp2, energy)
    }

    #[test]
    fn test_rotated_orbitals_reproduce_canonical_mp2() {
        let occupied_energies = [-1.0, -0.8];
        let (model, canonical) = rotated_model(
            &occupied_energies,
            vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 1.5)],
        );
        let reference = canonical_mp2(&canonical, &occupied_energies, &[0, 1]);
        let (settings, correlation) = exact_settings();

        // The rotation must actually couple the pairs
        assert!(model.system.occupied_fock()[(0, 1)].abs() > 1e-2);

        let transformer = four_center(&model);
        let metric = CentroidDistanceMetric::new(model.centroids.clone());
        let controller = LocalCorrelationController::new(model.system, correlation, Box::new(metric))
            .with_four_center_integrals(transformer);
        let (lmp2, energy) = run(controller, settings, 2);

        assert!(reference < 0.0);
        assert!(
            (energy.total() - reference).abs() < 1e-9,
            "LMP2 {} vs canonical {}",
            energy.total(),
            reference
        );
        assert!(energy.pno_truncation.abs() < 1e-12);
        assert_eq!(energy.dipole, 0.0);
        assert_eq!(lmp2.pairs().len(), 3);
        assert!(lmp2.pairs().iter().all(|p| p.n_pno() == VIRTUAL_ENERGIES.len()));
    }

    #[test]
    fn test_density_fitted_path_matches_four_center() {
        let occupied_energies = [-1.0, -0.8];
        let centroids = vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 1.5)];
        let (settings, correlation) = exact_settings();

        let (model, _) = rotated_model(&occupied_energies, centroids.clone());
        let four_center_energy = {
            let transformer = four_center(&model);
            let controller = LocalCorrelationController::new(
                model.system,
                correlation.clone(),
                Box::new(CentroidDistanceMetric::new(centroids.clone())),
            )
            .with_four_center_integrals(transformer);
            run(controller, settings.clone(), 1).1
        };

        let (model, _) = rotated_model(&occupied_energies, centroids.clone());
        let fitted = DensityFittedTransformer::new(
            model.local_b.clone(),
            &DMatrix::identity(N_AUX, N_AUX),
            correlation.metric_pseudo_inverse_threshold,
            correlation.aux_domain_threshold,
        )
        .unwrap();
        let df_settings = LocalMp2Settings {
            use_four_center_integrals: false,
            ..settings
        };
        let controller = LocalCorrelationController::new(
            model.system,
            correlation,
            Box::new(CentroidDistanceMetric::new(centroids)),
        )
        .with_density_fitting(fitted);
        let (lmp2, df_energy) = run(controller, df_settings, 1);

        assert!((df_energy.total() - four_center_energy.total()).abs() < 1e-10);
        assert!(lmp2.pairs().iter().all(|p| p.n_aux_functions == N_AUX));
    }

    #[test]
    fn test_far_orbital_is_treated_by_the_dipole_approximation() {
        let occupied_energies = [-1.0, -0.8, -0.9];
        let centroids = vec![
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 1.5),
            Vector3::new(0.0, 0.0, 40.0),
        ];
        let (model, canonical) = rotated_model(&occupied_energies, centroids);
        let dipoles: Vec<Vec<Vector3<f64>>> = (0..3)
            .map(|i| {
                (0..VIRTUAL_ENERGIES.len())
                    .map(|a| Vector3::new(0.1 * (i + a) as f64, 0.05, 0.2 - 0.03 * a as f64))
                    .collect()
            })
            .collect();
        let Model {
            system,
            local_b,
            centroids,
        } = model;
        let model = Model {
            system: system.with_transition_dipoles(dipoles).unwrap(),
            local_b,
            centroids,
        };

        let (settings, correlation) = exact_settings();
        let transformer = four_center(&model);
        let controller = LocalCorrelationController::new(
            model.system,
            correlation,
            Box::new(CentroidDistanceMetric::new(model.centroids.clone())),
        )
        .with_four_center_integrals(transformer);
        let (lmp2, energy) = run(controller, settings, 2);

        let very_distant: Vec<_> = lmp2
            .pairs()
            .iter()
            .filter(|p| p.pair_type == PairType::VeryDistant)
            .collect();
        assert_eq!(very_distant.len(), 2);
        assert!(very_distant.iter().all(|p| p.j == 2 && p.i < 2));
        assert!(energy.dipole < 0.0);
        let dipole_sum: f64 = very_distant.iter().map(|p| p.dipole_pair_energy).sum();
        assert!((energy.dipole - dipole_sum).abs() < 1e-15);

        // Orbital 2 is decoupled, so its diagonal pair is canonical as well
        let reference = canonical_mp2(&canonical, &occupied_energies, &[0, 1])
            + canonical_mp2(&canonical, &occupied_energies, &[2]);
        assert!((energy.local - reference).abs() < 1e-9);
    }
}
