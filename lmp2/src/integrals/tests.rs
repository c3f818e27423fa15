//! Tests for integral transformers, PNO construction and the coupling map

use super::*;
use crate::pairs::{PairArena, PairKey, PairType};
use nalgebra::{DVector, Vector3};

fn model_system(fock: DMatrix<f64>, virtual_energies: Vec<f64>) -> CorrelationSystem {
    let n_occ = fock.nrows();
    CorrelationSystem::from_occupied_fock(
        fock,
        DVector::from_vec(virtual_energies),
        vec![Vector3::zeros(); n_occ],
    )
    .unwrap()
}

fn model_block() -> DMatrix<f64> {
    DMatrix::from_row_slice(3, 3, &[0.12, 0.03, -0.01, 0.02, 0.08, 0.015, -0.02, 0.01, 0.05])
}

fn pno_constructor(pno_threshold: f64) -> SemicanonicalPnoConstructor {
    SemicanonicalPnoConstructor {
        pno_threshold,
        distant_pno_scaling: 10.0,
        ss_scaling: 1.0,
        os_scaling: 1.0,
    }
}

#[test]
fn test_operator_names() {
    assert_eq!("coulomb".parse::<IntegralOperator>().unwrap(), IntegralOperator::Coulomb);
    assert_eq!("ERF_COULOMB".parse::<IntegralOperator>().unwrap(), IntegralOperator::ErfCoulomb);
    assert!("yukawa".parse::<IntegralOperator>().is_err());
    assert_eq!(IntegralOperator::ErfCoulomb.to_string(), "erf_coulomb");
}

#[test]
fn test_four_center_reversed_block_is_transposed() {
    let mut transformer = FourCenterTransformer::new(3);
    transformer.insert(0, 1, model_block()).unwrap();

    let forward = transformer.exchange_block(0, 1).unwrap();
    let reversed = transformer.exchange_block(1, 0).unwrap();
    assert_eq!(forward.integrals, model_block());
    assert_eq!(reversed.integrals, model_block().transpose());
    assert_eq!(forward.n_aux_functions, 0);

    assert!(transformer.exchange_block(0, 2).is_err());
    assert!(transformer.insert(1, 1, DMatrix::zeros(2, 2)).is_err());
}

#[test]
fn test_only_coulomb_is_supported() {
    let four_center = FourCenterTransformer::new(1);
    assert!(four_center.supports(IntegralOperator::Coulomb));
    assert!(!four_center.supports(IntegralOperator::ErfCoulomb));

    let fitted = DensityFittedTransformer::new(
        vec![DMatrix::from_element(1, 1, 0.3)],
        &DMatrix::identity(1, 1),
        1e-10,
        0.0,
    )
    .unwrap();
    assert!(!fitted.supports(IntegralOperator::ErfCoulomb));
}

#[test]
fn test_ao_transformation_with_unit_coefficients() {
    // Three basis functions: the first is occupied, the other two are virtual
    let n = 3;
    let ao = DMatrix::from_fn(n * n, n * n, |r, c| 0.01 * (r as f64 + 1.0) + 0.001 * c as f64);
    let identity = DMatrix::<f64>::identity(n, n);
    let c_occ = identity.columns(0, 1).into_owned();
    let c_vir = identity.columns(1, 2).into_owned();

    let transformer = FourCenterTransformer::from_ao_integrals(&ao, &c_occ, &c_vir).unwrap();
    let block = transformer.exchange_block(0, 0).unwrap().integrals;

    for a in 0..2 {
        for b in 0..2 {
            // (0 a+1 | 0 b+1) sits at row 0 + n(a+1) and column 0 + n(b+1)
            assert!((block[(a, b)] - ao[(n * (a + 1), n * (b + 1))]).abs() < 1e-14);
        }
    }
}

#[test]
fn test_density_fitting_with_unit_metric() {
    // Two auxiliary functions, two occupied, two virtual orbitals
    let p0 = DMatrix::from_row_slice(2, 2, &[0.3, 0.1, 0.2, -0.1]);
    let p1 = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.4, 0.05]);
    let transformer = DensityFittedTransformer::new(
        vec![p0.clone(), p1.clone()],
        &DMatrix::identity(2, 2),
        1e-10,
        0.0,
    )
    .unwrap();

    let block = transformer.exchange_block(0, 1).unwrap();
    let expected = DMatrix::from_fn(2, 2, |a, b| p0[(0, a)] * p0[(1, b)] + p1[(0, a)] * p1[(1, b)]);
    assert!((block.integrals - expected).abs().max() < 1e-12);
    assert_eq!(block.n_aux_functions, 2);
    assert_eq!(transformer.total_aux_functions(), 2);
}

#[test]
fn test_aux_domain_drops_functions_without_support() {
    let p0 = DMatrix::from_row_slice(2, 2, &[0.3, 0.1, 0.2, -0.1]);
    // p1 has no weight on occupied orbital 0
    let p1 = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.4, 0.05]);
    let transformer =
        DensityFittedTransformer::new(vec![p0, p1], &DMatrix::identity(2, 2), 1e-10, 1e-8).unwrap();

    assert_eq!(transformer.aux_domain(0, 1), vec![0]);
    assert_eq!(transformer.aux_domain(1, 1), vec![0, 1]);
    assert_eq!(transformer.exchange_block(0, 0).unwrap().n_aux_functions, 1);
}

#[test]
fn test_untruncated_pnos_reproduce_the_semicanonical_energy() {
    let system = model_system(
        DMatrix::from_row_slice(2, 2, &[-1.0, 0.05, 0.05, -0.8]),
        vec![0.5, 0.7, 1.1],
    );
    let k = model_block();
    let mut pair = OrbitalPair::new(0, 1, PairType::Close);
    pno_constructor(0.0).construct(&mut pair, &k, &system).unwrap();

    // Canonical reference: T = -K / (e_a + e_b - f_ii - f_jj)
    let eps = system.virtual_energies();
    let mut reference = 0.0;
    for a in 0..3 {
        for b in 0..3 {
            let t_ab = -k[(a, b)] / (eps[a] + eps[b] + 1.8);
            let t_ba = -k[(b, a)] / (eps[a] + eps[b] + 1.8);
            reference += 2.0 * ((t_ab - t_ba) * k[(a, b)] + t_ab * k[(a, b)]);
        }
    }

    assert_eq!(pair.n_pno(), 3);
    assert!((pair.semicanonical_pair_energy - reference).abs() < 1e-12);
    assert!(pair.delta_pno.abs() < 1e-12);
    assert_eq!(pair.amplitudes, DMatrix::zeros(3, 3));
    // Semicanonical: the uncoupled term is built from sorted PNO energies
    assert!(pair.pno_energies[0] <= pair.pno_energies[1]);
    assert!((pair.uncoupled_term[(0, 0)] - (2.0 * pair.pno_energies[0] + 1.8)).abs() < 1e-12);
}

#[test]
fn test_truncation_is_looser_for_distant_pairs() {
    let system = model_system(DMatrix::from_diagonal(&DVector::from_vec(vec![-1.0, -0.8])), vec![0.5, 0.7, 1.1]);
    let k = model_block();
    let constructor = pno_constructor(1e-4);

    let mut close = OrbitalPair::new(0, 1, PairType::Close);
    let mut distant = OrbitalPair::new(0, 1, PairType::Distant);
    constructor.construct(&mut close, &k, &system).unwrap();
    constructor.construct(&mut distant, &k, &system).unwrap();

    assert!(distant.n_pno() < close.n_pno());
    // Dropping PNOs loses correlation energy, the correction is negative
    assert!(distant.delta_pno < 0.0);
    assert!(distant.delta_pno <= close.delta_pno + 1e-15);
}

#[test]
fn test_overlap_of_a_pair_with_itself_is_unit() {
    let system = model_system(DMatrix::from_diagonal(&DVector::from_vec(vec![-1.0, -0.8])), vec![0.5, 0.7, 1.1]);
    let mut pair = OrbitalPair::new(0, 1, PairType::Close);
    pno_constructor(0.0).construct(&mut pair, &model_block(), &system).unwrap();

    let s = PnoOverlapProvider.overlap(&pair, &pair);
    assert!((s - DMatrix::<f64>::identity(3, 3)).abs().max() < 1e-12);
}

fn unit_pair(i: usize, j: usize) -> OrbitalPair {
    let mut pair = OrbitalPair::with_integrals(
        i,
        j,
        PairType::Close,
        DMatrix::from_element(1, 1, 0.1),
        DMatrix::from_element(1, 1, 1.0),
    )
    .unwrap();
    pair.pno_coefficients = DMatrix::from_element(1, 1, 1.0);
    pair
}

#[test]
fn test_coupling_map_follows_fock_prescreening() {
    let fock = DMatrix::from_row_slice(3, 3, &[-1.0, 0.1, 0.0, 0.1, -0.9, 1e-7, 0.0, 1e-7, -0.7]);
    let pairs = vec![unit_pair(0, 0), unit_pair(0, 1), unit_pair(1, 1), unit_pair(2, 2)];
    let mut arena = PairArena::from_pairs(pairs).unwrap();

    let n_sets = build_coupling_map(&mut arena, &fock, 1e-5, &PnoOverlapProvider).unwrap();

    let diag = arena.get(PairKey::new(0, 0)).unwrap();
    assert_eq!(diag.coupled_pairs.len(), 1);
    let set = &diag.coupled_pairs[0];
    assert_eq!(set.k, 1);
    assert_eq!(set.ik_pair(), Some(PairKey::new(0, 1)));
    assert_eq!(set.kj_pair(), Some(PairKey::new(0, 1)));
    assert_eq!(set.s_ij_kj().shape(), (1, 1));

    // (2, 2) only couples through f_12, which is below the threshold
    assert!(arena.get(PairKey::new(2, 2)).unwrap().coupled_pairs.is_empty());

    // (0, 1): k = 0 through (0, 1) itself and f_10; k = 1 likewise
    let off_diag = arena.get(PairKey::new(0, 1)).unwrap();
    let ks: Vec<usize> = off_diag.coupled_pairs.iter().map(|s| s.k).collect();
    assert_eq!(ks, vec![0, 1]);

    let total: usize = arena.pairs().iter().map(|p| p.coupled_pairs.len()).sum();
    assert_eq!(n_sets, total);
}
