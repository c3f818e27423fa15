use super::DomainOverlapProvider;
use crate::error::CorrelationError;
use crate::pairs::{CouplingOrbitalSet, PairArena, PairKey};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Attach one coupling set per pair (i, j) and intermediate k that can
/// contribute to the residual, together with the PNO overlap projectors.
///
/// A set is created when (k, j) is in the arena with |f_ik| at or above
/// `fock_threshold` and i != k, or when (i, k) is in the arena with |f_jk| at
/// or above the threshold and j != k. Returns the number of sets created.
///
/// Must run inside the caller's execution context.
pub fn build_coupling_map(
    arena: &mut PairArena,
    occupied_fock: &DMatrix<f64>,
    fock_threshold: f64,
    overlaps: &dyn DomainOverlapProvider,
) -> Result<usize, CorrelationError> {
    let n_occ = occupied_fock.nrows();

    let shared: &PairArena = arena;
    let sets: Vec<Vec<CouplingOrbitalSet>> = shared
        .pairs()
        .par_iter()
        .map(|pair| {
            let (i, j) = (pair.i, pair.j);
            (0..n_occ)
                .filter_map(|k| {
                    let ik = shared.get(PairKey::new(i, k));
                    let kj = shared.get(PairKey::new(k, j));
                    let kj_term = kj.is_some()
                        && i != k
                        && occupied_fock[(i, k)].abs() >= fock_threshold;
                    let ik_term = ik.is_some()
                        && j != k
                        && occupied_fock[(j, k)].abs() >= fock_threshold;
                    if !kj_term && !ik_term {
                        return None;
                    }
                    let s_ij_ik = ik.map_or_else(|| DMatrix::zeros(0, 0), |ik| overlaps.overlap(pair, ik));
                    let s_ij_kj = kj.map_or_else(|| DMatrix::zeros(0, 0), |kj| overlaps.overlap(pair, kj));
                    Some(CouplingOrbitalSet::with_overlaps(
                        k,
                        ik.map(|p| p.key()),
                        kj.map(|p| p.key()),
                        s_ij_ik,
                        s_ij_kj,
                    ))
                })
                .collect()
        })
        .collect();

    let mut n_sets = 0;
    for (pair, pair_sets) in arena.pairs_mut().iter_mut().zip(sets) {
        pair.coupled_pairs.clear();
        for set in pair_sets {
            pair.add_coupling_set(set)?;
            n_sets += 1;
        }
    }
    Ok(n_sets)
}
