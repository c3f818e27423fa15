use super::{CouplingOrbitalSet, PairKey};
use crate::error::CorrelationError;
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// Screening tier of an orbital pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairType {
    /// Full amplitude optimization.
    Close,
    /// Optimized in a reduced PNO space.
    Distant,
    /// Dipole approximation only.
    VeryDistant,
}

impl fmt::Display for PairType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PairType::Close => "CLOSE",
            PairType::Distant => "DISTANT",
            PairType::VeryDistant => "VERY_DISTANT",
        };
        f.write_str(name)
    }
}

/// A correlated pair of occupied orbitals (i, j) with `i <= j`.
#[derive(Debug, Clone)]
pub struct OrbitalPair {
    pub i: usize,
    pub j: usize,
    pub pair_type: PairType,

    /// Exchange integrals K_ij in the pair's PNO basis
    pub exchange_integrals: DMatrix<f64>,

    /// Amplitudes T_ij, same shape as K_ij
    pub amplitudes: DMatrix<f64>,

    /// Residual of the last optimization cycle
    pub residual: DMatrix<f64>,

    /// ε_a + ε_b - f_ii - f_jj in the semicanonical PNO basis
    pub uncoupled_term: DMatrix<f64>,

    /// PNO coefficients in the canonical virtual basis (n_virt x n_pno)
    pub pno_coefficients: DMatrix<f64>,

    /// Semicanonical PNO energies
    pub pno_energies: DVector<f64>,

    pub n_aux_functions: usize,

    /// Local MP2 pair energy including the PNO truncation correction.
    /// `None` until the energy has been evaluated.
    pub pair_energy: Option<f64>,
    pub delta_pno: f64,
    pub dipole_pair_energy: f64,
    pub semicanonical_pair_energy: f64,

    pub coupled_pairs: Vec<CouplingOrbitalSet>,
}

impl OrbitalPair {
    pub fn new(i: usize, j: usize, pair_type: PairType) -> Self {
        let key = PairKey::new(i, j);
        OrbitalPair {
            i: key.i,
            j: key.j,
            pair_type,
            exchange_integrals: DMatrix::zeros(0, 0),
            amplitudes: DMatrix::zeros(0, 0),
            residual: DMatrix::zeros(0, 0),
            uncoupled_term: DMatrix::zeros(0, 0),
            pno_coefficients: DMatrix::zeros(0, 0),
            pno_energies: DVector::zeros(0),
            n_aux_functions: 0,
            pair_energy: None,
            delta_pno: 0.0,
            dipole_pair_energy: 0.0,
            semicanonical_pair_energy: 0.0,
            coupled_pairs: Vec::new(),
        }
    }

    /// Pair with its integrals already expressed in a local basis
    ///
    /// # Arguments
    ///
    /// * `i, j` - Occupied orbital indices; a reversed pair is stored transposed
    /// * `pair_type` - Screening tier of the pair
    /// * `exchange_integrals` - K_ij in the pair's local virtual basis
    /// * `uncoupled_term` - Diagonal denominator terms, same shape as K_ij
    ///
    /// # Returns
    ///
    /// The pair with zero amplitudes and residual
    pub fn with_integrals(
        i: usize,
        j: usize,
        pair_type: PairType,
        exchange_integrals: DMatrix<f64>,
        uncoupled_term: DMatrix<f64>,
    ) -> Result<Self, CorrelationError> {
        if exchange_integrals.shape() != uncoupled_term.shape() {
            return Err(CorrelationError::configuration(format!(
                "pair ({i}, {j}): exchange integrals {:?} and uncoupled term {:?} differ in shape",
                exchange_integrals.shape(),
                uncoupled_term.shape()
            )));
        }
        let mut pair = OrbitalPair::new(i, j, pair_type);
        // K_ji = K_ijᵀ, so a reversed request is stored transposed
        let (k, u) = if PairKey::is_reversed(i, j) {
            (exchange_integrals.transpose(), uncoupled_term.transpose())
        } else {
            (exchange_integrals, uncoupled_term)
        };
        let (rows, cols) = k.shape();
        pair.exchange_integrals = k;
        pair.uncoupled_term = u;
        pair.amplitudes = DMatrix::zeros(rows, cols);
        pair.residual = DMatrix::zeros(rows, cols);
        Ok(pair)
    }

    pub fn key(&self) -> PairKey {
        PairKey {
            i: self.i,
            j: self.j,
        }
    }

    pub fn n_pno(&self) -> usize {
        self.exchange_integrals.nrows()
    }

    pub fn is_diagonal(&self) -> bool {
        self.i == self.j
    }

    /// Attach a coupling set; a second set for the same k is rejected.
    pub fn add_coupling_set(&mut self, set: CouplingOrbitalSet) -> Result<(), CorrelationError> {
        if self.coupled_pairs.iter().any(|existing| existing.k == set.k) {
            return Err(CorrelationError::configuration(format!(
                "pair {} already has a coupling set for k = {}",
                self.key(),
                set.k
            )));
        }
        self.coupled_pairs.push(set);
        Ok(())
    }

    /// Reset amplitudes and residual to zero in the current local basis.
    pub fn reset_amplitudes(&mut self) {
        let (rows, cols) = self.exchange_integrals.shape();
        self.amplitudes = DMatrix::zeros(rows, cols);
        self.residual = DMatrix::zeros(rows, cols);
    }
}
