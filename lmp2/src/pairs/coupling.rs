use super::PairKey;
use nalgebra::DMatrix;

/// Coupling of a pair (i, j) to the pairs (i, k) and (k, j).
///
/// Companion pairs are referenced by key. A key of `None` means the companion
/// was screened away, and the corresponding term contributes nothing.
#[derive(Debug, Clone)]
pub struct CouplingOrbitalSet {
    pub k: usize,
    ik_pair: Option<PairKey>,
    kj_pair: Option<PairKey>,
    s_ij_ik: DMatrix<f64>,
    s_ij_kj: DMatrix<f64>,
}

impl CouplingOrbitalSet {
    pub fn new(k: usize, ik_pair: Option<PairKey>, kj_pair: Option<PairKey>) -> Self {
        CouplingOrbitalSet {
            k,
            ik_pair,
            kj_pair,
            s_ij_ik: DMatrix::zeros(0, 0),
            s_ij_kj: DMatrix::zeros(0, 0),
        }
    }

    pub fn with_overlaps(
        k: usize,
        ik_pair: Option<PairKey>,
        kj_pair: Option<PairKey>,
        s_ij_ik: DMatrix<f64>,
        s_ij_kj: DMatrix<f64>,
    ) -> Self {
        CouplingOrbitalSet {
            k,
            ik_pair,
            kj_pair,
            s_ij_ik,
            s_ij_kj,
        }
    }

    pub fn ik_pair(&self) -> Option<PairKey> {
        self.ik_pair
    }

    pub fn kj_pair(&self) -> Option<PairKey> {
        self.kj_pair
    }

    /// Overlap between the PNO spaces of (i, j) and (i, k)
    pub fn s_ij_ik(&self) -> &DMatrix<f64> {
        &self.s_ij_ik
    }

    /// Overlap between the PNO spaces of (i, j) and (k, j)
    pub fn s_ij_kj(&self) -> &DMatrix<f64> {
        &self.s_ij_kj
    }

    pub fn set_overlaps(&mut self, s_ij_ik: DMatrix<f64>, s_ij_kj: DMatrix<f64>) {
        self.s_ij_ik = s_ij_ik;
        self.s_ij_kj = s_ij_kj;
    }
}
