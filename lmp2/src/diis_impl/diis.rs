extern crate nalgebra as na;

use crate::pairs::OrbitalPair;
use na::{DMatrix, DVector};
use tracing::debug;

/// Bounded FIFO history of amplitude and residual snapshots
#[derive(Debug, Clone)]
pub struct PairDiis {
    amplitudes: Vec<DVector<f64>>,
    residuals: Vec<DVector<f64>>,
    max_store: usize,
}

impl PairDiis {
    pub fn new(max_store: usize) -> Self {
        PairDiis {
            amplitudes: Vec::new(),
            residuals: Vec::new(),
            max_store: max_store.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.residuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residuals.is_empty()
    }

    fn flatten<'a>(blocks: impl Iterator<Item = &'a DMatrix<f64>>, size: usize) -> DVector<f64> {
        let mut flat = Vec::with_capacity(size);
        for block in blocks {
            flat.extend(block.iter().copied());
        }
        DVector::from_vec(flat)
    }

    /// Record the current amplitudes and residuals of `pairs` and, with at
    /// least two snapshots stored, overwrite the amplitudes with the DIIS
    /// extrapolation.
    ///
    /// Returns whether the amplitudes were replaced. A singular or non-finite
    /// subspace solve leaves them untouched.
    pub fn update(&mut self, pairs: &mut [OrbitalPair]) -> bool {
        let size: usize = pairs.iter().map(|p| p.amplitudes.len()).sum();
        let amplitudes = Self::flatten(pairs.iter().map(|p| &p.amplitudes), size);
        let residual = Self::flatten(pairs.iter().map(|p| &p.residual), size);

        if self.residuals.first().is_some_and(|r| r.len() != size) {
            debug!("DIIS history reset, amplitude space changed size");
            self.amplitudes.clear();
            self.residuals.clear();
        }

        // Remove oldest entries if the history is full
        if self.residuals.len() >= self.max_store {
            self.amplitudes.remove(0);
            self.residuals.remove(0);
        }
        self.amplitudes.push(amplitudes);
        self.residuals.push(residual);

        if self.residuals.len() < 2 {
            return false;
        }

        let extrapolated = match self.extrapolate() {
            Some(x) => x,
            None => return false,
        };

        let mut offset = 0;
        for pair in pairs.iter_mut() {
            let n = pair.amplitudes.len();
            pair.amplitudes
                .as_mut_slice()
                .copy_from_slice(&extrapolated.as_slice()[offset..offset + n]);
            offset += n;
        }
        true
    }

    fn extrapolate(&self) -> Option<DVector<f64>> {
        let n = self.residuals.len();

        // B_ij = <r_i|r_j> bordered by the constraint rows for Σ c_i = 1
        let mut b = DMatrix::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in 0..=i {
                let value = self.residuals[i].dot(&self.residuals[j]);
                b[(i, j)] = value;
                b[(j, i)] = value;
            }
            b[(i, n)] = -1.0;
            b[(n, i)] = -1.0;
        }

        // Scale for conditioning; the constraint rows are unaffected
        let scale = (0..n).map(|i| b[(i, i)]).fold(0.0_f64, f64::max);
        if scale > 0.0 {
            for i in 0..n {
                for j in 0..n {
                    b[(i, j)] /= scale;
                }
            }
        }

        let mut rhs = DVector::zeros(n + 1);
        rhs[n] = -1.0;

        let coeffs = match b.lu().solve(&rhs) {
            Some(x) => x,
            None => {
                debug!("DIIS extrapolation skipped: singular B matrix");
                return None;
            }
        };
        if coeffs.iter().any(|c| !c.is_finite()) {
            debug!("DIIS extrapolation skipped: non-finite coefficients");
            return None;
        }

        let mut extrapolated = DVector::zeros(self.amplitudes[0].len());
        for (c, amplitudes) in coeffs.iter().zip(&self.amplitudes) {
            extrapolated.axpy(*c, amplitudes, 1.0);
        }
        Some(extrapolated)
    }
}
