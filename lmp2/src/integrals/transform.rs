//! Four-center and density-fitted exchange integral transformers

use super::{ExchangeBlock, ExchangeIntegralTransformer, IntegralOperator};
use crate::error::CorrelationError;
use crate::math::pseudo_inverse_sqrt_sym;
use crate::pairs::PairKey;
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Exact MO-basis (ia|jb) blocks, one per canonical pair.
#[derive(Debug, Clone)]
pub struct FourCenterTransformer {
    n_virtual: usize,
    blocks: BTreeMap<PairKey, DMatrix<f64>>,
}

impl FourCenterTransformer {
    pub fn new(n_virtual: usize) -> Self {
        FourCenterTransformer {
            n_virtual,
            blocks: BTreeMap::new(),
        }
    }

    /// Store the block (ia|jb) of the ordered pair (i, j).
    pub fn insert(&mut self, i: usize, j: usize, block: DMatrix<f64>) -> Result<(), CorrelationError> {
        if block.shape() != (self.n_virtual, self.n_virtual) {
            return Err(CorrelationError::configuration(format!(
                "exchange block ({i}, {j}) has shape {:?}, expected {n}x{n}",
                block.shape(),
                n = self.n_virtual
            )));
        }
        let block = if PairKey::is_reversed(i, j) {
            block.transpose()
        } else {
            block
        };
        self.blocks.insert(PairKey::new(i, j), block);
        Ok(())
    }

    /// Transform AO integrals into MO exchange blocks for every occupied pair.
    ///
    /// `ao_integrals` holds (μν|λσ) as an n²×n² matrix with row μ + nν and
    /// column λ + nσ. The first index pair is transformed to (i a| and the
    /// second to |j b) in two successive half transformations.
    pub fn from_ao_integrals(
        ao_integrals: &DMatrix<f64>,
        occupied_coefficients: &DMatrix<f64>,
        virtual_coefficients: &DMatrix<f64>,
    ) -> Result<Self, CorrelationError> {
        let n_basis = occupied_coefficients.nrows();
        let n_occ = occupied_coefficients.ncols();
        let n_virt = virtual_coefficients.ncols();
        let n2 = n_basis * n_basis;
        if ao_integrals.shape() != (n2, n2) || virtual_coefficients.nrows() != n_basis {
            return Err(CorrelationError::configuration(format!(
                "AO integrals {:?} do not match {} basis functions",
                ao_integrals.shape(),
                n_basis
            )));
        }

        let half = |ao_pair: &[f64]| -> DMatrix<f64> {
            let block = DMatrix::from_column_slice(n_basis, n_basis, ao_pair);
            occupied_coefficients.transpose() * block * virtual_coefficients
        };
        let column =
            |m: &DMatrix<f64>, col: usize| -> Vec<f64> { m.column(col).iter().copied().collect() };

        // (ia|λσ): one column per occupied-virtual index i + n_occ a
        let mut first = DMatrix::zeros(n2, n_occ * n_virt);
        for col in 0..n2 {
            let ia = half(&column(ao_integrals, col));
            for (idx, value) in ia.iter().enumerate() {
                first[(col, idx)] = *value;
            }
        }

        // (ia|jb)
        let transformed: Vec<DMatrix<f64>> = (0..n_occ * n_virt)
            .into_par_iter()
            .map(|ia| half(&column(&first, ia)))
            .collect();

        let mut transformer = FourCenterTransformer::new(n_virt);
        for i in 0..n_occ {
            for j in i..n_occ {
                let block = DMatrix::from_fn(n_virt, n_virt, |a, b| {
                    transformed[i + n_occ * a][(j, b)]
                });
                transformer.insert(i, j, block)?;
            }
        }
        info!(
            "Four-center transformation: {} occupied, {} virtual orbitals",
            n_occ, n_virt
        );
        Ok(transformer)
    }
}

impl ExchangeIntegralTransformer for FourCenterTransformer {
    fn name(&self) -> &'static str {
        "four-center"
    }

    fn supports(&self, operator: IntegralOperator) -> bool {
        operator == IntegralOperator::Coulomb
    }

    fn exchange_block(&self, i: usize, j: usize) -> Result<ExchangeBlock, CorrelationError> {
        let block = self.blocks.get(&PairKey::new(i, j)).ok_or_else(|| {
            CorrelationError::configuration(format!("no four-center exchange integrals for pair ({i}, {j})"))
        })?;
        let integrals = if PairKey::is_reversed(i, j) {
            block.transpose()
        } else {
            block.clone()
        };
        Ok(ExchangeBlock {
            integrals,
            n_aux_functions: 0,
        })
    }

    fn total_aux_functions(&self) -> usize {
        0
    }
}

/// Density-fitted exchange integrals (ia|jb) ≈ Σ_Q B^Q_ia B^Q_jb.
#[derive(Debug, Clone)]
pub struct DensityFittedTransformer {
    /// Fitted B^Q, one n_occ x n_virt matrix per auxiliary function
    fitted: Vec<DMatrix<f64>>,
    aux_domain_threshold: f64,
}

impl DensityFittedTransformer {
    /// Fit three-center integrals (P|ia) with the metric (P|Q).
    ///
    /// Metric eigenvalues below `metric_threshold` are dropped from the
    /// inverse square root.
    pub fn new(
        three_center: Vec<DMatrix<f64>>,
        metric: &DMatrix<f64>,
        metric_threshold: f64,
        aux_domain_threshold: f64,
    ) -> Result<Self, CorrelationError> {
        let n_aux = three_center.len();
        if metric.shape() != (n_aux, n_aux) {
            return Err(CorrelationError::configuration(format!(
                "fitting metric has shape {:?} for {} auxiliary functions",
                metric.shape(),
                n_aux
            )));
        }
        let shape = three_center.first().map(|m| m.shape()).unwrap_or((0, 0));
        if three_center.iter().any(|m| m.shape() != shape) {
            return Err(CorrelationError::configuration(
                "three-center integrals differ in shape between auxiliary functions",
            ));
        }

        let inv_sqrt = pseudo_inverse_sqrt_sym(metric, metric_threshold)?;
        let fitted = (0..n_aux)
            .into_par_iter()
            .map(|q| {
                let mut b = DMatrix::zeros(shape.0, shape.1);
                for (p, three_center_p) in three_center.iter().enumerate() {
                    b += three_center_p * inv_sqrt[(q, p)];
                }
                b
            })
            .collect();

        info!("Density fitting with {} auxiliary functions", n_aux);
        Ok(DensityFittedTransformer {
            fitted,
            aux_domain_threshold,
        })
    }

    /// Auxiliary functions whose contribution to the pair (i, j) reaches the
    /// domain threshold, measured by ‖B^Q_i‖ ‖B^Q_j‖.
    pub fn aux_domain(&self, i: usize, j: usize) -> Vec<usize> {
        self.fitted
            .iter()
            .enumerate()
            .filter(|(_, b)| b.row(i).norm() * b.row(j).norm() >= self.aux_domain_threshold)
            .map(|(q, _)| q)
            .collect()
    }
}

impl ExchangeIntegralTransformer for DensityFittedTransformer {
    fn name(&self) -> &'static str {
        "density-fitted"
    }

    fn supports(&self, operator: IntegralOperator) -> bool {
        operator == IntegralOperator::Coulomb
    }

    fn exchange_block(&self, i: usize, j: usize) -> Result<ExchangeBlock, CorrelationError> {
        let n_occ = self.fitted.first().map_or(0, |b| b.nrows());
        if i >= n_occ || j >= n_occ {
            return Err(CorrelationError::configuration(format!(
                "pair ({i}, {j}) is outside the {n_occ} fitted occupied orbitals"
            )));
        }
        let domain = self.aux_domain(i, j);
        let n_virt = self.fitted[0].ncols();

        let bi = DMatrix::from_fn(domain.len(), n_virt, |q, a| self.fitted[domain[q]][(i, a)]);
        let bj = DMatrix::from_fn(domain.len(), n_virt, |q, b| self.fitted[domain[q]][(j, b)]);
        debug!("Pair ({}, {}): auxiliary domain of {} functions", i, j, domain.len());

        Ok(ExchangeBlock {
            integrals: bi.transpose() * bj,
            n_aux_functions: domain.len(),
        })
    }

    fn total_aux_functions(&self) -> usize {
        self.fitted.len()
    }
}
