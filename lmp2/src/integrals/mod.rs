//! Exchange integrals, pair natural orbitals and the coupling map
//!
//! The amplitude solver never builds integrals itself. It talks to three
//! collaborators:
//!
//! - an [`ExchangeIntegralTransformer`] that delivers the canonical exchange
//!   block K_ij[a, b] = (ia|jb) of an occupied pair,
//! - a [`PnoConstructor`] that compresses that block into the pair's
//!   semicanonical PNO space,
//! - a [`DomainOverlapProvider`] that projects between the PNO spaces of two
//!   pairs.
//!
//! Transformers advertise the operators they can handle through
//! [`ExchangeIntegralTransformer::supports`]; asking for anything else is an
//! error, never a silent fallback.

mod coupling_map;
mod overlap;
mod pno;
mod transform;

pub use coupling_map::build_coupling_map;
pub use overlap::PnoOverlapProvider;
pub use pno::SemicanonicalPnoConstructor;
pub use transform::{DensityFittedTransformer, FourCenterTransformer};

use crate::error::CorrelationError;
use crate::pairs::OrbitalPair;
use crate::system::CorrelationSystem;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Two-electron operator used for the exchange integrals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegralOperator {
    Coulomb,
    /// Long-range (error-function attenuated) Coulomb operator
    ErfCoulomb,
}

impl fmt::Display for IntegralOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegralOperator::Coulomb => f.write_str("coulomb"),
            IntegralOperator::ErfCoulomb => f.write_str("erf_coulomb"),
        }
    }
}

impl FromStr for IntegralOperator {
    type Err = CorrelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coulomb" => Ok(IntegralOperator::Coulomb),
            "erf_coulomb" | "erfcoulomb" => Ok(IntegralOperator::ErfCoulomb),
            other => Err(CorrelationError::configuration(format!(
                "unknown integral operator '{other}'"
            ))),
        }
    }
}

/// Canonical exchange integrals of one pair.
#[derive(Debug, Clone)]
pub struct ExchangeBlock {
    /// (ia|jb) with rows a and columns b over the canonical virtuals
    pub integrals: DMatrix<f64>,
    /// Size of the auxiliary domain used for the block (0 without fitting)
    pub n_aux_functions: usize,
}

pub trait ExchangeIntegralTransformer: Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn supports(&self, operator: IntegralOperator) -> bool;

    /// Exchange block for the ordered pair (i, j); (j, i) gives the transpose.
    fn exchange_block(&self, i: usize, j: usize) -> Result<ExchangeBlock, CorrelationError>;

    /// Number of auxiliary functions available to the transformer.
    fn total_aux_functions(&self) -> usize;
}

pub trait PnoConstructor: Sync {
    /// Build the truncated PNO space of `pair` from its canonical exchange
    /// block and express the pair's integrals, uncoupled term and amplitudes
    /// in it. Also records the semicanonical pair energy and the truncation
    /// correction.
    fn construct(
        &self,
        pair: &mut OrbitalPair,
        canonical_integrals: &DMatrix<f64>,
        system: &CorrelationSystem,
    ) -> Result<(), CorrelationError>;
}

pub trait DomainOverlapProvider: Sync {
    /// Overlap between the local virtual spaces of two pairs
    /// (rows: `bra`, columns: `ket`).
    fn overlap(&self, bra: &OrbitalPair, ket: &OrbitalPair) -> DMatrix<f64>;
}

#[cfg(test)]
mod tests;
