use super::DomainOverlapProvider;
use crate::pairs::OrbitalPair;
use nalgebra::DMatrix;

/// PNO overlaps for PNOs expanded in orthonormal canonical virtuals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PnoOverlapProvider;

impl DomainOverlapProvider for PnoOverlapProvider {
    fn overlap(&self, bra: &OrbitalPair, ket: &OrbitalPair) -> DMatrix<f64> {
        bra.pno_coefficients.transpose() * &ket.pno_coefficients
    }
}
