//! The active system seen by the correlation engine
//!
//! Holds the converged reference data the pair solver needs: occupied orbital
//! coefficients, the Fock matrix, canonical virtual orbital energies and the
//! centroids of the (localized) occupied orbitals.

use crate::error::CorrelationError;
use nalgebra::{DMatrix, DVector, Vector3};

#[derive(Debug, Clone)]
pub struct CorrelationSystem {
    occupied_coefficients: DMatrix<f64>,
    fock: DMatrix<f64>,
    occupied_fock: DMatrix<f64>,
    virtual_energies: DVector<f64>,
    centroids: Vec<Vector3<f64>>,
    /// <i|r|a> for every occupied i and canonical virtual a
    transition_dipoles: Option<Vec<Vec<Vector3<f64>>>>,
}

impl CorrelationSystem {
    /// Build the system from the occupied coefficients (n_basis x n_occ) and
    /// the Fock matrix in the same basis.
    pub fn new(
        occupied_coefficients: DMatrix<f64>,
        fock: DMatrix<f64>,
        virtual_energies: DVector<f64>,
        centroids: Vec<Vector3<f64>>,
    ) -> Result<Self, CorrelationError> {
        if fock.nrows() != fock.ncols() {
            return Err(CorrelationError::configuration("Fock matrix must be square"));
        }
        if occupied_coefficients.nrows() != fock.nrows() {
            return Err(CorrelationError::configuration(format!(
                "occupied coefficients have {} rows, Fock matrix has dimension {}",
                occupied_coefficients.nrows(),
                fock.nrows()
            )));
        }
        let n_occ = occupied_coefficients.ncols();
        if centroids.len() != n_occ {
            return Err(CorrelationError::configuration(format!(
                "{} orbital centroids given for {} occupied orbitals",
                centroids.len(),
                n_occ
            )));
        }

        let occupied_fock = occupied_coefficients.transpose() * &fock * &occupied_coefficients;

        Ok(CorrelationSystem {
            occupied_coefficients,
            fock,
            occupied_fock,
            virtual_energies,
            centroids,
            transition_dipoles: None,
        })
    }

    /// Build the system directly from the occupied block of the MO Fock matrix.
    pub fn from_occupied_fock(
        occupied_fock: DMatrix<f64>,
        virtual_energies: DVector<f64>,
        centroids: Vec<Vector3<f64>>,
    ) -> Result<Self, CorrelationError> {
        let n_occ = occupied_fock.nrows();
        Self::new(
            DMatrix::identity(n_occ, n_occ),
            occupied_fock,
            virtual_energies,
            centroids,
        )
    }

    pub fn with_transition_dipoles(
        mut self,
        dipoles: Vec<Vec<Vector3<f64>>>,
    ) -> Result<Self, CorrelationError> {
        if dipoles.len() != self.n_occupied() {
            return Err(CorrelationError::configuration(format!(
                "transition dipoles given for {} occupied orbitals, expected {}",
                dipoles.len(),
                self.n_occupied()
            )));
        }
        if let Some(row) = dipoles.iter().find(|row| row.len() != self.n_virtual()) {
            return Err(CorrelationError::configuration(format!(
                "transition dipole row has {} virtual entries, expected {}",
                row.len(),
                self.n_virtual()
            )));
        }
        self.transition_dipoles = Some(dipoles);
        Ok(self)
    }

    pub fn n_occupied(&self) -> usize {
        self.occupied_coefficients.ncols()
    }

    pub fn n_virtual(&self) -> usize {
        self.virtual_energies.len()
    }

    pub fn occupied_coefficients(&self) -> &DMatrix<f64> {
        &self.occupied_coefficients
    }

    pub fn fock(&self) -> &DMatrix<f64> {
        &self.fock
    }

    /// Occupied block of the Fock matrix in the MO basis, Cᵀ F C.
    pub fn occupied_fock(&self) -> &DMatrix<f64> {
        &self.occupied_fock
    }

    pub fn virtual_energies(&self) -> &DVector<f64> {
        &self.virtual_energies
    }

    pub fn centroid(&self, i: usize) -> Vector3<f64> {
        self.centroids[i]
    }

    pub fn centroids(&self) -> &[Vector3<f64>] {
        &self.centroids
    }

    pub fn transition_dipoles(&self) -> Option<&[Vec<Vector3<f64>>]> {
        self.transition_dipoles.as_deref()
    }
}
