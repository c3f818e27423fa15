use crate::error::CorrelationError;
use crate::integrals::IntegralOperator;
use serde::{Deserialize, Serialize};

/// Settings of the local MP2 amplitude optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalMp2Settings {
    /// Same-spin component scaling
    pub ss_scaling: f64,
    /// Opposite-spin component scaling
    pub os_scaling: f64,
    /// Convergence threshold on max |R|
    pub max_residual: f64,
    pub max_cycles: usize,
    pub use_four_center_integrals: bool,
    pub operator: IntegralOperator,
}

impl Default for LocalMp2Settings {
    fn default() -> Self {
        LocalMp2Settings {
            ss_scaling: 1.0,
            os_scaling: 1.0,
            max_residual: 1e-5,
            max_cycles: 100,
            use_four_center_integrals: true,
            operator: IntegralOperator::Coulomb,
        }
    }
}

impl LocalMp2Settings {
    pub fn validate(&self) -> Result<(), CorrelationError> {
        if !(self.max_residual > 0.0) {
            return Err(CorrelationError::configuration(format!(
                "max_residual must be positive, got {}",
                self.max_residual
            )));
        }
        if self.max_cycles == 0 {
            return Err(CorrelationError::configuration("max_cycles must be at least 1"));
        }
        if !self.ss_scaling.is_finite() || !self.os_scaling.is_finite() {
            return Err(CorrelationError::configuration("spin component scaling factors must be finite"));
        }
        Ok(())
    }
}

/// Settings shared by local correlation methods: screening, PNO truncation,
/// prescreening and convergence acceleration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalCorrelationSettings {
    pub fock_prescreening_threshold: f64,
    /// DIIS runs once max |R| drops below this value
    pub diis_start_residual: f64,
    pub diis_max_store: usize,
    pub pno_threshold: f64,
    /// PNO threshold multiplier for DISTANT pairs
    pub distant_pno_scaling: f64,
    pub close_pair_cutoff: f64,
    pub very_distant_pair_cutoff: f64,
    pub aux_domain_threshold: f64,
    pub metric_pseudo_inverse_threshold: f64,
}

impl Default for LocalCorrelationSettings {
    fn default() -> Self {
        LocalCorrelationSettings {
            fock_prescreening_threshold: 1e-5,
            diis_start_residual: 1e-2,
            diis_max_store: 10,
            pno_threshold: 1e-8,
            distant_pno_scaling: 10.0,
            close_pair_cutoff: 8.0,
            very_distant_pair_cutoff: 15.0,
            aux_domain_threshold: 0.0,
            metric_pseudo_inverse_threshold: 1e-10,
        }
    }
}

impl LocalCorrelationSettings {
    pub fn validate(&self) -> Result<(), CorrelationError> {
        let non_negative = [
            ("fock_prescreening_threshold", self.fock_prescreening_threshold),
            ("diis_start_residual", self.diis_start_residual),
            ("distant_pno_scaling", self.distant_pno_scaling),
            ("aux_domain_threshold", self.aux_domain_threshold),
            ("metric_pseudo_inverse_threshold", self.metric_pseudo_inverse_threshold),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(CorrelationError::configuration(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if self.pno_threshold.is_nan() {
            return Err(CorrelationError::configuration("pno_threshold is not a number"));
        }
        if !self.close_pair_cutoff.is_finite() || !self.very_distant_pair_cutoff.is_finite() {
            return Err(CorrelationError::configuration("pair screening cutoffs must be finite"));
        }
        if self.diis_start_residual > 0.0 && self.diis_max_store == 0 {
            return Err(CorrelationError::configuration(
                "diis_max_store must be at least 1 when DIIS is enabled",
            ));
        }
        Ok(())
    }
}
