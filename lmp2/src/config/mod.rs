//! Configuration management for local MP2 calculations
//!
//! This module handles the YAML configuration structures, their defaults and
//! the conversion into solver settings.

mod args;

pub use args::Args;

use color_eyre::eyre::{Result, WrapErr};
use lmp2::{IntegralOperator, LocalCorrelationSettings, LocalMp2Settings};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub local_mp2: Option<LocalMp2Params>,
    pub local_correlation: Option<LocalCorrelationParams>,
    pub execution: Option<ExecutionParams>,
    pub system: SystemInput,
}

/// Amplitude optimization parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocalMp2Params {
    pub ss_scaling: Option<f64>,
    pub os_scaling: Option<f64>,
    pub max_residual: Option<f64>,
    pub max_cycles: Option<usize>,
    pub use_four_center_integrals: Option<bool>,
    pub operator: Option<String>, // "coulomb" or "erf_coulomb"
}

impl Default for LocalMp2Params {
    fn default() -> Self {
        let settings = LocalMp2Settings::default();
        LocalMp2Params {
            ss_scaling: Some(settings.ss_scaling),
            os_scaling: Some(settings.os_scaling),
            max_residual: Some(settings.max_residual),
            max_cycles: Some(settings.max_cycles),
            use_four_center_integrals: Some(settings.use_four_center_integrals),
            operator: Some(settings.operator.to_string()),
        }
    }
}

impl LocalMp2Params {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        self.ss_scaling = self.ss_scaling.or(defaults.ss_scaling);
        self.os_scaling = self.os_scaling.or(defaults.os_scaling);
        self.max_residual = self.max_residual.or(defaults.max_residual);
        self.max_cycles = self.max_cycles.or(defaults.max_cycles);
        self.use_four_center_integrals = self
            .use_four_center_integrals
            .or(defaults.use_four_center_integrals);
        if self.operator.is_none() {
            self.operator = defaults.operator;
        }
        self
    }

    pub fn to_settings(&self) -> Result<LocalMp2Settings> {
        let defaults = LocalMp2Settings::default();
        let operator = match &self.operator {
            Some(name) => name
                .parse::<IntegralOperator>()
                .wrap_err("Invalid local_mp2.operator")?,
            None => defaults.operator,
        };
        Ok(LocalMp2Settings {
            ss_scaling: self.ss_scaling.unwrap_or(defaults.ss_scaling),
            os_scaling: self.os_scaling.unwrap_or(defaults.os_scaling),
            max_residual: self.max_residual.unwrap_or(defaults.max_residual),
            max_cycles: self.max_cycles.unwrap_or(defaults.max_cycles),
            use_four_center_integrals: self
                .use_four_center_integrals
                .unwrap_or(defaults.use_four_center_integrals),
            operator,
        })
    }
}

/// Screening, PNO and convergence acceleration parameters
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LocalCorrelationParams {
    pub fock_prescreening_threshold: Option<f64>,
    pub diis_start_residual: Option<f64>,
    pub diis_max_store: Option<usize>,
    pub pno_threshold: Option<f64>,
    pub distant_pno_scaling: Option<f64>,
    pub close_pair_cutoff: Option<f64>,
    pub very_distant_pair_cutoff: Option<f64>,
    pub aux_domain_threshold: Option<f64>,
    pub metric_pseudo_inverse_threshold: Option<f64>,
}

impl LocalCorrelationParams {
    pub fn to_settings(&self) -> LocalCorrelationSettings {
        let d = LocalCorrelationSettings::default();
        LocalCorrelationSettings {
            fock_prescreening_threshold: self
                .fock_prescreening_threshold
                .unwrap_or(d.fock_prescreening_threshold),
            diis_start_residual: self.diis_start_residual.unwrap_or(d.diis_start_residual),
            diis_max_store: self.diis_max_store.unwrap_or(d.diis_max_store),
            pno_threshold: self.pno_threshold.unwrap_or(d.pno_threshold),
            distant_pno_scaling: self.distant_pno_scaling.unwrap_or(d.distant_pno_scaling),
            close_pair_cutoff: self.close_pair_cutoff.unwrap_or(d.close_pair_cutoff),
            very_distant_pair_cutoff: self
                .very_distant_pair_cutoff
                .unwrap_or(d.very_distant_pair_cutoff),
            aux_domain_threshold: self.aux_domain_threshold.unwrap_or(d.aux_domain_threshold),
            metric_pseudo_inverse_threshold: self
                .metric_pseudo_inverse_threshold
                .unwrap_or(d.metric_pseudo_inverse_threshold),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ExecutionParams {
    /// Worker threads, 0 for rayon's default
    pub threads: Option<usize>,
}

/// Reference data of the correlated system
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemInput {
    pub n_occupied: usize,
    /// Occupied MO block of the Fock matrix, or the AO Fock matrix when
    /// `occupied_coefficients` are given
    pub fock: Vec<Vec<f64>>,
    pub occupied_coefficients: Option<Vec<Vec<f64>>>,
    pub virtual_energies: Vec<f64>,
    pub centroids: Vec<[f64; 3]>,
    /// <i|r|a>, indexed [i][a]
    pub transition_dipoles: Option<Vec<Vec<[f64; 3]>>>,
    pub pair_metric: Option<PairMetricInput>,
    pub exchange_integrals: Option<Vec<ExchangeBlockInput>>,
    /// (P|ia), indexed [P][i][a]
    pub three_center: Option<Vec<Vec<Vec<f64>>>>,
    /// (P|Q)
    pub fitting_metric: Option<Vec<Vec<f64>>>,
}

/// Explicit screening metric replacing centroid distances
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PairMetricInput {
    pub kind: String, // "distance" or "overlap"
    pub values: Vec<PairValue>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PairValue {
    pub i: usize,
    pub j: usize,
    pub value: f64,
}

/// (ia|jb) of one pair, rows a and columns b
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeBlockInput {
    pub i: usize,
    pub j: usize,
    pub block: Vec<Vec<f64>>,
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.local_mp2 = Some(self.local_mp2.take().unwrap_or_default().with_defaults());
        if self.local_correlation.is_none() {
            self.local_correlation = Some(LocalCorrelationParams::default());
        }
        if self.execution.is_none() {
            self.execution = Some(ExecutionParams::default());
        }
        self
    }

    pub fn local_mp2_settings(&self, args: &Args) -> Result<LocalMp2Settings> {
        let mut settings = self
            .local_mp2
            .as_ref()
            .cloned()
            .unwrap_or_default()
            .to_settings()?;
        if let Some(max_cycles) = args.max_cycles {
            settings.max_cycles = max_cycles;
        }
        if let Some(max_residual) = args.max_residual {
            settings.max_residual = max_residual;
        }
        if args.density_fitting {
            settings.use_four_center_integrals = false;
        }
        Ok(settings)
    }

    pub fn local_correlation_settings(&self, args: &Args) -> LocalCorrelationSettings {
        let mut settings = self
            .local_correlation
            .as_ref()
            .map(LocalCorrelationParams::to_settings)
            .unwrap_or_default();
        if let Some(store) = args.diis_max_store {
            settings.diis_max_store = store;
        }
        settings
    }

    /// Worker threads, the command line wins over the file
    pub fn threads(&self, args: &Args) -> usize {
        args.threads
            .or(self.execution.as_ref().and_then(|e| e.threads))
            .unwrap_or(0)
    }
}
