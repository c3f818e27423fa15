//! Error types for the local correlation engine

use crate::integrals::IntegralOperator;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Integral operator {operator:?} is not supported by the {path} transformation")]
    UnsupportedOperator {
        operator: IntegralOperator,
        path: &'static str,
    },

    #[error("Canceling amplitude optimization after {cycles} cycles (abs. max. residual {residual:.3e}). NOT CONVERGED")]
    NotConverged { cycles: usize, residual: f64 },

    #[error("Numerical failure: {0}")]
    Numerical(String),

    #[error("Failed to build the worker thread pool: {source}")]
    ThreadPool {
        #[from]
        source: rayon::ThreadPoolBuildError,
    },
}

impl CorrelationError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CorrelationError::Configuration(message.into())
    }
}
