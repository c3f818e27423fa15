// Main library file for local MP2 calculations

pub mod context;
pub mod diis_impl;
pub mod dipole;
pub mod error;
pub mod integrals;
pub mod lmp2_impl;
pub mod math;
pub mod pairs;
pub mod screening;
pub mod system;

pub use context::ExecutionContext;
pub use diis_impl::PairDiis;
pub use dipole::DipoleApproximation;
pub use error::CorrelationError;
pub use integrals::{
    DensityFittedTransformer, DomainOverlapProvider, ExchangeBlock, ExchangeIntegralTransformer,
    FourCenterTransformer, IntegralOperator, PnoConstructor, PnoOverlapProvider,
    SemicanonicalPnoConstructor,
};
pub use lmp2_impl::{
    ConvergenceReport, CorrelationEnergy, LocalCorrelationController, LocalCorrelationSettings,
    LocalMp2, LocalMp2Settings,
};
pub use pairs::{CouplingOrbitalSet, OrbitalPair, PairArena, PairKey, PairType};
pub use screening::{
    CentroidDistanceMetric, ExplicitPairMetric, MetricKind, PairClassifier, PairDistanceMetric,
    PairPartition,
};
pub use system::CorrelationSystem;
