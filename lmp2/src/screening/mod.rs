//! Pair screening
//!
//! Every occupied pair (i <= j) is assigned one of three tiers from an
//! externally supplied metric. CLOSE and DISTANT pairs are optimized, VERY
//! DISTANT pairs only receive the dipole estimate.

mod metric;

pub use metric::{CentroidDistanceMetric, ExplicitPairMetric, MetricKind, PairDistanceMetric};

use crate::error::CorrelationError;
use crate::pairs::{OrbitalPair, PairType};
use tracing::info;

/// Assigns screening tiers from a pair metric and two cutoffs.
///
/// For distance metrics a pair is CLOSE below `close_cutoff` and VERY DISTANT
/// at or beyond `very_distant_cutoff`. For overlap metrics the comparisons are
/// reversed: a pair is CLOSE at or above `close_cutoff`.
#[derive(Debug, Clone, Copy)]
pub struct PairClassifier {
    close_cutoff: f64,
    very_distant_cutoff: f64,
}

/// The complete, non-overlapping split of all occupied pairs.
#[derive(Debug, Default)]
pub struct PairPartition {
    pub close: Vec<OrbitalPair>,
    pub distant: Vec<OrbitalPair>,
    pub very_distant: Vec<OrbitalPair>,
}

impl PairPartition {
    pub fn len(&self) -> usize {
        self.close.len() + self.distant.len() + self.very_distant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CLOSE and DISTANT pairs, i.e. everything that enters the optimization,
    /// and the VERY DISTANT rest.
    pub fn into_optimized_and_very_distant(self) -> (Vec<OrbitalPair>, Vec<OrbitalPair>) {
        let mut optimized = self.close;
        optimized.extend(self.distant);
        (optimized, self.very_distant)
    }
}

impl PairClassifier {
    pub fn new(close_cutoff: f64, very_distant_cutoff: f64) -> Result<Self, CorrelationError> {
        if !close_cutoff.is_finite() || !very_distant_cutoff.is_finite() {
            return Err(CorrelationError::configuration(
                "pair screening cutoffs must be finite",
            ));
        }
        Ok(PairClassifier {
            close_cutoff,
            very_distant_cutoff,
        })
    }

    fn check_cutoff_order(&self, kind: MetricKind) -> Result<(), CorrelationError> {
        let ordered = match kind {
            MetricKind::Distance => self.close_cutoff <= self.very_distant_cutoff,
            MetricKind::Overlap => self.close_cutoff >= self.very_distant_cutoff,
        };
        if ordered {
            Ok(())
        } else {
            Err(CorrelationError::configuration(format!(
                "close pair cutoff {} and very distant pair cutoff {} are inconsistent for a {:?} metric",
                self.close_cutoff, self.very_distant_cutoff, kind
            )))
        }
    }

    /// Tier of the pair (i, j). Diagonal pairs are always CLOSE.
    pub fn classify(
        &self,
        i: usize,
        j: usize,
        metric: &dyn PairDistanceMetric,
    ) -> Result<PairType, CorrelationError> {
        if i == j {
            return Ok(PairType::Close);
        }
        let value = metric.value(i, j).ok_or_else(|| {
            CorrelationError::configuration(format!("no screening metric value for pair ({i}, {j})"))
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(CorrelationError::configuration(format!(
                "malformed screening metric value {value} for pair ({i}, {j})"
            )));
        }

        let pair_type = match metric.kind() {
            MetricKind::Distance => {
                if value < self.close_cutoff {
                    PairType::Close
                } else if value < self.very_distant_cutoff {
                    PairType::Distant
                } else {
                    PairType::VeryDistant
                }
            }
            MetricKind::Overlap => {
                if value >= self.close_cutoff {
                    PairType::Close
                } else if value >= self.very_distant_cutoff {
                    PairType::Distant
                } else {
                    PairType::VeryDistant
                }
            }
        };
        Ok(pair_type)
    }

    /// Classify every pair (i <= j) of `n_occupied` orbitals.
    pub fn partition(
        &self,
        n_occupied: usize,
        metric: &dyn PairDistanceMetric,
    ) -> Result<PairPartition, CorrelationError> {
        self.check_cutoff_order(metric.kind())?;

        let mut partition = PairPartition::default();
        for i in 0..n_occupied {
            for j in i..n_occupied {
                let pair_type = self.classify(i, j, metric)?;
                let pair = OrbitalPair::new(i, j, pair_type);
                match pair_type {
                    PairType::Close => partition.close.push(pair),
                    PairType::Distant => partition.distant.push(pair),
                    PairType::VeryDistant => partition.very_distant.push(pair),
                }
            }
        }

        info!("Orbital pair screening:");
        info!("  Close pairs:         {:>8}", partition.close.len());
        info!("  Distant pairs:       {:>8}", partition.distant.len());
        info!("  Very distant pairs:  {:>8}", partition.very_distant.len());
        Ok(partition)
    }
}

#[cfg(test)]
mod tests;
