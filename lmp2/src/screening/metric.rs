use crate::pairs::PairKey;
use nalgebra::Vector3;
use std::collections::BTreeMap;

/// How a metric value relates to spatial separation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Larger values mean farther apart (e.g. centroid distance).
    Distance,
    /// Larger values mean closer together (e.g. differential overlap).
    Overlap,
}

/// Per-pair screening metric supplied by the surrounding program.
pub trait PairDistanceMetric: Sync {
    fn kind(&self) -> MetricKind;

    /// Metric value for the pair (i, j), or `None` if it is unknown.
    fn value(&self, i: usize, j: usize) -> Option<f64>;
}

/// Distance between the charge centroids of two occupied orbitals.
#[derive(Debug, Clone)]
pub struct CentroidDistanceMetric {
    centroids: Vec<Vector3<f64>>,
}

impl CentroidDistanceMetric {
    pub fn new(centroids: Vec<Vector3<f64>>) -> Self {
        CentroidDistanceMetric { centroids }
    }
}

impl PairDistanceMetric for CentroidDistanceMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Distance
    }

    fn value(&self, i: usize, j: usize) -> Option<f64> {
        let a = self.centroids.get(i)?;
        let b = self.centroids.get(j)?;
        Some((a - b).norm())
    }
}

/// Metric values given explicitly for each pair.
#[derive(Debug, Clone)]
pub struct ExplicitPairMetric {
    kind: MetricKind,
    values: BTreeMap<PairKey, f64>,
}

impl ExplicitPairMetric {
    pub fn new(kind: MetricKind) -> Self {
        ExplicitPairMetric {
            kind,
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, i: usize, j: usize, value: f64) {
        self.values.insert(PairKey::new(i, j), value);
    }
}

impl PairDistanceMetric for ExplicitPairMetric {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    fn value(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(&PairKey::new(i, j)).copied()
    }
}
