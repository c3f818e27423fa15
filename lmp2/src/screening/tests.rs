//! Tests for pair screening

use super::*;
use crate::pairs::PairKey;
use nalgebra::Vector3;
use std::collections::BTreeSet;

fn chain_metric(n: usize, spacing: f64) -> CentroidDistanceMetric {
    CentroidDistanceMetric::new(
        (0..n)
            .map(|i| Vector3::new(i as f64 * spacing, 0.0, 0.0))
            .collect(),
    )
}

#[test]
fn test_partition_is_complete_and_disjoint() {
    let n_occ = 7;
    let metric = chain_metric(n_occ, 2.5);

    for (close, very_distant) in [(0.0, 0.0), (3.0, 8.0), (6.0, 6.0), (100.0, 200.0)] {
        let classifier = PairClassifier::new(close, very_distant).unwrap();
        let partition = classifier.partition(n_occ, &metric).unwrap();

        let mut seen = BTreeSet::new();
        for pair in partition
            .close
            .iter()
            .chain(&partition.distant)
            .chain(&partition.very_distant)
        {
            assert!(pair.i <= pair.j);
            assert!(seen.insert(pair.key()), "pair {} listed twice", pair.key());
        }
        assert_eq!(seen.len(), n_occ * (n_occ + 1) / 2);
        assert_eq!(partition.len(), seen.len());
    }
}

#[test]
fn test_tiers_follow_distance() {
    let metric = chain_metric(4, 5.0);
    let classifier = PairClassifier::new(8.0, 12.0).unwrap();
    let partition = classifier.partition(4, &metric).unwrap();

    let keys = |pairs: &[crate::pairs::OrbitalPair]| -> Vec<PairKey> {
        pairs.iter().map(|p| p.key()).collect()
    };

    // Neighbours (5 bohr) and diagonal pairs are close, 10 bohr is distant, 15 bohr very distant
    assert!(keys(&partition.close).contains(&PairKey::new(0, 1)));
    assert!(keys(&partition.close).contains(&PairKey::new(2, 2)));
    assert_eq!(keys(&partition.distant), vec![PairKey::new(0, 2), PairKey::new(1, 3)]);
    assert_eq!(keys(&partition.very_distant), vec![PairKey::new(0, 3)]);
    assert!(partition
        .very_distant
        .iter()
        .all(|p| p.pair_type == PairType::VeryDistant));
}

#[test]
fn test_overlap_metric_reverses_comparisons() {
    let mut metric = ExplicitPairMetric::new(MetricKind::Overlap);
    metric.insert(0, 1, 1e-2);
    metric.insert(0, 2, 1e-5);
    metric.insert(1, 2, 1e-9);
    let classifier = PairClassifier::new(1e-3, 1e-6).unwrap();

    assert_eq!(classifier.classify(0, 1, &metric).unwrap(), PairType::Close);
    assert_eq!(classifier.classify(2, 0, &metric).unwrap(), PairType::Distant);
    assert_eq!(classifier.classify(1, 2, &metric).unwrap(), PairType::VeryDistant);
}

#[test]
fn test_unclassifiable_pair_is_a_configuration_error() {
    let mut metric = ExplicitPairMetric::new(MetricKind::Distance);
    metric.insert(0, 1, f64::NAN);
    let classifier = PairClassifier::new(5.0, 10.0).unwrap();

    assert!(matches!(
        classifier.classify(0, 1, &metric),
        Err(CorrelationError::Configuration(_))
    ));
    // Missing value
    assert!(classifier.classify(0, 2, &metric).is_err());
    // Negative distance
    metric.insert(1, 2, -1.0);
    assert!(classifier.partition(3, &metric).is_err());
}

#[test]
fn test_inconsistent_cutoffs_are_rejected() {
    let classifier = PairClassifier::new(10.0, 5.0).unwrap();
    assert!(classifier.partition(3, &chain_metric(3, 1.0)).is_err());
    assert!(PairClassifier::new(f64::INFINITY, 5.0).is_err());
}
