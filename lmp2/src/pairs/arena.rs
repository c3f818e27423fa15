use super::{OrbitalPair, PairKey, PairType};
use crate::error::CorrelationError;
use nalgebra::DMatrix;
use std::collections::BTreeMap;

/// Owner of all optimized (CLOSE and DISTANT) pairs of one calculation.
///
/// Pairs are never removed, so positions in [`PairArena::pairs`] stay valid for
/// the lifetime of the arena.
#[derive(Debug, Default, Clone)]
pub struct PairArena {
    pairs: Vec<OrbitalPair>,
    index: BTreeMap<PairKey, usize>,
}

impl PairArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an arena from optimized pairs; a repeated key or a very distant
    /// pair is a configuration error
    pub fn from_pairs(pairs: Vec<OrbitalPair>) -> Result<Self, CorrelationError> {
        let mut arena = PairArena::new();
        for pair in pairs {
            arena.insert(pair)?;
        }
        Ok(arena)
    }

    pub fn insert(&mut self, pair: OrbitalPair) -> Result<(), CorrelationError> {
        let key = pair.key();
        if pair.pair_type == PairType::VeryDistant {
            return Err(CorrelationError::configuration(format!(
                "very distant pair {key} cannot enter the amplitude optimization"
            )));
        }
        if self.index.contains_key(&key) {
            return Err(CorrelationError::configuration(format!(
                "pair {key} is listed more than once"
            )));
        }
        self.index.insert(key, self.pairs.len());
        self.pairs.push(pair);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[OrbitalPair] {
        &self.pairs
    }

    pub fn pairs_mut(&mut self) -> &mut [OrbitalPair] {
        &mut self.pairs
    }

    pub fn into_pairs(self) -> Vec<OrbitalPair> {
        self.pairs
    }

    pub fn get(&self, key: PairKey) -> Option<&OrbitalPair> {
        self.index.get(&key).map(|&idx| &self.pairs[idx])
    }

    pub fn get_mut(&mut self, key: PairKey) -> Option<&mut OrbitalPair> {
        match self.index.get(&key) {
            Some(&idx) => Some(&mut self.pairs[idx]),
            None => None,
        }
    }

    pub fn contains(&self, p: usize, q: usize) -> bool {
        self.index.contains_key(&PairKey::new(p, q))
    }

    /// Amplitudes T_pq for the ordered pair (p, q).
    pub fn amplitudes(&self, p: usize, q: usize) -> Option<DMatrix<f64>> {
        let pair = self.get(PairKey::new(p, q))?;
        if PairKey::is_reversed(p, q) {
            Some(pair.amplitudes.transpose())
        } else {
            Some(pair.amplitudes.clone())
        }
    }

    /// S T_pq Sᵀ for the ordered pair (p, q), or `None` if (p, q) was screened.
    pub fn projected_amplitudes(
        &self,
        p: usize,
        q: usize,
        overlap: &DMatrix<f64>,
    ) -> Option<DMatrix<f64>> {
        let pair = self.get(PairKey::new(p, q))?;
        let projected = if PairKey::is_reversed(p, q) {
            overlap * pair.amplitudes.transpose() * overlap.transpose()
        } else {
            overlap * &pair.amplitudes * overlap.transpose()
        };
        Some(projected)
    }
}
