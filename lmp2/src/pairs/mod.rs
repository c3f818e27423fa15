//! Orbital pairs and their coupling sets
//!
//! An [`OrbitalPair`] is a correlated pair (i, j) of occupied orbitals with its
//! own truncated virtual space. Pairs couple to each other through a shared
//! occupied index k; that link is stored in a [`CouplingOrbitalSet`] which only
//! holds [`PairKey`]s of its companion pairs. The pairs themselves live in a
//! [`PairArena`], which resolves keys at use time.
//!
//! Only pairs with `i <= j` are stored. The amplitudes of the reversed pair are
//! the transpose, T_ji = T_ijᵀ, so every lookup in reversed order transposes.

mod arena;
mod coupling;
mod orbital_pair;

pub use arena::PairArena;
pub use coupling::CouplingOrbitalSet;
pub use orbital_pair::{OrbitalPair, PairType};

use std::fmt;

/// Canonical index of an orbital pair (`i <= j`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub i: usize,
    pub j: usize,
}

impl PairKey {
    /// Build the canonical key for the unordered pair {p, q}.
    pub fn new(p: usize, q: usize) -> Self {
        if p <= q {
            PairKey { i: p, j: q }
        } else {
            PairKey { i: q, j: p }
        }
    }

    /// True if the ordered lookup (p, q) is stored transposed.
    pub fn is_reversed(p: usize, q: usize) -> bool {
        p > q
    }

    pub fn is_diagonal(&self) -> bool {
        self.i == self.j
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}
