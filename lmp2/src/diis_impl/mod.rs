//! DIIS convergence acceleration for pair amplitudes
//!
//! Pulay's Direct Inversion in the Iterative Subspace applied to the
//! amplitudes of all optimized pairs at once. Each snapshot is the
//! concatenation of every pair's amplitudes together with the matching
//! residuals. The extrapolated amplitudes minimize the norm of the combined
//! residual subject to Σ c_i = 1.

mod diis;

pub use diis::PairDiis;
