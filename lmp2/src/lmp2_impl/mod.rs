//! Local MP2 (LMP2) in pair natural orbitals
//!
//! Occupied orbitals are localized, so the MP2 amplitude equations no longer
//! decouple. For every optimized pair (i, j) the residual
//!
//! R_ij = K_ij + (ε_a + ε_b - f_ii - f_jj) ⊙ T_ij
//!        - Σ_k [f_ik S_ij,kj T_kj S_ij,kjᵀ + f_kj S_ij,ik T_ik S_ij,ikᵀ]
//!
//! is driven to zero with a preconditioned fixed-point update
//! T_ij ← T_ij - R_ij ⊘ (ε_a + ε_b - f_ii - f_jj), accelerated by DIIS.
//!
//! # Usage
//!
//! ```ignore
//! let controller = LocalCorrelationController::new(system, settings, Box::new(metric))
//!     .with_four_center_integrals(transformer);
//! let mut lmp2 = LocalMp2::new(controller, LocalMp2Settings::default(), ExecutionContext::new(0)?)?;
//! let energy = lmp2.calculate_energy_correction(None)?;
//! println!("E_corr = {}", energy.total());
//! ```

mod energy;
mod lmp2;
mod settings;

pub use energy::{calculate_energy, pair_energy_components, CorrelationEnergy};
pub use lmp2::{ConvergenceReport, LocalCorrelationController, LocalMp2};
pub use settings::{LocalCorrelationSettings, LocalMp2Settings};
