// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Mathematical Constants
// ─────────────────────────────────────────────────────────────────────
//! Single source of truth for the φ/ψ-derived constants.
//!
//! ψ = φ^(1/φ) has no const-evaluable form, so it is stored as a
//! precomputed literal alongside its inverse.

/// Golden ratio φ.
pub const PHI: f64 = 1.618_033_988_749_895;

/// 1/φ ≈ 0.618.
pub const PHI_INV: f64 = 1.0 / PHI;

/// φ² ≈ 2.618.
pub const PHI_SQ: f64 = PHI * PHI;

/// φ³ ≈ 4.236.
pub const PHI_CUBE: f64 = PHI * PHI * PHI;

/// 1/φ² ≈ 0.382.
pub const PHI_INV_SQ: f64 = 1.0 / PHI_SQ;

/// 1/φ³ ≈ 0.236.
pub const PHI_INV_CUBE: f64 = 1.0 / PHI_CUBE;

/// ψ = φ^(1/φ) ≈ 1.346.
pub const PSI: f64 = 1.346_360_820_034_869_3;

/// 1/ψ ≈ 0.743.
pub const PSI_INV: f64 = 0.742_742_944_624_681_7;

pub const PI: f64 = std::f64::consts::PI;

/// τ = 2π.
pub const TAU: f64 = std::f64::consts::TAU;

pub const E: f64 = std::f64::consts::E;
