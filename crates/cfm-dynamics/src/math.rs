// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Numeric Helpers
// ─────────────────────────────────────────────────────────────────────

/// Clamp into [0, 1]. NaN maps to 0.
#[inline]
pub fn clamp01(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}

/// Hermite smooth-step `3x² − 2x³` of `x` rescaled from [edge0, edge1].
///
/// Degenerate edges collapse to a hard step at `edge1`.
#[inline]
pub fn smooth_step(x: f64, edge0: f64, edge1: f64) -> f64 {
    if edge1 == edge0 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = clamp01((x - edge0) / (edge1 - edge0));
    t * t * (3.0 - 2.0 * t)
}

/// Wrap a phase into [0, 1).
///
/// `rem_euclid` can round up to exactly 1.0 for tiny negative inputs, so
/// that case folds back to 0.
#[inline]
pub fn wrap_phase(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let wrapped = value.rem_euclid(1.0);
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Unit-interval sinusoid `0.5 + 0.5·sin(2π·phase)`.
#[inline]
pub fn half_wave(phase: f64) -> f64 {
    0.5 + 0.5 * (std::f64::consts::TAU * phase).sin()
}
