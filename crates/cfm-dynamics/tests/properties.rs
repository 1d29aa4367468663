// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Dynamics Property Tests
// ─────────────────────────────────────────────────────────────────────
//! Cross-variant behavioural guarantees: boundedness, determinism,
//! reset idempotence, phase wrapping, basin convergence and resonance.

use cfm_dynamics::v2::{CfmV2Config, CfmV2State, Preset};
use cfm_dynamics::{CfmCore, CfmCoreV0, CfmCoreV1, CfmCoreV2};

/// Deterministic dt stream in [0, max_dt].
struct DtStream(u64);

impl DtStream {
    fn next(&mut self, max_dt: f64) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 11) as f64 / (1u64 << 53) as f64) * max_dt
    }
}

fn all_cores() -> Vec<(String, Box<dyn CfmCore>)> {
    let mut cores: Vec<(String, Box<dyn CfmCore>)> = vec![
        ("v0".into(), Box::new(CfmCoreV0::default())),
        ("v1".into(), Box::new(CfmCoreV1::default())),
    ];
    for p in Preset::ALL {
        cores.push((format!("v2/{p}"), Box::new(CfmCoreV2::new(p.config()))));
    }
    cores
}

// ── Boundedness ──────────────────────────────────────────────────────

#[test]
fn test_bounded_10k_random_dt() {
    for (name, mut core) in all_cores() {
        let mut dts = DtStream(7);
        for i in 0..10_000 {
            let out = core.step(dts.next(1.0));
            assert!(out.is_bounded(), "{name}: output out of range at step {i}: {out:?}");
            assert!((0.0..1.0).contains(&out.phase), "{name}: phase {}", out.phase);
        }
        assert!(core.verify_state_bounds(), "{name}: state out of range");
        for (k, v) in core.state_map() {
            assert!(v.is_finite(), "{name}: {k} not finite");
        }
    }
}

#[test]
fn test_bounded_from_extreme_states() {
    let corners = [0.0, 1.0];
    for &c in &corners {
        for &e in &corners {
            for &s in &corners {
                let init = CfmV2State {
                    coherence_slow: c,
                    coherence_fast: 1.0 - c,
                    energy_potential: e,
                    energy_flux: 1.0 - e,
                    stability_envelope: s,
                    instability_pulse: 1.0 - s,
                    ..Default::default()
                };
                let mut core = CfmCoreV2::with_state(CfmV2Config::default(), init);
                for _ in 0..2000 {
                    assert!(core.step(1.0).is_bounded());
                }
                assert!(core.verify_state_bounds());
            }
        }
    }
}

#[test]
fn test_huge_and_negative_dt_are_clamped() {
    for (name, mut core) in all_cores() {
        let out = core.step(1e9);
        assert!(out.time <= 1.0 + 1e-12, "{name}: dt not clamped");
        let out = core.step(-5.0);
        assert!(out.time <= 1.0 + 1e-12, "{name}: negative dt advanced time");
        assert_eq!(out.step, 2);
        let out = core.step(f64::NAN);
        assert!(out.is_bounded(), "{name}: NaN dt leaked");
    }
}

#[test]
fn test_infinite_dt_lands_on_bounds() {
    for (name, mut core) in all_cores() {
        let out = core.step(f64::INFINITY);
        assert_eq!(out.time, 1.0, "{name}: +inf dt should advance by max_dt");
        assert!(out.is_bounded(), "{name}");
        let out = core.step(f64::NEG_INFINITY);
        assert_eq!(out.time, 1.0, "{name}: -inf dt advanced time");
        assert_eq!(out.step, 2);
    }
}

// ── Determinism ──────────────────────────────────────────────────────

#[test]
fn test_identical_sequences() {
    let run = || {
        let mut core = CfmCoreV2::default();
        let mut dts = DtStream(99);
        (0..500).map(|_| core.step(dts.next(1.0))).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_reset_reproduces_sequence() {
    for (name, mut core) in all_cores() {
        let first: Vec<_> = (0..300).map(|_| core.step(0.1)).collect();
        core.reset();
        let second: Vec<_> = (0..300).map(|_| core.step(0.1)).collect();
        assert_eq!(first, second, "{name}: replay diverged");
    }
}

#[test]
fn test_reset_to_snapshot_replays() {
    let mut core = CfmCoreV2::default();
    for _ in 0..50 {
        core.step(0.3);
    }
    let snap = core.get_state();
    let a: Vec<_> = (0..100).map(|_| core.step(0.2)).collect();
    core.reset_to(Some(snap));
    let b: Vec<_> = (0..100).map(|_| core.step(0.2)).collect();
    assert_eq!(a, b);
}

// ── Phase ────────────────────────────────────────────────────────────

#[test]
fn test_phase_wrapping() {
    let mut core = CfmCoreV2::default();
    for _ in 0..1000 {
        core.step(0.1);
    }
    let s = core.get_state();
    assert!((0.0..1.0).contains(&s.phase_global));
    assert!((0.0..1.0).contains(&s.phase_local));
}

// ── Basin / resonance ────────────────────────────────────────────────

#[test]
fn test_basin_convergence() {
    let init = CfmV2State {
        coherence_slow: 0.1,
        energy_potential: 0.9,
        stability_envelope: 0.2,
        ..Default::default()
    };
    let initial_distance = init.distance_to_default_basin();
    let mut core = CfmCoreV2::with_state(CfmV2Config::default(), init);
    for _ in 0..500 {
        core.step(0.1);
    }
    let final_distance = core.get_state().distance_to_default_basin();
    assert!(
        final_distance < initial_distance,
        "basin distance grew: {initial_distance} → {final_distance}"
    );
}

#[test]
fn test_resonance_index_variation() {
    let mut core = CfmCoreV2::default();
    let (mut lo, mut hi) = (f64::MAX, f64::MIN);
    for _ in 0..200 {
        core.step(0.1);
        let r = core.get_state().resonance_index;
        lo = lo.min(r);
        hi = hi.max(r);
    }
    assert!(hi - lo > 0.001, "resonance stuck: range {}", hi - lo);
}

#[test]
fn test_reported_basin_distance_matches_state() {
    let mut core = CfmCoreV2::default();
    let out = core.step(0.5);
    assert!((out.basin_distance.unwrap() - core.basin_distance()).abs() < 1e-15);
    assert_eq!(out.resonance_index, Some(core.get_state().resonance_index));
}

// ── Timescales ───────────────────────────────────────────────────────

#[test]
fn test_timescale_ordering_all_presets() {
    assert!(CfmV2Config::default().timescales_ordered());
    for p in Preset::ALL {
        assert!(p.config().timescales_ordered(), "{p}");
    }
}

// ── Versions ─────────────────────────────────────────────────────────

#[test]
fn test_versions_differ_per_variant() {
    let mut v0 = CfmCoreV0::default();
    let mut v1 = CfmCoreV1::default();
    let mut v2 = CfmCoreV2::default();
    assert_eq!(v0.step(0.1).version, None);
    assert_eq!(v1.step(0.1).version, Some(1));
    assert_eq!(v2.step(0.1).version, Some(2));
    assert_eq!((v0.version(), v1.version(), v2.version()), (0, 1, 2));
}
