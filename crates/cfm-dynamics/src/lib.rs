// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Field Dynamics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Bounded, deterministic numeric field dynamics.
//!
//! Three independent variants share one calling contract ([`CfmCore`]):
//!   - `v0`: minimal coherence / instability / energy / phase recurrence
//!   - `v1`: slow/fast variable split with alignment lock-in
//!   - `v2`: five-channel state, five-tier timescale hierarchy, attractor
//!     basin in (coherence, energy, stability) space, tiered pulse
//!     response and cross-channel resonance
//!
//! # Invariants
//!
//! 1. **Bounded**: every non-phase state variable is clamped into [0, 1]
//!    immediately after each mutation; phases wrap into [0, 1).
//! 2. **Deterministic**: a step is a pure function of (state, dt). No
//!    clock, RNG, or I/O is consulted.
//! 3. **Inputs are inert**: message and event arguments are borrowed
//!    immutably and never read.
//! 4. **Bounded work**: each step runs a fixed number of stages.

pub mod math;
pub mod protocol;
pub mod v0;
pub mod v1;
pub mod v2;

pub use protocol::{CfmCore, StateMap};
pub use v0::{CfmCoreV0, CfmV0Config, CfmV0State};
pub use v1::{CfmCoreV1, CfmV1Config, CfmV1State};
pub use v2::{CfmCoreV2, CfmV2Config, CfmV2State, Preset};
