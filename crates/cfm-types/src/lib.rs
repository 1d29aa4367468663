// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Mathematical constants, error hierarchy, and the step output record
//! shared by every CFM core variant.

pub mod consts;
pub mod error;
pub mod output;

pub use error::{CfmError, CfmResult};
pub use output::{clamp_unit, StepOutput, COMMON_METRICS};
