// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Interface Layer
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Construction and safe consumption of CFM cores.
//!
//! # Invariants
//!
//! 1. **Adapter output is always finite and bounded**: every value in
//!    `numeric_state` lies in [0, 1]. NaN/Inf from a core becomes 0.0 and
//!    counts as an error.
//! 2. **Core panics are contained**: a panicking core is caught with
//!    `catch_unwind` and reported through the call metadata, unless the
//!    adapter was configured fail-open.
//! 3. **Unknown identifiers are errors**: the factory never falls back to a
//!    default variant for an unrecognised name.

pub mod adapter;
pub mod config;
pub mod factory;

pub use adapter::{AdapterMetadata, AdapterStatus, AdapterStepResult, CoreAdapter};
pub use config::InterfaceConfig;
pub use factory::{
    create_core, create_core_with_config, list_core_types, CoreConfig, DynCore, CORE_TYPES,
    DEFAULT_CORE_TYPE,
};
