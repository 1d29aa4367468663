// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — CFM Core v2
// ─────────────────────────────────────────────────────────────────────
//! Multi-channel core: five channels plus resonance, five timescales,
//! a finite attractor basin and tiered pulse responses.

pub mod config;
pub mod engine;
pub mod presets;
pub mod projection;
pub mod state;

use serde::Serialize;

use cfm_types::{CfmResult, StepOutput};

use crate::protocol::{CfmCore, StateMap};

pub use config::CfmV2Config;
pub use presets::{get_preset, list_presets, Preset, PRESET_NAMES};
pub use state::{
    AlignmentChannel, ChannelStates, CfmV2State, CoherenceChannel, EnergyChannel, PhaseChannel,
    StabilityChannel,
};

/// Diagnostic snapshot returned by [`CfmCoreV2::get_status`].
#[derive(Debug, Clone, Serialize)]
pub struct V2Status {
    pub state: CfmV2State,
    pub config: CfmV2Config,
    pub version: u8,
    pub channels: ChannelStates,
    pub basin_distance: f64,
}

/// Multi-channel CFM core.
///
/// Owns its configuration and state exclusively. Stepping mutates in
/// place; [`get_state`](Self::get_state) hands out copies.
#[derive(Debug, Clone)]
pub struct CfmCoreV2 {
    config: CfmV2Config,
    state: CfmV2State,
}

impl Default for CfmCoreV2 {
    fn default() -> Self {
        Self::new(CfmV2Config::default())
    }
}

impl CfmCoreV2 {
    pub fn new(config: CfmV2Config) -> Self {
        Self {
            config: config.normalized(),
            state: CfmV2State::default(),
        }
    }

    pub fn with_state(config: CfmV2Config, initial: CfmV2State) -> Self {
        Self {
            config: config.normalized(),
            state: initial.normalized(),
        }
    }

    /// Construct from a named preset (see [`Preset`]).
    pub fn from_preset(name: &str) -> CfmResult<Self> {
        Ok(Self::new(get_preset(name)?))
    }

    pub fn config(&self) -> &CfmV2Config {
        &self.config
    }

    /// Owned copy of the current state.
    pub fn get_state(&self) -> CfmV2State {
        self.state.clone()
    }

    /// Replace the state with `initial` (normalized) or the defaults.
    pub fn reset_to(&mut self, initial: Option<CfmV2State>) {
        self.state = initial.map(CfmV2State::normalized).unwrap_or_default();
    }

    pub fn channel_states(&self) -> ChannelStates {
        self.state.channels()
    }

    pub fn basin_distance(&self) -> f64 {
        let (c, e, s) = self.config.basin_center();
        self.state.distance_to_basin(c, e, s)
    }

    pub fn get_status(&self) -> V2Status {
        V2Status {
            state: self.state.clone(),
            config: self.config.clone(),
            version: 2,
            channels: self.channel_states(),
            basin_distance: self.basin_distance(),
        }
    }
}

impl CfmCore for CfmCoreV2 {
    fn version(&self) -> u8 {
        2
    }

    fn step_with(
        &mut self,
        _human_messages: Option<&[String]>,
        _external_events: Option<&serde_json::Value>,
        dt: f64,
    ) -> StepOutput {
        engine::step_state(&mut self.state, &self.config, dt);
        projection::project(&self.state, &self.config)
    }

    fn reset(&mut self) {
        self.reset_to(None);
    }

    fn state_map(&self) -> StateMap {
        self.state.to_map()
    }

    fn status(&self) -> serde_json::Value {
        serde_json::to_value(self.get_status()).unwrap_or(serde_json::Value::Null)
    }

    fn verify_state_bounds(&self) -> bool {
        self.state.validate()
    }
}
