//! Typed cavity detection parameters.
//!
//! `Settings` is an immutable, validated value. It is built through
//! [`SettingsBuilder`] or deserialized (request payloads, job files); both
//! paths run the same validation, so a `Settings` in hand always satisfies:
//!
//! - `probe_in` and `probe_out` are positive and `probe_in < probe_out`;
//! - cutoffs and step size are non-negative;
//! - in box mode, neither the visible nor the internal box is all zeros.
//!
//! The serialized shape matches what the KVFinder-web server expects under
//! `settings` (`modes`, `step_size`, `probes`, `cutoffs`, `visiblebox`,
//! `internalbox`).

mod error;
mod types;

pub use error::SettingsError;
pub use types::{
    default_internal_box, BoxPoints, Cutoffs, Modes, Point, Probes, ResolutionMode, StepSize,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSettings")]
pub struct Settings {
    modes: Modes,
    step_size: StepSize,
    probes: Probes,
    cutoffs: Cutoffs,
    visiblebox: BoxPoints,
    internalbox: BoxPoints,
}

/// Unvalidated mirror of `Settings`, used as the deserialization target.
#[derive(Debug, Clone, Deserialize)]
struct RawSettings {
    modes: Modes,
    step_size: StepSize,
    probes: Probes,
    cutoffs: Cutoffs,
    visiblebox: BoxPoints,
    internalbox: BoxPoints,
}

impl TryFrom<RawSettings> for Settings {
    type Error = SettingsError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let settings = Settings {
            modes: raw.modes,
            step_size: raw.step_size,
            probes: raw.probes,
            cutoffs: raw.cutoffs,
            visiblebox: raw.visiblebox,
            internalbox: raw.internalbox,
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            modes: Modes::default(),
            step_size: StepSize::default(),
            probes: Probes::default(),
            cutoffs: Cutoffs::default(),
            visiblebox: BoxPoints::default(),
            internalbox: default_internal_box(),
        }
    }
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Start a builder pre-filled with these settings (e.g. for one sweep point).
    pub fn to_builder(&self) -> SettingsBuilder {
        SettingsBuilder {
            inner: self.clone(),
        }
    }

    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    pub fn probes(&self) -> &Probes {
        &self.probes
    }

    pub fn cutoffs(&self) -> &Cutoffs {
        &self.cutoffs
    }

    pub fn step_size(&self) -> f64 {
        self.step_size.step_size
    }

    pub fn visible_box(&self) -> &BoxPoints {
        &self.visiblebox
    }

    pub fn internal_box(&self) -> &BoxPoints {
        &self.internalbox
    }

    pub fn probe_in(&self) -> f64 {
        self.probes.probe_in
    }

    pub fn probe_out(&self) -> f64 {
        self.probes.probe_out
    }

    pub fn removal_distance(&self) -> f64 {
        self.cutoffs.removal_distance
    }

    fn validate(&self) -> Result<(), SettingsError> {
        positive("probe_in", self.probes.probe_in)?;
        positive("probe_out", self.probes.probe_out)?;
        if self.probes.probe_in >= self.probes.probe_out {
            return Err(SettingsError::ProbeOrder {
                probe_in: self.probes.probe_in,
                probe_out: self.probes.probe_out,
            });
        }
        non_negative("volume_cutoff", self.cutoffs.volume_cutoff)?;
        non_negative("ligand_cutoff", self.cutoffs.ligand_cutoff)?;
        non_negative("removal_distance", self.cutoffs.removal_distance)?;
        non_negative("step_size", self.step_size.step_size)?;

        if !self.visiblebox.is_finite() {
            return Err(SettingsError::NonFiniteBox("visiblebox"));
        }
        if !self.internalbox.is_finite() {
            return Err(SettingsError::NonFiniteBox("internalbox"));
        }
        if self.modes.box_mode {
            if self.visiblebox.is_zero() {
                return Err(SettingsError::EmptyBox("visiblebox"));
            }
            if self.internalbox.is_zero() {
                return Err(SettingsError::EmptyBox("internalbox"));
            }
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::NonPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::Negative { name, value })
    }
}

/// Builder for [`Settings`]. Starts from the defaults; `build` validates.
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    inner: Settings,
}

impl SettingsBuilder {
    pub fn probe_in(mut self, value: f64) -> Self {
        self.inner.probes.probe_in = value;
        self
    }

    pub fn probe_out(mut self, value: f64) -> Self {
        self.inner.probes.probe_out = value;
        self
    }

    pub fn volume_cutoff(mut self, value: f64) -> Self {
        self.inner.cutoffs.volume_cutoff = value;
        self
    }

    pub fn ligand_cutoff(mut self, value: f64) -> Self {
        self.inner.cutoffs.ligand_cutoff = value;
        self
    }

    pub fn removal_distance(mut self, value: f64) -> Self {
        self.inner.cutoffs.removal_distance = value;
        self
    }

    pub fn step_size(mut self, value: f64) -> Self {
        self.inner.step_size.step_size = value;
        self
    }

    pub fn resolution(mut self, mode: ResolutionMode) -> Self {
        self.inner.modes.resolution_mode = mode;
        self
    }

    pub fn surface_mode(mut self, on: bool) -> Self {
        self.inner.modes.surface_mode = on;
        self
    }

    pub fn kvp_mode(mut self, on: bool) -> Self {
        self.inner.modes.kvp_mode = on;
        self
    }

    pub fn ligand_mode(mut self, on: bool) -> Self {
        self.inner.modes.ligand_mode = on;
        self
    }

    /// Restrict the search to a box. Turns whole protein mode off.
    pub fn search_box(mut self, visible: BoxPoints, internal: BoxPoints) -> Self {
        self.inner.modes.box_mode = true;
        self.inner.modes.whole_protein_mode = false;
        self.inner.visiblebox = visible;
        self.inner.internalbox = internal;
        self
    }

    /// Search the whole structure. Keeps the box coordinates but ignores them.
    pub fn whole_protein(mut self) -> Self {
        self.inner.modes.box_mode = false;
        self.inner.modes.whole_protein_mode = true;
        self
    }

    pub fn build(self) -> Result<Settings, SettingsError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
