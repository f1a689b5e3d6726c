//! Plain value types that make up the detection settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SettingsError;

/// A point in 3D space (Å).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Box given by an origin corner `p1` and the corners `p2`, `p3`, `p4` that
/// span its X, Y and Z edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxPoints {
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
    pub p4: Point,
}

impl BoxPoints {
    pub const fn new(p1: Point, p2: Point, p3: Point, p4: Point) -> Self {
        Self { p1, p2, p3, p4 }
    }

    pub fn points(&self) -> [Point; 4] {
        [self.p1, self.p2, self.p3, self.p4]
    }

    /// True when all four points are the origin (no box drawn).
    pub fn is_zero(&self) -> bool {
        self.points().iter().all(Point::is_zero)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.points().iter().all(Point::is_finite)
    }
}

/// Grid resolution requested from the detection service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionMode {
    #[default]
    Low,
    Medium,
    High,
    Off,
}

impl ResolutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionMode::Low => "Low",
            ResolutionMode::Medium => "Medium",
            ResolutionMode::High => "High",
            ResolutionMode::Off => "Off",
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(ResolutionMode::Low),
            "medium" => Ok(ResolutionMode::Medium),
            "high" => Ok(ResolutionMode::High),
            "off" => Ok(ResolutionMode::Off),
            _ => Err(SettingsError::UnknownResolution(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modes {
    pub whole_protein_mode: bool,
    pub box_mode: bool,
    pub resolution_mode: ResolutionMode,
    pub surface_mode: bool,
    pub kvp_mode: bool,
    pub ligand_mode: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            whole_protein_mode: true,
            box_mode: false,
            resolution_mode: ResolutionMode::Low,
            surface_mode: true,
            kvp_mode: false,
            ligand_mode: false,
        }
    }
}

/// Wrapped in its own table on the wire (`step_size.step_size`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StepSize {
    pub step_size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probes {
    pub probe_in: f64,
    pub probe_out: f64,
}

impl Default for Probes {
    fn default() -> Self {
        Self {
            probe_in: 1.4,
            probe_out: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cutoffs {
    pub volume_cutoff: f64,
    pub ligand_cutoff: f64,
    pub removal_distance: f64,
}

impl Default for Cutoffs {
    fn default() -> Self {
        Self {
            volume_cutoff: 5.0,
            ligand_cutoff: 5.0,
            removal_distance: 2.4,
        }
    }
}

/// Internal box used when no box was drawn: an 8 Å cube around the origin.
pub fn default_internal_box() -> BoxPoints {
    BoxPoints::new(
        Point::new(-4.0, -4.0, -4.0),
        Point::new(4.0, -4.0, -4.0),
        Point::new(-4.0, 4.0, -4.0),
        Point::new(-4.0, -4.0, 4.0),
    )
}
