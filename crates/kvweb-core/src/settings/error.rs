//! Validation errors for detection settings.

/// A settings value violated one of the model's constraints.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("{name} must be a positive number, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must be a non-negative number, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("probe_in ({probe_in}) must be smaller than probe_out ({probe_out})")]
    ProbeOrder { probe_in: f64, probe_out: f64 },

    #[error("box mode requires a non-zero {0}")]
    EmptyBox(&'static str),

    #[error("{0} contains a non-finite coordinate")]
    NonFiniteBox(&'static str),

    #[error("unknown resolution mode {0:?} (expected low, medium, high or off)")]
    UnknownResolution(String),
}
