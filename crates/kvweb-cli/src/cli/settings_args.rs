//! Detection parameters shared by `submit` and `bench`.

use anyhow::{Context, Result};
use clap::Args;
use kvweb_core::settings::{ResolutionMode, Settings};

#[derive(Debug, Clone, Default, Args)]
pub struct SettingsArgs {
    /// Probe In radius in Å (default 1.4).
    #[arg(long, value_name = "Å")]
    pub probe_in: Option<f64>,
    /// Probe Out radius in Å (default 4.0).
    #[arg(long, value_name = "Å")]
    pub probe_out: Option<f64>,
    /// Minimum cavity volume in Å³ (default 5.0).
    #[arg(long, value_name = "Å3")]
    pub volume_cutoff: Option<f64>,
    /// Ligand distance cutoff in Å (default 5.0).
    #[arg(long, value_name = "Å")]
    pub ligand_cutoff: Option<f64>,
    /// Removal distance in Å (default 2.4).
    #[arg(long, value_name = "Å")]
    pub removal_distance: Option<f64>,
    /// Grid step size (default 0.0).
    #[arg(long, value_name = "Å")]
    pub step_size: Option<f64>,
    /// Grid resolution: low, medium, high or off.
    #[arg(long, value_name = "MODE")]
    pub resolution: Option<ResolutionMode>,
    /// Use the van der Waals surface instead of the solvent excluded surface.
    #[arg(long)]
    pub vdw_surface: bool,
    /// Ask the server for cavity depth and hydropathy (KVP) output.
    #[arg(long)]
    pub kvp: bool,
}

impl SettingsArgs {
    /// Settings built from the defaults plus the given flags.
    pub fn to_settings(&self, ligand_mode: bool) -> Result<Settings> {
        let mut b = Settings::builder()
            .surface_mode(!self.vdw_surface)
            .kvp_mode(self.kvp)
            .ligand_mode(ligand_mode);
        if let Some(v) = self.probe_in {
            b = b.probe_in(v);
        }
        if let Some(v) = self.probe_out {
            b = b.probe_out(v);
        }
        if let Some(v) = self.volume_cutoff {
            b = b.volume_cutoff(v);
        }
        if let Some(v) = self.ligand_cutoff {
            b = b.ligand_cutoff(v);
        }
        if let Some(v) = self.removal_distance {
            b = b.removal_distance(v);
        }
        if let Some(v) = self.step_size {
            b = b.step_size(v);
        }
        if let Some(mode) = self.resolution {
            b = b.resolution(mode);
        }
        b.build().context("invalid detection settings")
    }
}
