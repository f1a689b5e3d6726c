//! `<base>_parameters.toml`: echo of what was submitted.

use std::path::Path;

use serde::Serialize;

use crate::settings::Settings;

const HEADER: &str = "# TOML configuration file for KVFinder-web job.\n\n";
const TITLE: &str = "KVFinder-web parameters file";
/// Written in place of the ligand path when the job had none.
const NO_LIGAND: &str = "-";

#[derive(Serialize)]
struct ParametersFile<'a> {
    title: &'static str,
    files: Files,
    settings: &'a Settings,
}

#[derive(Serialize)]
struct Files {
    pdb: String,
    ligand: String,
}

pub fn render_parameters(
    pdb: &Path,
    ligand: Option<&Path>,
    settings: &Settings,
) -> Result<String, toml::ser::Error> {
    let file = ParametersFile {
        title: TITLE,
        files: Files {
            pdb: pdb.to_string_lossy().into_owned(),
            ligand: ligand
                .map(|l| l.to_string_lossy().into_owned())
                .unwrap_or_else(|| NO_LIGAND.to_string()),
        },
        settings,
    };
    Ok(format!("{}{}", HEADER, toml::to_string(&file)?))
}
