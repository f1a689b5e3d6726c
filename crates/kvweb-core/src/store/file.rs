//! On-disk schema of `job.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::job::{JobDescriptor, JobStatus};
use crate::settings::Settings;

pub(crate) const FILE_HEADER: &str = "# TOML configuration file for KVFinder-web job\n\n";
const TITLE: &str = "KVFinder-web job file";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct JobFile {
    #[serde(default = "default_title")]
    pub title: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub id_added_manually: bool,
    pub files: FilesSection,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FilesSection {
    pub pdb: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ligand: Option<PathBuf>,
    pub output: PathBuf,
    pub base_name: String,
}

fn default_title() -> String {
    TITLE.to_string()
}

impl JobFile {
    pub fn from_job(job: &JobDescriptor) -> Self {
        Self {
            title: default_title(),
            status: job.status(),
            id_added_manually: job.id_added_manually(),
            files: FilesSection {
                pdb: job.pdb_path.clone(),
                ligand: job.ligand_path.clone(),
                output: job.output_directory.clone(),
                base_name: job.base_name.clone(),
            },
            settings: job.settings.clone(),
        }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let body = toml::to_string(self)?;
        Ok(format!("{}{}", FILE_HEADER, body))
    }
}
