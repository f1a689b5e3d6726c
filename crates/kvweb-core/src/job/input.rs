//! Snapshot of the structure files sent to the server.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// Structure file contents, one entry per line (line terminators kept).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JobInput {
    pub pdb: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdb_ligand: Option<Vec<String>>,
}

impl JobInput {
    /// Build from in-memory text (e.g. a structure exported by a viewer).
    pub fn from_text(pdb: &str, ligand: Option<&str>) -> Self {
        Self {
            pdb: split_lines(pdb),
            pdb_ligand: ligand.map(split_lines),
        }
    }

    /// Read the structure (and optional ligand) from disk.
    pub fn read(pdb_path: &Path, ligand_path: Option<&Path>) -> io::Result<Self> {
        let pdb = fs::read_to_string(pdb_path)?;
        let ligand = match ligand_path {
            Some(p) => Some(fs::read_to_string(p)?),
            None => None,
        };
        Ok(Self::from_text(&pdb, ligand.as_deref()))
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}
