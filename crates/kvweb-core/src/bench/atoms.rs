use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Counts the atoms of a structure file.
pub trait AtomCounter: Send + Sync {
    fn count_atoms(&self, path: &Path) -> io::Result<usize>;
}

/// Counts `ATOM` and `HETATM` records of a PDB file, across all models.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdbAtomCounter;

impl AtomCounter for PdbAtomCounter {
    fn count_atoms(&self, path: &Path) -> io::Result<usize> {
        let reader = BufReader::new(File::open(path)?);
        let mut n = 0;
        for line in reader.lines() {
            let line = line?;
            if line.starts_with("ATOM  ") || line.starts_with("HETATM") {
                n += 1;
            }
        }
        Ok(n)
    }
}
