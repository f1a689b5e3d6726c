//! Results report rewriting.

use std::path::Path;

use toml::{Table, Value};

pub const REPORT_HEADER: &str = "# TOML results file for parKVFinder software\n\n";

const FILES_PATH: &str = "FILES_PATH";

/// Parse the server report and point its `FILES_PATH` entries at local files.
///
/// An empty (or whitespace-only) report yields a document holding only the
/// rewritten `FILES_PATH` table.
pub fn rewrite_report(
    report: &str,
    pdb: &Path,
    ligand: Option<&Path>,
    cavity: &Path,
) -> Result<String, String> {
    let mut doc: Table = if report.trim().is_empty() {
        Table::new()
    } else {
        report.parse::<Table>().map_err(|e| e.to_string())?
    };

    let files = doc
        .entry(FILES_PATH)
        .or_insert_with(|| Value::Table(Table::new()));
    let Value::Table(files) = files else {
        return Err(format!("{} is not a table", FILES_PATH));
    };
    files.insert("INPUT".into(), path_value(pdb));
    match ligand {
        Some(l) => {
            files.insert("LIGAND".into(), path_value(l));
        }
        None => {
            files.remove("LIGAND");
        }
    }
    files.insert("OUTPUT".into(), path_value(cavity));

    let body = toml::to_string(&doc).map_err(|e| e.to_string())?;
    Ok(format!("{}{}", REPORT_HEADER, body))
}

fn path_value(p: &Path) -> Value {
    Value::String(p.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_REPORT: &str = r#"
[FILES_PATH]
INPUT = "/opt/kv/jobs/123/protein.pdb"
LIGAND = "/opt/kv/jobs/123/ligand.pdb"
OUTPUT = "/opt/kv/jobs/123/KV_Files/protein.KVFinder.output.pdb"

[PARAMETERS]
TARGET_VOLUME = "1 cavity"

[RESULTS.VOLUME]
KAA = 137.16
KAB = 47.52
"#;

    #[test]
    fn files_path_points_at_local_files() {
        let out = rewrite_report(
            SERVER_REPORT,
            Path::new("/data/1FMO.pdb"),
            Some(Path::new("/data/lig.pdb")),
            Path::new("/out/123/1FMO.KVFinder.output.pdb"),
        )
        .unwrap();
        assert!(out.starts_with(REPORT_HEADER));
        let doc: Table = out.parse().unwrap();
        let files = doc["FILES_PATH"].as_table().unwrap();
        assert_eq!(files["INPUT"].as_str(), Some("/data/1FMO.pdb"));
        assert_eq!(files["LIGAND"].as_str(), Some("/data/lig.pdb"));
        assert_eq!(files["OUTPUT"].as_str(), Some("/out/123/1FMO.KVFinder.output.pdb"));
        assert_eq!(doc["RESULTS"]["VOLUME"]["KAA"].as_float(), Some(137.16));
    }

    #[test]
    fn ligand_entry_dropped_without_ligand() {
        let out = rewrite_report(SERVER_REPORT, Path::new("/a.pdb"), None, Path::new("/c.pdb")).unwrap();
        let doc: Table = out.parse().unwrap();
        assert!(doc["FILES_PATH"].get("LIGAND").is_none());
    }

    #[test]
    fn empty_report_gets_files_path_only() {
        let out = rewrite_report("", Path::new("/a.pdb"), None, Path::new("/c.pdb")).unwrap();
        let doc: Table = out.parse().unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["FILES_PATH"]["OUTPUT"].as_str(), Some("/c.pdb"));
    }

    #[test]
    fn invalid_reports_rejected() {
        assert!(rewrite_report("[[[", Path::new("/a"), None, Path::new("/c")).is_err());
        assert!(rewrite_report("FILES_PATH = 3", Path::new("/a"), None, Path::new("/c")).is_err());
    }

    #[test]
    fn rewriting_is_deterministic() {
        let a = rewrite_report(SERVER_REPORT, Path::new("/a"), None, Path::new("/c")).unwrap();
        let b = rewrite_report(SERVER_REPORT, Path::new("/a"), None, Path::new("/c")).unwrap();
        assert_eq!(a, b);
    }
}
