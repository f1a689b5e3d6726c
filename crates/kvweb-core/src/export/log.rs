//! Server log filtering.

const RUNNING_MARKER: &str = "Running parKVFinder for: ";
const DICTIONARY_MARKER: &str = "Dictionary: ";

/// Replace the server-side input path in the "Running" line with the job id
/// and drop dictionary lines. Every kept line ends with `\n`.
pub fn filter_log(log: &str, id: &str) -> String {
    let mut out = String::with_capacity(log.len());
    for line in log.lines() {
        if line.contains(RUNNING_MARKER) {
            out.push_str("Running parKVFinder for job ID: ");
            out.push_str(id);
        } else if line.contains(DICTIONARY_MARKER) {
            continue;
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_running_line_and_drops_dictionary() {
        let log = "==========\n\
                   Running parKVFinder for: /srv/jobs/42/protein.pdb\n\
                   Dictionary: /srv/vdw.dat\n\
                   Surface: SES\n";
        assert_eq!(
            filter_log(log, "42"),
            "==========\nRunning parKVFinder for job ID: 42\nSurface: SES\n"
        );
    }

    #[test]
    fn empty_log_stays_empty() {
        assert_eq!(filter_log("", "1"), "");
    }
}
