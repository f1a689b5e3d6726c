//! Result of a finished job as reported by the server.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;

/// Output attached to a job in `Completed` or `TimedOut` status.
///
/// Any of the text fields may be empty; a timed-out job in particular is not
/// guaranteed to carry a meaningful cavity or report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobOutput {
    /// Cavity geometry in PDB format (`pdb_kv`).
    pub cavity: String,
    /// parKVFinder results file (TOML text).
    pub report: String,
    /// parKVFinder run log.
    pub log: String,
    pub created_at: String,
    pub started_at: String,
    pub ended_at: String,
}

/// Durations derived from the server timestamps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobTimings {
    /// `ended_at - created_at`.
    pub total: Duration,
    /// `started_at - created_at`: time spent waiting for a worker.
    pub queued: Duration,
    /// `ended_at - started_at`: time spent on the worker.
    pub worker: Duration,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid {field} timestamp {value:?}")]
pub struct TimestampError {
    pub field: &'static str,
    pub value: String,
}

impl JobOutput {
    pub fn timings(&self) -> Result<JobTimings, TimestampError> {
        let created = parse_timestamp("created_at", &self.created_at)?;
        let started = parse_timestamp("started_at", &self.started_at)?;
        let ended = parse_timestamp("ended_at", &self.ended_at)?;
        Ok(JobTimings {
            total: span(created, ended),
            queued: span(created, started),
            worker: span(started, ended),
        })
    }
}

/// Accepts RFC 3339 or a naive ISO-8601 timestamp (taken as UTC).
fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, TimestampError> {
    let v = value.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(v) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|n| n.and_utc())
        .map_err(|_| TimestampError {
            field,
            value: value.to_string(),
        })
}

/// Clock skew between server components can produce negative spans; clamp to zero.
fn span(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(created: &str, started: &str, ended: &str) -> JobOutput {
        JobOutput {
            created_at: created.into(),
            started_at: started.into(),
            ended_at: ended.into(),
            ..JobOutput::default()
        }
    }

    #[test]
    fn timings_from_rfc3339() {
        let o = output(
            "2021-03-01T10:00:00Z",
            "2021-03-01T10:00:02.5Z",
            "2021-03-01T10:00:10Z",
        );
        let t = o.timings().unwrap();
        assert_eq!(t.total, Duration::from_secs(10));
        assert_eq!(t.queued, Duration::from_millis(2500));
        assert_eq!(t.worker, Duration::from_millis(7500));
    }

    #[test]
    fn timings_from_naive_timestamps() {
        let o = output(
            "2021-03-01T10:00:00.000001",
            "2021-03-01 10:00:01",
            "2021-03-01T10:00:03",
        );
        let t = o.timings().unwrap();
        assert_eq!(t.worker, Duration::from_secs(2));
    }

    #[test]
    fn invalid_timestamp_names_field() {
        let o = output("2021-03-01T10:00:00Z", "soon", "2021-03-01T10:00:03Z");
        let err = o.timings().unwrap_err();
        assert_eq!(err.field, "started_at");
    }

    #[test]
    fn negative_span_clamps_to_zero() {
        let o = output(
            "2021-03-01T10:00:05Z",
            "2021-03-01T10:00:00Z",
            "2021-03-01T10:00:06Z",
        );
        assert_eq!(o.timings().unwrap().queued, Duration::ZERO);
    }
}
