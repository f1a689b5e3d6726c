use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::poller::PollConfig;
use crate::remote::HttpOptions;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8081";

/// Poll loop pacing (optional `[poll]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSection {
    /// Pause between two job ids within one cycle, in milliseconds.
    pub id_interval_ms: u64,
    /// Pause between two cycles, in seconds.
    pub cycle_interval_secs: u64,
    /// Stop after this many consecutive empty cycles (None = poll until stopped).
    pub idle_cycles_to_stop: Option<u32>,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            id_interval_ms: 1000,
            cycle_interval_secs: 10,
            idle_cycles_to_stop: None,
        }
    }
}

/// HTTP timeouts (optional `[http]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 60,
        }
    }
}

/// Global configuration loaded from `~/.config/kvweb/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvConfig {
    /// KVFinder-web server root URL.
    pub server_url: String,
    /// Job store root; defaults to `~/.local/state/kvweb/jobs`.
    #[serde(default)]
    pub jobs_dir: Option<PathBuf>,
    #[serde(default)]
    pub poll: PollSection,
    #[serde(default)]
    pub http: HttpSection,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            jobs_dir: None,
            poll: PollSection::default(),
            http: HttpSection::default(),
        }
    }
}

impl KvConfig {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            id_interval: Duration::from_millis(self.poll.id_interval_ms),
            cycle_interval: Duration::from_secs(self.poll.cycle_interval_secs),
            idle_cycles_to_stop: self.poll.idle_cycles_to_stop,
        }
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
            timeout: Duration::from_secs(self.http.timeout_secs),
        }
    }

    /// Configured job store root, or the XDG state default.
    pub fn jobs_dir(&self) -> Result<PathBuf> {
        match &self.jobs_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_jobs_dir(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("kvweb")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

pub fn default_jobs_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("kvweb")?;
    Ok(xdg_dirs.get_state_home().join("kvweb").join("jobs"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<KvConfig> {
    load_or_init_at(&config_path()?)
}

/// `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<KvConfig> {
    if !path.exists() {
        let default_cfg = KvConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: KvConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = KvConfig::default();
        assert_eq!(cfg.server_url, "http://localhost:8081");
        assert!(cfg.jobs_dir.is_none());
        let poll = cfg.poll_config();
        assert_eq!(poll.id_interval, Duration::from_secs(1));
        assert_eq!(poll.cycle_interval, Duration::from_secs(10));
        assert_eq!(poll.idle_cycles_to_stop, None);
        assert_eq!(cfg.http_options(), HttpOptions::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = KvConfig {
            jobs_dir: Some(PathBuf::from("/var/lib/kvweb/jobs")),
            ..KvConfig::default()
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: KvConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_sections() {
        let toml = r#"
            server_url = "https://kv.example.org/api"

            [poll]
            cycle_interval_secs = 2
            idle_cycles_to_stop = 3
        "#;
        let cfg: KvConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server_url, "https://kv.example.org/api");
        assert_eq!(cfg.poll.id_interval_ms, 1000);
        assert_eq!(cfg.poll.cycle_interval_secs, 2);
        assert_eq!(cfg.poll_config().idle_cycles_to_stop, Some(3));
        assert_eq!(cfg.http.timeout_secs, 60);
    }

    #[test]
    fn explicit_jobs_dir_wins() {
        let cfg = KvConfig {
            jobs_dir: Some(PathBuf::from("/tmp/kv-jobs")),
            ..KvConfig::default()
        };
        assert_eq!(cfg.jobs_dir().unwrap(), PathBuf::from("/tmp/kv-jobs"));
    }

    #[test]
    fn load_or_init_creates_then_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kvweb").join("config.toml");
        let created = load_or_init_at(&path).unwrap();
        assert_eq!(created, KvConfig::default());
        assert!(path.exists());

        fs::write(&path, "server_url = \"http://10.0.0.5:8081\"\n").unwrap();
        let loaded = load_or_init_at(&path).unwrap();
        assert_eq!(loaded.server_url, "http://10.0.0.5:8081");
        assert_eq!(loaded.http, HttpSection::default());
    }

    #[test]
    fn load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "server_url = ").unwrap();
        assert!(load_or_init_at(&path).is_err());
    }
}
