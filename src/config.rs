use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FEED_URL: &str = "https://raw.githubusercontent.com/WynterDai/WanyueDai.github.io/main/Mapping%20project/UK_earthquake_clean.csv";

/// Viewer configuration, read from an optional JSON file. Missing keys fall
/// back to the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed_url: String,
    pub fetch: FetchConfig,
    /// Degrees of longitude / latitude the map may be panned beyond the
    /// padded data bounds.
    pub pan_margin: [f64; 2],
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            fetch: FetchConfig::default(),
            pan_margin: [8.0, 5.0],
            window_size: [1200.0, 800.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref)
            .with_context(|| format!("reading config {}", path_ref.display()))?;
        let config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Config file named by the first command-line argument, or defaults.
    pub fn from_args() -> anyhow::Result<Self> {
        match std::env::args_os().nth(1) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "feed_url": "http://localhost/quakes.csv", "fetch": {{ "max_attempts": 5 }} }}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.feed_url, "http://localhost/quakes.csv");
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.pan_margin, [8.0, 5.0]);
    }

    #[test]
    fn bad_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }
}
