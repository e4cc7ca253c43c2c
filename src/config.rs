// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::drivers::GsrError;

/// Collector settings. Every field has a default so a config file only needs
/// the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    /// Arduino resets when DTR toggles on open; wait for it before talking.
    pub settle_delay_ms: u64,
    pub stop_grace_ms: u64,
    pub poll_interval_ms: u64,
    pub fallback_sampling_rate_hz: f64,
    pub progress_every: usize,
    pub max_line_len: usize,
    pub output_dir: PathBuf,
    pub preview_plot: bool,
    pub simulated_rate_hz: f64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_timeout_ms: 1000,
            settle_delay_ms: 2000,
            stop_grace_ms: 500,
            poll_interval_ms: 10,
            fallback_sampling_rate_hz: 10.0,
            progress_every: 10,
            max_line_len: 2048,
            output_dir: PathBuf::from("."),
            preview_plot: false,
            simulated_rate_hz: 10.0,
        }
    }
}

impl CollectorConfig {
    pub fn load(path: &Path) -> Result<Self, GsrError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GsrError> {
        if self.baud_rate == 0 {
            return Err(GsrError::Config("baud_rate must be greater than zero".into()));
        }
        if !(self.fallback_sampling_rate_hz > 0.0) {
            return Err(GsrError::Config(
                "fallback_sampling_rate_hz must be greater than zero".into(),
            ));
        }
        if self.max_line_len == 0 {
            return Err(GsrError::Config("max_line_len must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Zero delays everywhere; used by tests driving scripted links.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            stop_grace_ms: 0,
            poll_interval_ms: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "baud_rate": 9600, "preview_plot": true }}"#).unwrap();
        let config = CollectorConfig::load(file.path()).unwrap();
        assert_eq!(config.baud_rate, 9600);
        assert!(config.preview_plot);
        assert_eq!(config.settle_delay_ms, 2000);
        assert_eq!(config.fallback_sampling_rate_hz, 10.0);
    }

    #[test]
    fn rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "fallback_sampling_rate_hz": 0.0 }}"#).unwrap();
        assert!(matches!(
            CollectorConfig::load(file.path()),
            Err(GsrError::Config(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            CollectorConfig::load(file.path()),
            Err(GsrError::Config(_))
        ));
    }
}
