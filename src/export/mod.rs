// src/export/mod.rs
//! Turns a finished recording into Ledalab-ready files.
//!
//! The MAT file is the primary artifact; the `.txt`/`.csv` fallbacks and the
//! optional `.png` preview are written independently, so one failure never
//! blocks the others.
pub mod matfile;
pub mod series;
pub mod text;
pub mod verify;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{error, info, warn};

use crate::config::CollectorConfig;
use crate::drivers::{render_conductance_png, GsrError, PlotStyle};
use crate::types::Sample;

pub use series::{ExportSeries, SeriesStats};
pub use text::TextLayout;
pub use verify::VerificationReport;

pub const MAT_EXTENSION: &str = "mat";

#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactPaths {
    pub structured: PathBuf,
    pub tab: PathBuf,
    pub csv: PathBuf,
    pub preview: PathBuf,
}

impl ArtifactPaths {
    /// `base` falls back to a timestamped name. `.mat` is enforced and the
    /// other artifacts swap that extension. A base that is only the
    /// extension counts as no base at all.
    pub fn resolve(base: Option<&str>, output_dir: &Path) -> Self {
        let suffix = format!(".{MAT_EXTENSION}");
        let stem = base
            .map(str::trim)
            .map(|b| b.strip_suffix(suffix.as_str()).unwrap_or(b))
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_base_name);
        let structured = output_dir.join(format!("{stem}{suffix}"));
        Self {
            tab: structured.with_extension("txt"),
            csv: structured.with_extension("csv"),
            preview: structured.with_extension("png"),
            structured,
        }
    }
}

pub fn default_base_name() -> String {
    format!("GSR_data_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArtifactOutcome {
    Written,
    Failed(String),
    Skipped,
}

impl ArtifactOutcome {
    fn from_result<E: std::fmt::Display>(label: &str, path: &Path, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => {
                info!("{label} saved: {}", path.display());
                ArtifactOutcome::Written
            }
            Err(e) => {
                error!("failed to write {label} {}: {e}", path.display());
                ArtifactOutcome::Failed(e.to_string())
            }
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, ArtifactOutcome::Written)
    }
}

#[derive(Clone, Debug)]
pub struct ExportReport {
    pub paths: ArtifactPaths,
    pub stats: SeriesStats,
    pub sampling_rate_hz: f64,
    pub structured: ArtifactOutcome,
    pub verification: Option<VerificationReport>,
    pub tab: ArtifactOutcome,
    pub csv: ArtifactOutcome,
    pub preview: ArtifactOutcome,
}

impl ExportReport {
    /// Every artifact with its label and path, MAT file first.
    pub fn artifacts(&self) -> [(&'static str, &Path, &ArtifactOutcome); 4] {
        [
            ("MAT file", self.paths.structured.as_path(), &self.structured),
            ("text backup", self.paths.tab.as_path(), &self.tab),
            ("CSV backup", self.paths.csv.as_path(), &self.csv),
            ("preview plot", self.paths.preview.as_path(), &self.preview),
        ]
    }

    pub fn any_written(&self) -> bool {
        self.artifacts().iter().any(|(_, _, outcome)| outcome.is_written())
    }

    /// Closing summary for the operator, one line per attempted artifact.
    pub fn closing_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} samples, {:.2} Hz",
            self.stats.count, self.sampling_rate_hz
        )];
        for (label, path, outcome) in self.artifacts() {
            match outcome {
                ArtifactOutcome::Written => lines.push(format!("  {label}: {}", path.display())),
                ArtifactOutcome::Failed(reason) => {
                    lines.push(format!("  {label}: NOT saved ({reason})"))
                }
                ArtifactOutcome::Skipped => {}
            }
        }
        if !self.any_written() {
            lines.push("  nothing was saved".to_string());
        }
        lines
    }
}

/// Writes every artifact for `samples`. Only an empty recording is an error;
/// per-file failures are recorded in the report.
pub fn export_recording(
    samples: &[Sample],
    base: Option<&str>,
    config: &CollectorConfig,
) -> Result<ExportReport, GsrError> {
    let series = ExportSeries::from_samples(samples, config.fallback_sampling_rate_hz)?;
    let paths = ArtifactPaths::resolve(base, &config.output_dir);
    log_summary(&series);

    if let Some(parent) = paths.structured.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("could not create output directory {}: {e}", parent.display());
            }
        }
    }

    let structured = ArtifactOutcome::from_result(
        "MAT file",
        &paths.structured,
        matfile::save(
            &paths.structured,
            verify::RECORD_NAME,
            series.to_ledalab_record(),
        ),
    );
    let verification = structured.is_written().then(|| {
        info!("verifying MAT file...");
        let report = verify::verify_structured(&paths.structured);
        report.log();
        report
    });

    let time = series.time.to_vec();
    let conductance = series.conductance.to_vec();
    let tab = ArtifactOutcome::from_result(
        "text backup",
        &paths.tab,
        text::write_series(&paths.tab, &time, &conductance, TextLayout::Tab),
    );
    let csv = ArtifactOutcome::from_result(
        "CSV backup",
        &paths.csv,
        text::write_series(&paths.csv, &time, &conductance, TextLayout::Comma),
    );
    let preview = if config.preview_plot {
        let result = render_conductance_png(&time, &conductance, &PlotStyle::default())
            .and_then(|png| fs::write(&paths.preview, png).map_err(GsrError::from));
        ArtifactOutcome::from_result("preview plot", &paths.preview, result)
    } else {
        ArtifactOutcome::Skipped
    };

    Ok(ExportReport {
        paths,
        stats: series.stats,
        sampling_rate_hz: series.sampling_rate_hz,
        structured,
        verification,
        tab,
        csv,
        preview,
    })
}

fn log_summary(series: &ExportSeries) {
    let stats = &series.stats;
    info!("recording summary:");
    info!("  samples: {}", stats.count);
    info!("  duration: {:.2} s", stats.duration_s);
    info!("  estimated sampling rate: {:.2} Hz", series.sampling_rate_hz);
    info!(
        "  conductance range: {:.2} - {:.2} uS",
        stats.min_conductance, stats.max_conductance
    );
    info!("  mean conductance: {:.2} uS", stats.mean_conductance);
}
