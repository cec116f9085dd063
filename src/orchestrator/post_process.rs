//! Post-run processing utilities.
//!
//! Builds the summary and runs the one-shot export after a run completes.

use super::FinishedRun;
use crate::model::RunRecord;
use crate::text_summary::{build_text_summary, TextSummary};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of post-run processing, ready for presentation layers.
pub(crate) struct ProcessedRun {
    pub summary: TextSummary,
    pub export_messages: Vec<String>,
    pub exported_path: Option<PathBuf>,
}

/// Write a finished run record as pretty JSON, creating parent directories as needed.
pub(crate) fn export_json(path: &Path, record: &RunRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(record).context("serialize run record")?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "run record exported");
    Ok(())
}

/// Summarize a completed run and export it when a path was requested. Export failures are
/// reported as messages rather than errors so the UI can keep running.
pub(crate) fn process_run_completion(export_path: Option<&Path>, run: &FinishedRun) -> ProcessedRun {
    let summary = build_text_summary(&run.record, &run.samples);

    let mut export_messages = Vec::new();
    let mut exported_path = None;
    if let Some(path) = export_path {
        match export_json(path, &run.record) {
            Ok(()) => {
                export_messages.push(format!("Exported JSON: {}", path.display()));
                exported_path = Some(path.to_path_buf());
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "export failed");
                export_messages.push(format!("Export JSON failed: {e:#}"));
            }
        }
    }

    ProcessedRun {
        summary,
        export_messages,
        exported_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunSource;

    fn finished() -> FinishedRun {
        FinishedRun {
            record: RunRecord {
                distance_km: 3.21,
                duration_sec: 1200,
                avg_pace_sec_per_km: 373.8,
                date: "2026-10-16".into(),
                elevation_gain_m: 18,
                source: RunSource::App,
                strava_id: None,
            },
            samples: Vec::new(),
            stopped_on_quit: false,
        }
    }

    #[test]
    fn exports_record_into_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("latest.json");
        let processed = process_run_completion(Some(&path), &finished());

        assert_eq!(processed.exported_path.as_deref(), Some(path.as_path()));
        assert_eq!(processed.export_messages.len(), 1);
        let back: RunRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, finished().record);
    }

    #[test]
    fn export_failure_becomes_a_message() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten as a file.
        let processed = process_run_completion(Some(dir.path()), &finished());
        assert!(processed.exported_path.is_none());
        assert!(processed.export_messages[0].starts_with("Export JSON failed"));
    }

    #[test]
    fn no_export_requested() {
        let processed = process_run_completion(None, &finished());
        assert!(processed.export_messages.is_empty());
        assert!(!processed.summary.lines.is_empty());
    }
}
