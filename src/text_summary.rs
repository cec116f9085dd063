//! Text summary builder for CLI output.
//!
//! This module computes metrics and formats human-readable lines for text mode.

use crate::format;
use crate::metrics;
use crate::model::{PositionSample, RunRecord};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished run and its raw samples.
pub(crate) fn build_text_summary(record: &RunRecord, samples: &[PositionSample]) -> TextSummary {
    let mut lines = vec![
        format!("Date:      {}", record.date),
        format!("Distance:  {}", format::format_distance_km(record.distance_km)),
        format!("Time:      {}", format::format_duration_secs(record.duration_sec)),
        format!(
            "Avg pace:  {} /km",
            format::format_pace_sec_per_km(record.avg_pace_sec_per_km)
        ),
        format!("Climb:     {} m", record.elevation_gain_m),
    ];

    let speeds: Vec<f64> = samples.iter().filter_map(|s| s.speed).collect();
    match metrics::compute_metrics(&speeds) {
        Some((mean, median, p25, p75)) => lines.push(format!(
            "Speed:     avg {:.2} med {:.2} p25 {:.2} p75 {:.2} m/s",
            mean, median, p25, p75
        )),
        None => lines.push("Speed:     not enough readings".into()),
    }
    lines.push(format!("Samples:   {}", samples.len()));

    TextSummary { lines }
}
