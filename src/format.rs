//! Display helpers shared by the text summary and the TUI.

/// `mm:ss`, or `h:mm:ss` once the run passes an hour.
pub fn format_duration_ms(elapsed_ms: u64) -> String {
    format_duration_secs(elapsed_ms / 1000)
}

pub fn format_duration_secs(total: u64) -> String {
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Pace in minutes per km as `m'ss"`. Zero means no pace and renders as `--'--"`.
pub fn format_pace_min_per_km(pace: f64) -> String {
    if !pace.is_finite() || pace <= 0.0 {
        return "--'--\"".into();
    }
    let total = (pace * 60.0).round() as u64;
    format!("{}'{:02}\"", total / 60, total % 60)
}

pub fn format_pace_sec_per_km(pace: f64) -> String {
    format_pace_min_per_km(pace / 60.0)
}

pub fn format_distance_km(km: f64) -> String {
    format!("{km:.2} km")
}
