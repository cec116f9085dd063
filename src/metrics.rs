/// Below this speed the receiver is assumed to be standing still and pace is reported as 0.
pub const MIN_PACE_SPEED_MPS: f64 = 0.3;

/// Compute metrics (mean, median, 25th percentile, 75th percentile) from samples
pub fn compute_metrics(samples: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if samples.len() < 2 {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let mean = samples.iter().sum::<f64>() / n as f64;
    let median = sorted[n / 2];
    let p25 = sorted[n / 4];
    let p75 = sorted[3 * n / 4];
    Some((mean, median, p25, p75))
}

/// Instantaneous pace in minutes per km.
pub fn current_pace_min_per_km(speed_mps: f64) -> f64 {
    if speed_mps > MIN_PACE_SPEED_MPS {
        1000.0 / (speed_mps * 60.0)
    } else {
        0.0
    }
}

/// Average pace in seconds per km, 0 when no distance was covered.
pub fn avg_pace_sec_per_km(duration_sec: f64, distance_km: f64) -> f64 {
    if distance_km > 0.0 {
        duration_sec / distance_km
    } else {
        0.0
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
