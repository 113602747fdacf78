/// Kick times as chart points: x is the kick number (from 1), y the seconds it took
pub fn kick_time_points(kick_times: &[f64]) -> Vec<(f64, f64)> {
    kick_times
        .iter()
        .enumerate()
        .map(|(idx, &t)| ((idx + 1) as f64, t))
        .collect()
}

/// Compute X (kick number) and Y (seconds) bounds for the scorecard chart
pub fn compute_chart_params(kick_times: &[f64]) -> (f64, f64) {
    let overall_kicks = (kick_times.len() as f64).max(1.0);

    let mut slowest = 0.0;
    for &t in kick_times {
        if t > slowest {
            slowest = t;
        }
    }
    // round up to the next half second so the slowest kick is not on the border
    let y_max = ((slowest * 2.0).ceil() / 2.0).max(1.0);

    (overall_kicks, y_max)
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
