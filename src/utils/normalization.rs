//! Normalization Utilities
//!
//! Two stages map a raw metric onto a comparable scale:
//! 1. `saturate` squashes unbounded network sums into [0, 1) with tanh
//! 2. `percentile_normalize` ranks a raw value against a calibrated
//!    percentile table for the guild's climate tier

/// tanh(raw / scale), zero for non-positive input
pub fn saturate(raw: f64, scale: f64) -> f64 {
    if raw <= 0.0 {
        return 0.0;
    }
    libm::tanh(raw / scale)
}

/// Percentile rank of `raw_value` using linear interpolation
///
/// Algorithm:
/// 1. Values at or below the first point rank 0, at or above the last rank 100
/// 2. Find bracketing percentiles [pi, pi+1] where values[pi] <= raw <= values[pi+1]
/// 3. Linear interpolation: percentile = pi + fraction × (pi+1 - pi)
///
/// A zero-width bracket (ties in the calibration sample) yields the lower
/// percentile. `values` must be non-decreasing and the same length as `points`.
pub fn percentile_normalize(raw_value: f64, points: &[f64], values: &[f64]) -> f64 {
    let n = values.len().min(points.len());
    if n == 0 {
        return 0.0;
    }

    // Edge cases
    if raw_value <= values[0] {
        return 0.0;
    }
    if raw_value >= values[n - 1] {
        return 100.0;
    }

    for i in 0..n - 1 {
        if values[i] <= raw_value && raw_value <= values[i + 1] {
            let width = values[i + 1] - values[i];
            let fraction = if width > 0.0 {
                (raw_value - values[i]) / width
            } else {
                0.0
            };
            return points[i] + fraction * (points[i + 1] - points[i]);
        }
    }

    // Unreachable for monotonic tables; NaN input lands here
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const POINTS: [f64; 5] = [1.0, 25.0, 50.0, 75.0, 99.0];

    #[test]
    fn test_saturate() {
        assert_relative_eq!(saturate(0.0, 8.0), 0.0);
        assert_relative_eq!(saturate(-1.0, 8.0), 0.0);
        assert_relative_eq!(saturate(8.0, 8.0), 1.0_f64.tanh(), epsilon = 1e-12);
        assert!(saturate(1e6, 3.0) <= 1.0);
    }

    #[test]
    fn test_percentile_edges() {
        let values = [0.1, 0.2, 0.3, 0.4, 0.5];
        assert_relative_eq!(percentile_normalize(0.05, &POINTS, &values), 0.0);
        assert_relative_eq!(percentile_normalize(0.1, &POINTS, &values), 0.0);
        assert_relative_eq!(percentile_normalize(0.5, &POINTS, &values), 100.0);
        assert_relative_eq!(percentile_normalize(9.0, &POINTS, &values), 100.0);
    }

    #[test]
    fn test_percentile_interpolates_within_bracket() {
        let values = [0.1, 0.2, 0.3, 0.4, 0.5];
        // Halfway between p25 (0.2) and p50 (0.3)
        assert_relative_eq!(percentile_normalize(0.25, &POINTS, &values), 37.5, epsilon = 1e-9);
        assert_relative_eq!(percentile_normalize(0.3, &POINTS, &values), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_width_bracket_takes_lower_point() {
        let values = [0.0, 0.0, 0.2, 0.2, 0.6];
        assert_relative_eq!(percentile_normalize(0.2, &POINTS, &values), 50.0);
    }
}
