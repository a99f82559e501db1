use crate::models::{Trend, ValueRange};

/// Round to two decimal places, the precision readings and yields are reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score a reading against its optimal range.
///
/// Returns 1.0 inside the range. Below the range the score falls off as
/// `value / min`, above it as `max / value`; never negative.
pub fn normalize_sensor_value(value: f64, optimal: &ValueRange) -> f64 {
    if optimal.contains(value) {
        1.0
    } else if value < optimal.min {
        if optimal.min <= 0.0 {
            return 0.0;
        }
        (value / optimal.min).max(0.0)
    } else {
        (optimal.max / value).max(0.0)
    }
}

/// Yield multiplier for temperature deviation from the middle of the optimal
/// range, scaled by how sensitive the crop is. Floored at 0.1.
pub fn temperature_factor(temp: f64, optimal: &ValueRange, sensitivity: f64) -> f64 {
    let optimal_temp = optimal.midpoint();
    if optimal_temp == 0.0 {
        return 1.0;
    }
    let deviation = (temp - optimal_temp).abs() / optimal_temp.abs();
    (1.0 - deviation * sensitivity * 0.5).max(0.1)
}

/// Yield multiplier for soil moisture.
///
/// Below the range the shortfall ratio is scaled by the crop's water need;
/// above it the penalty is capped at 30% of the relative excess. Floored at 0.1.
pub fn water_factor(moisture: f64, optimal: &ValueRange, water_need: f64) -> f64 {
    let factor = if moisture < optimal.min {
        if optimal.min <= 0.0 {
            0.0
        } else {
            (moisture / optimal.min) * water_need
        }
    } else if moisture > optimal.max {
        1.0 - ((moisture - optimal.max) / optimal.max) * 0.3
    } else {
        1.0
    };
    factor.max(0.1)
}

/// Compare the endpoints of a series: a >10% rise is increasing, a >10% drop
/// is decreasing.
pub fn endpoint_trend(values: &[f64], change_ratio: f64) -> Trend {
    let (Some(first), Some(last)) = (values.first(), values.last()) else {
        return Trend::Stable;
    };
    if values.len() < 2 {
        return Trend::Stable;
    }

    if *last > first * (1.0 + change_ratio) {
        Trend::Increasing
    } else if *last < first * (1.0 - change_ratio) {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_is_one_inside_range() {
        let range = ValueRange::new(20.0, 40.0);
        assert_eq!(normalize_sensor_value(20.0, &range), 1.0);
        assert_eq!(normalize_sensor_value(30.0, &range), 1.0);
        assert_eq!(normalize_sensor_value(40.0, &range), 1.0);
    }

    #[test]
    fn normalization_decreases_away_from_range() {
        let range = ValueRange::new(20.0, 40.0);

        let mut previous = 1.0;
        for value in [19.0, 15.0, 10.0, 5.0, 0.0] {
            let score = normalize_sensor_value(value, &range);
            assert!((0.0..1.0).contains(&score), "score {} out of [0,1)", score);
            assert!(score < previous);
            previous = score;
        }

        let mut previous = 1.0;
        for value in [41.0, 50.0, 80.0, 200.0] {
            let score = normalize_sensor_value(value, &range);
            assert!((0.0..1.0).contains(&score), "score {} out of [0,1)", score);
            assert!(score < previous);
            previous = score;
        }
    }

    #[test]
    fn normalization_never_negative() {
        let range = ValueRange::new(0.3, 0.8);
        assert_eq!(normalize_sensor_value(-0.5, &range), 0.0);
    }

    #[test]
    fn temperature_factor_peaks_at_midpoint() {
        let range = ValueRange::new(15.0, 30.0);
        assert!((temperature_factor(22.5, &range, 1.3) - 1.0).abs() < 1e-9);
        // 45°C is 100% off the midpoint: 1 - 1.0 * 1.0 * 0.5
        assert!((temperature_factor(45.0, &range, 1.0) - 0.5).abs() < 1e-9);
        // Extreme deviations are floored
        assert!((temperature_factor(200.0, &range, 1.3) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn water_factor_bands() {
        let range = ValueRange::new(20.0, 40.0);
        assert_eq!(water_factor(30.0, &range, 1.2), 1.0);
        assert!((water_factor(10.0, &range, 1.2) - 0.6).abs() < 1e-9);
        // 50% over max costs 15%
        assert!((water_factor(60.0, &range, 1.2) - 0.85).abs() < 1e-9);
        assert!((water_factor(0.0, &range, 1.2) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn endpoint_trend_detection() {
        assert_eq!(endpoint_trend(&[10.0, 9.0, 11.5], 0.1), Trend::Increasing);
        assert_eq!(endpoint_trend(&[10.0, 12.0, 8.9], 0.1), Trend::Decreasing);
        assert_eq!(endpoint_trend(&[10.0, 30.0, 10.5], 0.1), Trend::Stable);
        assert_eq!(endpoint_trend(&[10.0], 0.1), Trend::Stable);
        assert_eq!(endpoint_trend(&[], 0.1), Trend::Stable);
    }

    #[test]
    fn round2_rounds_half_away() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_1), 1.24);
        assert_eq!(round2(-2.5), -2.5);
    }
}
