/// Colony health, 0-100.
///
/// Temperature contributes up to 40 points in bands around the 34-35 °C
/// optimum, activity up to 40 points (flat above 80), battery up to 20.
pub fn health_score(temperature: f64, activity_level: u8, battery_percent: u8) -> u8 {
    let total = temperature_points(temperature)
        + activity_points(activity_level)
        + battery_points(battery_percent);

    total.clamp(0.0, 100.0) as u8
}

fn temperature_points(t: f64) -> f64 {
    if (34.0..=35.0).contains(&t) {
        40.0
    } else if (32.0..34.0).contains(&t) || (t > 35.0 && t <= 36.0) {
        35.0
    } else if (30.0..32.0).contains(&t) || (t > 36.0 && t <= 38.0) {
        25.0
    } else if (25.0..30.0).contains(&t) || (t > 38.0 && t <= 40.0) {
        15.0
    } else {
        5.0
    }
}

fn activity_points(activity_level: u8) -> f64 {
    let capped = f64::from(activity_level).min(80.0);
    (capped / 80.0 * 40.0).clamp(0.0, 40.0)
}

fn battery_points(battery_percent: u8) -> f64 {
    (f64::from(battery_percent) / 100.0 * 20.0).clamp(0.0, 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_bands() {
        assert_eq!(temperature_points(34.0), 40.0);
        assert_eq!(temperature_points(35.0), 40.0);
        assert_eq!(temperature_points(33.0), 35.0);
        assert_eq!(temperature_points(36.0), 35.0);
        assert_eq!(temperature_points(31.0), 25.0);
        assert_eq!(temperature_points(37.5), 25.0);
        assert_eq!(temperature_points(26.0), 15.0);
        assert_eq!(temperature_points(40.0), 15.0);
        assert_eq!(temperature_points(41.0), 5.0);
        assert_eq!(temperature_points(-10.0), 5.0);
    }

    #[test]
    fn test_activity_above_eighty_adds_nothing() {
        assert_eq!(activity_points(80), 40.0);
        assert_eq!(activity_points(100), 40.0);
        assert_eq!(activity_points(40), 20.0);
    }

    #[test]
    fn test_health_score_examples() {
        assert_eq!(health_score(34.5, 80, 100), 100);
        // 35 + 20 + 10
        assert_eq!(health_score(33.0, 40, 50), 65);
        assert_eq!(health_score(-5.0, 0, 0), 5);
    }

    #[test]
    fn test_health_score_bounded_across_temperatures() {
        let mut t = -30.0;
        while t <= 60.0 {
            for activity in [0u8, 50, 80, 100, 255] {
                for battery in [0u8, 50, 100, 255] {
                    let score = health_score(t, activity, battery);
                    assert!(score <= 100, "t={} a={} b={} -> {}", t, activity, battery, score);
                }
            }
            t += 0.5;
        }
    }
}
