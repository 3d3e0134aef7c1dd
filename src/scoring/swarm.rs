/// Swarm likelihood, 0-100.
///
/// Sums four banded components: season (30), temperature (25),
/// activity (25) and the raw sensor signal scaled from 0-255 (20).
pub fn swarm_likelihood(temperature: f64, activity_level: u8, raw_signal: u8, month: u32) -> u8 {
    let total = season_points(month)
        + temperature_points(temperature)
        + activity_points(activity_level)
        + sensor_points(raw_signal);

    total.clamp(0.0, 100.0) as u8
}

fn season_points(month: u32) -> f64 {
    match month {
        4..=6 => 30.0,
        3 | 7 => 20.0,
        2 | 8 => 10.0,
        _ => 0.0,
    }
}

fn temperature_points(t: f64) -> f64 {
    if t >= 36.0 {
        25.0
    } else if t >= 34.0 {
        20.0
    } else if t >= 30.0 {
        15.0
    } else if t >= 25.0 {
        10.0
    } else {
        0.0
    }
}

fn activity_points(activity_level: u8) -> f64 {
    match activity_level {
        85..=u8::MAX => 25.0,
        70..=84 => 20.0,
        50..=69 => 15.0,
        30..=49 => 10.0,
        _ => 5.0,
    }
}

fn sensor_points(raw_signal: u8) -> f64 {
    f64::from(raw_signal) / 255.0 * 20.0
}
