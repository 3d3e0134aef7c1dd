// Colony-wide counters folded from per-track classifications

use crate::tracking::{Direction, TrackUpdate};
use serde::{Deserialize, Serialize};

/// Aggregate view of one vision session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColonySnapshot {
    /// Distinct track ids seen this session
    pub unique_tracks: u64,
    pub entering: u64,
    pub leaving: u64,
    pub wasps: u64,
    /// 0-100
    pub activity_level: u8,
}

/// Running colony counters.
///
/// Counters only move when a `TrackUpdate` reports a fresh decision, so each
/// track contributes at most once to each of them.
#[derive(Clone, Debug, Default)]
pub struct ColonyStats {
    unique_tracks: u64,
    entering: u64,
    leaving: u64,
    wasps: u64,
}

impl ColonyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one classifier outcome into the counters
    pub fn apply(&mut self, update: &TrackUpdate) {
        if update.new_track {
            self.unique_tracks += 1;
        }
        match update.counted {
            Some(Direction::Entering) => self.entering += 1,
            Some(Direction::Leaving) => self.leaving += 1,
            Some(Direction::Unknown) | None => {}
        }
        if update.wasp_flagged {
            self.wasps += 1;
        }
    }

    pub fn snapshot(&self) -> ColonySnapshot {
        ColonySnapshot {
            unique_tracks: self.unique_tracks,
            entering: self.entering,
            leaving: self.leaving,
            wasps: self.wasps,
            activity_level: activity_level(self.unique_tracks, self.entering, self.leaving),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Blend population size and directional churn into a 0-100 score.
///
/// Presence saturates at 10 tracks (50 points); churn saturates when every
/// track has been counted entering or leaving (50 points).
pub fn activity_level(unique_bees: u64, entering: u64, leaving: u64) -> u8 {
    let presence = (unique_bees as f64 * 5.0).min(50.0);
    let churn = entering.saturating_add(leaving) as f64 / unique_bees.max(1) as f64;
    let movement = (churn * 50.0).min(50.0);

    (presence + movement).clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(new_track: bool, counted: Option<Direction>, wasp_flagged: bool) -> TrackUpdate {
        TrackUpdate {
            track_id: 1,
            new_track,
            counted,
            wasp_flagged,
        }
    }

    #[test]
    fn test_activity_level_zero_bees() {
        assert_eq!(activity_level(0, 0, 0), 0);
        // No division by zero even with stray counts
        assert!(activity_level(0, 3, 2) <= 100);
    }

    #[test]
    fn test_activity_level_saturates() {
        assert_eq!(activity_level(10, 10, 0), 100);
        assert_eq!(activity_level(1000, 5000, 5000), 100);
        assert_eq!(activity_level(u64::MAX, u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_activity_level_truncates() {
        // 3 * 5 = 15 presence, 1/3 * 50 = 16.66 movement
        assert_eq!(activity_level(3, 1, 0), 31);
        // presence only
        assert_eq!(activity_level(4, 0, 0), 20);
    }

    #[test]
    fn test_activity_level_always_bounded() {
        for bees in 0..40 {
            for moves in 0..40 {
                let level = activity_level(bees, moves, moves / 2);
                assert!(level <= 100, "bees={} moves={} level={}", bees, moves, level);
            }
        }
    }

    #[test]
    fn test_apply_counts_each_decision() {
        let mut stats = ColonyStats::new();

        stats.apply(&update(true, None, false));
        stats.apply(&update(false, Some(Direction::Entering), false));
        stats.apply(&update(true, Some(Direction::Leaving), true));
        stats.apply(&update(false, None, false));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.unique_tracks, 2);
        assert_eq!(snapshot.entering, 1);
        assert_eq!(snapshot.leaving, 1);
        assert_eq!(snapshot.wasps, 1);
        assert_eq!(snapshot.activity_level, activity_level(2, 1, 1));
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut stats = ColonyStats::new();
        stats.apply(&update(true, Some(Direction::Entering), true));

        stats.reset();

        assert_eq!(stats.snapshot(), ColonySnapshot::default());
    }
}
