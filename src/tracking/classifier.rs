use crate::tracking::config::TrackingConfig;
use crate::tracking::track::{Direction, Point, Track};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Outcome of a single `observe` call.
///
/// `counted` and `wasp_flagged` are only set on the call that made the
/// decision, so folding updates into colony counters counts each track once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackUpdate {
    pub track_id: u64,
    /// First sighting of this track id
    pub new_track: bool,
    /// Direction decided on this call
    pub counted: Option<Direction>,
    /// Track became a wasp on this call
    pub wasp_flagged: bool,
}

/// Owns one bounded trajectory per track id and classifies it as samples arrive
pub struct TrackClassifier {
    config: TrackingConfig,
    tracks: BTreeMap<u64, Track>,
    /// Frozen flags of evicted tracks, kept until `reset` so a returning id
    /// is neither a new track nor re-counted
    retired: BTreeMap<u64, Retired>,
    frame: u64,
}

#[derive(Debug, Clone, Copy)]
struct Retired {
    direction: Direction,
    counted: bool,
    is_wasp: bool,
}

impl TrackClassifier {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            config,
            tracks: BTreeMap::new(),
            retired: BTreeMap::new(),
            frame: 0,
        }
    }

    /// Record a sample for `track_id` and run both rules once.
    ///
    /// The track is created on first sighting. Classification flags are
    /// frozen once set; later samples are still buffered.
    pub fn observe(&mut self, track_id: u64, x: f64, y: f64, frame_height: f64) -> TrackUpdate {
        let frame = self.frame;
        let capacity = self.config.buffer_capacity;

        let retired = &mut self.retired;
        let mut new_track = false;
        let track = self.tracks.entry(track_id).or_insert_with(|| {
            let mut track = Track::new(track_id, capacity, frame);
            match retired.remove(&track_id) {
                Some(flags) => {
                    if flags.counted {
                        track.mark_counted(flags.direction);
                    }
                    if flags.is_wasp {
                        track.mark_wasp();
                    }
                }
                None => new_track = true,
            }
            track
        });

        track.push(Point { x, y });
        track.last_seen_frame = frame;

        let mut update = TrackUpdate {
            track_id,
            new_track,
            counted: None,
            wasp_flagged: false,
        };

        if !track.is_wasp() && is_hovering(&self.config, track, frame_height) && track.mark_wasp() {
            info!(track_id, "Potential wasp detected");
            update.wasp_flagged = true;
        }

        if !track.counted() {
            if let Some(direction) = judge_direction(&self.config, track) {
                if track.mark_counted(direction) {
                    debug!(track_id, direction = ?direction, "Track direction decided");
                    update.counted = Some(direction);
                }
            }
        }

        update
    }

    /// Advance the frame clock used for eviction by age
    pub fn next_frame(&mut self) {
        self.frame += 1;
    }

    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Drop the sample buffers of tracks not seen for more than
    /// `max_idle_frames` frames.
    ///
    /// Only the classification flags survive, so an id that reappears later
    /// in the session resumes frozen and is not counted again. Returns how
    /// many tracks were evicted.
    pub fn evict_idle(&mut self, max_idle_frames: u64) -> usize {
        let frame = self.frame;
        let idle: Vec<u64> = self
            .tracks
            .values()
            .filter(|track| frame.saturating_sub(track.last_seen_frame) > max_idle_frames)
            .map(|track| track.id)
            .collect();

        for track_id in &idle {
            if let Some(track) = self.tracks.remove(track_id) {
                self.retired.insert(
                    *track_id,
                    Retired {
                        direction: track.direction(),
                        counted: track.counted(),
                        is_wasp: track.is_wasp(),
                    },
                );
            }
        }

        let evicted = idle.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.tracks.len(), "Evicted idle tracks");
        }
        evicted
    }

    pub fn track(&self, track_id: u64) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Forget every track (start of a new session)
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.retired.clear();
        self.frame = 0;
    }
}

/// Wasp rule: mostly in the top band of the frame with little horizontal travel
fn is_hovering(config: &TrackingConfig, track: &Track, frame_height: f64) -> bool {
    let samples = track.len();
    if samples < config.wasp_min_samples.max(1) {
        return false;
    }

    let top_band = frame_height * config.wasp_top_fraction;
    let in_band = track.positions().iter().filter(|p| p.y < top_band).count();
    if (in_band as f64) <= samples as f64 * config.wasp_band_ratio {
        return false;
    }

    let window = config.wasp_hover_window.clamp(1, samples);
    let (min_x, max_x) = track
        .positions()
        .iter()
        .skip(samples - window)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        });

    max_x - min_x < config.wasp_max_spread
}

/// Direction rule: compare the mean x of the oldest and newest samples
fn judge_direction(config: &TrackingConfig, track: &Track) -> Option<Direction> {
    let samples = track.len();
    if samples < config.direction_min_samples.max(1) {
        return None;
    }

    let window = config.direction_edge_window.clamp(1, samples);
    let positions = track.positions();
    let start: f64 = positions.iter().take(window).map(|p| p.x).sum::<f64>() / window as f64;
    let end: f64 = positions.iter().skip(samples - window).map(|p| p.x).sum::<f64>() / window as f64;

    let shift = end - start;
    if shift.abs() <= config.direction_min_shift {
        return None;
    }

    if shift > 0.0 {
        Some(Direction::Entering)
    } else {
        Some(Direction::Leaving)
    }
}
