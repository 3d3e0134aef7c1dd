use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Direction a track was judged to move relative to the hive entrance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Unknown,
    Entering,
    Leaving,
}

/// Centre point of a detection, in frame pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One subject followed by the external tracker.
///
/// Positions form a FIFO window: once `capacity` samples are held, the oldest
/// is dropped for every new one. `direction`/`counted` and `is_wasp` are
/// write-once; the classifier flips them at most once per track.
#[derive(Debug, Clone)]
pub struct Track {
    /// Identifier handed out by the external tracker
    pub id: u64,

    positions: VecDeque<Point>,
    capacity: usize,
    direction: Direction,
    counted: bool,
    is_wasp: bool,

    /// Frame index of the latest sighting (drives eviction by age)
    pub last_seen_frame: u64,
}

impl Track {
    pub fn new(id: u64, capacity: usize, frame: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            id,
            positions: VecDeque::with_capacity(capacity),
            capacity,
            direction: Direction::Unknown,
            counted: false,
            is_wasp: false,
            last_seen_frame: frame,
        }
    }

    /// Append a sample, evicting the oldest one past capacity
    pub fn push(&mut self, point: Point) {
        if self.positions.len() == self.capacity {
            self.positions.pop_front();
        }
        self.positions.push_back(point);
    }

    pub fn positions(&self) -> &VecDeque<Point> {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn counted(&self) -> bool {
        self.counted
    }

    pub fn is_wasp(&self) -> bool {
        self.is_wasp
    }

    /// Freeze the direction. Returns false if it was already decided.
    pub(crate) fn mark_counted(&mut self, direction: Direction) -> bool {
        if self.counted {
            return false;
        }
        self.direction = direction;
        self.counted = true;
        true
    }

    /// Flag the track as a wasp. Returns false if it was already flagged.
    pub(crate) fn mark_wasp(&mut self) -> bool {
        if self.is_wasp {
            return false;
        }
        self.is_wasp = true;
        true
    }
}
