//! Fling planning.
//!
//! A fling estimates where free deceleration would stop, picks the card
//! boundary nearest to that estimate and then moves there with constant
//! deceleration, arriving with zero velocity.

use crate::layout::CardLayout;

/// Deceleration in px/s² used to estimate where a fling would come to rest.
pub const FLING_ESTIMATE_DECELERATION: f32 = 2000.0;

/// Flings that would take longer than this are replaced by a motion of
/// exactly this duration.
pub const SLOW_FLING_DURATION_SECONDS: f32 = 0.25;

/// Index of the card a fling from `offset` with `velocity` settles on.
///
/// Takes the last card whose boundary is at or before the estimated rest
/// position, then the next card when the estimate reached the midpoint
/// between the two boundaries.
pub fn fling_target_index(layout: &CardLayout, offset: f32, velocity: f32) -> Option<usize> {
    if layout.card_count() == 0 {
        return None;
    }
    let estimate = offset + velocity * velocity.abs() / (2.0 * FLING_ESTIMATE_DECELERATION);
    let boundaries = layout.boundaries();
    let mut index = boundaries
        .iter()
        .rposition(|boundary| *boundary <= estimate)
        .unwrap_or(0);
    if let Some(next) = boundaries.get(index + 1) {
        let midpoint = (boundaries[index] + next) / 2.0;
        if estimate >= midpoint {
            index += 1;
        }
    }
    Some(index)
}

/// Constant-deceleration motion from `start` to `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingPlan {
    pub start: f32,
    pub target: f32,
    pub velocity: f32,
    pub acceleration: f32,
    pub duration_seconds: f32,
}

impl FlingPlan {
    /// Plans the motion to the boundary chosen by [`fling_target_index`].
    pub fn new(layout: &CardLayout, offset: f32, velocity: f32) -> Option<Self> {
        let index = fling_target_index(layout, offset, velocity)?;
        Some(Self::towards(offset, layout.card_scroll_offset(index), velocity))
    }

    pub fn towards(start: f32, target: f32, velocity: f32) -> Self {
        let distance = target - start;
        if distance == 0.0 {
            return Self {
                start,
                target,
                velocity: 0.0,
                acceleration: 0.0,
                duration_seconds: 0.0,
            };
        }
        let acceleration = -(velocity * velocity) / (2.0 * distance);
        let duration = 2.0 * distance / velocity;
        if duration.is_finite() && duration > 0.0 && duration <= SLOW_FLING_DURATION_SECONDS {
            return Self {
                start,
                target,
                velocity,
                acceleration,
                duration_seconds: duration,
            };
        }
        // too slow, stalled or heading away from the target
        let duration = SLOW_FLING_DURATION_SECONDS;
        let velocity = 2.0 * distance / duration;
        Self {
            start,
            target,
            velocity,
            acceleration: -velocity / duration,
            duration_seconds: duration,
        }
    }

    pub fn is_finished_at(&self, seconds: f32) -> bool {
        seconds >= self.duration_seconds
    }

    /// Offset after `seconds`; exactly `target` once the motion is over.
    pub fn offset_at(&self, seconds: f32) -> f32 {
        if self.is_finished_at(seconds) {
            return self.target;
        }
        self.start + self.velocity * seconds + self.acceleration * seconds * seconds / 2.0
    }
}

#[cfg(test)]
#[path = "tests/fling_tests.rs"]
mod tests;
