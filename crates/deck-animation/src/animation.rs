//! Tween and spring specifications.

use deck_graphics::{Offset, Point, ScaleFactor, Size};
use serde::{Deserialize, Serialize};

use crate::spring::SpringResponse;

/// Trait for types that can be linearly interpolated.
pub trait Lerp {
    fn lerp(&self, target: &Self, fraction: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        self + (target - self) * fraction
    }
}

impl Lerp for f64 {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        self + (target - self) * fraction as f64
    }
}

impl Lerp for Point {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        Point::new(self.x.lerp(&target.x, fraction), self.y.lerp(&target.y, fraction))
    }
}

impl Lerp for Size {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        Size::new(
            self.width.lerp(&target.width, fraction),
            self.height.lerp(&target.height, fraction),
        )
    }
}

impl Lerp for Offset {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        Offset::new(self.dx.lerp(&target.dx, fraction), self.dy.lerp(&target.dy, fraction))
    }
}

impl Lerp for ScaleFactor {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        ScaleFactor::new(self.x.lerp(&target.x, fraction), self.y.lerp(&target.y, fraction))
    }
}

/// Easing functions, named after their Material counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Material standard curve.
    FastOutSlowIn,
    LinearOutSlowIn,
    FastOutLinearIn,
}

impl Easing {
    /// Apply the easing function to a linear fraction [0, 1].
    pub fn transform(&self, fraction: f32) -> f32 {
        let fraction = fraction.clamp(0.0, 1.0);
        match self {
            Easing::Linear => fraction,
            Easing::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, fraction),
            Easing::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, fraction),
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, fraction),
            Easing::FastOutSlowIn => cubic_bezier(0.4, 0.0, 0.2, 1.0, fraction),
            Easing::LinearOutSlowIn => cubic_bezier(0.0, 0.0, 0.2, 1.0, fraction),
            Easing::FastOutLinearIn => cubic_bezier(0.4, 0.0, 1.0, 1.0, fraction),
        }
    }
}

fn bezier_component(p1: f32, p2: f32, t: f32) -> f32 {
    // B(t) with P0 = 0 and P3 = 1
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

fn bezier_slope(p1: f32, p2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

/// Evaluates the curve's y for the given x by solving for the bezier parameter.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let mut t = x;
    for _ in 0..8 {
        let error = bezier_component(x1, x2, t) - x;
        if error.abs() < 1e-5 {
            return bezier_component(y1, y2, t);
        }
        let slope = bezier_slope(x1, x2, t);
        if slope.abs() < 1e-6 {
            break;
        }
        t -= error / slope;
    }
    // Newton stalled on a flat segment: bisect
    let (mut low, mut high) = (0.0f32, 1.0f32);
    t = x;
    for _ in 0..32 {
        let value = bezier_component(x1, x2, t);
        if (value - x).abs() < 1e-5 {
            break;
        }
        if value < x {
            low = t;
        } else {
            high = t;
        }
        t = (low + high) / 2.0;
    }
    bezier_component(y1, y2, t)
}

/// Tween: duration and easing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub duration_millis: u64,
    pub easing: Easing,
    /// Delay before the animation starts moving.
    #[serde(default)]
    pub delay_millis: u64,
}

impl AnimationSpec {
    pub fn tween(duration_millis: u64, easing: Easing) -> Self {
        Self {
            duration_millis,
            easing,
            delay_millis: 0,
        }
    }

    pub fn linear(duration_millis: u64) -> Self {
        Self::tween(duration_millis, Easing::Linear)
    }

    pub fn with_delay(mut self, delay_millis: u64) -> Self {
        self.delay_millis = delay_millis;
        self
    }

    fn sample(&self, elapsed_nanos: u64) -> CurveSample {
        let delay_nanos = self.delay_millis * 1_000_000;
        if elapsed_nanos < delay_nanos {
            return CurveSample::running(0.0);
        }
        let duration_nanos = (self.duration_millis * 1_000_000).max(1);
        let linear = ((elapsed_nanos - delay_nanos) as f64 / duration_nanos as f64).min(1.0) as f32;
        if linear >= 1.0 {
            CurveSample::finished()
        } else {
            CurveSample::running(self.easing.transform(linear))
        }
    }
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self::tween(300, Easing::FastOutSlowIn)
    }
}

/// Spring animation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringSpec {
    /// 1.0 = critically damped, < 1.0 = bouncy, > 1.0 = over-damped.
    pub damping_ratio: f32,
    /// Higher values settle faster.
    pub stiffness: f32,
    /// Velocity (fraction per second) below which the spring may rest.
    pub velocity_threshold: f32,
    /// Distance from the target (fraction) below which the spring may rest.
    pub position_threshold: f32,
}

impl SpringSpec {
    pub fn default_spring() -> Self {
        Self {
            damping_ratio: 1.0,
            stiffness: 1500.0,
            velocity_threshold: 0.01,
            position_threshold: 0.001,
        }
    }

    pub fn bouncy() -> Self {
        Self {
            damping_ratio: 0.5,
            ..Self::default_spring()
        }
    }

    pub fn stiff() -> Self {
        Self {
            stiffness: 3000.0,
            ..Self::default_spring()
        }
    }

    fn sample(&self, elapsed_nanos: u64) -> CurveSample {
        let seconds = elapsed_nanos as f64 / 1_000_000_000.0;
        let (displacement, velocity) = SpringResponse::new(self).at(seconds);
        let at_rest = velocity.abs() < self.velocity_threshold as f64
            && displacement.abs() < self.position_threshold as f64;
        if at_rest {
            CurveSample::finished()
        } else {
            CurveSample::running((1.0 + displacement) as f32)
        }
    }
}

impl Default for SpringSpec {
    fn default() -> Self {
        Self::default_spring()
    }
}

/// Animation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimationType {
    Tween(AnimationSpec),
    Spring(SpringSpec),
}

impl AnimationType {
    /// Fraction of the way from start (0) to target (1) after `elapsed_nanos`.
    ///
    /// Springs may overshoot past 1. A finished sample is exactly 1.
    pub fn sample(&self, elapsed_nanos: u64) -> CurveSample {
        match self {
            AnimationType::Tween(spec) => spec.sample(elapsed_nanos),
            AnimationType::Spring(spec) => spec.sample(elapsed_nanos),
        }
    }
}

impl Default for AnimationType {
    /// Critically damped spring.
    fn default() -> Self {
        AnimationType::Spring(SpringSpec::default())
    }
}

impl From<AnimationSpec> for AnimationType {
    fn from(spec: AnimationSpec) -> Self {
        AnimationType::Tween(spec)
    }
}

impl From<SpringSpec> for AnimationType {
    fn from(spec: SpringSpec) -> Self {
        AnimationType::Spring(spec)
    }
}

/// One sample of an animation curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub fraction: f32,
    pub finished: bool,
}

impl CurveSample {
    fn running(fraction: f32) -> Self {
        Self {
            fraction,
            finished: false,
        }
    }

    fn finished() -> Self {
        Self {
            fraction: 1.0,
            finished: true,
        }
    }
}

#[cfg(test)]
#[path = "tests/animation_tests.rs"]
mod tests;
