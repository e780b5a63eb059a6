//! Animation curves for the page deck
//!
//! Time-based tweens with easing curves and analytic spring physics. Curves are
//! sampled with the elapsed time since an animation started; callers drive
//! them from frame callbacks.

pub mod animation;
pub mod spring;

pub use animation::*;
pub use spring::SpringResponse;

pub mod prelude {
    pub use crate::animation::{AnimationSpec, AnimationType, CurveSample, Easing, Lerp, SpringSpec};
}
