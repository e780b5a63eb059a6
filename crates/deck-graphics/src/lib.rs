//! Pure math/data for deck layout and transitions.
//!
//! Geometry primitives shared by the scroll engine, the transition tracker
//! and the host renderer.

mod geometry;

pub use geometry::*;

pub mod prelude {
    pub use crate::geometry::{Offset, Point, ScaleFactor, Size};
}
