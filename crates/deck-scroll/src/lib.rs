//! Horizontal card scrolling.
//!
//! Offsets are in scroll space: 0 shows the first card and positive values
//! move towards later cards. A [`ScrollEngine`] owns the offset, lets one
//! mutator (drag, fling or programmatic animation) move it at a time and
//! always settles flings exactly on a card boundary.

mod engine;
mod fling;
mod gate;
mod layout;

pub use engine::{DragSession, ScrollEngine};
pub use fling::{
    fling_target_index, FlingPlan, FLING_ESTIMATE_DECELERATION, SLOW_FLING_DURATION_SECONDS,
};
pub use gate::{JobState, MutatePriority, ScrollJob};
pub use layout::{CardAlignment, CardLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScrollError {
    /// A higher priority mutator holds the scroll position.
    #[error("scrolling is held by a higher priority mutator")]
    Busy,
    #[error("there are no cards to scroll to")]
    NoCards,
    #[error("card {index} out of range for {card_count} cards")]
    IndexOutOfRange { index: usize, card_count: usize },
}
