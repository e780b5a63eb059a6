//! Shared-element transitions between the pages of a stack.
//!
//! Layout passes record where each tagged element of a page sits
//! ([`PageLayoutInfo`]). When a page is pushed or popped, the elements
//! declared for that pair of page types in the [`PageTransitionRegistry`] are
//! animated from where they are on the current page to where their
//! counterpart sits on the target page.

mod animator;
mod coordinates;
mod layout_id;
mod registry;
mod state;
mod transform;

pub use animator::TransitionAnimator;
pub use coordinates::{ElementCoordinates, PageKey, PageLayoutInfo, TransitionCoordinateTracker};
pub use layout_id::LayoutId;
pub use registry::{
    ElementSetBuilder, PageTransitionRegistry, TransitionAnimation, TransitionBuilder,
    TransitionDirection, TransitionElements, TransitionSpec,
};
pub use state::{PageState, PageTransitionState};
pub use transform::{element_transform, ElementSide, ElementTransform};
