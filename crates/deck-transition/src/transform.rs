use deck_animation::Lerp;
use deck_graphics::{Offset, ScaleFactor};

use crate::coordinates::ElementCoordinates;

/// Which page of a transition an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementSide {
    /// The page shown when the transition started.
    CurrentPage,
    /// The page being navigated to.
    TargetPage,
}

/// Scale and translation applied to an element while a transition runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementTransform {
    pub scale: ScaleFactor,
    pub offset: Offset,
}

impl ElementTransform {
    pub const IDENTITY: ElementTransform = ElementTransform {
        scale: ScaleFactor::IDENTITY,
        offset: Offset::ZERO,
    };

    pub fn is_identity(&self) -> bool {
        self.scale.is_identity() && self.offset == Offset::ZERO
    }
}

impl Default for ElementTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Transform of an element at `progress` (0 = start, 1 = end).
///
/// A current-page element starts untouched and ends covering its target
/// counterpart. A target-page element starts covering its current counterpart
/// and ends untouched. Without both coordinates, or with an empty size on
/// either side, the element is left untouched.
pub fn element_transform(
    side: ElementSide,
    current: Option<ElementCoordinates>,
    target: Option<ElementCoordinates>,
    progress: f32,
) -> ElementTransform {
    let (Some(current), Some(target)) = (current, target) else {
        return ElementTransform::IDENTITY;
    };
    if current.size.is_degenerate() || target.size.is_degenerate() {
        return ElementTransform::IDENTITY;
    }
    let (from, to) = match side {
        ElementSide::CurrentPage => (current, target),
        ElementSide::TargetPage => (target, current),
    };
    // `to` relative to `from`
    let (Some(covering_scale), covering_offset) = (
        to.size.ratio_to(from.size),
        to.position_in_root - from.position_in_root,
    ) else {
        return ElementTransform::IDENTITY;
    };
    if !covering_scale.is_finite() || !covering_offset.is_finite() || !progress.is_finite() {
        return ElementTransform::IDENTITY;
    }
    let covering = ElementTransform {
        scale: covering_scale,
        offset: covering_offset,
    };
    let (start, end) = match side {
        ElementSide::CurrentPage => (ElementTransform::IDENTITY, covering),
        ElementSide::TargetPage => (covering, ElementTransform::IDENTITY),
    };
    // endpoints are exact so settled elements are untouched
    if progress == 0.0 {
        return start;
    }
    if progress == 1.0 {
        return end;
    }
    ElementTransform {
        scale: start.scale.lerp(&end.scale, progress),
        offset: start.offset.lerp(&end.offset, progress),
    }
}

#[cfg(test)]
#[path = "tests/transform_tests.rs"]
mod tests;
