use crate::coordinates::{ElementCoordinates, PageKey, PageLayoutInfo, TransitionCoordinateTracker};
use crate::layout_id::LayoutId;

/// A page taking part in a transition.
#[derive(Debug, Clone)]
pub struct PageState {
    pub key: PageKey,
    /// Type tag of the page, used to look transitions up.
    pub tag: &'static str,
    pub layout: PageLayoutInfo,
}

impl PageState {
    /// State of `key` whose layout info is shared with `tracker`.
    pub fn tracked(tracker: &TransitionCoordinateTracker, key: PageKey, tag: &'static str) -> Self {
        Self {
            key,
            tag,
            layout: tracker.layout_info(key),
        }
    }

    pub fn coordinates_of(&self, id: LayoutId) -> Option<ElementCoordinates> {
        self.layout.get(id)
    }
}

/// Page shown when a transition started and the page it moves to.
#[derive(Debug, Clone)]
pub struct PageTransitionState {
    current: PageState,
    target: PageState,
}

impl PageTransitionState {
    pub fn new(current: PageState, target: PageState) -> Self {
        Self { current, target }
    }

    /// No transition: `page` is both current and target.
    pub fn idle(page: PageState) -> Self {
        Self {
            current: page.clone(),
            target: page,
        }
    }

    pub fn current(&self) -> &PageState {
        &self.current
    }

    pub fn target(&self) -> &PageState {
        &self.target
    }

    pub fn is_idle(&self) -> bool {
        self.current.key == self.target.key
    }

    /// Idle state at the target page.
    pub fn settled(&self) -> Self {
        Self::idle(self.target.clone())
    }
}
