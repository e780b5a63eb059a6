use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use deck_core::collections::map::HashMap;
use deck_graphics::{Point, Size};
use deck_model::{PageId, StackId};

use crate::layout_id::LayoutId;

/// Where an element was last laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementCoordinates {
    pub size: Size,
    pub position_in_root: Point,
}

impl ElementCoordinates {
    pub fn new(size: Size, position_in_root: Point) -> Self {
        Self {
            size,
            position_in_root,
        }
    }
}

/// A page within a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    pub stack: StackId,
    pub page: PageId,
}

impl PageKey {
    pub fn new(stack: StackId, page: PageId) -> Self {
        Self { stack, page }
    }
}

/// Coordinates of the transition elements of one page.
///
/// Clones share the same map, so coordinates recorded by later layout passes
/// are seen by a transition that is already running. Each record replaces
/// the previous coordinates of that element.
#[derive(Clone, Default)]
pub struct PageLayoutInfo {
    elements: Rc<RefCell<HashMap<LayoutId, ElementCoordinates>>>,
}

impl PageLayoutInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: LayoutId, coordinates: ElementCoordinates) {
        self.elements.borrow_mut().insert(id, coordinates);
    }

    pub fn get(&self, id: LayoutId) -> Option<ElementCoordinates> {
        self.elements.borrow().get(&id).copied()
    }

    pub fn remove(&self, id: LayoutId) -> Option<ElementCoordinates> {
        self.elements.borrow_mut().remove(&id)
    }

    pub fn clear(&self) {
        self.elements.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.elements, &other.elements)
    }
}

impl fmt::Debug for PageLayoutInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.elements.borrow().iter()).finish()
    }
}

/// Layout info of every page that takes part in a transition.
#[derive(Clone, Default)]
pub struct TransitionCoordinateTracker {
    pages: Rc<RefCell<HashMap<PageKey, PageLayoutInfo>>>,
}

impl TransitionCoordinateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout info of `page`, created empty on first use.
    pub fn layout_info(&self, page: PageKey) -> PageLayoutInfo {
        self.pages.borrow_mut().entry(page).or_default().clone()
    }

    pub fn record(&self, page: PageKey, id: LayoutId, coordinates: ElementCoordinates) {
        self.layout_info(page).record(id, coordinates);
    }

    pub fn discard(&self, page: PageKey) {
        self.pages.borrow_mut().remove(&page);
    }

    /// Keeps only the pages for which `keep` returns true.
    pub fn retain(&self, mut keep: impl FnMut(&PageKey) -> bool) {
        self.pages.borrow_mut().retain(|page, _| keep(page));
    }

    pub fn is_tracking(&self, page: PageKey) -> bool {
        self.pages.borrow().contains_key(&page)
    }

    pub fn tracked_pages(&self) -> Vec<PageKey> {
        let mut pages: Vec<_> = self.pages.borrow().keys().copied().collect();
        pages.sort_unstable();
        pages
    }
}

impl fmt::Debug for TransitionCoordinateTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionCoordinateTracker")
            .field("pages", &self.tracked_pages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(page: u64) -> PageKey {
        PageKey::new(StackId::new(0), PageId::new(page))
    }

    fn coords(x: f32) -> ElementCoordinates {
        ElementCoordinates::new(Size::new(10.0, 10.0), Point::new(x, 0.0))
    }

    #[test]
    fn layout_info_is_shared_and_overwritten() {
        let tracker = TransitionCoordinateTracker::new();
        let held = tracker.layout_info(key(1));
        let id = LayoutId::named("title");
        tracker.record(key(1), id, coords(1.0));
        tracker.record(key(1), id, coords(2.0));
        assert_eq!(held.get(id), Some(coords(2.0)));
        assert_eq!(held.len(), 1);
        assert!(held.ptr_eq(&tracker.layout_info(key(1))));
    }

    #[test]
    fn discard_and_retain_drop_pages() {
        let tracker = TransitionCoordinateTracker::new();
        for page in 0..4 {
            tracker.layout_info(key(page));
        }
        tracker.discard(key(0));
        tracker.retain(|page| page.page.get() % 2 == 1);
        assert_eq!(tracker.tracked_pages(), vec![key(1), key(3)]);
    }
}
