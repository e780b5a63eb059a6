use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use deck_animation::CurveSample;
use deck_core::{FrameCallbackRegistration, FrameClock};
use log::debug;

use crate::coordinates::TransitionCoordinateTracker;
use crate::layout_id::LayoutId;
use crate::registry::{TransitionAnimation, TransitionElements};
use crate::state::PageTransitionState;
use crate::transform::{element_transform, ElementSide, ElementTransform};

struct AnimatedElement {
    side: ElementSide,
    id: LayoutId,
    animation: TransitionAnimation,
    sample: CurveSample,
}

struct AnimatorInner {
    tracker: TransitionCoordinateTracker,
    state: PageTransitionState,
    elements: Vec<AnimatedElement>,
    start_time_nanos: Option<u64>,
    finished: bool,
    registration: Option<FrameCallbackRegistration>,
}

/// Runs one page transition.
///
/// Every declared element follows its own curve; the transition finishes when
/// the slowest one does. Transforms are computed from the live layout info of
/// both pages, so coordinates recorded mid-transition are picked up on the
/// next read.
#[derive(Clone)]
pub struct TransitionAnimator {
    inner: Rc<RefCell<AnimatorInner>>,
}

impl TransitionAnimator {
    pub fn new(
        tracker: TransitionCoordinateTracker,
        state: PageTransitionState,
        elements: TransitionElements,
    ) -> Self {
        let initial = CurveSample {
            fraction: 0.0,
            finished: false,
        };
        let current = elements.current.into_iter().map(|(id, animation)| AnimatedElement {
            side: ElementSide::CurrentPage,
            id,
            animation,
            sample: initial,
        });
        let target = elements.target.into_iter().map(|(id, animation)| AnimatedElement {
            side: ElementSide::TargetPage,
            id,
            animation,
            sample: initial,
        });
        Self {
            inner: Rc::new(RefCell::new(AnimatorInner {
                tracker,
                state,
                elements: current.chain(target).collect(),
                start_time_nanos: None,
                finished: false,
                registration: None,
            })),
        }
    }

    /// Fixes the start time; later calls are ignored.
    pub fn start(&self, now_nanos: u64) {
        self.advance(now_nanos);
    }

    /// Samples every element at `now_nanos`. Returns whether the transition
    /// is still running.
    pub fn advance(&self, now_nanos: u64) -> bool {
        let done = {
            let mut inner = self.inner.borrow_mut();
            if inner.finished {
                return false;
            }
            let start = *inner.start_time_nanos.get_or_insert(now_nanos);
            let elapsed = now_nanos.saturating_sub(start);
            let mut done = true;
            for element in &mut inner.elements {
                element.sample = element.animation.curve().sample(elapsed);
                done &= element.sample.finished;
            }
            done
        };
        if done {
            self.finish();
        }
        !done
    }

    /// Transform to draw element `id` of `side` with right now.
    ///
    /// Elements not part of this transition are untouched.
    pub fn transform_of(&self, side: ElementSide, id: LayoutId) -> ElementTransform {
        let inner = self.inner.borrow();
        let Some(element) = inner
            .elements
            .iter()
            .find(|element| element.side == side && element.id == id)
        else {
            return ElementTransform::IDENTITY;
        };
        let current = inner.state.current().coordinates_of(id);
        let target = inner.state.target().coordinates_of(id);
        let transform = element_transform(side, current, target, element.sample.fraction);
        element.animation.apply(transform)
    }

    /// Curve progress of element `id`, if it takes part.
    pub fn progress_of(&self, side: ElementSide, id: LayoutId) -> Option<f32> {
        self.inner
            .borrow()
            .elements
            .iter()
            .find(|element| element.side == side && element.id == id)
            .map(|element| element.sample.fraction)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.borrow().finished
    }

    pub fn state(&self) -> PageTransitionState {
        self.inner.borrow().state.clone()
    }

    /// Advances on every frame of `clock` until finished.
    pub fn drive(&self, clock: &FrameClock) {
        {
            let inner = self.inner.borrow();
            if inner.finished || inner.registration.is_some() {
                return;
            }
        }
        let weak = Rc::downgrade(&self.inner);
        let registration = clock.with_frame_nanos({
            let clock = clock.clone();
            move |frame_time_nanos| {
                if let Some(inner) = weak.upgrade() {
                    let animator = TransitionAnimator { inner };
                    animator.inner.borrow_mut().registration = None;
                    if animator.advance(frame_time_nanos) {
                        animator.drive(&clock);
                    }
                }
            }
        });
        if !registration.is_active() {
            // no runtime left to drive frames
            self.finish();
            return;
        }
        self.inner.borrow_mut().registration = Some(registration);
    }

    /// Jumps to the end of the transition.
    pub fn cancel(&self) {
        self.finish();
    }

    fn finish(&self) {
        let (tracker, current, target, registration) = {
            let mut inner = self.inner.borrow_mut();
            if inner.finished {
                return;
            }
            inner.finished = true;
            for element in &mut inner.elements {
                element.sample = CurveSample {
                    fraction: 1.0,
                    finished: true,
                };
            }
            (
                inner.tracker.clone(),
                inner.state.current().key,
                inner.state.target().key,
                inner.registration.take(),
            )
        };
        drop(registration);
        if current != target {
            // the target page stays tracked for its next transition
            tracker.retain(|page| page.stack != target.stack || *page == target);
        }
        debug!(
            "page transition in stack {} finished at page {}",
            target.stack, target.page
        );
    }
}

impl fmt::Debug for TransitionAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TransitionAnimator")
            .field("state", &inner.state)
            .field("elements", &inner.elements.len())
            .field("finished", &inner.finished)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/animator_tests.rs"]
mod tests;
