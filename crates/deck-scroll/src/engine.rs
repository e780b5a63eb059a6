use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use deck_animation::{AnimationType, Lerp};
use deck_core::{FrameCallbackRegistration, ReactiveCell, ReadOnlyCell, RuntimeHandle, NANOS_PER_SECOND};
use log::{debug, error};

use crate::fling::FlingPlan;
use crate::gate::{JobState, MutatePriority, ScrollJob};
use crate::layout::{CardAlignment, CardLayout};
use crate::ScrollError;

/// Frame-driven motion of a job.
#[derive(Debug, Clone, Copy)]
enum Motion {
    Fling(FlingPlan),
    Animation {
        start: f32,
        target: f32,
        curve: AnimationType,
    },
}

impl Motion {
    fn target(&self) -> f32 {
        match self {
            Motion::Fling(plan) => plan.target,
            Motion::Animation { target, .. } => *target,
        }
    }

    /// `(offset, finished)` after `elapsed_nanos`.
    fn sample(&self, elapsed_nanos: u64) -> (f32, bool) {
        match self {
            Motion::Fling(plan) => {
                let seconds = elapsed_nanos as f32 / NANOS_PER_SECOND as f32;
                (plan.offset_at(seconds), plan.is_finished_at(seconds))
            }
            Motion::Animation {
                start,
                target,
                curve,
            } => {
                let sample = curve.sample(elapsed_nanos);
                if sample.finished {
                    (*target, true)
                } else {
                    (start.lerp(target, sample.fraction), false)
                }
            }
        }
    }
}

/// The mutator currently allowed to move the offset.
struct Holder {
    job: ScrollJob,
    motion: Option<Motion>,
    start_time: Option<u64>,
    registration: Option<FrameCallbackRegistration>,
}

struct EngineState {
    layout: CardLayout,
    holder: Option<Holder>,
    next_job_id: u64,
}

struct Shared {
    runtime: RuntimeHandle,
    offset: ReactiveCell<f32>,
    in_progress: ReactiveCell<bool>,
    state: RefCell<EngineState>,
}

/// Owner of the horizontal scroll offset.
///
/// Cells are written only while no internal borrow is held, so observers of
/// [`offset`](Self::offset) and [`scroll_in_progress`](Self::scroll_in_progress)
/// may query the engine. They must not start new scrolls from inside the
/// notification.
#[derive(Clone)]
pub struct ScrollEngine {
    shared: Rc<Shared>,
}

impl ScrollEngine {
    pub fn new(runtime: RuntimeHandle, layout: CardLayout) -> Self {
        Self {
            shared: Rc::new(Shared {
                runtime,
                offset: ReactiveCell::new(0.0),
                in_progress: ReactiveCell::new(false),
                state: RefCell::new(EngineState {
                    layout,
                    holder: None,
                    next_job_id: 1,
                }),
            }),
        }
    }

    pub fn layout(&self) -> CardLayout {
        self.shared.state.borrow().layout
    }

    /// Replaces the layout and clamps the offset into the new range.
    pub fn set_layout(&self, layout: CardLayout) {
        self.shared.state.borrow_mut().layout = layout;
        let clamped = layout.clamp(self.scroll_offset());
        self.publish_offset(clamped);
    }

    pub fn scroll_offset(&self) -> f32 {
        self.shared.offset.get()
    }

    pub fn max_scroll_offset(&self) -> f32 {
        self.layout().max_scroll_offset()
    }

    pub fn is_scroll_in_progress(&self) -> bool {
        self.shared.in_progress.get()
    }

    pub fn offset(&self) -> ReadOnlyCell<f32> {
        self.shared.offset.as_read_only()
    }

    pub fn scroll_in_progress(&self) -> ReadOnlyCell<bool> {
        self.shared.in_progress.as_read_only()
    }

    /// Moves the offset by `delta`, clamped to the scroll range, and returns
    /// the distance actually moved.
    pub fn dispatch_raw_delta(&self, delta: f32) -> f32 {
        let current = self.scroll_offset();
        let next = self.layout().clamp(current + delta);
        self.publish_offset(next);
        next - current
    }

    /// Jumps to `offset` without animating.
    pub fn scroll_to(&self, offset: f32) -> Result<(), ScrollError> {
        let job = self.acquire(MutatePriority::Default, None)?;
        let target = self.layout().clamp(offset);
        self.publish_offset(target);
        self.release(job.id(), JobState::Completed);
        Ok(())
    }

    /// Takes the scroll position for a finger drag.
    pub fn begin_drag(&self) -> Result<DragSession, ScrollError> {
        let job = self.acquire(MutatePriority::UserInput, None)?;
        Ok(DragSession {
            engine: self.clone(),
            job,
        })
    }

    /// Flings with `velocity` in scroll space (px/s) and settles on a card
    /// boundary.
    pub fn fling(&self, velocity: f32) -> Result<ScrollJob, ScrollError> {
        self.fling_after(velocity, None)
    }

    fn fling_after(&self, velocity: f32, succeeding: Option<u64>) -> Result<ScrollJob, ScrollError> {
        let layout = self.layout();
        let offset = self.scroll_offset();
        let Some(plan) = FlingPlan::new(&layout, offset, velocity) else {
            return Err(ScrollError::NoCards);
        };
        let job = self.acquire(MutatePriority::Default, succeeding)?;
        debug!(
            "fling at {velocity} px/s from {offset} settles on {} in {}s",
            plan.target, plan.duration_seconds
        );
        self.start_motion(&job, Motion::Fling(plan));
        Ok(job)
    }

    /// Animates until card `index` sits at `alignment` in the viewport.
    pub fn animate_scroll_to(
        &self,
        index: usize,
        alignment: CardAlignment,
        curve: AnimationType,
    ) -> Result<ScrollJob, ScrollError> {
        let layout = self.layout();
        if layout.card_count() == 0 {
            return Err(ScrollError::NoCards);
        }
        if index >= layout.card_count() {
            return Err(ScrollError::IndexOutOfRange {
                index,
                card_count: layout.card_count(),
            });
        }
        let job = self.acquire(MutatePriority::Default, None)?;
        let start = self.scroll_offset();
        let target = layout.aligned_offset(index, alignment);
        debug!("animating scroll from {start} to card {index} at {target}");
        self.start_motion(
            &job,
            Motion::Animation {
                start,
                target,
                curve,
            },
        );
        Ok(job)
    }

    /// Cancels whichever mutator holds the offset; the offset stays where it is.
    pub fn stop(&self) {
        let holder = self.shared.state.borrow_mut().holder.take();
        if let Some(holder) = holder {
            holder.job.finish(JobState::Cancelled);
            drop(holder);
            self.publish_in_progress(false);
        }
    }

    /// Installs a new holder at `priority`.
    ///
    /// The current holder is preempted when `priority` is at least its own;
    /// the job named by `succeeding` is always replaced, counting as completed.
    fn acquire(&self, priority: MutatePriority, succeeding: Option<u64>) -> Result<ScrollJob, ScrollError> {
        let (job, previous) = {
            let mut state = self.shared.state.borrow_mut();
            if let Some(holder) = &state.holder {
                let handoff = succeeding == Some(holder.job.id());
                if !handoff && priority < holder.job.priority() {
                    return Err(ScrollError::Busy);
                }
            }
            let id = state.next_job_id;
            state.next_job_id += 1;
            let job = ScrollJob::new(id, priority);
            let previous = state.holder.replace(Holder {
                job: job.clone(),
                motion: None,
                start_time: None,
                registration: None,
            });
            (job, previous)
        };
        match previous {
            Some(previous) => {
                if succeeding == Some(previous.job.id()) {
                    previous.job.finish(JobState::Completed);
                } else {
                    debug!("scroll job {} preempted by {:?}", previous.job.id(), priority);
                    previous.job.finish(JobState::Cancelled);
                }
            }
            None => self.publish_in_progress(true),
        }
        Ok(job)
    }

    fn release(&self, job_id: u64, outcome: JobState) {
        let released = {
            let mut state = self.shared.state.borrow_mut();
            match &state.holder {
                Some(holder) if holder.job.id() == job_id => state.holder.take(),
                _ => None,
            }
        };
        if let Some(holder) = released {
            holder.job.finish(outcome);
            drop(holder);
            self.publish_in_progress(false);
        }
    }

    fn start_motion(&self, job: &ScrollJob, motion: Motion) {
        if let Some(holder) = self.shared.state.borrow_mut().holder.as_mut() {
            if holder.job.id() == job.id() {
                holder.motion = Some(motion);
            }
        }
        Self::schedule_frame(&self.shared, job.id());
    }

    fn schedule_frame(shared: &Rc<Shared>, job_id: u64) {
        let weak = Rc::downgrade(shared);
        let registration = shared.runtime.frame_clock().with_frame_nanos(move |time| {
            if let Some(strong) = weak.upgrade() {
                Self::on_frame(&strong, job_id, time);
            }
        });
        if !registration.is_active() {
            // no runtime to drive frames: finish at the target
            let target = {
                let state = shared.state.borrow();
                state
                    .holder
                    .as_ref()
                    .filter(|holder| holder.job.id() == job_id)
                    .and_then(|holder| holder.motion)
                    .map(|motion| motion.target())
            };
            let engine = ScrollEngine {
                shared: Rc::clone(shared),
            };
            if let Some(target) = target {
                engine.publish_offset(engine.layout().clamp(target));
            }
            engine.release(job_id, JobState::Completed);
            return;
        }
        let stale = {
            let mut state = shared.state.borrow_mut();
            match state.holder.as_mut() {
                Some(holder) if holder.job.id() == job_id => {
                    holder.registration = Some(registration);
                    None
                }
                _ => Some(registration),
            }
        };
        drop(stale);
    }

    fn on_frame(shared: &Rc<Shared>, job_id: u64, frame_time_nanos: u64) {
        let step = {
            let mut state = shared.state.borrow_mut();
            let layout = state.layout;
            match state.holder.as_mut() {
                Some(holder) if holder.job.id() == job_id && holder.job.is_running() => {
                    holder.registration = None;
                    let start = *holder.start_time.get_or_insert(frame_time_nanos);
                    holder
                        .motion
                        .map(|motion| motion.sample(frame_time_nanos.saturating_sub(start)))
                        .map(|(offset, finished)| (layout.clamp(offset), finished))
                }
                // preempted: stop where we are
                _ => None,
            }
        };
        let Some((offset, finished)) = step else {
            return;
        };
        let engine = ScrollEngine {
            shared: Rc::clone(shared),
        };
        engine.publish_offset(offset);
        if finished {
            debug!("scroll job {job_id} settled at {offset}");
            engine.release(job_id, JobState::Completed);
        } else {
            Self::schedule_frame(shared, job_id);
        }
    }

    fn publish_offset(&self, offset: f32) {
        if self.shared.offset.get() != offset {
            publish(&self.shared.offset, offset);
        }
    }

    fn publish_in_progress(&self, in_progress: bool) {
        if self.shared.in_progress.get() != in_progress {
            publish(&self.shared.in_progress, in_progress);
        }
    }
}

fn publish<T: 'static>(cell: &ReactiveCell<T>, value: T) {
    if let Err(err) = cell.set(value) {
        error!("failed to publish scroll state: {err}");
    }
}

impl fmt::Debug for ScrollEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("ScrollEngine")
            .field("offset", &self.shared.offset.get())
            .field("in_progress", &self.shared.in_progress.get())
            .field("layout", &state.layout)
            .field("holder", &state.holder.as_ref().map(|holder| holder.job.priority()))
            .finish()
    }
}

/// A finger drag holding the scroll position at [`MutatePriority::UserInput`].
///
/// Dropping the session ends the drag without a fling.
pub struct DragSession {
    engine: ScrollEngine,
    job: ScrollJob,
}

impl DragSession {
    /// False once another drag took over.
    pub fn is_active(&self) -> bool {
        self.job.is_running()
    }

    /// Moves content with the finger: a finger moving right (positive) scrolls
    /// towards earlier cards. Returns the applied scroll-space delta.
    pub fn drag_by(&self, finger_dx: f32) -> f32 {
        if !self.is_active() {
            return 0.0;
        }
        self.engine.dispatch_raw_delta(-finger_dx)
    }

    /// Ends the drag and flings with the finger's release velocity.
    ///
    /// The scroll stays in progress across the hand-off.
    pub fn release(self, finger_velocity: f32) -> Result<ScrollJob, ScrollError> {
        if !self.is_active() {
            return Err(ScrollError::Busy);
        }
        self.engine
            .fling_after(-finger_velocity, Some(self.job.id()))
    }
}

impl Drop for DragSession {
    fn drop(&mut self) {
        self.engine.release(self.job.id(), JobState::Completed);
    }
}

impl fmt::Debug for DragSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragSession")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
