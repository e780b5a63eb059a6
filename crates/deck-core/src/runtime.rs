use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures_task::{waker, ArcWake};

use crate::collections::map::HashMap;
use crate::frame_clock::FrameClock;
use crate::platform::RuntimeScheduler;

pub(crate) type FrameCallbackId = u64;

/// Identifies a future launched on the runtime.
pub type TaskId = u64;

type LocalFuture = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Waker for a launched future. Waking may happen on any thread: the id is
/// queued and a frame is requested so the UI thread polls the task again.
struct TaskWaker {
    id: TaskId,
    woken: Arc<Mutex<Vec<TaskId>>>,
    scheduler: Arc<dyn RuntimeScheduler>,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.lock().unwrap().push(arc_self.id);
        arc_self.scheduler.schedule_frame();
    }
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_frame: Cell<bool>,
    frame_callbacks: RefCell<VecDeque<FrameCallbackEntry>>,
    next_frame_callback_id: Cell<u64>,
    local_tasks: RefCell<HashMap<TaskId, LocalFuture>>,
    next_task_id: Cell<TaskId>,
    woken_tasks: Arc<Mutex<Vec<TaskId>>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            needs_frame: Cell::new(false),
            frame_callbacks: RefCell::new(VecDeque::new()),
            next_frame_callback_id: Cell::new(1),
            local_tasks: RefCell::new(HashMap::new()),
            next_task_id: Cell::new(1),
            woken_tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn has_frame_callbacks(&self) -> bool {
        !self.frame_callbacks.borrow().is_empty()
    }

    fn has_woken_tasks(&self) -> bool {
        !self.woken_tasks.lock().unwrap().is_empty()
    }

    fn settle_needs_frame(&self) {
        if !self.has_woken_tasks() && !self.has_frame_callbacks() {
            self.needs_frame.set(false);
        }
    }

    fn launch(&self, future: LocalFuture) -> TaskId {
        let id = self.next_task_id.get();
        self.next_task_id.set(id + 1);
        self.local_tasks.borrow_mut().insert(id, future);
        self.woken_tasks.lock().unwrap().push(id);
        self.schedule();
        id
    }

    fn cancel_task(&self, id: TaskId) -> bool {
        self.local_tasks.borrow_mut().remove(&id).is_some()
    }

    fn drain_tasks(&self) {
        self.poll_woken_tasks();
        self.settle_needs_frame();
    }

    /// Polls every task woken before this call. Tasks woken while polling wait
    /// for the next drain so a self-waking future cannot spin the UI thread.
    fn poll_woken_tasks(&self) {
        let mut woken: Vec<TaskId> = std::mem::take(&mut *self.woken_tasks.lock().unwrap());
        woken.sort_unstable();
        woken.dedup();
        for id in woken {
            // removed while polling so the future may launch or cancel tasks
            let future = self.local_tasks.borrow_mut().remove(&id);
            let Some(mut future) = future else {
                continue;
            };
            let task_waker = waker(Arc::new(TaskWaker {
                id,
                woken: Arc::clone(&self.woken_tasks),
                scheduler: Arc::clone(&self.scheduler),
            }));
            let mut cx = Context::from_waker(&task_waker);
            if let Poll::Pending = future.as_mut().poll(&mut cx) {
                self.local_tasks.borrow_mut().insert(id, future);
            }
        }
    }

    fn has_live_tasks(&self) -> bool {
        !self.local_tasks.borrow().is_empty()
    }

    fn register_frame_callback(&self, callback: Box<dyn FnOnce(u64) + 'static>) -> FrameCallbackId {
        let id = self.next_frame_callback_id.get();
        self.next_frame_callback_id.set(id + 1);
        self.frame_callbacks.borrow_mut().push_back(FrameCallbackEntry {
            id,
            callback: Some(callback),
        });
        self.schedule();
        id
    }

    fn cancel_frame_callback(&self, id: FrameCallbackId) {
        let mut callbacks = self.frame_callbacks.borrow_mut();
        if let Some(index) = callbacks.iter().position(|entry| entry.id == id) {
            callbacks.remove(index);
        }
        drop(callbacks);
        self.settle_needs_frame();
    }

    fn drain_frame_callbacks(&self, frame_time_nanos: u64) {
        let mut callbacks = self.frame_callbacks.borrow_mut();
        let mut pending: Vec<Box<dyn FnOnce(u64) + 'static>> = Vec::with_capacity(callbacks.len());
        while let Some(mut entry) = callbacks.pop_front() {
            if let Some(callback) = entry.callback.take() {
                pending.push(callback);
            }
        }
        drop(callbacks);
        // callbacks registered from inside a callback run on the next frame
        for callback in pending {
            callback(frame_time_nanos);
        }
        self.settle_needs_frame();
    }
}

/// Owner of the UI-thread runtime: frame callbacks and launched futures.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.handle())
    }

    /// Polls woken futures, then runs the frame callbacks.
    pub fn run_frame(&self, frame_time_nanos: u64) {
        self.inner.drain_tasks();
        self.inner.drain_frame_callbacks(frame_time_nanos);
    }
}

/// Scheduler that ignores frame requests. Useful when frames are driven by hand.
#[derive(Debug, Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

/// Weak handle to a [`Runtime`]. Operations on a dropped runtime are no-ops.
#[derive(Clone)]
pub struct RuntimeHandle(pub(crate) Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn schedule(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    pub fn drain_tasks(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.drain_tasks();
        }
    }

    /// Launches `future` on the UI thread. It is first polled on the next
    /// [`drain_tasks`](Self::drain_tasks) and afterwards whenever it is woken.
    pub fn launch(&self, future: impl Future<Output = ()> + 'static) -> Option<TaskId> {
        self.0
            .upgrade()
            .map(|inner| inner.launch(Box::pin(future)))
    }

    /// Drops a launched future. Returns false if it already completed.
    pub fn cancel_task(&self, id: TaskId) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.cancel_task(id))
            .unwrap_or(false)
    }

    pub fn has_live_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_live_tasks())
            .unwrap_or(false)
    }

    pub fn register_frame_callback(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> Option<FrameCallbackId> {
        self.0
            .upgrade()
            .map(|inner| inner.register_frame_callback(Box::new(callback)))
    }

    pub fn cancel_frame_callback(&self, id: FrameCallbackId) {
        if let Some(inner) = self.0.upgrade() {
            inner.cancel_frame_callback(id);
        }
    }

    pub fn drain_frame_callbacks(&self, frame_time_nanos: u64) {
        if let Some(inner) = self.0.upgrade() {
            inner.drain_frame_callbacks(frame_time_nanos);
        }
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.clone())
    }

    pub fn needs_frame(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.needs_frame.get())
            .unwrap_or(false)
    }

    pub fn has_frame_callbacks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_frame_callbacks())
            .unwrap_or(false)
    }
}

pub(crate) struct FrameCallbackEntry {
    id: FrameCallbackId,
    callback: Option<Box<dyn FnOnce(u64) + 'static>>,
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
