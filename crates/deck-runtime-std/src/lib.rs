//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `deck-core`: a frame scheduler, a
//! [`StdRuntime`] bundling it with a [`Runtime`], and an [`IoWorker`] thread
//! for repository I/O.

mod io_worker;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use deck_core::{FrameClock, Runtime, RuntimeHandle, RuntimeScheduler};

pub use io_worker::IoWorker;

/// Frame cadence used by [`StdRuntime::run_until`].
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Scheduler that records frame requests and wakes the host loop.
pub struct StdScheduler {
    frame_requested: AtomicBool,
    frame_waker: RwLock<Option<Arc<dyn Fn() + Send + Sync + 'static>>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            frame_requested: AtomicBool::new(false),
            frame_waker: RwLock::new(None),
        }
    }

    /// Returns whether a frame has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.frame_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever a frame is requested, possibly from
    /// a background thread.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.frame_waker.write().unwrap() = Some(Arc::new(waker));
    }

    pub fn clear_frame_waker(&self) {
        *self.frame_waker.write().unwrap() = None;
    }

    fn wake(&self) {
        let waker = self.frame_waker.read().unwrap().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "frame_requested",
                &self.frame_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_frame(&self) {
        self.frame_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Runtime and scheduler for a host running on std threads.
///
/// Frame times are nanoseconds since the runtime was created.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
    started: Instant,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            runtime,
            started: Instant::now(),
        }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn frame_clock(&self) -> FrameClock {
        self.runtime.frame_clock()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Returns whether a frame was requested since the last poll.
    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    /// Registers a waker to be called when the runtime schedules a new frame.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_frame_waker(waker);
    }

    pub fn clear_frame_waker(&self) {
        self.scheduler.clear_frame_waker();
    }

    pub fn elapsed_nanos(&self) -> u64 {
        self.started.elapsed().as_nanos() as u64
    }

    /// Runs one frame stamped with the current time.
    pub fn run_frame(&self) {
        self.take_frame_request();
        self.runtime.run_frame(self.elapsed_nanos());
    }

    /// Runs frames every `frame_interval` until `done` returns true or
    /// `timeout` elapses. Returns whether `done` was reached.
    pub fn run_until(
        &self,
        frame_interval: Duration,
        timeout: Duration,
        mut done: impl FnMut() -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.run_frame();
            if done() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(frame_interval);
        }
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("elapsed_nanos", &self.elapsed_nanos())
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn frame_callbacks_request_a_frame_and_run_on_the_next_one() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        runtime.set_frame_waker({
            let wakes = Arc::clone(&wakes);
            move || {
                wakes.fetch_add(1, Ordering::SeqCst);
            }
        });

        let seen = Rc::new(Cell::new(None));
        let _registration = runtime.frame_clock().with_frame_nanos({
            let seen = Rc::clone(&seen);
            move |time| seen.set(Some(time))
        });
        assert!(runtime.take_frame_request());
        assert_eq!(wakes.load(Ordering::SeqCst), 1);

        runtime.run_frame();
        assert!(seen.get().is_some());
        assert!(!runtime.take_frame_request());
    }

    #[test]
    fn run_until_drives_frame_awaiting_tasks() {
        let runtime = StdRuntime::new();
        let frames = Rc::new(Cell::new(0));
        let clock = runtime.frame_clock();
        runtime.runtime_handle().launch({
            let frames = Rc::clone(&frames);
            async move {
                for _ in 0..3 {
                    clock.next_frame().await;
                    frames.set(frames.get() + 1);
                }
            }
        });
        let finished = runtime.run_until(Duration::from_millis(1), Duration::from_secs(5), || {
            frames.get() == 3
        });
        assert!(finished);
    }

    #[test]
    fn run_until_gives_up_after_the_timeout() {
        let runtime = StdRuntime::new();
        assert!(!runtime.run_until(Duration::from_millis(1), Duration::from_millis(5), || false));
    }
}
