//! Platform abstraction traits for deck runtime services.
//!
//! The host decides how frames are scheduled and where blocking work (file I/O)
//! runs. `deck-runtime-std` provides std-backed
//! implementations; tests usually plug in [`DefaultScheduler`](crate::DefaultScheduler)
//! and drive frames by hand.

/// Schedules frames for the deck runtime.
///
/// Implementations must be safe to use from multiple threads: wakers of
/// background tasks call [`schedule_frame`](RuntimeScheduler::schedule_frame)
/// from the thread that completed the work.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}

/// Runs blocking jobs away from the UI thread.
///
/// Jobs submitted to one executor run one at a time in submission order.
pub trait BackgroundExecutor: Send + Sync {
    /// Queue `job` for execution.
    fn execute(&self, job: Box<dyn FnOnce() + Send + 'static>);
}
