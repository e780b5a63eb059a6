//! Awaitable results of work handed to a [`BackgroundExecutor`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::platform::BackgroundExecutor;

struct Slot<T> {
    result: Option<T>,
    waker: Option<Waker>,
}

/// Future resolving to the output of a job run by a [`BackgroundExecutor`].
///
/// Awaiting it suspends the calling task without blocking the thread; the
/// executor's thread wakes the task once the job finished. Dropping the future
/// does not cancel the job.
pub struct BackgroundTask<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

/// Runs `job` on `executor` and returns a future for its output.
pub fn run_in_background<T, F>(executor: &dyn BackgroundExecutor, job: F) -> BackgroundTask<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let slot = Arc::new(Mutex::new(Slot {
        result: None,
        waker: None,
    }));
    let producer = Arc::clone(&slot);
    executor.execute(Box::new(move || {
        let output = job();
        let waker = {
            let mut slot = producer.lock().unwrap();
            slot.result = Some(output);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }));
    BackgroundTask { slot }
}

impl<T> BackgroundTask<T> {
    pub fn is_ready(&self) -> bool {
        self.slot.lock().unwrap().result.is_some()
    }
}

impl<T> Future for BackgroundTask<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut slot = self.slot.lock().unwrap();
        match slot.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T> fmt::Debug for BackgroundTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundTask")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Executor that runs each job on the submitting thread.
///
/// For hosts without worker threads and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl BackgroundExecutor for InlineExecutor {
    fn execute(&self, job: Box<dyn FnOnce() + Send + 'static>) {
        job();
    }
}
