use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::runtime::{FrameCallbackId, RuntimeHandle};

/// Access to the runtime's frame callbacks.
///
/// Animations advance only from these callbacks, so motion stays tied to the
/// render cadence of the host.
#[derive(Clone)]
pub struct FrameClock {
    runtime: RuntimeHandle,
}

impl FrameClock {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self { runtime }
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.clone()
    }

    pub fn with_frame_nanos(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> FrameCallbackRegistration {
        let mut callback_opt = Some(callback);
        let runtime = self.runtime.clone();
        match runtime.register_frame_callback(move |time| {
            if let Some(callback) = callback_opt.take() {
                callback(time);
            }
        }) {
            Some(id) => FrameCallbackRegistration::new(runtime, id),
            None => FrameCallbackRegistration::inactive(runtime),
        }
    }

    /// Suspends the calling task until the next frame; resolves to the frame
    /// time in nanoseconds.
    pub fn next_frame(&self) -> NextFrame {
        NextFrame {
            clock: self.clone(),
            shared: Rc::new(RefCell::new(NextFrameShared::default())),
            registration: None,
        }
    }
}

#[derive(Default)]
struct NextFrameShared {
    frame_time: Option<u64>,
    waker: Option<Waker>,
}

/// Future returned by [`FrameClock::next_frame`].
pub struct NextFrame {
    clock: FrameClock,
    shared: Rc<RefCell<NextFrameShared>>,
    registration: Option<FrameCallbackRegistration>,
}

impl Future for NextFrame {
    type Output = u64;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<u64> {
        if let Some(time) = self.shared.borrow().frame_time {
            return Poll::Ready(time);
        }
        self.shared.borrow_mut().waker = Some(cx.waker().clone());
        if self.registration.is_none() {
            let shared = Rc::clone(&self.shared);
            let registration = self.clock.with_frame_nanos(move |time| {
                let waker = {
                    let mut shared = shared.borrow_mut();
                    shared.frame_time = Some(time);
                    shared.waker.take()
                };
                if let Some(waker) = waker {
                    waker.wake();
                }
            });
            self.registration = Some(registration);
        }
        Poll::Pending
    }
}

/// Keeps a frame callback registered; dropping it cancels the callback.
pub struct FrameCallbackRegistration {
    runtime: RuntimeHandle,
    id: Option<FrameCallbackId>,
}

impl FrameCallbackRegistration {
    fn new(runtime: RuntimeHandle, id: FrameCallbackId) -> Self {
        Self {
            runtime,
            id: Some(id),
        }
    }

    fn inactive(runtime: RuntimeHandle) -> Self {
        Self { runtime, id: None }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    pub fn cancel(mut self) {
        if let Some(id) = self.id.take() {
            self.runtime.cancel_frame_callback(id);
        }
    }
}

impl Drop for FrameCallbackRegistration {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.runtime.cancel_frame_callback(id);
        }
    }
}
