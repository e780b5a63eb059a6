#![doc = r"Core runtime pieces for the page deck: frame clock, UI-thread runtime and reactive cells."]

pub mod background;
pub mod cell;
pub mod collections;
pub mod frame_clock;
pub mod platform;
pub mod runtime;

pub use background::{run_in_background, BackgroundTask, InlineExecutor};
pub use cell::{CellStore, ReactiveCell, ReadOnlyCell, StoreError, Subscription};
pub use frame_clock::{FrameCallbackRegistration, FrameClock, NextFrame};
pub use platform::{BackgroundExecutor, RuntimeScheduler};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle, TaskId};

/// Nanoseconds per second, for converting frame times.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;
