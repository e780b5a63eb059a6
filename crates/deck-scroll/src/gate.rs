use std::cell::Cell;
use std::rc::Rc;

use deck_core::FrameClock;

/// Who is asking to move the scroll position. Later variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MutatePriority {
    /// Flings and programmatic animations.
    Default,
    /// A finger on the screen.
    UserInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Completed,
    /// Preempted or stopped before reaching its target.
    Cancelled,
}

/// Handle to a mutator holding, or having held, the scroll position.
#[derive(Debug, Clone)]
pub struct ScrollJob {
    id: u64,
    priority: MutatePriority,
    state: Rc<Cell<JobState>>,
}

impl ScrollJob {
    pub(crate) fn new(id: u64, priority: MutatePriority) -> Self {
        Self {
            id,
            priority,
            state: Rc::new(Cell::new(JobState::Running)),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn priority(&self) -> MutatePriority {
        self.priority
    }

    pub fn state(&self) -> JobState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.get() == JobState::Running
    }

    pub(crate) fn finish(&self, state: JobState) {
        if self.is_running() {
            self.state.set(state);
        }
    }

    /// Waits frame by frame until the job stops; resolves to its final state.
    pub async fn join(self, clock: FrameClock) -> JobState {
        while self.is_running() {
            clock.next_frame().await;
        }
        self.state()
    }
}
