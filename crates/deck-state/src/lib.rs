//! State holders tying the deck together.
//!
//! [`DeckState`] owns the deck cell, the scroll engine and the active card.
//! [`PageStackState`] is the per-card context pages use to navigate; it
//! starts page transitions and removes its card when the last page finishes.

mod config;
mod deck_state;
mod error;
mod page_stack_state;

pub use config::{ConfigError, DeckConfig, DeckLayoutMode};
pub use deck_state::{DeckSettings, DeckState};
pub use error::StateError;
pub use page_stack_state::{PageFinish, PageStackState};
