//! File-backed repositories for page stacks and the deck.
//!
//! Stacks live in `<root>/page_stacks/<id>.json`, the deck in
//! `<root>/deck.json`. The deck file stores only stack ids; loading resolves
//! them through the stack repository. Every repository hands out
//! [`ReactiveCell`](deck_core::ReactiveCell)s whose writes rewrite the backing
//! file.
//!
//! File I/O happens in the `*Store` types, which are `Send + Sync` and may run
//! on a background executor. Cells are built on the UI thread.

mod default;
mod error;
mod format;
mod fs;

pub mod deck;
pub mod page_stack;

pub use deck::{deck_layout, DeckRepository, DeckStore, FileDeckRepository, PageDeck};
pub use default::load_deck_or_default;
pub use error::{RepositoryError, Result};
pub use format::FORMAT_VERSION;
pub use page_stack::{FilePageStackRepository, PageStackRepository, PageStackStore};

/// Bounds shared by every persisted page type.
pub trait PersistedPage: deck_model::Tagged + Send + Sync + 'static {}

impl<T: deck_model::Tagged + Send + Sync + 'static> PersistedPage for T {}
