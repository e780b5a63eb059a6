//! Data model of the page deck.
//!
//! Everything here is persistent: edits return new values that share the
//! untouched parts with the receiver, which is never modified.

pub mod deck;
pub mod page;
pub mod page_stack;
pub mod registry;

pub use deck::{Column, Deck, DeckNode, Row};
pub use page::{PageId, StackId, Tagged};
pub use page_stack::{PageStack, RestoreError};
pub use registry::{CodecError, TagRegistry, TaggedValue};

pub mod prelude {
    pub use crate::deck::{Column, Deck, DeckNode, Row};
    pub use crate::page::{PageId, StackId, Tagged};
    pub use crate::page_stack::PageStack;
}
