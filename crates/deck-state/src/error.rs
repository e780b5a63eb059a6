use deck_core::StoreError;
use deck_model::StackId;
use deck_repository::RepositoryError;
use deck_scroll::ScrollError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Scroll(#[from] ScrollError),

    /// A committed write could not be persisted; the previous value is kept.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("card {index} out of range for {card_count} cards")]
    CardOutOfRange { index: usize, card_count: usize },

    /// The stack's card was removed from the deck.
    #[error("page stack {0} is no longer in the deck")]
    NotInDeck(StackId),
}
