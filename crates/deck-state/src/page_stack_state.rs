use std::fmt;

use deck_core::{ReactiveCell, ReadOnlyCell};
use deck_model::{PageId, PageStack, StackId, Tagged};
use deck_transition::{ElementCoordinates, LayoutId, PageKey, TransitionAnimator, TransitionDirection};
use log::error;

use crate::deck_state::DeckState;
use crate::error::StateError;

/// What [`PageStackState::finish_page`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFinish {
    /// The previous page is shown again.
    Popped { head: PageId },
    /// The last page finished; the card left the deck.
    CardRemoved,
}

/// Navigation context of one card, handed to the pages it shows.
pub struct PageStackState<P: 'static> {
    deck: DeckState<P>,
    stack: ReactiveCell<PageStack<P>>,
}

impl<P: 'static> Clone for PageStackState<P> {
    fn clone(&self) -> Self {
        Self {
            deck: self.deck.clone(),
            stack: self.stack.clone(),
        }
    }
}

impl<P: 'static> PageStackState<P> {
    pub(crate) fn new(deck: DeckState<P>, stack: ReactiveCell<PageStack<P>>) -> Self {
        Self { deck, stack }
    }
}

impl<P: Tagged + 'static> PageStackState<P> {
    pub fn stack_id(&self) -> StackId {
        self.stack.with(PageStack::id)
    }

    pub fn head_id(&self) -> PageId {
        self.stack.with(PageStack::head_id)
    }

    pub fn stack(&self) -> ReadOnlyCell<PageStack<P>> {
        self.stack.as_read_only()
    }

    pub fn deck(&self) -> &DeckState<P> {
        &self.deck
    }

    /// Pushes `page` and starts the enter transition. Returns the new page's id.
    pub fn start_page(&self, page: P) -> Result<PageId, StateError> {
        self.ensure_in_deck()?;
        let before = self.stack.get();
        let after = before.added(page);
        let head = after.head_id();
        self.commit(after.clone())?;
        self.deck
            .start_transition(TransitionDirection::Enter, &before, &after);
        Ok(head)
    }

    /// Pops the head page and starts the exit transition. When the head is
    /// the only page, the card is removed from the deck instead.
    pub fn finish_page(&self) -> Result<PageFinish, StateError> {
        self.ensure_in_deck()?;
        let before = self.stack.get();
        let Some(after) = before.tail_or_none() else {
            self.remove_from_deck()?;
            return Ok(PageFinish::CardRemoved);
        };
        let head = after.head_id();
        self.commit(after.clone())?;
        self.deck
            .start_transition(TransitionDirection::Exit, &before, &after);
        Ok(PageFinish::Popped { head })
    }

    /// Opens `page` in a new card next to the active one.
    pub fn add_card(&self, page: P) -> Result<usize, StateError> {
        self.deck.add_card(page)
    }

    pub fn remove_from_deck(&self) -> Result<(), StateError> {
        let id = self.stack_id();
        let index = self.deck.index_of_stack(id).ok_or(StateError::NotInDeck(id))?;
        self.deck.remove_card(index)
    }

    /// Records where element `id` of `page` was laid out.
    pub fn record_coordinates(&self, page: PageId, id: LayoutId, coordinates: ElementCoordinates) {
        self.deck
            .coordinate_tracker()
            .record(PageKey::new(self.stack_id(), page), id, coordinates);
    }

    /// Transition currently running in this card.
    pub fn transition(&self) -> Option<TransitionAnimator> {
        self.deck.transition_of(self.stack_id())
    }

    fn ensure_in_deck(&self) -> Result<(), StateError> {
        let id = self.stack_id();
        match self.deck.index_of_stack(id) {
            Some(_) => Ok(()),
            None => Err(StateError::NotInDeck(id)),
        }
    }

    fn commit(&self, stack: PageStack<P>) -> Result<(), StateError> {
        self.stack.set(stack).map_err(|err| {
            error!("failed to save page stack {}: {err}", self.stack_id());
            StateError::from(err)
        })
    }
}

impl<P: fmt::Debug + 'static> fmt::Debug for PageStackState<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageStackState")
            .field("stack", &self.stack)
            .finish()
    }
}
