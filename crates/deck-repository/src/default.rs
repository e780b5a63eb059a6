use deck_core::ReactiveCell;
use deck_model::{Deck, PageStack, StackId};
use log::warn;

use crate::deck::{DeckRepository, PageDeck};
use crate::error::Result;
use crate::page_stack::PageStackRepository;

/// Loads the stored deck, or replaces all stored state with a default deck.
///
/// When loading fails for any reason every stored stack is deleted once, then
/// one single-page card is created per page from `default_pages`, each with a
/// freshly saved stack. Failures while building the default deck are
/// returned.
pub fn load_deck_or_default<P, D, S>(
    decks: &D,
    stacks: &S,
    default_pages: impl FnOnce() -> Vec<P>,
) -> Result<ReactiveCell<PageDeck<P>>>
where
    P: 'static,
    D: DeckRepository<P> + ?Sized,
    S: PageStackRepository<P> + ?Sized,
{
    let err = match decks.load_deck() {
        Ok(deck) => return Ok(deck),
        Err(err) => err,
    };
    warn!("stored deck unavailable, starting from the default deck: {err}");

    stacks.delete_all_page_stacks()?;
    let cards = default_pages()
        .into_iter()
        .enumerate()
        .map(|(index, page)| stacks.save_page_stack(PageStack::new(StackId::new(index as u64), page)))
        .collect::<Result<Vec<_>>>()?;
    decks.save_deck(Deck::from_cards(cards))
}
