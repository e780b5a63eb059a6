use std::cell::{Cell, RefCell};
use std::sync::Arc;

use deck_core::ReactiveCell;
use deck_model::{Deck, PageStack, StackId, TagRegistry, Tagged};
use deck_repository::{
    load_deck_or_default, DeckRepository, FileDeckRepository, FilePageStackRepository, PageDeck,
    PageStackRepository, RepositoryError, Result,
};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
struct Page(String);

impl Tagged for Page {
    fn type_tag(&self) -> &'static str {
        "page"
    }
}

fn default_pages() -> Vec<Page> {
    vec![Page("0".into()), Page("1".into())]
}

/// Records calls in order so the test can check deletion happens first.
#[derive(Default)]
struct RecordingStacks {
    calls: RefCell<Vec<String>>,
    deletes: Cell<usize>,
}

impl PageStackRepository<Page> for RecordingStacks {
    fn save_page_stack(&self, stack: PageStack<Page>) -> Result<ReactiveCell<PageStack<Page>>> {
        self.calls.borrow_mut().push(format!("save {}", stack.id()));
        Ok(ReactiveCell::new(stack))
    }

    fn load_page_stack(&self, id: StackId) -> Result<ReactiveCell<PageStack<Page>>> {
        Err(RepositoryError::NotFound {
            path: format!("{id}.json").into(),
        })
    }

    fn delete_page_stack(&self, _id: StackId) -> Result<()> {
        Ok(())
    }

    fn delete_all_page_stacks(&self) -> Result<()> {
        self.calls.borrow_mut().push("delete all".into());
        self.deletes.set(self.deletes.get() + 1);
        Ok(())
    }
}

struct BrokenDeck {
    saved: RefCell<Option<Vec<StackId>>>,
}

impl DeckRepository<Page> for BrokenDeck {
    fn save_deck(&self, deck: PageDeck<Page>) -> Result<ReactiveCell<PageDeck<Page>>> {
        let ids = deck
            .cards()
            .into_iter()
            .map(|cell| cell.with(|stack| stack.id()))
            .collect();
        *self.saved.borrow_mut() = Some(ids);
        Ok(ReactiveCell::new(deck))
    }

    fn load_deck(&self) -> Result<ReactiveCell<PageDeck<Page>>> {
        Err(RepositoryError::Corrupt {
            path: "deck.json".into(),
            reason: "truncated".into(),
        })
    }
}

#[test]
fn failed_load_deletes_stacks_once_and_builds_default_deck() {
    let stacks = RecordingStacks::default();
    let decks = BrokenDeck {
        saved: RefCell::new(None),
    };

    let deck = load_deck_or_default(&decks, &stacks, default_pages).unwrap();

    assert_eq!(stacks.deletes.get(), 1);
    assert_eq!(
        *stacks.calls.borrow(),
        ["delete all", "save 0", "save 1"]
    );
    deck.with(|deck| {
        assert_eq!(deck.card_count(), 2);
        let pages: Vec<_> = deck
            .cards()
            .into_iter()
            .map(|cell| cell.with(|stack| (stack.len(), stack.head().clone())))
            .collect();
        assert_eq!(pages, [(1, Page("0".into())), (1, Page("1".into()))]);
    });
    assert_eq!(
        *decks.saved.borrow(),
        Some(vec![StackId::new(0), StackId::new(1)])
    );
}

fn file_repositories(dir: &TempDir) -> (FileDeckRepository<Page>, FilePageStackRepository<Page>) {
    let registry = Arc::new(TagRegistry::new().with("page", Page, |page| Some(&page.0)));
    let stacks = FilePageStackRepository::new(dir.path(), registry);
    (FileDeckRepository::new(dir.path(), stacks.clone()), stacks)
}

#[test]
fn fresh_storage_gets_default_deck_then_reloads_it() {
    let dir = TempDir::new().unwrap();
    let (decks, stacks) = file_repositories(&dir);

    let first = load_deck_or_default(&decks, &stacks, default_pages).unwrap();
    assert_eq!(first.with(Deck::card_count), 2);

    let first_card = first.with(|deck| deck.cards()[0].clone());
    first_card
        .update(|stack| *stack = stack.added(Page("pushed".into())))
        .unwrap();

    let second = load_deck_or_default(&decks, &stacks, || -> Vec<Page> { panic!("stored deck should load") })
        .unwrap();
    second.with(|deck| {
        let head = deck.cards()[0].with(|stack| stack.head().clone());
        assert_eq!(head, Page("pushed".into()));
    });
}

#[test]
fn corrupt_deck_file_falls_back_and_wipes_old_stacks() {
    let dir = TempDir::new().unwrap();
    let (decks, stacks) = file_repositories(&dir);
    stacks
        .save_page_stack(PageStack::new(StackId::new(9), Page("stale".into())))
        .unwrap();
    std::fs::write(dir.path().join("deck.json"), b"not json").unwrap();

    let deck = load_deck_or_default(&decks, &stacks, default_pages).unwrap();
    assert_eq!(deck.with(Deck::card_count), 2);
    assert_eq!(
        stacks.store().stored_ids().unwrap(),
        vec![StackId::new(0), StackId::new(1)]
    );
}
