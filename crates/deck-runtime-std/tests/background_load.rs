use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use deck_model::{Deck, PageStack, StackId, TagRegistry, Tagged};
use deck_repository::{
    deck_layout, DeckRepository, FileDeckRepository, FilePageStackRepository, PageStackRepository,
};
use deck_runtime_std::{IoWorker, StdRuntime};

#[derive(Debug, Clone, PartialEq)]
enum Page {
    Home,
    Search,
}

impl Tagged for Page {
    fn type_tag(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Search => "search",
        }
    }
}

fn repositories(root: &std::path::Path) -> (FilePageStackRepository<Page>, FileDeckRepository<Page>) {
    let registry = TagRegistry::new()
        .with_unit("home", || Page::Home)
        .with_unit("search", || Page::Search);
    let stacks = FilePageStackRepository::new(root, Arc::new(registry));
    let decks = FileDeckRepository::new(root, stacks.clone());
    (stacks, decks)
}

#[test]
fn deck_loads_on_the_worker_and_resolves_on_the_ui_thread() {
    let dir = tempfile::tempdir().unwrap();
    let (stacks, decks) = repositories(dir.path());
    let home = stacks
        .save_page_stack(PageStack::new(StackId::new(0), Page::Home).added(Page::Search))
        .unwrap();
    let search = stacks
        .save_page_stack(PageStack::new(StackId::new(1), Page::Search))
        .unwrap();
    decks.save_deck(Deck::from_cards([home, search])).unwrap();

    let runtime = StdRuntime::new();
    let worker = IoWorker::spawn("deck-io").unwrap();
    let loaded = Rc::new(RefCell::new(None));
    let load = decks.load_deck_in_background(&worker);
    runtime.runtime_handle().launch({
        let loaded = Rc::clone(&loaded);
        async move {
            *loaded.borrow_mut() = Some(load.await);
        }
    });

    assert!(runtime.run_until(Duration::from_millis(1), Duration::from_secs(5), || {
        loaded.borrow().is_some()
    }));
    let deck = loaded.borrow_mut().take().unwrap().unwrap();
    assert!(deck.is_persistent());
    assert_eq!(
        deck_layout(&deck.get()),
        Deck::from_cards([StackId::new(0), StackId::new(1)])
    );
    let first = deck.get().card(0).unwrap().get();
    assert_eq!(first.len(), 2);
    assert_eq!(first.head(), &Page::Search);
}

#[test]
fn saves_from_the_worker_are_visible_to_later_loads() {
    let dir = tempfile::tempdir().unwrap();
    let (stacks, _decks) = repositories(dir.path());
    let runtime = StdRuntime::new();
    let worker = IoWorker::spawn("deck-io").unwrap();

    let saved = Rc::new(RefCell::new(None));
    let save = stacks.save_page_stack_in_background(&worker, PageStack::new(StackId::new(7), Page::Home));
    runtime.runtime_handle().launch({
        let saved = Rc::clone(&saved);
        async move {
            *saved.borrow_mut() = Some(save.await);
        }
    });
    assert!(runtime.run_until(Duration::from_millis(1), Duration::from_secs(5), || {
        saved.borrow().is_some()
    }));
    assert!(saved.borrow_mut().take().unwrap().is_ok());

    worker.shutdown();
    let reloaded = stacks.load_page_stack(StackId::new(7)).unwrap();
    assert_eq!(reloaded.with(|stack| stack.head().clone()), Page::Home);
}
