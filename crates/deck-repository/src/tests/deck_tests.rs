use std::sync::Arc;

use deck_model::{Column, DeckNode, Row, TagRegistry, Tagged};
use tempfile::TempDir;

use super::*;
use crate::error::RepositoryError;

#[derive(Debug, Clone, PartialEq)]
struct Page(String);

impl Tagged for Page {
    fn type_tag(&self) -> &'static str {
        "page"
    }
}

fn repositories(dir: &TempDir) -> FileDeckRepository<Page> {
    let registry = Arc::new(TagRegistry::new().with("page", Page, |page| Some(&page.0)));
    FileDeckRepository::new(dir.path(), FilePageStackRepository::new(dir.path(), registry))
}

fn saved_card(repo: &FileDeckRepository<Page>, id: u64, page: &str) -> DeckNode<ReactiveCell<PageStack<Page>>> {
    DeckNode::Card(
        repo.page_stacks()
            .save_page_stack(PageStack::new(StackId::new(id), Page(page.to_owned())))
            .unwrap(),
    )
}

fn heads(deck: &PageDeck<Page>) -> Vec<String> {
    deck.cards()
        .into_iter()
        .map(|cell| cell.with(|stack| stack.head().0.clone()))
        .collect()
}

#[test]
fn nested_deck_round_trips() {
    let dir = TempDir::new().unwrap();
    let repo = repositories(&dir);
    let deck = Deck::new(Row::new(vec![
        saved_card(&repo, 0, "home"),
        DeckNode::Column(Column::new(vec![
            saved_card(&repo, 1, "search"),
            saved_card(&repo, 2, "thread"),
        ])),
    ]));
    repo.save_deck(deck).unwrap();

    let loaded = repo.load_deck().unwrap();
    loaded.with(|deck| {
        assert_eq!(heads(deck), ["home", "search", "thread"]);
        assert_eq!(deck.slot_count(), 2);
        assert_eq!(deck.path_of_card(2), Some(vec![1, 1]));
        assert!(deck.cards().iter().all(|cell| cell.is_persistent()));
    });
}

#[test]
fn deck_cell_writes_rewrite_layout() {
    let dir = TempDir::new().unwrap();
    let repo = repositories(&dir);
    let cell = repo
        .save_deck(Deck::new(Row::new(vec![saved_card(&repo, 0, "a")])))
        .unwrap();
    let extra = saved_card(&repo, 5, "b");
    cell.update(|deck| *deck = Deck::new(deck.root().inserted(1, extra)))
        .unwrap();

    let layout = repo.load_deck().unwrap().with(deck_layout);
    assert_eq!(
        layout.cards().into_iter().copied().collect::<Vec<_>>(),
        [StackId::new(0), StackId::new(5)]
    );
}

#[test]
fn missing_deck_is_not_found() {
    let dir = TempDir::new().unwrap();
    assert!(repositories(&dir).load_deck().unwrap_err().is_not_found());
}

#[test]
fn deck_referring_to_missing_stack_fails() {
    let dir = TempDir::new().unwrap();
    let repo = repositories(&dir);
    repo.save_deck(Deck::new(Row::new(vec![saved_card(&repo, 0, "a")])))
        .unwrap();
    repo.page_stacks().delete_all_page_stacks().unwrap();
    assert!(repo.load_deck().unwrap_err().is_not_found());
}

#[test]
fn duplicate_stack_ids_are_corrupt() {
    let dir = TempDir::new().unwrap();
    let repo = repositories(&dir);
    let json = serde_json::json!({
        "version": 1,
        "slots": [
            { "kind": "card", "stack_id": 0 },
            { "kind": "card", "stack_id": 0 },
        ],
    });
    std::fs::write(dir.path().join("deck.json"), json.to_string()).unwrap();
    assert!(matches!(repo.load_deck(), Err(RepositoryError::Corrupt { .. })));
}

#[test]
fn leftover_temp_file_is_ignored() {
    let dir = TempDir::new().unwrap();
    let repo = repositories(&dir);
    repo.save_deck(Deck::new(Row::new(vec![saved_card(&repo, 0, "a")])))
        .unwrap();
    std::fs::write(dir.path().join("deck.json.tmp"), b"{ \"version\": 1, \"sl").unwrap();

    assert_eq!(repo.load_deck().unwrap().with(heads), ["a"]);
}
