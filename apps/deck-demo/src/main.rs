use std::cell::RefCell;
use std::env;
use std::error::Error;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use deck_core::ReactiveCell;
use deck_graphics::{Point, Size};
use deck_model::{PageStack, TagRegistry, Tagged};
use deck_repository::{
    load_deck_or_default, FileDeckRepository, FilePageStackRepository, PageDeck,
};
use deck_runtime_std::{IoWorker, StdRuntime, DEFAULT_FRAME_INTERVAL};
use deck_state::{DeckConfig, DeckSettings, DeckState};
use deck_transition::{ElementCoordinates, LayoutId, PageTransitionRegistry, TransitionAnimation};
use log::{info, warn};
use serde::{Deserialize, Serialize};

const VIEWPORT_WIDTH: f32 = 1200.0;
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
enum DemoPage {
    Home,
    Profile(String),
    Thread(ThreadArgs),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ThreadArgs {
    uri: String,
    focus_reply: bool,
}

impl Tagged for DemoPage {
    fn type_tag(&self) -> &'static str {
        match self {
            DemoPage::Home => "home",
            DemoPage::Profile(_) => "profile",
            DemoPage::Thread(_) => "thread",
        }
    }
}

fn page_registry() -> TagRegistry<DemoPage> {
    TagRegistry::new()
        .with_unit("home", || DemoPage::Home)
        .with("profile", DemoPage::Profile, |page| match page {
            DemoPage::Profile(handle) => Some(handle),
            _ => None,
        })
        .with("thread", DemoPage::Thread, |page| match page {
            DemoPage::Thread(args) => Some(args),
            _ => None,
        })
}

fn avatar() -> LayoutId {
    LayoutId::named("avatar")
}

fn transitions() -> PageTransitionRegistry {
    let mut registry = PageTransitionRegistry::new();
    registry.transition_to("home", "profile", |t| {
        t.enter(|e| {
            e.current_page_element(avatar(), TransitionAnimation::bounds())
                .target_page_element(avatar(), TransitionAnimation::bounds());
        });
        t.exit(|e| {
            e.target_page_element(avatar(), TransitionAnimation::position());
        });
    });
    registry
}

fn load_deck(
    runtime: &StdRuntime,
    worker: &IoWorker,
    stacks: &FilePageStackRepository<DemoPage>,
    decks: &FileDeckRepository<DemoPage>,
) -> Result<ReactiveCell<PageDeck<DemoPage>>, Box<dyn Error>> {
    let loaded = Rc::new(RefCell::new(None));
    let load = decks.load_deck_in_background(worker);
    runtime.runtime_handle().launch({
        let loaded = Rc::clone(&loaded);
        async move {
            *loaded.borrow_mut() = Some(load.await);
        }
    });
    runtime.run_until(DEFAULT_FRAME_INTERVAL, SETTLE_TIMEOUT, || loaded.borrow().is_some());

    let result = loaded.borrow_mut().take();
    match result {
        Some(Ok(deck)) => Ok(deck),
        Some(Err(err)) => {
            warn!("background load failed: {err}");
            Ok(load_deck_or_default(decks, stacks, || {
                vec![DemoPage::Home, DemoPage::Profile("deck.example".into())]
            })?)
        }
        None => Err("timed out loading the deck".into()),
    }
}

fn settle(runtime: &StdRuntime, state: &DeckState<DemoPage>) {
    let settled = runtime.run_until(DEFAULT_FRAME_INTERVAL, SETTLE_TIMEOUT, || {
        !state.scroll_engine().is_scroll_in_progress()
            && (0..state.card_count()).all(|index| {
                state
                    .page_stack_state(index)
                    .map_or(true, |card| card.transition().is_none())
            })
    });
    if !settled {
        warn!("deck did not settle within {SETTLE_TIMEOUT:?}");
    }
}

fn print_deck(label: &str, state: &DeckState<DemoPage>) {
    println!("--- {label} ---");
    let deck = state.deck();
    for (index, card) in deck.cards().into_iter().enumerate() {
        let marker = if index == state.active_card_index() { '*' } else { ' ' };
        card.with(|stack: &PageStack<DemoPage>| {
            let pages: Vec<&str> = stack.iter().map(|(_, page)| page.type_tag()).collect();
            println!("{marker} card {index} (stack {}): {}", stack.id(), pages.join(" <- "));
        });
    }
    println!(
        "  offset {:.1} of {:.1}, visible {:?}",
        state.scroll_engine().scroll_offset(),
        state.scroll_engine().max_scroll_offset(),
        state.visible_cards()
    );
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = match env::args().nth(1) {
        Some(path) => DeckConfig::load_or_default(path)?,
        None => DeckConfig::default(),
    };
    info!("using storage root {}", config.storage_root.display());

    let runtime = StdRuntime::new();
    let worker = IoWorker::spawn("deck-io")?;
    let stacks = FilePageStackRepository::new(&config.storage_root, Arc::new(page_registry()));
    let decks = FileDeckRepository::new(&config.storage_root, stacks.clone());
    let deck = load_deck(&runtime, &worker, &stacks, &decks)?;

    let state = DeckState::new(
        runtime.runtime_handle(),
        deck,
        Rc::new(stacks.clone()),
        DeckSettings::from_config(&config, VIEWPORT_WIDTH),
        transitions(),
    );
    print_deck("loaded", &state);

    let index = state.add_card(DemoPage::Profile("deck.example".into()))?;
    settle(&runtime, &state);
    print_deck(&format!("added card {index}"), &state);

    if let Some(card) = state.page_stack_state(0) {
        card.record_coordinates(
            card.head_id(),
            avatar(),
            ElementCoordinates::new(Size::new(48.0, 48.0), Point::new(16.0, 16.0)),
        );
        let profile = card.start_page(DemoPage::Profile("someone.example".into()))?;
        card.record_coordinates(
            profile,
            avatar(),
            ElementCoordinates::new(Size::new(96.0, 96.0), Point::new(40.0, 120.0)),
        );
        settle(&runtime, &state);
        card.start_page(DemoPage::Thread(ThreadArgs {
            uri: "at://someone.example/post/1".into(),
            focus_reply: false,
        }))?;
        settle(&runtime, &state);
        print_deck("navigated in card 0", &state);

        card.finish_page()?;
        settle(&runtime, &state);
        print_deck("finished a page in card 0", &state);
    }

    state.fling(-4000.0)?;
    settle(&runtime, &state);
    print_deck("flung back to the start", &state);

    worker.shutdown();
    Ok(())
}

fn main() {
    env_logger::init();

    println!("=== Page Deck Demo ===");
    if let Err(err) = run() {
        eprintln!("deck demo failed: {err}");
        std::process::exit(1);
    }
}
