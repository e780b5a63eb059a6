use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use deck_core::{run_in_background, BackgroundExecutor, CellStore, ReactiveCell, StoreError};
use deck_model::{Deck, PageStack, StackId};
use log::debug;

use crate::error::Result;
use crate::format::DeckRecord;
use crate::fs::{lock_io, read_json, write_json_atomic};
use crate::page_stack::{FilePageStackRepository, PageStackRepository};
use crate::PersistedPage;

const DECK_FILE: &str = "deck.json";

/// Deck whose cards are page stack cells.
pub type PageDeck<P> = Deck<ReactiveCell<PageStack<P>>>;

/// Stack ids of a deck, in the deck's shape.
pub fn deck_layout<P: 'static>(deck: &PageDeck<P>) -> Deck<StackId> {
    deck.map(|cell| cell.with(PageStack::id))
}

/// Persistence of the deck layout.
pub trait DeckRepository<P: 'static> {
    /// Writes the layout of `deck` and returns a cell backed by the deck file.
    fn save_deck(&self, deck: PageDeck<P>) -> Result<ReactiveCell<PageDeck<P>>>;

    /// Reads the layout and resolves every card through the stack repository.
    fn load_deck(&self) -> Result<ReactiveCell<PageDeck<P>>>;
}

/// Thread-safe file access for the deck layout.
#[derive(Debug)]
pub struct DeckStore {
    path: PathBuf,
    io_lock: Mutex<()>,
}

impl DeckStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join(DECK_FILE),
            io_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, layout: &Deck<StackId>) -> Result<()> {
        let record = DeckRecord::encode(layout);
        let _guard = lock_io(&self.io_lock);
        write_json_atomic(&self.path, &record)?;
        debug!(
            "saved deck with {} cards to {}",
            layout.card_count(),
            self.path.display()
        );
        Ok(())
    }

    pub fn read(&self) -> Result<Deck<StackId>> {
        let record: DeckRecord = {
            let _guard = lock_io(&self.io_lock);
            read_json(&self.path)?
        };
        record.decode(&self.path)
    }
}

struct DeckFile {
    store: Arc<DeckStore>,
}

impl<P: 'static> CellStore<PageDeck<P>> for DeckFile {
    fn store(&self, value: &PageDeck<P>) -> std::result::Result<(), StoreError> {
        self.store
            .write(&deck_layout(value))
            .map_err(StoreError::new)
    }
}

/// [`DeckRepository`] keeping the layout in `<root>/deck.json` and the
/// stacks in a [`FilePageStackRepository`].
pub struct FileDeckRepository<P> {
    store: Arc<DeckStore>,
    stacks: FilePageStackRepository<P>,
}

impl<P> Clone for FileDeckRepository<P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            stacks: self.stacks.clone(),
        }
    }
}

impl<P: PersistedPage> FileDeckRepository<P> {
    pub fn new(root: impl AsRef<Path>, stacks: FilePageStackRepository<P>) -> Self {
        Self {
            store: Arc::new(DeckStore::new(root)),
            stacks,
        }
    }

    pub fn page_stacks(&self) -> &FilePageStackRepository<P> {
        &self.stacks
    }

    fn cell_for(&self, deck: PageDeck<P>) -> ReactiveCell<PageDeck<P>> {
        let backing: Rc<dyn CellStore<PageDeck<P>>> = Rc::new(DeckFile {
            store: Arc::clone(&self.store),
        });
        ReactiveCell::with_store(deck, backing)
    }

    /// Reads the layout and every stack on `executor`, then builds the cells
    /// when awaited on the UI thread.
    pub fn load_deck_in_background(
        &self,
        executor: &dyn BackgroundExecutor,
    ) -> impl Future<Output = Result<ReactiveCell<PageDeck<P>>>> + 'static {
        let store = Arc::clone(&self.store);
        let stacks = Arc::clone(self.stacks.store());
        let task = run_in_background(executor, move || {
            let layout = store.read()?;
            layout.try_map(|id| stacks.read(*id))
        });
        let repository = self.clone();
        async move {
            let loaded = task.await?;
            let deck = loaded.map(|stack| repository.stacks.cell_for(stack.clone()));
            Ok(repository.cell_for(deck))
        }
    }
}

impl<P: PersistedPage> DeckRepository<P> for FileDeckRepository<P> {
    fn save_deck(&self, deck: PageDeck<P>) -> Result<ReactiveCell<PageDeck<P>>> {
        self.store.write(&deck_layout(&deck))?;
        Ok(self.cell_for(deck))
    }

    fn load_deck(&self) -> Result<ReactiveCell<PageDeck<P>>> {
        let layout = self.store.read()?;
        let deck = layout.try_map(|id| self.stacks.load_page_stack(*id))?;
        debug!("loaded deck with {} cards", deck.card_count());
        Ok(self.cell_for(deck))
    }
}

impl<P> fmt::Debug for FileDeckRepository<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDeckRepository")
            .field("store", &self.store)
            .field("stacks", &self.stacks)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/deck_tests.rs"]
mod tests;
