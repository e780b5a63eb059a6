use std::fmt;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use deck_core::{run_in_background, BackgroundExecutor, CellStore, ReactiveCell, StoreError};
use deck_model::{PageStack, StackId, TagRegistry};
use log::debug;

use crate::error::{RepositoryError, Result};
use crate::format::PageStackRecord;
use crate::fs::{lock_io, read_json, remove_if_exists, write_json_atomic, TEMP_EXTENSION};
use crate::PersistedPage;

const STACK_DIR: &str = "page_stacks";

/// Persistence of page stacks, one cell per stack.
pub trait PageStackRepository<P: 'static> {
    /// Writes `stack` and returns a cell backed by its file.
    fn save_page_stack(&self, stack: PageStack<P>) -> Result<ReactiveCell<PageStack<P>>>;

    /// Reads the stack stored under `id`.
    fn load_page_stack(&self, id: StackId) -> Result<ReactiveCell<PageStack<P>>>;

    fn delete_page_stack(&self, id: StackId) -> Result<()>;

    fn delete_all_page_stacks(&self) -> Result<()>;
}

/// Thread-safe file access for page stacks.
///
/// All reads and writes of one store are serialized, so two saves never
/// interleave even when they target different files.
pub struct PageStackStore<P> {
    dir: PathBuf,
    registry: Arc<TagRegistry<P>>,
    io_lock: Mutex<()>,
}

impl<P: PersistedPage> PageStackStore<P> {
    pub fn new(root: impl AsRef<Path>, registry: Arc<TagRegistry<P>>) -> Self {
        Self {
            dir: root.as_ref().join(STACK_DIR),
            registry,
            io_lock: Mutex::new(()),
        }
    }

    pub fn path_of(&self, id: StackId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn write(&self, stack: &PageStack<P>) -> Result<()> {
        let record = PageStackRecord::encode(stack, &self.registry)?;
        let path = self.path_of(stack.id());
        let _guard = lock_io(&self.io_lock);
        write_json_atomic(&path, &record)?;
        debug!(
            "saved page stack {} ({} pages) to {}",
            stack.id(),
            stack.len(),
            path.display()
        );
        Ok(())
    }

    pub fn read(&self, id: StackId) -> Result<PageStack<P>> {
        let path = self.path_of(id);
        let record: PageStackRecord = {
            let _guard = lock_io(&self.io_lock);
            read_json(&path)?
        };
        let stack = record.decode(&path, id, &self.registry)?;
        debug!("loaded page stack {id} from {}", path.display());
        Ok(stack)
    }

    pub fn delete(&self, id: StackId) -> Result<()> {
        let path = self.path_of(id);
        let _guard = lock_io(&self.io_lock);
        remove_if_exists(&path)?;
        remove_if_exists(&path.with_extension(TEMP_EXTENSION))
    }

    /// Removes every stack file, including leftovers of interrupted writes.
    pub fn delete_all(&self) -> Result<()> {
        let _guard = lock_io(&self.io_lock);
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(RepositoryError::io(&self.dir, err)),
        };
        let mut removed = 0usize;
        for entry in entries {
            let path = entry.map_err(|err| RepositoryError::io(&self.dir, err))?.path();
            if path.is_file() {
                remove_if_exists(&path)?;
                removed += 1;
            }
        }
        debug!("deleted {removed} page stack files from {}", self.dir.display());
        Ok(())
    }

    /// Ids of the stacks currently stored, ascending.
    pub fn stored_ids(&self) -> Result<Vec<StackId>> {
        let _guard = lock_io(&self.io_lock);
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(RepositoryError::io(&self.dir, err)),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| RepositoryError::io(&self.dir, err))?.path();
            // `<id>.json` only; temp files are never valid data
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u64>().ok())
            {
                ids.push(StackId::new(id));
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

impl<P> fmt::Debug for PageStackStore<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageStackStore")
            .field("dir", &self.dir)
            .finish()
    }
}

/// Cell backing that rewrites the stack's file.
struct StackFile<P> {
    store: Arc<PageStackStore<P>>,
}

impl<P: PersistedPage> CellStore<PageStack<P>> for StackFile<P> {
    fn store(&self, value: &PageStack<P>) -> std::result::Result<(), StoreError> {
        self.store.write(value).map_err(StoreError::new)
    }
}

/// [`PageStackRepository`] over a directory of JSON files.
pub struct FilePageStackRepository<P> {
    store: Arc<PageStackStore<P>>,
}

impl<P> Clone for FilePageStackRepository<P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<P: PersistedPage> FilePageStackRepository<P> {
    pub fn new(root: impl AsRef<Path>, registry: Arc<TagRegistry<P>>) -> Self {
        Self::from_store(Arc::new(PageStackStore::new(root, registry)))
    }

    pub fn from_store(store: Arc<PageStackStore<P>>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<PageStackStore<P>> {
        &self.store
    }

    /// Wraps an already stored stack in a cell backed by its file.
    pub fn cell_for(&self, stack: PageStack<P>) -> ReactiveCell<PageStack<P>> {
        let backing: Rc<dyn CellStore<PageStack<P>>> = Rc::new(StackFile {
            store: Arc::clone(&self.store),
        });
        ReactiveCell::with_store(stack, backing)
    }

    /// Loads the stack on `executor`; the cell is built once the caller
    /// awaits the result on the UI thread.
    pub fn load_page_stack_in_background(
        &self,
        executor: &dyn BackgroundExecutor,
        id: StackId,
    ) -> impl Future<Output = Result<ReactiveCell<PageStack<P>>>> + 'static {
        let store = Arc::clone(&self.store);
        let task = run_in_background(executor, move || store.read(id));
        let repository = self.clone();
        async move { Ok(repository.cell_for(task.await?)) }
    }

    /// Saves the stack on `executor`.
    pub fn save_page_stack_in_background(
        &self,
        executor: &dyn BackgroundExecutor,
        stack: PageStack<P>,
    ) -> impl Future<Output = Result<ReactiveCell<PageStack<P>>>> + 'static {
        let store = Arc::clone(&self.store);
        let written = stack.clone();
        let task = run_in_background(executor, move || store.write(&written));
        let repository = self.clone();
        async move {
            task.await?;
            Ok(repository.cell_for(stack))
        }
    }
}

impl<P: PersistedPage> PageStackRepository<P> for FilePageStackRepository<P> {
    fn save_page_stack(&self, stack: PageStack<P>) -> Result<ReactiveCell<PageStack<P>>> {
        self.store.write(&stack)?;
        Ok(self.cell_for(stack))
    }

    fn load_page_stack(&self, id: StackId) -> Result<ReactiveCell<PageStack<P>>> {
        let stack = self.store.read(id)?;
        Ok(self.cell_for(stack))
    }

    fn delete_page_stack(&self, id: StackId) -> Result<()> {
        self.store.delete(id)
    }

    fn delete_all_page_stacks(&self) -> Result<()> {
        self.store.delete_all()
    }
}

impl<P> fmt::Debug for FilePageStackRepository<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePageStackRepository")
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/page_stack_tests.rs"]
mod tests;
