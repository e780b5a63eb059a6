//! Observable single-slot values.
//!
//! A [`ReactiveCell`] holds one committed value. Writes commit synchronously
//! and notify every observer before returning. A cell may be backed by a
//! [`CellStore`]; such a cell persists the value before committing it, so the
//! in-memory value never runs ahead of what is stored.

use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt;
use std::rc::{Rc, Weak};

/// Error returned by a [`CellStore`] that failed to persist a value.
#[derive(Debug, thiserror::Error)]
#[error("failed to persist cell value: {source}")]
pub struct StoreError {
    #[source]
    source: Box<dyn Error + Send + Sync + 'static>,
}

impl StoreError {
    pub fn new(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> Box<dyn Error + Send + Sync + 'static> {
        self.source
    }
}

/// Durable backing for a cell.
pub trait CellStore<T> {
    fn store(&self, value: &T) -> Result<(), StoreError>;
}

type Observer<T> = Rc<dyn Fn(&T) + 'static>;

struct ObserverEntry<T> {
    id: u64,
    observer: Observer<T>,
}

struct CellInner<T> {
    value: RefCell<Rc<T>>,
    observers: RefCell<Vec<ObserverEntry<T>>>,
    next_observer_id: Cell<u64>,
    store: Option<Rc<dyn CellStore<T>>>,
}

impl<T> CellInner<T> {
    fn remove_observer(&self, id: u64) {
        self.observers.borrow_mut().retain(|entry| entry.id != id);
    }
}

/// Writable observable value.
pub struct ReactiveCell<T: 'static> {
    inner: Rc<CellInner<T>>,
}

/// Read-only view of a [`ReactiveCell`].
pub struct ReadOnlyCell<T: 'static> {
    inner: Rc<CellInner<T>>,
}

impl<T: 'static> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Clone for ReadOnlyCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> ReactiveCell<T> {
    pub fn new(value: T) -> Self {
        Self::from_parts(value, None)
    }

    /// Creates a cell whose writes are persisted through `store`.
    ///
    /// `value` must already be the stored value; it is not written again.
    pub fn with_store(value: T, store: Rc<dyn CellStore<T>>) -> Self {
        Self::from_parts(value, Some(store))
    }

    fn from_parts(value: T, store: Option<Rc<dyn CellStore<T>>>) -> Self {
        Self {
            inner: Rc::new(CellInner {
                value: RefCell::new(Rc::new(value)),
                observers: RefCell::new(Vec::new()),
                next_observer_id: Cell::new(1),
                store,
            }),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.inner.store.is_some()
    }

    pub fn as_read_only(&self) -> ReadOnlyCell<T> {
        ReadOnlyCell {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&**self.inner.value.borrow())
    }

    /// Commits `value` and notifies observers.
    ///
    /// A store-backed cell persists first; if that fails the previous value is
    /// kept, no observer runs and the error is returned.
    pub fn set(&self, value: T) -> Result<(), StoreError> {
        if let Some(store) = &self.inner.store {
            store.store(&value)?;
        }
        *self.inner.value.borrow_mut() = Rc::new(value);
        self.notify_observers();
        Ok(())
    }

    /// Read-modify-write with the same commit rules as [`set`](Self::set).
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError>
    where
        T: Clone,
    {
        let mut next = self.get();
        let result = f(&mut next);
        self.set(next)?;
        Ok(result)
    }

    /// Registers `observer`, called after every committed write.
    ///
    /// Observers may read and write the cell; a write from an observer
    /// notifies every observer again before the outer notification resumes.
    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        subscribe(&self.inner, Rc::new(observer))
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify_observers(&self) {
        // snapshot so observers may subscribe, unsubscribe or read the cell
        let observers: Vec<Observer<T>> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|entry| Rc::clone(&entry.observer))
            .collect();
        // observers get the value committed by this write even if one of them
        // writes the cell again
        let value = Rc::clone(&self.inner.value.borrow());
        for observer in observers {
            observer(&value);
        }
    }
}

impl<T: Clone + 'static> ReactiveCell<T> {
    pub fn get(&self) -> T {
        T::clone(&**self.inner.value.borrow())
    }
}

impl<T: 'static> ReadOnlyCell<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&**self.inner.value.borrow())
    }

    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        subscribe(&self.inner, Rc::new(observer))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static> ReadOnlyCell<T> {
    pub fn get(&self) -> T {
        T::clone(&**self.inner.value.borrow())
    }
}

fn subscribe<T: 'static>(inner: &Rc<CellInner<T>>, observer: Observer<T>) -> Subscription {
    let id = inner.next_observer_id.get();
    inner.next_observer_id.set(id + 1);
    inner
        .observers
        .borrow_mut()
        .push(ObserverEntry { id, observer });
    let weak: Weak<CellInner<T>> = Rc::downgrade(inner);
    Subscription {
        unsubscribe: Some(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove_observer(id);
            }
        })),
    }
}

/// Keeps an observer attached; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    /// Leaves the observer attached for the lifetime of the cell.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.unsubscribe.is_some())
            .finish()
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("value", &**self.inner.value.borrow())
            .field("persistent", &self.inner.store.is_some())
            .finish()
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ReadOnlyCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyCell")
            .field("value", &**self.inner.value.borrow())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/cell_tests.rs"]
mod tests;
