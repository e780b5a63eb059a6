//! Immutable push/pop history of pages.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::page::{PageId, StackId};

/// Hands out page ids to every version of one stack.
///
/// Versions obtained through [`PageStack::added`] and
/// [`PageStack::tail_or_none`] share the allocator, so an id is never issued
/// twice even after the page that carried it was popped.
#[derive(Debug)]
struct Lineage {
    next_page_id: AtomicU64,
}

impl Lineage {
    fn starting_at(next: u64) -> Arc<Self> {
        Arc::new(Self {
            next_page_id: AtomicU64::new(next),
        })
    }

    fn allocate(&self) -> PageId {
        PageId::new(self.next_page_id.fetch_add(1, Ordering::Relaxed))
    }

    fn peek(&self) -> u64 {
        self.next_page_id.load(Ordering::Relaxed)
    }
}

struct Frame<P> {
    page_id: PageId,
    page: P,
    depth: usize,
    tail: Option<Arc<Frame<P>>>,
}

/// Persistent page stack with at least one page.
///
/// Pushing and popping are O(1) and leave the receiver untouched; versions
/// share their common history.
pub struct PageStack<P> {
    id: StackId,
    head: Arc<Frame<P>>,
    lineage: Arc<Lineage>,
}

impl<P> Clone for PageStack<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            head: Arc::clone(&self.head),
            lineage: Arc::clone(&self.lineage),
        }
    }
}

/// Reasons persisted frames cannot form a stack.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error("a page stack needs at least one page")]
    Empty,
    #[error("page ids must decrease from head to root, found {later} above {earlier}")]
    OutOfOrder { earlier: PageId, later: PageId },
    #[error("{page} was issued at or after the next free id {next_page_id}")]
    IdNotAllocated { page: PageId, next_page_id: u64 },
}

impl<P> PageStack<P> {
    /// Single-page stack; the page gets the first id of a new lineage.
    pub fn new(id: StackId, page: P) -> Self {
        let lineage = Lineage::starting_at(0);
        let page_id = lineage.allocate();
        Self {
            id,
            head: Arc::new(Frame {
                page_id,
                page,
                depth: 1,
                tail: None,
            }),
            lineage,
        }
    }

    /// Rebuilds a stack from persisted frames ordered head first.
    ///
    /// `next_page_id` resumes the lineage allocator and must exceed every id.
    pub fn restore(
        id: StackId,
        next_page_id: u64,
        pages: Vec<(PageId, P)>,
    ) -> Result<Self, RestoreError> {
        if pages.is_empty() {
            return Err(RestoreError::Empty);
        }
        for (page_id, _) in &pages {
            if page_id.get() >= next_page_id {
                return Err(RestoreError::IdNotAllocated {
                    page: *page_id,
                    next_page_id,
                });
            }
        }
        for pair in pages.windows(2) {
            let (later, earlier) = (pair[0].0, pair[1].0);
            if later <= earlier {
                return Err(RestoreError::OutOfOrder { earlier, later });
            }
        }

        let mut tail: Option<Arc<Frame<P>>> = None;
        for (page_id, page) in pages.into_iter().rev() {
            let depth = tail.as_ref().map_or(0, |frame| frame.depth) + 1;
            tail = Some(Arc::new(Frame {
                page_id,
                page,
                depth,
                tail,
            }));
        }
        let head = tail.ok_or(RestoreError::Empty)?;
        Ok(Self {
            id,
            head,
            lineage: Lineage::starting_at(next_page_id),
        })
    }

    pub fn id(&self) -> StackId {
        self.id
    }

    pub fn head(&self) -> &P {
        &self.head.page
    }

    pub fn head_id(&self) -> PageId {
        self.head.page_id
    }

    /// Number of pages, always at least one.
    pub fn len(&self) -> usize {
        self.head.depth
    }

    /// Id the next pushed page will receive.
    pub fn next_page_id(&self) -> u64 {
        self.lineage.peek()
    }

    /// New version with `page` on top.
    pub fn added(&self, page: P) -> Self {
        let page_id = self.lineage.allocate();
        Self {
            id: self.id,
            head: Arc::new(Frame {
                page_id,
                page,
                depth: self.head.depth + 1,
                tail: Some(Arc::clone(&self.head)),
            }),
            lineage: Arc::clone(&self.lineage),
        }
    }

    /// The version below the head, or `None` for a single-page stack.
    pub fn tail_or_none(&self) -> Option<Self> {
        self.head.tail.as_ref().map(|tail| Self {
            id: self.id,
            head: Arc::clone(tail),
            lineage: Arc::clone(&self.lineage),
        })
    }

    /// Pages from head to root.
    pub fn iter(&self) -> Iter<'_, P> {
        Iter {
            next: Some(&self.head),
        }
    }

    /// True when both values are the same version of the same lineage.
    pub fn same_version(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.head, &other.head)
    }
}

impl<P: PartialEq> PartialEq for PageStack<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<P: fmt::Debug> fmt::Debug for PageStack<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageStack")
            .field("id", &self.id)
            .field("pages", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

/// Iterator over `(PageId, &page)` from head to root.
pub struct Iter<'a, P> {
    next: Option<&'a Arc<Frame<P>>>,
}

impl<'a, P> Iterator for Iter<'a, P> {
    type Item = (PageId, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next?;
        self.next = frame.tail.as_ref();
        Some((frame.page_id, &frame.page))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.next.map_or(0, |frame| frame.depth);
        (remaining, Some(remaining))
    }
}

impl<P> ExactSizeIterator for Iter<'_, P> {}

impl<P> Drop for PageStack<P> {
    fn drop(&mut self) {
        // unlink uniquely owned frames iteratively; deep histories would
        // otherwise overflow the stack through recursive Arc drops
        let mut next = Arc::get_mut(&mut self.head).and_then(|frame| frame.tail.take());
        while let Some(frame) = next {
            match Arc::try_unwrap(frame) {
                Ok(mut frame) => next = frame.tail.take(),
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/page_stack_tests.rs"]
mod tests;
