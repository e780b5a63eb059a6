use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use deck_core::collections::namespaced_key;

// generated ids stay below this bit, named ids set it
const NAMED_BIT: u64 = 1 << 63;

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a transition element on a page.
///
/// The same id on two pages marks the elements as counterparts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutId(u64);

impl LayoutId {
    /// Fresh process-unique id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed) & !NAMED_BIT)
    }

    /// Id derived from `name`; equal names give equal ids.
    pub fn named(name: &str) -> Self {
        Self(namespaced_key("layout-id", name) | NAMED_BIT)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 & NAMED_BIT != 0 {
            write!(f, "LayoutId(named {:#x})", self.0 & !NAMED_BIT)
        } else {
            write!(f, "LayoutId({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LayoutId;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(LayoutId::new(), LayoutId::new());
    }

    #[test]
    fn named_ids_agree_across_calls() {
        assert_eq!(LayoutId::named("avatar"), LayoutId::named("avatar"));
        assert_ne!(LayoutId::named("avatar"), LayoutId::named("banner"));
        assert_ne!(LayoutId::named("avatar"), LayoutId::new());
    }
}
