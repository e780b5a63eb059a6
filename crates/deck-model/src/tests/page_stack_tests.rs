use super::*;
use proptest::prelude::*;

fn stack(pages: &[&'static str]) -> PageStack<&'static str> {
    let mut stack = PageStack::new(StackId::new(0), pages[0]);
    for page in &pages[1..] {
        stack = stack.added(*page);
    }
    stack
}

#[test]
fn push_then_walk_back_to_root() {
    let stack = PageStack::new(StackId::new(0), "0").added("1").added("2");
    assert_eq!(*stack.head(), "2");

    let tail = stack.tail_or_none().expect("two pages below");
    assert_eq!(*tail.head(), "1");

    let root = tail.tail_or_none().expect("one page below");
    assert_eq!(*root.head(), "0");

    assert!(root.tail_or_none().is_none());
}

#[test]
fn added_leaves_receiver_untouched() {
    let base = stack(&["a", "b"]);
    let pushed = base.added("c");
    assert_eq!(base.len(), 2);
    assert_eq!(*base.head(), "b");
    assert_eq!(pushed.len(), 3);
    assert!(pushed.tail_or_none().unwrap().same_version(&base));
}

#[test]
fn popped_ids_are_never_reissued() {
    let base = stack(&["a"]);
    let first = base.added("b");
    let popped = first.tail_or_none().unwrap();
    let second = popped.added("c");
    assert_ne!(first.head_id(), second.head_id());
    assert!(second.head_id() > first.head_id());
}

#[test]
fn iter_runs_head_to_root() {
    let stack = stack(&["a", "b", "c"]);
    let pages: Vec<_> = stack.iter().map(|(_, page)| *page).collect();
    assert_eq!(pages, ["c", "b", "a"]);
    assert_eq!(stack.iter().len(), 3);
}

#[test]
fn restore_rebuilds_history_and_allocator() {
    let restored = PageStack::restore(
        StackId::new(4),
        10,
        vec![(PageId::new(7), "top"), (PageId::new(2), "root")],
    )
    .unwrap();
    assert_eq!(restored.id(), StackId::new(4));
    assert_eq!(restored.len(), 2);
    assert_eq!(restored.head_id(), PageId::new(7));
    assert_eq!(restored.added("next").head_id(), PageId::new(10));
}

#[test]
fn restore_rejects_invalid_frames() {
    assert_eq!(
        PageStack::<&str>::restore(StackId::new(0), 1, Vec::new()).unwrap_err(),
        RestoreError::Empty
    );
    assert!(matches!(
        PageStack::restore(
            StackId::new(0),
            5,
            vec![(PageId::new(1), "a"), (PageId::new(3), "b")]
        ),
        Err(RestoreError::OutOfOrder { .. })
    ));
    assert!(matches!(
        PageStack::restore(StackId::new(0), 2, vec![(PageId::new(2), "a")]),
        Err(RestoreError::IdNotAllocated { .. })
    ));
}

#[test]
fn deep_history_drops_without_overflow() {
    let mut stack = PageStack::new(StackId::new(0), 0u32);
    for page in 1..200_000 {
        stack = stack.added(page);
    }
    assert_eq!(stack.len(), 200_000);
    drop(stack);
}

proptest! {
    #[test]
    fn tails_walk_the_full_history(pages in prop::collection::vec(any::<u16>(), 1..40)) {
        let mut stack = PageStack::new(StackId::new(1), pages[0]);
        for page in &pages[1..] {
            stack = stack.added(*page);
        }

        let mut seen = Vec::new();
        let mut current = Some(stack);
        while let Some(version) = current {
            seen.push(*version.head());
            current = version.tail_or_none();
        }
        seen.reverse();
        prop_assert_eq!(seen, pages);
    }

    #[test]
    fn page_ids_strictly_decrease_towards_root(pushes in 1usize..30) {
        let mut stack = PageStack::new(StackId::new(1), ());
        for _ in 0..pushes {
            stack = stack.added(());
        }
        let ids: Vec<_> = stack.iter().map(|(id, _)| id).collect();
        prop_assert!(ids.windows(2).all(|pair| pair[0] > pair[1]));
        prop_assert!(ids.iter().all(|id| id.get() < stack.next_page_id()));
    }
}
