use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use deck_animation::AnimationType;
use deck_core::collections::map::HashMap;
use deck_core::{ReactiveCell, ReadOnlyCell, RuntimeHandle, Subscription};
use deck_model::{DeckNode, PageStack, StackId, Tagged};
use deck_repository::{PageDeck, PageStackRepository};
use deck_scroll::{CardAlignment, CardLayout, DragSession, ScrollEngine, ScrollJob};
use deck_transition::{
    PageKey, PageState, PageTransitionRegistry, PageTransitionState, TransitionAnimator,
    TransitionCoordinateTracker, TransitionDirection,
};
use log::{debug, error};

use crate::config::{DeckConfig, DeckLayoutMode};
use crate::error::StateError;
use crate::page_stack_state::PageStackState;

/// Geometry of the deck in the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckSettings {
    pub mode: DeckLayoutMode,
    pub card_spacing: f32,
    pub padding: f32,
    pub viewport_width: f32,
}

impl DeckSettings {
    pub fn from_config(config: &DeckConfig, viewport_width: f32) -> Self {
        Self {
            mode: config.layout,
            card_spacing: config.card_spacing,
            padding: config.padding,
            viewport_width,
        }
    }

    pub fn layout(&self, card_count: usize) -> CardLayout {
        match self.mode {
            DeckLayoutMode::SingleColumn => {
                CardLayout::single_column(card_count, self.viewport_width, self.card_spacing)
            }
            DeckLayoutMode::MultiColumn { columns } => CardLayout::multi_column(
                card_count,
                self.viewport_width,
                columns,
                self.card_spacing,
                self.padding,
            ),
        }
    }
}

struct DeckShared<P: 'static> {
    runtime: RuntimeHandle,
    deck: ReactiveCell<PageDeck<P>>,
    stacks: Rc<dyn PageStackRepository<P>>,
    scroll: ScrollEngine,
    settings: Cell<DeckSettings>,
    active: ReactiveCell<usize>,
    registry: PageTransitionRegistry,
    tracker: TransitionCoordinateTracker,
    running: RefCell<HashMap<StackId, TransitionAnimator>>,
    scroll_curve: AnimationType,
    settle: RefCell<Option<Subscription>>,
}

/// The deck, its scroll position and the active card.
///
/// Every deck edit is committed through the deck cell, which persists it
/// before observers see it. After each scroll settles the active card is
/// re-derived from the offset.
pub struct DeckState<P: 'static> {
    shared: Rc<DeckShared<P>>,
}

impl<P: 'static> Clone for DeckState<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<P: 'static> DeckState<P> {
    pub fn new(
        runtime: RuntimeHandle,
        deck: ReactiveCell<PageDeck<P>>,
        stacks: Rc<dyn PageStackRepository<P>>,
        settings: DeckSettings,
        registry: PageTransitionRegistry,
    ) -> Self {
        let card_count = deck.with(|deck| deck.card_count());
        let scroll = ScrollEngine::new(runtime.clone(), settings.layout(card_count));
        let shared = Rc::new(DeckShared {
            runtime,
            deck,
            stacks,
            scroll,
            settings: Cell::new(settings),
            active: ReactiveCell::new(0),
            registry,
            tracker: TransitionCoordinateTracker::new(),
            running: RefCell::new(HashMap::default()),
            scroll_curve: AnimationType::default(),
            settle: RefCell::new(None),
        });
        let weak = Rc::downgrade(&shared);
        let subscription = shared.scroll.scroll_in_progress().subscribe(move |in_progress| {
            if *in_progress {
                return;
            }
            if let Some(shared) = weak.upgrade() {
                DeckState { shared }.settle_active_card();
            }
        });
        *shared.settle.borrow_mut() = Some(subscription);
        Self { shared }
    }

    /// Current deck value.
    pub fn deck(&self) -> PageDeck<P> {
        self.shared.deck.get()
    }

    pub fn deck_cell(&self) -> ReadOnlyCell<PageDeck<P>> {
        self.shared.deck.as_read_only()
    }

    pub fn card_count(&self) -> usize {
        self.shared.deck.with(|deck| deck.card_count())
    }

    pub fn active_card_index(&self) -> usize {
        self.shared.active.get()
    }

    pub fn active_card(&self) -> ReadOnlyCell<usize> {
        self.shared.active.as_read_only()
    }

    pub fn settings(&self) -> DeckSettings {
        self.shared.settings.get()
    }

    pub fn scroll_engine(&self) -> &ScrollEngine {
        &self.shared.scroll
    }

    /// Where layout passes record element coordinates for transitions.
    pub fn coordinate_tracker(&self) -> &TransitionCoordinateTracker {
        &self.shared.tracker
    }

    /// Navigation context of the card at `index`.
    pub fn page_stack_state(&self, index: usize) -> Option<PageStackState<P>> {
        let card = self.shared.deck.with(|deck| deck.card(index).cloned())?;
        Some(PageStackState::new(self.clone(), card))
    }

    /// Card index of stack `id`.
    pub fn index_of_stack(&self, id: StackId) -> Option<usize> {
        self.shared
            .deck
            .with(|deck| deck.position(|card| card.with(PageStack::id) == id))
    }

    /// Adds a single-page card right after the active card's slot, makes it
    /// active and scrolls it into view. Returns the new card's index.
    pub fn add_card(&self, page: P) -> Result<usize, StateError> {
        let deck = self.deck();
        let id = next_stack_id(&deck);
        let slot = deck
            .slot_of_card(self.active_card_index())
            .map_or(deck.slot_count(), |slot| slot + 1);
        let index: usize = deck.root().iter().take(slot).map(DeckNode::card_count).sum();

        let stack = self.shared.stacks.save_page_stack(PageStack::new(id, page))?;
        if let Err(err) = self.shared.deck.set(deck.inserted_card(slot, stack)) {
            error!("failed to save deck after adding card {id}: {err}");
            if let Err(err) = self.shared.stacks.delete_page_stack(id) {
                error!("failed to delete orphaned page stack {id}: {err}");
            }
            return Err(err.into());
        }
        debug!("added card {id} at index {index}");
        self.refresh_layout();
        self.set_active(index);
        self.reveal(index);
        Ok(index)
    }

    /// Removes the card at `index` and deletes its stack.
    pub fn remove_card(&self, index: usize) -> Result<(), StateError> {
        let deck = self.deck();
        let Some(id) = deck.card(index).map(|card| card.with(PageStack::id)) else {
            return Err(StateError::CardOutOfRange {
                index,
                card_count: deck.card_count(),
            });
        };
        if let Err(err) = self.shared.deck.set(deck.removed_card(index)) {
            error!("failed to save deck after removing card {id}: {err}");
            return Err(err.into());
        }
        if let Err(err) = self.shared.stacks.delete_page_stack(id) {
            error!("failed to delete page stack {id}: {err}");
        }
        let running = self.shared.running.borrow_mut().remove(&id);
        if let Some(animator) = running {
            animator.cancel();
        }
        self.shared.tracker.retain(|page| page.stack != id);
        debug!("removed card {id} at index {index}");

        self.refresh_layout();
        let active = self.active_card_index();
        let card_count = self.card_count();
        let next = if active > index {
            active - 1
        } else {
            active.min(card_count.saturating_sub(1))
        };
        self.set_active(next);
        if card_count > 0 {
            self.jump_to(next);
        }
        Ok(())
    }

    /// Makes card `index` active and scrolls it into view if needed.
    pub fn activate_card(&self, index: usize) -> Result<Option<ScrollJob>, StateError> {
        let card_count = self.card_count();
        if index >= card_count {
            return Err(StateError::CardOutOfRange { index, card_count });
        }
        self.set_active(index);
        Ok(self.reveal(index))
    }

    pub fn animate_scroll_to(
        &self,
        index: usize,
        alignment: CardAlignment,
    ) -> Result<ScrollJob, StateError> {
        Ok(self
            .shared
            .scroll
            .animate_scroll_to(index, alignment, self.shared.scroll_curve)?)
    }

    /// Flings with `velocity` in scroll space.
    pub fn fling(&self, velocity: f32) -> Result<ScrollJob, StateError> {
        Ok(self.shared.scroll.fling(velocity)?)
    }

    pub fn begin_drag(&self) -> Result<DragSession, StateError> {
        Ok(self.shared.scroll.begin_drag()?)
    }

    pub fn set_viewport_width(&self, width: f32) {
        let settings = DeckSettings {
            viewport_width: width,
            ..self.settings()
        };
        self.shared.settings.set(settings);
        self.refresh_layout();
    }

    /// Cards overlapping the viewport.
    pub fn visible_cards(&self) -> Range<usize> {
        self.shared
            .scroll
            .layout()
            .visible_cards(self.shared.scroll.scroll_offset())
    }

    /// Running transition of stack `id`.
    pub fn transition_of(&self, id: StackId) -> Option<TransitionAnimator> {
        let mut running = self.shared.running.borrow_mut();
        running.retain(|_, animator| !animator.is_finished());
        running.get(&id).cloned()
    }

    fn refresh_layout(&self) {
        let layout = self.settings().layout(self.card_count());
        self.shared.scroll.set_layout(layout);
    }

    fn set_active(&self, index: usize) {
        if self.shared.active.get() == index {
            return;
        }
        if let Err(err) = self.shared.active.set(index) {
            error!("failed to update active card: {err}");
        }
    }

    /// Alignment that shows card `index` completely, or `None` when it
    /// already is.
    fn reveal_alignment(&self, index: usize) -> Option<CardAlignment> {
        let layout = self.shared.scroll.layout();
        let start = layout.card_start(index) - self.shared.scroll.scroll_offset();
        let end = start + layout.card_width();
        if start < 0.0 {
            Some(CardAlignment::Start)
        } else if end > layout.viewport_width() {
            Some(CardAlignment::End)
        } else {
            None
        }
    }

    /// Scrolls just enough to show card `index` completely.
    fn reveal(&self, index: usize) -> Option<ScrollJob> {
        let alignment = self.reveal_alignment(index)?;
        match self.animate_scroll_to(index, alignment) {
            Ok(job) => Some(job),
            Err(err) => {
                debug!("not scrolling to card {index}: {err}");
                None
            }
        }
    }

    /// Moves straight to where card `index` is shown completely, replacing
    /// any running scroll animation. A drag in progress keeps the offset.
    fn jump_to(&self, index: usize) {
        let Some(alignment) = self.reveal_alignment(index) else {
            return;
        };
        let target = self.shared.scroll.layout().aligned_offset(index, alignment);
        if let Err(err) = self.shared.scroll.scroll_to(target) {
            debug!("not moving to card {index}: {err}");
        }
    }

    fn settle_active_card(&self) {
        let layout = self.shared.scroll.layout();
        let offset = self.shared.scroll.scroll_offset();
        let active = self.active_card_index();
        let settled = match self.settings().mode {
            DeckLayoutMode::SingleColumn => layout.nearest_card(offset),
            DeckLayoutMode::MultiColumn { .. } => {
                let visible = layout.visible_cards(offset);
                if visible.is_empty() {
                    layout.nearest_card(offset)
                } else if visible.contains(&active) {
                    Some(active)
                } else if active < visible.start {
                    Some(visible.start)
                } else {
                    Some(visible.end - 1)
                }
            }
        };
        if let Some(index) = settled.filter(|index| *index != active) {
            debug!("scroll settled at {offset}, active card {active} -> {index}");
            self.set_active(index);
        }
    }
}

impl<P: Tagged + 'static> DeckState<P> {
    /// Starts the transition between the heads of `before` and `after`, two
    /// versions of the same stack. Without a registered transition only the
    /// coordinates of the pages no longer shown are dropped.
    pub(crate) fn start_transition(
        &self,
        direction: TransitionDirection,
        before: &PageStack<P>,
        after: &PageStack<P>,
    ) -> Option<TransitionAnimator> {
        let stack = after.id();
        let previous = self.shared.running.borrow_mut().remove(&stack);
        if let Some(previous) = previous {
            previous.cancel();
        }

        let tracker = &self.shared.tracker;
        let current = PageState::tracked(
            tracker,
            PageKey::new(stack, before.head_id()),
            before.head().type_tag(),
        );
        let target = PageState::tracked(
            tracker,
            PageKey::new(stack, after.head_id()),
            after.head().type_tag(),
        );
        let Some(elements) = self
            .shared
            .registry
            .resolve(direction, current.tag, target.tag)
        else {
            let shown = target.key;
            tracker.retain(|page| page.stack != stack || *page == shown);
            return None;
        };

        debug!(
            "{direction:?} transition in stack {stack} from {} to {}",
            current.tag, target.tag
        );
        let animator = TransitionAnimator::new(
            tracker.clone(),
            PageTransitionState::new(current, target),
            elements,
        );
        animator.drive(&self.shared.runtime.frame_clock());
        if !animator.is_finished() {
            self.shared
                .running
                .borrow_mut()
                .insert(stack, animator.clone());
        }
        Some(animator)
    }
}

impl<P: 'static> fmt::Debug for DeckState<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckState")
            .field("cards", &self.card_count())
            .field("active", &self.active_card_index())
            .field("settings", &self.settings())
            .field("scroll", &self.shared.scroll)
            .finish()
    }
}

/// One past the largest stack id in the deck.
fn next_stack_id<P>(deck: &PageDeck<P>) -> StackId {
    deck.cards()
        .iter()
        .map(|card| card.with(PageStack::id))
        .max()
        .map_or(StackId::new(0), StackId::next)
}

#[cfg(test)]
#[path = "tests/deck_state_tests.rs"]
mod tests;
