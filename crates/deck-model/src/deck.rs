//! Persistent deck tree.
//!
//! A deck is a root [`Row`] whose children are the horizontal slots. A slot is
//! a card or a nested container. Containers are copy-on-write: every edit
//! returns a new container that shares unchanged subtrees with the receiver.

use std::fmt;
use std::sync::Arc;

/// Node of the deck tree.
#[derive(Clone, PartialEq)]
pub enum DeckNode<C> {
    Row(Row<C>),
    Column(Column<C>),
    Card(C),
}

impl<C> DeckNode<C> {
    pub fn as_card(&self) -> Option<&C> {
        match self {
            DeckNode::Card(card) => Some(card),
            _ => None,
        }
    }

    /// Cards under this node, depth first.
    pub fn card_count(&self) -> usize {
        match self {
            DeckNode::Row(row) => row.card_count(),
            DeckNode::Column(column) => column.card_count(),
            DeckNode::Card(_) => 1,
        }
    }

    fn collect_cards<'a>(&'a self, out: &mut Vec<&'a C>) {
        match self {
            DeckNode::Row(row) => row.iter().for_each(|child| child.collect_cards(out)),
            DeckNode::Column(column) => column.iter().for_each(|child| child.collect_cards(out)),
            DeckNode::Card(card) => out.push(card),
        }
    }

    fn children(&self) -> Option<&[DeckNode<C>]> {
        match self {
            DeckNode::Row(row) => Some(row.children()),
            DeckNode::Column(column) => Some(column.children()),
            DeckNode::Card(_) => None,
        }
    }

    /// Same node kind with different children.
    fn with_children(&self, children: Vec<DeckNode<C>>) -> DeckNode<C> {
        match self {
            DeckNode::Row(_) => DeckNode::Row(Row::new(children)),
            DeckNode::Column(_) => DeckNode::Column(Column::new(children)),
            DeckNode::Card(_) => unreachable!("cards have no children"),
        }
    }

    fn map<D>(&self, f: &mut impl FnMut(&C) -> D) -> DeckNode<D> {
        match self {
            DeckNode::Row(row) => DeckNode::Row(Row::new(row.iter().map(|n| n.map(f)).collect())),
            DeckNode::Column(column) => {
                DeckNode::Column(Column::new(column.iter().map(|n| n.map(f)).collect()))
            }
            DeckNode::Card(card) => DeckNode::Card(f(card)),
        }
    }

    fn try_map<D, E>(&self, f: &mut impl FnMut(&C) -> Result<D, E>) -> Result<DeckNode<D>, E> {
        Ok(match self {
            DeckNode::Row(row) => DeckNode::Row(Row::new(
                row.iter().map(|n| n.try_map(f)).collect::<Result<_, _>>()?,
            )),
            DeckNode::Column(column) => DeckNode::Column(Column::new(
                column.iter().map(|n| n.try_map(f)).collect::<Result<_, _>>()?,
            )),
            DeckNode::Card(card) => DeckNode::Card(f(card)?),
        })
    }
}

impl<C: fmt::Debug> fmt::Debug for DeckNode<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckNode::Row(row) => row.fmt(f),
            DeckNode::Column(column) => column.fmt(f),
            DeckNode::Card(card) => f.debug_tuple("Card").field(card).finish(),
        }
    }
}

macro_rules! container {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        pub struct $name<C> {
            children: Arc<Vec<DeckNode<C>>>,
        }

        impl<C> $name<C> {
            pub fn new(children: Vec<DeckNode<C>>) -> Self {
                Self {
                    children: Arc::new(children),
                }
            }

            pub fn empty() -> Self {
                Self::new(Vec::new())
            }

            pub fn len(&self) -> usize {
                self.children.len()
            }

            pub fn is_empty(&self) -> bool {
                self.children.is_empty()
            }

            pub fn children(&self) -> &[DeckNode<C>] {
                &self.children
            }

            pub fn iter(&self) -> std::slice::Iter<'_, DeckNode<C>> {
                self.children.iter()
            }

            /// Child at `index`.
            ///
            /// # Panics
            /// If `index >= len()`.
            pub fn get(&self, index: usize) -> &DeckNode<C> {
                self.check_index(index, self.len());
                &self.children[index]
            }

            pub fn card_count(&self) -> usize {
                self.children.iter().map(DeckNode::card_count).sum()
            }

            fn check_index(&self, index: usize, bound: usize) {
                assert!(
                    index < bound,
                    "index {index} out of range for {} of length {}",
                    $label,
                    self.len()
                );
            }
        }

        impl<C: Clone> $name<C> {
            /// Copy with `node` inserted before `index`.
            ///
            /// # Panics
            /// If `index > len()`.
            pub fn inserted(&self, index: usize, node: DeckNode<C>) -> Self {
                self.check_index(index, self.len() + 1);
                let mut children = self.children.as_ref().clone();
                children.insert(index, node);
                Self::new(children)
            }

            /// Copy without the child at `index`.
            ///
            /// # Panics
            /// If `index >= len()`.
            pub fn removed(&self, index: usize) -> Self {
                self.check_index(index, self.len());
                let mut children = self.children.as_ref().clone();
                children.remove(index);
                Self::new(children)
            }

            /// Copy with the child at `index` replaced by `node`.
            ///
            /// # Panics
            /// If `index >= len()`.
            pub fn replaced(&self, index: usize, node: DeckNode<C>) -> Self {
                self.check_index(index, self.len());
                let mut children = self.children.as_ref().clone();
                children[index] = node;
                Self::new(children)
            }
        }

        impl<C> Clone for $name<C> {
            fn clone(&self) -> Self {
                Self {
                    children: Arc::clone(&self.children),
                }
            }
        }

        impl<C: PartialEq> PartialEq for $name<C> {
            fn eq(&self, other: &Self) -> bool {
                self.children == other.children
            }
        }

        impl<C: fmt::Debug> fmt::Debug for $name<C> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.children).finish()
            }
        }
    };
}

container!(
    /// Horizontal container; the deck root is a row.
    Row,
    "row"
);

container!(
    /// Vertical container of cards sharing one horizontal slot.
    Column,
    "column"
);

/// The deck: a root row of horizontal slots.
#[derive(PartialEq)]
pub struct Deck<C> {
    root: Row<C>,
}

impl<C> Clone for Deck<C> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<C> Deck<C> {
    pub fn new(root: Row<C>) -> Self {
        Self { root }
    }

    /// Deck with one slot per card.
    pub fn from_cards(cards: impl IntoIterator<Item = C>) -> Self {
        Self::new(Row::new(cards.into_iter().map(DeckNode::Card).collect()))
    }

    pub fn root(&self) -> &Row<C> {
        &self.root
    }

    /// Cards flattened left to right, depth first.
    pub fn cards(&self) -> Vec<&C> {
        let mut out = Vec::new();
        self.root
            .iter()
            .for_each(|child| child.collect_cards(&mut out));
        out
    }

    /// Card at flattened `index`, found by descending into the one child
    /// that holds it.
    pub fn card(&self, index: usize) -> Option<&C> {
        let mut remaining = index;
        let mut children = self.root.children();
        'descend: loop {
            for child in children {
                let count = child.card_count();
                if remaining >= count {
                    remaining -= count;
                    continue;
                }
                match child {
                    DeckNode::Card(card) => return Some(card),
                    _ => {
                        children = child.children()?;
                        continue 'descend;
                    }
                }
            }
            return None;
        }
    }

    pub fn card_count(&self) -> usize {
        self.root.card_count()
    }

    /// Number of horizontal slots.
    pub fn slot_count(&self) -> usize {
        self.root.len()
    }

    /// Root slot holding the card at flattened `index`.
    pub fn slot_of_card(&self, index: usize) -> Option<usize> {
        let mut seen = 0;
        for (slot, child) in self.root.iter().enumerate() {
            let count = child.card_count();
            if index < seen + count {
                return Some(slot);
            }
            seen += count;
        }
        None
    }

    /// Child indices from the root down to the card at flattened `index`.
    pub fn path_of_card(&self, index: usize) -> Option<Vec<usize>> {
        let mut remaining = index;
        let mut path = Vec::new();
        let mut children = self.root.children();
        'descend: loop {
            for (position, child) in children.iter().enumerate() {
                let count = child.card_count();
                if remaining >= count {
                    remaining -= count;
                    continue;
                }
                path.push(position);
                match child.children() {
                    Some(grandchildren) => {
                        children = grandchildren;
                        continue 'descend;
                    }
                    None => return Some(path),
                }
            }
            return None;
        }
    }

    /// Flattened index of the first card matching `predicate`.
    pub fn position(&self, predicate: impl FnMut(&C) -> bool) -> Option<usize> {
        self.cards().into_iter().position(predicate)
    }

    pub fn map<D>(&self, mut f: impl FnMut(&C) -> D) -> Deck<D> {
        Deck::new(Row::new(self.root.iter().map(|n| n.map(&mut f)).collect()))
    }

    pub fn try_map<D, E>(&self, mut f: impl FnMut(&C) -> Result<D, E>) -> Result<Deck<D>, E> {
        Ok(Deck::new(Row::new(
            self.root
                .iter()
                .map(|n| n.try_map(&mut f))
                .collect::<Result<_, _>>()?,
        )))
    }
}

impl<C: Clone> Deck<C> {
    /// Copy with `card` as a new slot before `slot`.
    ///
    /// # Panics
    /// If `slot > slot_count()`.
    pub fn inserted_card(&self, slot: usize, card: C) -> Self {
        Self::new(self.root.inserted(slot, DeckNode::Card(card)))
    }

    /// Copy without the card at flattened `index`. Containers left empty are
    /// removed as well; the root row is kept even when empty.
    ///
    /// # Panics
    /// If `index >= card_count()`.
    pub fn removed_card(&self, index: usize) -> Self {
        let path = self.expect_path(index);
        let children = without_path(self.root.children(), &path);
        Self::new(Row::new(children))
    }

    /// Copy with the card at flattened `index` replaced by `card`.
    ///
    /// # Panics
    /// If `index >= card_count()`.
    pub fn replaced_card(&self, index: usize, card: C) -> Self {
        let path = self.expect_path(index);
        let children = replaced_at_path(self.root.children(), &path, card);
        Self::new(Row::new(children))
    }

    fn expect_path(&self, index: usize) -> Vec<usize> {
        match self.path_of_card(index) {
            Some(path) => path,
            None => panic!(
                "card index {index} out of range for deck with {} cards",
                self.card_count()
            ),
        }
    }
}

impl<C> Default for Deck<C> {
    fn default() -> Self {
        Self::new(Row::empty())
    }
}

impl<C: fmt::Debug> fmt::Debug for Deck<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deck").field("root", &self.root).finish()
    }
}

fn without_path<C: Clone>(children: &[DeckNode<C>], path: &[usize]) -> Vec<DeckNode<C>> {
    let mut out = children.to_vec();
    let (&first, rest) = match path.split_first() {
        Some(split) => split,
        None => return out,
    };
    if rest.is_empty() {
        out.remove(first);
        return out;
    }
    let node = &children[first];
    let grandchildren = node.children().unwrap_or(&[]);
    let remaining = without_path(grandchildren, rest);
    if remaining.is_empty() {
        out.remove(first);
    } else {
        out[first] = node.with_children(remaining);
    }
    out
}

fn replaced_at_path<C: Clone>(children: &[DeckNode<C>], path: &[usize], card: C) -> Vec<DeckNode<C>> {
    let mut out = children.to_vec();
    let (&first, rest) = match path.split_first() {
        Some(split) => split,
        None => return out,
    };
    if rest.is_empty() {
        out[first] = DeckNode::Card(card);
        return out;
    }
    let node = &children[first];
    let grandchildren = node.children().unwrap_or(&[]);
    out[first] = node.with_children(replaced_at_path(grandchildren, rest, card));
    out
}

#[cfg(test)]
#[path = "tests/deck_tests.rs"]
mod tests;
