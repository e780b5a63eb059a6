//! On-disk records.

use std::path::Path;

use deck_model::{Column, Deck, DeckNode, PageId, PageStack, Row, StackId, TagRegistry, TaggedValue};
use serde::{Deserialize, Serialize};

use crate::error::{RepositoryError, Result};
use crate::PersistedPage;

/// Version written into every record.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PageRecord {
    id: PageId,
    page: TaggedValue,
}

/// One stack, pages ordered head first.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PageStackRecord {
    version: u32,
    id: StackId,
    next_page_id: u64,
    pages: Vec<PageRecord>,
}

impl PageStackRecord {
    pub(crate) fn encode<P: PersistedPage>(
        stack: &PageStack<P>,
        registry: &TagRegistry<P>,
    ) -> Result<Self> {
        let pages = stack
            .iter()
            .map(|(id, page)| {
                registry
                    .encode(page)
                    .map(|page| PageRecord { id, page })
                    .map_err(RepositoryError::encoding)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            version: FORMAT_VERSION,
            id: stack.id(),
            next_page_id: stack.next_page_id(),
            pages,
        })
    }

    pub(crate) fn decode<P: PersistedPage>(
        self,
        path: &Path,
        expected: StackId,
        registry: &TagRegistry<P>,
    ) -> Result<PageStack<P>> {
        check_version(path, self.version)?;
        if self.id != expected {
            return Err(RepositoryError::corrupt(
                path,
                format!("file holds stack {} instead of {expected}", self.id),
            ));
        }
        let pages = self
            .pages
            .into_iter()
            .map(|record| {
                registry
                    .decode(record.page)
                    .map(|page| (record.id, page))
                    .map_err(|err| RepositoryError::corrupt(path, err))
            })
            .collect::<Result<Vec<_>>>()?;
        PageStack::restore(self.id, self.next_page_id, pages)
            .map_err(|err| RepositoryError::corrupt(path, err))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum NodeRecord {
    Row { children: Vec<NodeRecord> },
    Column { children: Vec<NodeRecord> },
    Card { stack_id: StackId },
}

impl NodeRecord {
    fn encode(node: &DeckNode<StackId>) -> Self {
        match node {
            DeckNode::Row(row) => NodeRecord::Row {
                children: row.iter().map(NodeRecord::encode).collect(),
            },
            DeckNode::Column(column) => NodeRecord::Column {
                children: column.iter().map(NodeRecord::encode).collect(),
            },
            DeckNode::Card(id) => NodeRecord::Card { stack_id: *id },
        }
    }

    fn decode(self) -> DeckNode<StackId> {
        match self {
            NodeRecord::Row { children } => {
                DeckNode::Row(Row::new(children.into_iter().map(NodeRecord::decode).collect()))
            }
            NodeRecord::Column { children } => DeckNode::Column(Column::new(
                children.into_iter().map(NodeRecord::decode).collect(),
            )),
            NodeRecord::Card { stack_id } => DeckNode::Card(stack_id),
        }
    }
}

/// The deck layout; cards refer to stacks by id.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DeckRecord {
    version: u32,
    slots: Vec<NodeRecord>,
}

impl DeckRecord {
    pub(crate) fn encode(deck: &Deck<StackId>) -> Self {
        Self {
            version: FORMAT_VERSION,
            slots: deck.root().iter().map(NodeRecord::encode).collect(),
        }
    }

    pub(crate) fn decode(self, path: &Path) -> Result<Deck<StackId>> {
        check_version(path, self.version)?;
        let deck = Deck::new(Row::new(
            self.slots.into_iter().map(NodeRecord::decode).collect(),
        ));
        let mut seen = std::collections::BTreeSet::new();
        for id in deck.cards() {
            if !seen.insert(*id) {
                return Err(RepositoryError::corrupt(
                    path,
                    format!("stack {id} appears twice"),
                ));
            }
        }
        Ok(deck)
    }
}

fn check_version(path: &Path, version: u32) -> Result<()> {
    if version == FORMAT_VERSION {
        Ok(())
    } else {
        Err(RepositoryError::corrupt(
            path,
            format!("unsupported format version {version}, expected {FORMAT_VERSION}"),
        ))
    }
}
