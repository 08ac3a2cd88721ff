//! The cell store: an id-to-cell map plus a known head, ordered by the
//! doubly-linked `prev`/`next` pointers carried by each cell.

use std::collections::{HashMap, HashSet};

use crate::cell::{Cell, CellId};
use crate::error::StoreError;

/// In-memory ordered collection of cells.
///
/// Every public mutation leaves the links consistent: one acyclic chain from
/// `head`, reciprocal pointers, nothing unreachable.
#[derive(Debug, Clone, Default)]
pub struct CellStore {
    cells: HashMap<CellId, Cell>,
    head: Option<CellId>,
    /// Largest id ever held this session. Deletions never lower it.
    high_water: Option<CellId>,
}

/// A cell removed from the store, with the neighbors it was spliced out from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unlinked {
    pub cell: Cell,
    pub prev: Option<CellId>,
    pub next: Option<CellId>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from cells that already carry their links.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.replace_all(cells)?;
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn head(&self) -> Option<CellId> {
        self.head
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    pub fn prev_of(&self, id: CellId) -> Option<CellId> {
        self.cells.get(&id).and_then(|cell| cell.prev)
    }

    pub fn next_of(&self, id: CellId) -> Option<CellId> {
        self.cells.get(&id).and_then(|cell| cell.next)
    }

    /// The id the next insertion will receive. Never negative, so never the
    /// wire sentinel. `None` once the id space is used up.
    pub fn peek_next_id(&self) -> Option<CellId> {
        match self.high_water {
            Some(high) => high.succ().map(|id| id.max(CellId(0))),
            None => Some(CellId(0)),
        }
    }

    fn allocate_id(&mut self) -> Result<CellId, StoreError> {
        let id = self.peek_next_id().ok_or(StoreError::IdsExhausted)?;
        self.high_water = Some(id);
        Ok(id)
    }

    /// Splice a new cell in after `anchor` and return its id.
    ///
    /// The new id is greater than every id the store has held.
    pub fn insert_after(&mut self, anchor: CellId, text: impl Into<String>) -> Result<CellId, StoreError> {
        let next = self
            .cells
            .get(&anchor)
            .ok_or(StoreError::InvalidAnchor(anchor))?
            .next;
        let id = self.allocate_id()?;

        if let Some(next) = next {
            if let Some(cell) = self.cells.get_mut(&next) {
                cell.prev = Some(id);
            }
        }
        if let Some(cell) = self.cells.get_mut(&anchor) {
            cell.next = Some(id);
        }
        self.cells
            .insert(id, Cell::linked(id, Some(anchor), next, text));
        Ok(id)
    }

    /// Splice a new cell in as the head of the list.
    pub fn insert_first(&mut self, text: impl Into<String>) -> Result<CellId, StoreError> {
        let id = self.allocate_id()?;
        let next = self.head;
        if let Some(next) = next {
            if let Some(cell) = self.cells.get_mut(&next) {
                cell.prev = Some(id);
            }
        }
        self.cells.insert(id, Cell::linked(id, None, next, text));
        self.head = Some(id);
        Ok(id)
    }

    /// Unlink and remove a cell. Remaining cells keep their ids.
    pub fn remove(&mut self, id: CellId) -> Result<Unlinked, StoreError> {
        let cell = self.cells.remove(&id).ok_or(StoreError::UnknownCell(id))?;
        let (prev, next) = (cell.prev, cell.next);

        match prev.and_then(|prev| self.cells.get_mut(&prev)) {
            Some(before) => before.next = next,
            None => self.head = next,
        }
        if let Some(after) = next.and_then(|next| self.cells.get_mut(&next)) {
            after.prev = prev;
        }

        Ok(Unlinked { cell, prev, next })
    }

    /// Walk the cells in document order.
    ///
    /// The walk borrows the store, so no mutation can interleave with it.
    /// Call again to restart.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.head,
            remaining: self.cells.len(),
        }
    }

    /// Ids in document order.
    pub fn ids(&self) -> Vec<CellId> {
        self.iter().map(|cell| cell.id).collect()
    }

    /// Zero-based position of a cell in document order.
    pub fn position(&self, id: CellId) -> Option<usize> {
        self.iter().position(|cell| cell.id == id)
    }

    /// Replace the whole store, recomputing the head from the cell whose
    /// `prev` is the sentinel. On error the store is left untouched.
    pub fn replace_all(&mut self, cells: impl IntoIterator<Item = Cell>) -> Result<(), StoreError> {
        let mut map = HashMap::new();
        for cell in cells {
            let id = cell.id;
            if map.insert(id, cell).is_some() {
                return Err(StoreError::Duplicate(id));
            }
        }

        let head = map
            .values()
            .filter(|cell| cell.prev.is_none())
            .map(|cell| cell.id)
            .min();
        validate_links(&map, head)?;

        self.high_water = map.keys().copied().max().max(self.high_water);
        self.cells = map;
        self.head = head;
        Ok(())
    }

    /// Check the linked-list invariant.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_links(&self.cells, self.head)
    }
}

fn validate_links(cells: &HashMap<CellId, Cell>, head: Option<CellId>) -> Result<(), StoreError> {
    let Some(head) = head else {
        return if cells.is_empty() {
            Ok(())
        } else {
            Err(StoreError::NoHead)
        };
    };
    if cells.get(&head).is_some_and(|cell| cell.prev.is_some()) {
        return Err(StoreError::NoHead);
    }

    let mut seen = HashSet::with_capacity(cells.len());
    let mut cursor = Some(head);
    while let Some(id) = cursor {
        if !seen.insert(id) {
            return Err(StoreError::Cycle(id));
        }
        let cell = cells.get(&id).ok_or(StoreError::UnknownCell(id))?;
        if let Some(next) = cell.next {
            match cells.get(&next) {
                Some(after) if after.prev == Some(id) => {}
                _ => return Err(StoreError::BrokenLink { from: id, to: next }),
            }
        }
        cursor = cell.next;
    }

    let orphaned = cells.len() - seen.len();
    if orphaned > 0 {
        return Err(StoreError::Orphaned { count: orphaned });
    }
    Ok(())
}

/// Document-order walk over a [`CellStore`].
pub struct Iter<'a> {
    store: &'a CellStore,
    cursor: Option<CellId>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Cell;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let cell = self.store.cells.get(&self.cursor?)?;
        self.remaining -= 1;
        self.cursor = cell.next;
        Some(cell)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
