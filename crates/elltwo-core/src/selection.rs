//! Active cell and multi-select set.

use std::collections::BTreeSet;

use crate::cell::CellId;
use crate::store::CellStore;

/// Direction of vertical movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

/// Which cell has focus and which cells are marked for batch operations.
///
/// The controller only tracks ids. The session owns the display side of
/// activation (scrolling, focus, highlight).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    active: Option<CellId>,
    selected: BTreeSet<CellId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<CellId> {
        self.active
    }

    /// Make `id` the active cell and return the previously active one.
    pub fn activate(&mut self, id: CellId) -> Option<CellId> {
        self.active.replace(id)
    }

    /// The linked neighbor of the active cell in `direction`.
    pub fn neighbor(&self, store: &CellStore, direction: Direction) -> Option<CellId> {
        let active = self.active?;
        match direction {
            Direction::Up => store.prev_of(active),
            Direction::Down => store.next_of(active),
        }
    }

    /// Move to the neighbor in `direction`. Returns false, changing nothing,
    /// at a list boundary.
    fn step(&mut self, store: &CellStore, direction: Direction) -> bool {
        match self.neighbor(store, direction) {
            Some(id) => {
                self.active = Some(id);
                true
            }
            None => false,
        }
    }

    pub fn activate_prev(&mut self, store: &CellStore) -> bool {
        self.step(store, Direction::Up)
    }

    pub fn activate_next(&mut self, store: &CellStore) -> bool {
        self.step(store, Direction::Down)
    }

    /// Add `id` to the selected set, emptying it first when `clear` is set.
    pub fn select(&mut self, id: CellId, clear: bool) {
        if clear {
            self.selected.clear();
        }
        self.selected.insert(id);
    }

    /// Forget everything. Used before a full reload.
    pub fn reset(&mut self) {
        self.active = None;
        self.selected.clear();
    }

    pub fn is_selected(&self, id: CellId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_len(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in document order. Ids the store no longer holds are
    /// skipped.
    pub fn selected_in_order(&self, store: &CellStore) -> Vec<CellId> {
        store
            .iter()
            .map(|cell| cell.id)
            .filter(|id| self.selected.contains(id))
            .collect()
    }

    /// Drop ids that are no longer in `store`.
    pub fn retain_existing(&mut self, store: &CellStore) {
        self.selected.retain(|id| store.contains(*id));
        if self.active.is_some_and(|id| !store.contains(id)) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    fn chain() -> CellStore {
        CellStore::from_cells([
            Cell::linked(CellId(1), None, Some(CellId(2)), "a"),
            Cell::linked(CellId(2), Some(CellId(1)), Some(CellId(3)), "b"),
            Cell::linked(CellId(3), Some(CellId(2)), None, "c"),
        ])
        .unwrap()
    }

    #[test]
    fn stepping_stops_at_boundaries() {
        let store = chain();
        let mut selection = Selection::new();
        assert!(!selection.activate_next(&store));

        selection.activate(CellId(1));
        assert!(!selection.activate_prev(&store));
        assert_eq!(selection.active(), Some(CellId(1)));

        assert!(selection.activate_next(&store));
        assert!(selection.activate_next(&store));
        assert!(!selection.activate_next(&store));
        assert_eq!(selection.active(), Some(CellId(3)));
    }

    #[test]
    fn selection_is_reported_in_document_order() {
        let store = chain();
        let mut selection = Selection::new();
        selection.select(CellId(3), true);
        selection.select(CellId(1), false);
        assert_eq!(selection.selected_in_order(&store), vec![CellId(1), CellId(3)]);

        selection.select(CellId(2), true);
        assert_eq!(selection.selected_in_order(&store), vec![CellId(2)]);
    }

    #[test]
    fn retain_existing_drops_removed_cells() {
        let mut store = chain();
        let mut selection = Selection::new();
        selection.activate(CellId(2));
        selection.select(CellId(2), true);
        selection.select(CellId(3), false);

        store.remove(CellId(2)).unwrap();
        selection.retain_existing(&store);
        assert_eq!(selection.active(), None);
        assert_eq!(selection.selected_len(), 1);
        assert!(selection.is_selected(CellId(3)));
    }
}
