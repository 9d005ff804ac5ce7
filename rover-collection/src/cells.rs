//! Pool of native-facing cells and the item index each one currently shows.

use crate::error::ProtocolInconsistency;
use rover_bridge::ProxyId;
use std::collections::HashMap;

/// Which notification a populate request raises on the cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellChange {
    /// A different item was bound
    Item,
    /// Same item as before, only the position may have moved
    Index,
}

/// One recycled row/tile
#[derive(Debug, Clone)]
pub struct Cell<I> {
    id: ProxyId,
    kind_id: u32,
    item_index: Option<usize>,
    item: Option<I>,
}

impl<I> Cell<I> {
    pub fn id(&self) -> ProxyId {
        self.id
    }

    pub fn kind_id(&self) -> u32 {
        self.kind_id
    }

    pub fn item_index(&self) -> Option<usize> {
        self.item_index
    }

    pub fn item(&self) -> Option<&I> {
        self.item.as_ref()
    }
}

/// Relation table from cell identity to binding metadata.
///
/// The pool never moves a binding between cells; it only updates the cell the host names.
#[derive(Debug)]
pub struct CellPool<I> {
    cells: HashMap<ProxyId, Cell<I>>,
}

impl<I: PartialEq> CellPool<I> {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    /// Track a freshly created cell. An id already present keeps its existing binding.
    pub fn materialize(&mut self, id: ProxyId, kind_id: u32) -> &Cell<I> {
        self.cells.entry(id).or_insert(Cell {
            id,
            kind_id,
            item_index: None,
            item: None,
        })
    }

    pub fn get(&self, id: ProxyId) -> Option<&Cell<I>> {
        self.cells.get(&id)
    }

    /// Bind `index` (and the item found there) to the cell the host is reusing
    pub fn populate(
        &mut self,
        id: ProxyId,
        index: usize,
        item: Option<I>,
    ) -> Result<CellChange, ProtocolInconsistency> {
        let cell = self
            .cells
            .get_mut(&id)
            .ok_or(ProtocolInconsistency::UnknownCell(id))?;

        cell.item_index = Some(index);
        if cell.item == item {
            Ok(CellChange::Index)
        } else {
            cell.item = item;
            Ok(CellChange::Item)
        }
    }

    /// Move every bound cell at or after `threshold` by `delta`. No notifications.
    pub fn shift(&mut self, threshold: usize, delta: isize) {
        for cell in self.cells.values_mut() {
            if let Some(index) = cell.item_index.as_mut() {
                if *index >= threshold {
                    *index = index.saturating_add_signed(delta);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn ids(&self) -> Vec<ProxyId> {
        let mut ids: Vec<ProxyId> = self.cells.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<I: PartialEq> Default for CellPool<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with(cells: &[(u32, usize)]) -> CellPool<&'static str> {
        let mut pool = CellPool::new();
        for &(raw, index) in cells {
            let id = ProxyId::from_raw(raw);
            pool.materialize(id, 0);
            pool.populate(id, index, Some("x")).unwrap();
        }
        pool
    }

    fn index_of(pool: &CellPool<&'static str>, raw: u32) -> Option<usize> {
        pool.get(ProxyId::from_raw(raw)).unwrap().item_index()
    }

    #[test]
    fn test_populate_different_item_changes_item() {
        let mut pool = CellPool::new();
        let id = ProxyId::from_raw(2);
        pool.materialize(id, 1);

        assert_eq!(pool.populate(id, 0, Some("a")), Ok(CellChange::Item));
        assert_eq!(pool.populate(id, 5, Some("b")), Ok(CellChange::Item));

        let cell = pool.get(id).unwrap();
        assert_eq!(cell.item(), Some(&"b"));
        assert_eq!(cell.item_index(), Some(5));
        assert_eq!(cell.kind_id(), 1);
    }

    #[test]
    fn test_populate_same_item_only_moves_index() {
        let mut pool = CellPool::new();
        let id = ProxyId::from_raw(2);
        pool.materialize(id, 0);
        pool.populate(id, 0, Some("a")).unwrap();

        assert_eq!(pool.populate(id, 3, Some("a")), Ok(CellChange::Index));
        assert_eq!(pool.get(id).unwrap().item_index(), Some(3));
    }

    #[test]
    fn test_populate_unknown_cell() {
        let mut pool: CellPool<&str> = CellPool::new();
        let id = ProxyId::from_raw(9);
        assert_eq!(
            pool.populate(id, 0, Some("a")),
            Err(ProtocolInconsistency::UnknownCell(id))
        );
        assert!(pool.is_empty());
    }

    #[test]
    fn test_shift_moves_cells_at_or_after_threshold() {
        let mut pool = pool_with(&[(1, 0), (2, 1), (3, 2)]);
        pool.shift(1, 1);

        assert_eq!(index_of(&pool, 1), Some(0));
        assert_eq!(index_of(&pool, 2), Some(2));
        assert_eq!(index_of(&pool, 3), Some(3));
    }

    #[test]
    fn test_shift_back_after_remove() {
        let mut pool = pool_with(&[(1, 0), (2, 4), (3, 7)]);
        pool.shift(5, -3);

        assert_eq!(index_of(&pool, 2), Some(4));
        assert_eq!(index_of(&pool, 3), Some(4));
    }

    #[test]
    fn test_shift_ignores_unbound_cells() {
        let mut pool: CellPool<&str> = CellPool::new();
        let id = ProxyId::from_raw(1);
        pool.materialize(id, 0);
        pool.shift(0, 2);
        assert_eq!(pool.get(id).unwrap().item_index(), None);
    }

    #[test]
    fn test_materialize_keeps_existing_binding() {
        let mut pool = pool_with(&[(1, 3)]);
        pool.materialize(ProxyId::from_raw(1), 2);
        assert_eq!(index_of(&pool, 1), Some(3));
        assert_eq!(pool.ids(), vec![ProxyId::from_raw(1)]);
    }
}
