//! # Chunk Table
//!
//! Fixed-capacity collection of resident chunks. Lookup is a linear scan by
//! address; the table is small enough (a few hundred chunks in practice) that
//! this beats hashing once chunk moves on eviction are taken into account.
//!
//! Eviction swaps the last chunk into the freed slot, so indices are not
//! stable across evictions. Callers look chunks up by address every frame and
//! never hold on to an index.

use crate::error::TableFull;

use super::{Chunk, ChunkAddress};

/// Bounded storage for resident chunks.
///
/// # Invariants
/// - `len() <= capacity()` at all times.
/// - At most one chunk per address.
#[derive(Debug)]
pub struct ChunkTable {
    chunks: Vec<Chunk>,
    capacity: usize,
}

impl ChunkTable {
    /// Creates an empty table that will hold at most `capacity` chunks.
    pub fn new(capacity: usize) -> Self {
        ChunkTable {
            chunks: Vec::new(),
            capacity,
        }
    }

    /// Maximum number of resident chunks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` when no chunk is resident.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns `true` when another chunk would be rejected.
    pub fn is_full(&self) -> bool {
        self.chunks.len() >= self.capacity
    }

    /// Index of the chunk at `address`, if resident.
    pub fn position(&self, address: ChunkAddress) -> Option<usize> {
        self.chunks
            .iter()
            .position(|chunk| chunk.address() == address)
    }

    /// The chunk at `address`, if resident.
    pub fn find(&self, address: ChunkAddress) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.address() == address)
    }

    /// Mutable access to the chunk at `address`, if resident.
    pub fn find_mut(&mut self, address: ChunkAddress) -> Option<&mut Chunk> {
        self.chunks
            .iter_mut()
            .find(|chunk| chunk.address() == address)
    }

    /// Returns `true` if a chunk at `address` is resident.
    pub fn contains(&self, address: ChunkAddress) -> bool {
        self.position(address).is_some()
    }

    /// Adds a chunk and returns its index.
    ///
    /// If a chunk with the same address is already resident it is kept, the
    /// new one is dropped, and the existing index is returned.
    ///
    /// # Errors
    /// [`TableFull`] when the table is at capacity. The chunk is dropped.
    pub fn insert(&mut self, chunk: Chunk) -> Result<usize, TableFull> {
        if let Some(index) = self.position(chunk.address()) {
            return Ok(index);
        }
        if self.is_full() {
            return Err(TableFull {
                capacity: self.capacity,
            });
        }
        self.chunks.push(chunk);
        Ok(self.chunks.len() - 1)
    }

    /// Chunk at `index`.
    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    /// Mutable chunk at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Chunk> {
        self.chunks.get_mut(index)
    }

    /// Removes every chunk for which `evict` returns `true` and hands them back.
    ///
    /// Each removal moves the last chunk into the freed slot; that chunk is
    /// examined next, so no chunk is skipped.
    pub fn evict_where(&mut self, mut evict: impl FnMut(&Chunk) -> bool) -> Vec<Chunk> {
        let mut evicted = Vec::new();
        let mut i = 0;
        while i < self.chunks.len() {
            if evict(&self.chunks[i]) {
                evicted.push(self.chunks.swap_remove(i));
            } else {
                i += 1;
            }
        }
        evicted
    }

    /// Removes every chunk and hands them back.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Chunk> {
        self.chunks.drain(..)
    }

    /// Forward iterator over resident chunks in table order.
    pub fn iter(&self) -> ChunkIter<'_> {
        ChunkIter {
            table: self,
            index: 0,
        }
    }

    /// Mutable iterator over resident chunks in table order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Chunk> {
        self.chunks.iter_mut()
    }
}

/// Forward iterator over a [`ChunkTable`].
///
/// The iterator borrows the table, so the table cannot change while it runs.
pub struct ChunkIter<'a> {
    table: &'a ChunkTable,
    index: usize,
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = &'a Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.table.chunks.get(self.index)?;
        self.index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.chunks.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkIter<'_> {}

impl<'a> IntoIterator for &'a ChunkTable {
    type Item = &'a Chunk;
    type IntoIter = ChunkIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(capacity: usize, addresses: &[(i32, i32)]) -> ChunkTable {
        let mut table = ChunkTable::new(capacity);
        for &(p, q) in addresses {
            table.insert(Chunk::new(ChunkAddress::new(p, q))).unwrap();
        }
        table
    }

    #[test]
    fn insert_rejects_when_full() {
        let mut table = table_with(2, &[(0, 0), (1, 0)]);
        let err = table.insert(Chunk::new(ChunkAddress::new(2, 0))).unwrap_err();
        assert_eq!(err, TableFull { capacity: 2 });
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn duplicate_addresses_are_not_added() {
        let mut table = table_with(4, &[(0, 0)]);
        table.find_mut(ChunkAddress::new(0, 0)).unwrap().dirty = false;
        assert_eq!(table.insert(Chunk::new(ChunkAddress::new(0, 0))), Ok(0));
        assert_eq!(table.len(), 1);
        assert!(!table.find(ChunkAddress::new(0, 0)).unwrap().is_dirty());
    }

    #[test]
    fn eviction_checks_the_swapped_in_chunk() {
        let mut table = table_with(8, &[(0, 0), (9, 0), (1, 0), (9, 1)]);
        let evicted = table.evict_where(|chunk| chunk.address().p == 9);
        assert_eq!(evicted.len(), 2);
        assert_eq!(table.len(), 2);
        assert!(table.contains(ChunkAddress::new(0, 0)));
        assert!(table.contains(ChunkAddress::new(1, 0)));
    }

    #[test]
    fn find_returns_the_matching_address_only() {
        let table = table_with(8, &[(0, 0), (0, 1), (1, 0)]);
        for chunk in &table {
            let found = table.find(chunk.address()).unwrap();
            assert_eq!(found.address(), chunk.address());
        }
        assert!(table.find(ChunkAddress::new(5, 5)).is_none());
        assert_eq!(table.iter().len(), 3);
    }
}
