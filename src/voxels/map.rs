//! # Voxel Map
//!
//! Sparse per-chunk storage of `(x, y, z) -> value`. The same container holds
//! block types and light levels.
//!
//! A map is anchored at an origin in world space and accepts coordinates whose
//! offset from the origin lies in `0..=255` on every axis. Chunks anchor their
//! maps one voxel before their first column, so a chunk's map also has room for
//! the ghost copies of its neighbours' border voxels.
//!
//! Entries are kept in a `BTreeMap` keyed by the packed local offset, which gives
//! the ordered full scan the mesher and the store rely on. Writing `0` removes
//! the entry, so `len()` counts only meaningful values and an empty light map
//! short-circuits lighting work.

use std::collections::BTreeMap;

use cgmath::Point3;

/// Value stored per voxel. Block ids are positive, ghost copies negative.
pub type Voxel = i32;

/// Largest local offset on any axis.
pub const MAP_EXTENT: i32 = 255;

/// Sparse voxel storage anchored at a world-space origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelMap {
    origin: Point3<i32>,
    entries: BTreeMap<u32, Voxel>,
}

impl VoxelMap {
    /// Creates an empty map anchored at `origin`.
    pub fn new(origin: Point3<i32>) -> Self {
        VoxelMap {
            origin,
            entries: BTreeMap::new(),
        }
    }

    /// World-space position of local offset `(0, 0, 0)`.
    pub fn origin(&self) -> Point3<i32> {
        self.origin
    }

    /// Number of stored (non-zero) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entry is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads the value at a world position. Absent and out-of-range positions read as `0`.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Voxel {
        self.key(x, y, z)
            .and_then(|key| self.entries.get(&key).copied())
            .unwrap_or(0)
    }

    /// Writes the value at a world position.
    ///
    /// # Returns
    /// `true` if the stored value changed. Out-of-range positions are ignored
    /// and report `false`.
    pub fn set(&mut self, x: i32, y: i32, z: i32, w: Voxel) -> bool {
        let Some(key) = self.key(x, y, z) else {
            return false;
        };
        if w == 0 {
            self.entries.remove(&key).is_some()
        } else {
            self.entries.insert(key, w) != Some(w)
        }
    }

    /// Removes every entry, keeping the origin.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates every stored entry as `(x, y, z, w)` in world coordinates.
    ///
    /// The order is stable for identical contents.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, i32, Voxel)> + '_ {
        let origin = self.origin;
        self.entries.iter().map(move |(&key, &w)| {
            let (lx, ly, lz) = unpack(key);
            (origin.x + lx, origin.y + ly, origin.z + lz, w)
        })
    }

    fn key(&self, x: i32, y: i32, z: i32) -> Option<u32> {
        let lx = x - self.origin.x;
        let ly = y - self.origin.y;
        let lz = z - self.origin.z;
        let range = 0..=MAP_EXTENT;
        if range.contains(&lx) && range.contains(&ly) && range.contains(&lz) {
            Some(((lx as u32) << 16) | ((ly as u32) << 8) | lz as u32)
        } else {
            None
        }
    }
}

fn unpack(key: u32) -> (i32, i32, i32) {
    (
        ((key >> 16) & 0xff) as i32,
        ((key >> 8) & 0xff) as i32,
        (key & 0xff) as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_changes() {
        let mut map = VoxelMap::new(Point3::new(-1, 0, -1));
        assert!(map.set(3, 4, 5, 7));
        assert!(!map.set(3, 4, 5, 7));
        assert!(map.set(3, 4, 5, -7));
        assert_eq!(map.get(3, 4, 5), -7);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn writing_zero_removes_the_entry() {
        let mut map = VoxelMap::new(Point3::new(0, 0, 0));
        map.set(1, 1, 1, 3);
        assert!(map.set(1, 1, 1, 0));
        assert!(map.is_empty());
        assert!(!map.set(1, 1, 1, 0));
    }

    #[test]
    fn out_of_range_positions_are_ignored() {
        let mut map = VoxelMap::new(Point3::new(31, 0, 31));
        assert!(!map.set(30, 0, 40, 1));
        assert!(!map.set(40, 256, 40, 1));
        assert!(!map.set(40, -1, 40, 1));
        assert_eq!(map.get(30, 0, 40), 0);
        assert!(map.is_empty());
        assert!(map.set(31 + 255, 255, 31, 1));
    }

    #[test]
    fn iteration_yields_world_coordinates() {
        let mut map = VoxelMap::new(Point3::new(-33, 0, 63));
        map.set(-33, 0, 63, 1);
        map.set(-2, 200, 90, 2);
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort();
        assert_eq!(entries, vec![(-33, 0, 63, 1), (-2, 200, 90, 2)]);
    }

    #[test]
    fn clones_are_independent() {
        let mut map = VoxelMap::new(Point3::new(0, 0, 0));
        map.set(0, 0, 0, 1);
        let copy = map.clone();
        map.set(0, 0, 0, 2);
        assert_eq!(copy.get(0, 0, 0), 1);
    }
}
