//! Picking the next chunk for an idle worker.
//!
//! Addresses are split statically between workers, so two workers never hold
//! the same chunk. Within its share, a worker takes the lowest scoring
//! candidate inside `create_radius`:
//!
//! ```text
//! score = invisible << 24 | (has_geometry && dirty) << 16 | chebyshev_distance
//! ```
//!
//! so visible chunks beat invisible ones, chunks without any geometry beat
//! stale ones, and nearer chunks beat farther ones. Ties go to the first
//! candidate in scan order.

use log::debug;

use crate::view::ChunkVisibility;
use crate::voxels::chunk::{ChunkAddress, WORLD_HEIGHT};

use super::chunk_task::{ChunkTask, MapGrid};
use super::{ChunkManager, InFlight};

/// Worker that owns `address` in a pool of `workers`.
pub(crate) fn partition(address: ChunkAddress, workers: usize) -> usize {
    let key = address.p.unsigned_abs() ^ address.q.unsigned_abs();
    key as usize % workers.max(1)
}

/// Priority of a candidate; lower is better.
pub(crate) fn score(invisible: bool, stale_geometry: bool, distance: i32) -> u32 {
    (u32::from(invisible) << 24) | (u32::from(stale_geometry) << 16) | distance.unsigned_abs()
}

impl ChunkManager {
    /// Best candidate for worker `index` around `center`, if any.
    pub(crate) fn pick_candidate(
        &self,
        index: usize,
        center: ChunkAddress,
        visibility: &dyn ChunkVisibility,
    ) -> Option<ChunkAddress> {
        let radius = self.config.create_radius;
        let workers = self.pool.len();
        let mut best: Option<(u32, ChunkAddress)> = None;
        for dp in -radius..=radius {
            for dq in -radius..=radius {
                let address = center.offset(dp, dq);
                if partition(address, workers) != index {
                    continue;
                }
                let chunk = self.table.find(address);
                if chunk.is_some_and(|chunk| !chunk.is_dirty()) {
                    continue;
                }
                let invisible = !visibility.is_chunk_visible(address, 0, WORLD_HEIGHT);
                let stale = chunk.is_some_and(|chunk| chunk.render_handle().is_some());
                let candidate = score(invisible, stale, dp.abs().max(dq.abs()));
                if best.map_or(true, |(best_score, _)| candidate < best_score) {
                    best = Some((candidate, address));
                }
            }
        }
        best.map(|(_, address)| address)
    }

    /// Gives worker `index` its best candidate, creating the chunk if needed.
    ///
    /// The task carries copies of the 3 x 3 neighbourhood's maps. The chunk's
    /// dirty flag is cleared at dispatch, so an edit made while the worker runs
    /// marks it dirty again and it is picked up once more later.
    pub(crate) fn schedule_worker(
        &mut self,
        index: usize,
        center: ChunkAddress,
        visibility: &dyn ChunkVisibility,
    ) {
        let Some(address) = self.pick_candidate(index, center, visibility) else {
            return;
        };

        let load = !self.table.contains(address);
        if load && self.create_chunk(address).is_none() {
            return;
        }

        let mut blocks = MapGrid::default();
        let mut lights = MapGrid::default();
        for ((a, b), other) in address.neighborhood() {
            if let Some(chunk) = self.table.find(other) {
                blocks[a][b] = Some(chunk.blocks.clone());
                lights[a][b] = Some(chunk.lights.clone());
            }
        }
        if let Some(chunk) = self.table.find_mut(address) {
            chunk.dirty = false;
        }

        let task = ChunkTask {
            address,
            load,
            blocks,
            lights,
        };
        match self.pool.dispatch(index, task) {
            Ok(()) => {
                self.in_flight[index] = Some(InFlight { address, load });
                self.stats.dispatched += 1;
                debug!(
                    "Worker {} takes chunk ({}, {}){}",
                    index,
                    address.p,
                    address.q,
                    if load { " with load" } else { "" }
                );
            }
            Err(_) => {
                // An unloaded chunk would never be loaded later, so drop it.
                if load {
                    self.table.evict_where(|chunk| chunk.address() == address);
                } else if let Some(chunk) = self.table.find_mut(address) {
                    chunk.dirty = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::StreamConfig;
    use crate::view::AlwaysVisible;
    use crate::voxels::chunk::Chunk;
    use crate::voxels::store::MemoryStore;
    use crate::voxels::worldgen::EmptyTerrain;

    /// A manager whose 7 x 7 square is resident and clean except for `dirty`.
    fn resident_square(dirty: &[(i32, i32)]) -> ChunkManager {
        let config = StreamConfig {
            create_radius: 3,
            render_radius: 3,
            delete_radius: 5,
            workers: 2,
            ..StreamConfig::default()
        };
        let mut manager =
            ChunkManager::new(config, Arc::new(EmptyTerrain), Arc::new(MemoryStore::new())).unwrap();
        for p in -3..=3 {
            for q in -3..=3 {
                let mut chunk = Chunk::new(ChunkAddress::new(p, q));
                chunk.dirty = dirty.contains(&(p, q));
                assert!(manager.table.insert(chunk).is_ok());
            }
        }
        manager
    }

    #[test]
    fn partition_uses_absolute_coordinates() {
        assert_eq!(partition(ChunkAddress::new(3, 5), 4), (3 ^ 5) % 4);
        assert_eq!(partition(ChunkAddress::new(-3, 5), 4), partition(ChunkAddress::new(3, -5), 4));
        assert_eq!(partition(ChunkAddress::new(i32::MIN, 0), 3), (1u64 << 31) as usize % 3);
        assert_eq!(partition(ChunkAddress::new(7, 1), 1), 0);
    }

    #[test]
    fn every_address_has_exactly_one_owner() {
        for p in -6..6 {
            for q in -6..6 {
                let owner = partition(ChunkAddress::new(p, q), 3);
                assert!(owner < 3);
            }
        }
    }

    #[test]
    fn visibility_outranks_staleness_which_outranks_distance() {
        assert!(score(false, true, 9) < score(true, false, 0));
        assert!(score(false, false, 9) < score(false, true, 0));
        assert!(score(false, false, 1) < score(false, false, 2));
        assert_eq!(score(true, true, 3), (1 << 24) | (1 << 16) | 3);
    }

    #[test]
    fn nearer_dirty_chunks_win_within_a_partition() {
        // (-3, 0) is scanned first but (1, 0) is nearer; all three share worker 1
        let manager = resident_square(&[(-3, 0), (1, 0), (3, 0)]);
        let center = ChunkAddress::new(0, 0);
        for (p, q) in [(-3, 0), (1, 0), (3, 0)] {
            assert_eq!(partition(ChunkAddress::new(p, q), 2), 1);
        }
        assert_eq!(
            manager.pick_candidate(1, center, &AlwaysVisible),
            Some(ChunkAddress::new(1, 0))
        );
        assert_eq!(manager.pick_candidate(0, center, &AlwaysVisible), None);
    }

    #[test]
    fn equally_near_candidates_go_to_the_first_scanned() {
        let manager = resident_square(&[(3, 0), (-3, 0)]);
        assert_eq!(
            manager.pick_candidate(1, ChunkAddress::new(0, 0), &AlwaysVisible),
            Some(ChunkAddress::new(-3, 0))
        );
    }
}
