//! Read-only world queries over resident chunks.

use cgmath::{MetricSpace, Point3};

use crate::view::sight_vector;
use crate::voxels::block::is_obstacle;
use crate::voxels::chunk::{ChunkAddress, WORLD_HEIGHT};
use crate::voxels::map::{Voxel, VoxelMap};

use super::ChunkManager;

/// How far a ray travels, in voxels.
const HIT_RANGE: i32 = 8;

/// Ray steps per voxel of travel.
const STEPS_PER_VOXEL: i32 = 32;

/// A voxel found by [`ChunkManager::hit_test`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockHit {
    /// World X of the reported voxel.
    pub x: i32,
    /// World Y of the reported voxel.
    pub y: i32,
    /// World Z of the reported voxel.
    pub z: i32,
    /// Block that stopped the ray.
    pub w: Voxel,
}

/// Marches a ray through one chunk's block map.
fn march(
    map: &VoxelMap,
    previous: bool,
    origin: Point3<f32>,
    step: cgmath::Vector3<f32>,
) -> Option<BlockHit> {
    let mut position = origin;
    let mut last: Option<(i32, i32, i32)> = None;
    for _ in 0..HIT_RANGE * STEPS_PER_VOXEL {
        let cell = (
            position.x.round() as i32,
            position.y.round() as i32,
            position.z.round() as i32,
        );
        if last != Some(cell) {
            let w = map.get(cell.0, cell.1, cell.2);
            if w > 0 {
                let (x, y, z) = if previous { last? } else { cell };
                return Some(BlockHit { x, y, z, w });
            }
            last = Some(cell);
        }
        position += step;
    }
    None
}

impl ChunkManager {
    /// Block at a world position, or `0` when its chunk is not resident.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Voxel {
        self.table
            .find(ChunkAddress::containing_block(x, z))
            .map_or(0, |chunk| chunk.blocks.get(x, y, z))
    }

    /// Y of the highest obstacle in the column at `(x, z)`, or `-1` when the
    /// column is empty or not resident.
    pub fn highest_block(&self, x: f32, z: f32) -> i32 {
        let (bx, bz) = (x.round() as i32, z.round() as i32);
        let Some(chunk) = self.table.find(ChunkAddress::containing(x, z)) else {
            return -1;
        };
        (0..WORLD_HEIGHT)
            .rev()
            .find(|&y| is_obstacle(chunk.blocks.get(bx, y, bz)))
            .unwrap_or(-1)
    }

    /// Casts a ray from `position` along the sight direction `(rx, ry)` and
    /// returns the nearest solid voxel it meets within eight voxels.
    ///
    /// With `previous` set, the empty voxel just before the hit is reported
    /// instead, which is where a new block would be placed. Only the chunks
    /// around the one containing `position` are searched.
    pub fn hit_test(
        &self,
        previous: bool,
        position: Point3<f32>,
        rx: f32,
        ry: f32,
    ) -> Option<BlockHit> {
        let center = ChunkAddress::containing(position.x, position.z);
        let step = sight_vector(rx, ry) / STEPS_PER_VOXEL as f32;
        let mut best: Option<(f32, BlockHit)> = None;
        for chunk in self.table.iter() {
            if chunk.address().chebyshev(center) > 1 {
                continue;
            }
            let Some(hit) = march(&chunk.blocks, previous, position, step) else {
                continue;
            };
            let cell = Point3::new(hit.x as f32, hit.y as f32, hit.z as f32);
            let distance = position.distance(cell);
            if best.map_or(true, |(nearest, _)| distance < nearest) {
                best = Some((distance, hit));
            }
        }
        best.map(|(_, hit)| hit)
    }
}
