//! # Chunk Module
//!
//! A chunk is a 32 x 256 x 32 column of the world, addressed by `(p, q)`: the
//! world X and Z coordinates divided (flooring) by [`CHUNK_SIZE`].
//!
//! ## Storage
//!
//! Each chunk owns two [`VoxelMap`]s, one for block types and one for light
//! levels, both anchored one voxel before the chunk's first column:
//! `(p * 32 - 1, 0, q * 32 - 1)`. The extra border column on each side holds
//! ghost copies of the neighbouring chunk's edge voxels (stored negated) so the
//! chunk can cull faces across its border without owning the neighbour's data.
//!
//! ## Lifecycle
//!
//! Chunks start dirty with empty maps. A worker (or the synchronous path around
//! the viewpoint) fills the maps on first load, the mesher produces geometry,
//! and the dirty flag is cleared. Any block, light or sign edit sets it again.

use cgmath::Point3;

use crate::render::GeometryHandle;

use super::map::VoxelMap;
use super::sign::SignList;

pub mod chunk_table;

/// Edge length of a chunk along X and Z, in voxels.
pub const CHUNK_SIZE: i32 = 32;

/// Height of the world, in voxels. Valid Y coordinates are `0..WORLD_HEIGHT`.
pub const WORLD_HEIGHT: i32 = 256;

/// Returns the chunk coordinate containing a world coordinate.
///
/// The coordinate is rounded to the nearest voxel first, matching how voxel
/// centers sit on integer positions.
pub fn chunked(x: f32) -> i32 {
    chunked_block(x.round() as i32)
}

/// Returns the chunk coordinate containing an integer voxel coordinate.
pub fn chunked_block(x: i32) -> i32 {
    x.div_euclid(CHUNK_SIZE)
}

/// Integer address `(p, q)` of a chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkAddress {
    /// Chunk coordinate along world X.
    pub p: i32,
    /// Chunk coordinate along world Z.
    pub q: i32,
}

impl ChunkAddress {
    /// Creates an address.
    pub const fn new(p: i32, q: i32) -> Self {
        ChunkAddress { p, q }
    }

    /// Address of the chunk containing the world position `(x, z)`.
    pub fn containing(x: f32, z: f32) -> Self {
        ChunkAddress::new(chunked(x), chunked(z))
    }

    /// Address of the chunk owning the voxel column `(x, z)`.
    pub fn containing_block(x: i32, z: i32) -> Self {
        ChunkAddress::new(chunked_block(x), chunked_block(z))
    }

    /// Address shifted by `(dp, dq)`.
    pub fn offset(self, dp: i32, dq: i32) -> Self {
        ChunkAddress::new(self.p + dp, self.q + dq)
    }

    /// Chebyshev (king-move) distance in chunks.
    pub fn chebyshev(self, other: ChunkAddress) -> i32 {
        (self.p - other.p).abs().max((self.q - other.q).abs())
    }

    /// The 3 x 3 block of addresses centered on this one, with each cell's grid
    /// index `(dp + 1, dq + 1)`.
    pub fn neighborhood(self) -> impl Iterator<Item = ((usize, usize), ChunkAddress)> {
        (-1..=1).flat_map(move |dp| {
            (-1..=1).map(move |dq| {
                (
                    ((dp + 1) as usize, (dq + 1) as usize),
                    self.offset(dp, dq),
                )
            })
        })
    }

    /// World position of local offset zero in this chunk's voxel maps.
    pub fn map_origin(self) -> Point3<i32> {
        Point3::new(self.p * CHUNK_SIZE - 1, 0, self.q * CHUNK_SIZE - 1)
    }
}

/// Represents one resident column of the world.
///
/// Only the chunk manager mutates chunks; everything else sees them through
/// shared references for drawing, physics or queries.
#[derive(Debug)]
pub struct Chunk {
    address: ChunkAddress,
    pub(crate) blocks: VoxelMap,
    pub(crate) lights: VoxelMap,
    pub(crate) signs: SignList,
    pub(crate) dirty: bool,
    pub(crate) miny: i32,
    pub(crate) maxy: i32,
    pub(crate) render_handle: Option<GeometryHandle>,
}

impl Chunk {
    /// Creates an empty, dirty chunk with no geometry.
    ///
    /// # Arguments
    /// * `address` - The chunk coordinates of the new chunk
    pub fn new(address: ChunkAddress) -> Self {
        let origin = address.map_origin();
        Chunk {
            address,
            blocks: VoxelMap::new(origin),
            lights: VoxelMap::new(origin),
            signs: SignList::new(),
            dirty: true,
            miny: 0,
            maxy: 0,
            render_handle: None,
        }
    }

    /// The chunk's address.
    pub fn address(&self) -> ChunkAddress {
        self.address
    }

    /// Block types, including ghost copies in the border columns.
    pub fn blocks(&self) -> &VoxelMap {
        &self.blocks
    }

    /// Light levels of the emitters placed in this chunk.
    pub fn lights(&self) -> &VoxelMap {
        &self.lights
    }

    /// Signs attached to voxels of this chunk.
    pub fn signs(&self) -> &SignList {
        &self.signs
    }

    /// Returns `true` if the chunk's geometry is out of date.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Lowest Y with exposed geometry, as of the last mesh.
    pub fn miny(&self) -> i32 {
        self.miny
    }

    /// Highest Y with exposed geometry, as of the last mesh.
    pub fn maxy(&self) -> i32 {
        self.maxy
    }

    /// Handle of the uploaded geometry, if any has been uploaded.
    pub fn render_handle(&self) -> Option<GeometryHandle> {
        self.render_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_floors_toward_negative_infinity() {
        assert_eq!(chunked_block(0), 0);
        assert_eq!(chunked_block(31), 0);
        assert_eq!(chunked_block(32), 1);
        assert_eq!(chunked_block(-1), -1);
        assert_eq!(chunked_block(-32), -1);
        assert_eq!(chunked_block(-33), -2);
        assert_eq!(chunked(31.4), 0);
        assert_eq!(chunked(31.6), 1);
        assert_eq!(chunked(-0.4), 0);
    }

    #[test]
    fn neighborhood_covers_the_ring_in_grid_order() {
        let cells: Vec<_> = ChunkAddress::new(5, -2).neighborhood().collect();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], ((0, 0), ChunkAddress::new(4, -3)));
        assert_eq!(cells[4], ((1, 1), ChunkAddress::new(5, -2)));
        assert_eq!(cells[8], ((2, 2), ChunkAddress::new(6, -1)));
    }

    #[test]
    fn maps_cover_the_border_columns() {
        let mut chunk = Chunk::new(ChunkAddress::new(1, 0));
        assert!(chunk.is_dirty());
        assert!(chunk.blocks.set(31, 10, 0, -3));
        assert!(chunk.blocks.set(64, 10, 32, 1));
        assert!(!chunk.blocks.set(30, 10, 0, 1));
    }

    #[test]
    fn chebyshev_takes_the_larger_axis() {
        let a = ChunkAddress::new(0, 0);
        assert_eq!(a.chebyshev(ChunkAddress::new(3, -1)), 3);
        assert_eq!(a.chebyshev(ChunkAddress::new(-2, 2)), 2);
    }
}
