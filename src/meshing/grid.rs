//! Dense scratch grid covering a chunk and its eight neighbours.
//!
//! The grid spans the center chunk, one full chunk on each side and one extra
//! voxel beyond that, so every sample the mesher takes around a center voxel
//! stays inside it. Cells are laid out `y`-major, then `x`, then `z`.

use crate::voxels::chunk::{ChunkAddress, CHUNK_SIZE, WORLD_HEIGHT};

/// Cells along X and Z.
pub const XZ_SIZE: i32 = CHUNK_SIZE * 3 + 2;
/// First X/Z cell of the center chunk's map (its low border column).
pub const XZ_LO: i32 = CHUNK_SIZE;
/// Last X/Z cell of the center chunk's map (its high border column).
pub const XZ_HI: i32 = CHUNK_SIZE * 2 + 1;
/// Cells along Y: the world height plus one below and one above.
pub const Y_SIZE: i32 = WORLD_HEIGHT + 2;
/// Number of (x, z) columns.
pub const COLUMNS: usize = (XZ_SIZE * XZ_SIZE) as usize;
/// Number of cells.
pub const CELLS: usize = COLUMNS * Y_SIZE as usize;

/// Cell index of grid position `(x, y, z)`, or `None` outside the grid.
pub fn index(x: i32, y: i32, z: i32) -> Option<usize> {
    let column = column(x, z)?;
    if !(0..Y_SIZE).contains(&y) {
        return None;
    }
    Some(y as usize * COLUMNS + column)
}

/// Column index of grid position `(x, z)`, or `None` outside the grid.
pub fn column(x: i32, z: i32) -> Option<usize> {
    if !(0..XZ_SIZE).contains(&x) || !(0..XZ_SIZE).contains(&z) {
        return None;
    }
    Some((x * XZ_SIZE + z) as usize)
}

/// World position of grid cell `(0, 0, 0)` when meshing `address`.
pub fn origin(address: ChunkAddress) -> (i32, i32, i32) {
    (
        address.p * CHUNK_SIZE - CHUNK_SIZE - 1,
        -1,
        address.q * CHUNK_SIZE - CHUNK_SIZE - 1,
    )
}
