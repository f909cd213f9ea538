//! # Block Module
//!
//! Block catalogue and the per-block predicates used by meshing, lighting and
//! world queries. Predicates take raw stored values, so ghost copies (negative
//! values) behave like the block they mirror wherever that matters.

use block_type::{BlockType, COLOR_BASE, COLOR_COUNT};

use super::map::Voxel;

pub mod block_side;
pub mod block_type;

/// Texture tiles for each face of the named blocks, indexed by block id.
///
/// Face order matches [`block_side::BlockSide`]: left, right, top, bottom, front, back.
/// Plants and `EMPTY` have no cube tiles.
static CUBE_TILES: [[i32; 6]; 17] = [
    [0, 0, 0, 0, 0, 0],       // EMPTY
    [16, 16, 32, 0, 16, 16],  // GRASS
    [1, 1, 1, 1, 1, 1],       // SAND
    [2, 2, 2, 2, 2, 2],       // STONE
    [3, 3, 3, 3, 3, 3],       // BRICK
    [20, 20, 36, 4, 20, 20],  // WOOD
    [5, 5, 5, 5, 5, 5],       // CEMENT
    [6, 6, 6, 6, 6, 6],       // DIRT
    [7, 7, 7, 7, 7, 7],       // PLANK
    [24, 24, 40, 8, 24, 24],  // SNOW
    [9, 9, 9, 9, 9, 9],       // GLASS
    [10, 10, 10, 10, 10, 10], // COBBLE
    [11, 11, 11, 11, 11, 11], // LIGHT_STONE
    [12, 12, 12, 12, 12, 12], // DARK_STONE
    [13, 13, 13, 13, 13, 13], // CHEST
    [14, 14, 14, 14, 14, 14], // LEAVES
    [15, 15, 15, 15, 15, 15], // CLOUD
];

/// First tile of the plant sprites; plants occupy consecutive tiles.
const PLANT_TILE_BASE: i32 = 48;
/// First tile of the color swatches, two rows of sixteen.
const COLOR_TILE_BASE: i32 = 176;

/// Stored values are compared by magnitude so that no value, `Voxel::MIN`
/// included, can overflow.
fn is_plant_id(id: u32) -> bool {
    let first = BlockType::TALL_GRASS.value().unsigned_abs();
    let last = BlockType::BLUE_FLOWER.value().unsigned_abs();
    (first..=last).contains(&id)
}

fn is_color_id(id: u32) -> bool {
    let first = COLOR_BASE.unsigned_abs();
    (first..first + COLOR_COUNT.unsigned_abs()).contains(&id)
}

/// Returns `true` for grass and flowers, which mesh as crossed quads.
///
/// Unlike the other predicates this one looks at the stored value as-is, so a
/// ghost plant is not a plant.
pub fn is_plant(w: Voxel) -> bool {
    w > 0 && is_plant_id(w.unsigned_abs())
}

/// Returns `true` for one of the plain color blocks, ghost or not.
pub fn is_color(w: Voxel) -> bool {
    is_color_id(w.unsigned_abs())
}

/// Returns `true` if `w` may be written into the world: empty, a named block
/// or a color block. Ghost (negative) values are never accepted from callers.
pub fn is_valid_block(w: Voxel) -> bool {
    w >= 0 && (BlockType::from_voxel(w).is_some() || is_color(w))
}

/// Returns `true` if the block stops movement and counts for `highest_block`.
pub fn is_obstacle(w: Voxel) -> bool {
    if is_plant_id(w.unsigned_abs()) {
        return false;
    }
    !matches!(
        BlockType::from_voxel(w),
        Some(BlockType::EMPTY) | Some(BlockType::CLOUD)
    )
}

/// Returns `true` if light and sight pass through the block.
pub fn is_transparent(w: Voxel) -> bool {
    if w == BlockType::EMPTY.value() || is_plant_id(w.unsigned_abs()) {
        return true;
    }
    matches!(
        BlockType::from_voxel(w),
        Some(BlockType::GLASS) | Some(BlockType::LEAVES)
    )
}

/// Returns `true` if a player may break the block.
pub fn is_destructable(w: Voxel) -> bool {
    w != BlockType::EMPTY.value() && w != BlockType::CLOUD.value()
}

/// Texture tile of every face of a cube block, in [`block_side::BlockSide`] order.
pub fn cube_tiles(w: Voxel) -> [i32; 6] {
    let id = w.unsigned_abs();
    if is_color_id(id) {
        let tile = COLOR_TILE_BASE + (id - COLOR_BASE.unsigned_abs()) as i32;
        return [tile; 6];
    }
    usize::try_from(id)
        .ok()
        .and_then(|index| CUBE_TILES.get(index))
        .copied()
        .unwrap_or([0; 6])
}

/// Texture tile of a plant sprite.
pub fn plant_tile(w: Voxel) -> i32 {
    if is_plant(w) {
        PLANT_TILE_BASE + (w - BlockType::TALL_GRASS.value())
    } else {
        0
    }
}
