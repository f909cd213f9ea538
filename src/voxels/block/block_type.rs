//! # Block Type Module
//!
//! This module defines the named block types of the voxel world. Block values
//! are stored in voxel maps as plain integers; a negative value is a "ghost"
//! copy of the block owned by a neighbouring chunk and behaves like its absolute
//! value for occlusion purposes.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::voxels::map::Voxel;

/// First value of the 32 plain color blocks (`32..=63`).
pub const COLOR_BASE: Voxel = 32;
/// Number of plain color blocks.
pub const COLOR_COUNT: Voxel = 32;

/// Enumerates the named block types.
///
/// The discriminants are the values stored in voxel maps and persisted by the
/// chunk store, so they must never be renumbered.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// No block.
    EMPTY = 0,
    /// Grass-topped dirt.
    GRASS = 1,
    /// Sand, used for beaches and low terrain.
    SAND = 2,
    /// Stone.
    STONE = 3,
    /// Brick.
    BRICK = 4,
    /// Tree trunk.
    WOOD = 5,
    /// Cement.
    CEMENT = 6,
    /// Dirt.
    DIRT = 7,
    /// Wooden planks.
    PLANK = 8,
    /// Snow-topped dirt.
    SNOW = 9,
    /// Glass, transparent.
    GLASS = 10,
    /// Cobblestone.
    COBBLE = 11,
    /// Light stone.
    LIGHT_STONE = 12,
    /// Dark stone.
    DARK_STONE = 13,
    /// Chest.
    CHEST = 14,
    /// Tree leaves, transparent.
    LEAVES = 15,
    /// Cloud, neither an obstacle nor destructable.
    CLOUD = 16,
    /// Tall grass plant.
    TALL_GRASS = 17,
    /// Yellow flower plant.
    YELLOW_FLOWER = 18,
    /// Red flower plant.
    RED_FLOWER = 19,
    /// Purple flower plant.
    PURPLE_FLOWER = 20,
    /// Sun flower plant.
    SUN_FLOWER = 21,
    /// White flower plant.
    WHITE_FLOWER = 22,
    /// Blue flower plant.
    BLUE_FLOWER = 23,
}

/// Blocks a player may place, in hot-bar order.
pub const BUILDABLE: [BlockType; 22] = [
    BlockType::GRASS,
    BlockType::SAND,
    BlockType::STONE,
    BlockType::BRICK,
    BlockType::WOOD,
    BlockType::CEMENT,
    BlockType::DIRT,
    BlockType::PLANK,
    BlockType::SNOW,
    BlockType::GLASS,
    BlockType::COBBLE,
    BlockType::LIGHT_STONE,
    BlockType::DARK_STONE,
    BlockType::CHEST,
    BlockType::LEAVES,
    BlockType::TALL_GRASS,
    BlockType::YELLOW_FLOWER,
    BlockType::RED_FLOWER,
    BlockType::PURPLE_FLOWER,
    BlockType::SUN_FLOWER,
    BlockType::WHITE_FLOWER,
    BlockType::BLUE_FLOWER,
];

impl BlockType {
    /// Looks up the named block for a stored value, ignoring the ghost sign.
    ///
    /// Returns `None` for color blocks and unknown values.
    pub fn from_voxel(value: Voxel) -> Option<Self> {
        BlockType::from_u32(value.unsigned_abs())
    }

    /// The value stored in voxel maps for this block.
    pub fn value(self) -> Voxel {
        self as Voxel
    }
}

impl From<BlockType> for Voxel {
    fn from(block: BlockType) -> Self {
        block.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghost_values_resolve_to_their_block() {
        assert_eq!(BlockType::from_voxel(-15), Some(BlockType::LEAVES));
        assert_eq!(BlockType::from_voxel(5), Some(BlockType::WOOD));
    }

    #[test]
    fn color_and_unknown_values_have_no_name() {
        assert_eq!(BlockType::from_voxel(COLOR_BASE), None);
        assert_eq!(BlockType::from_voxel(200), None);
    }
}
