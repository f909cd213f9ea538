//! # Block Side Module
//!
//! The six faces of a cube voxel. The discriminant order is the order used by
//! the mesher's occlusion tables and by the per-face texture tile table, so it
//! must stay in sync with both.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The order is: [LEFT, RIGHT, TOP, BOTTOM, FRONT, BACK]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The left face (facing negative X)
    LEFT = 0,

    /// The right face (facing positive X)
    RIGHT = 1,

    /// The top face (facing positive Y)
    TOP = 2,

    /// The bottom face (facing negative Y)
    BOTTOM = 3,

    /// The front face (facing negative Z)
    FRONT = 4,

    /// The back face (facing positive Z)
    BACK = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in table order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::TOP,
            BlockSide::BOTTOM,
            BlockSide::FRONT,
            BlockSide::BACK,
        ]
    }

    /// Unit offset from a voxel to the neighbour this face looks at.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::FRONT => Vector3::new(0, 0, -1),
            BlockSide::BACK => Vector3::new(0, 0, 1),
        }
    }

    /// Outward facing normal of this face.
    pub fn normal(self) -> Vector3<f32> {
        let offset = self.offset();
        Vector3::new(offset.x as f32, offset.y as f32, offset.z as f32)
    }
}
