//! # Ambient Occlusion
//!
//! Per-corner ambient occlusion and light for the six faces of a voxel, from a
//! 3 x 3 x 3 sample of its surroundings.
//!
//! Samples are indexed `(dx + 1) * 9 + (dy + 1) * 3 + (dz + 1)`, so index 13 is
//! the voxel itself. For every face corner, [`CORNER_EDGES`] names the diagonal
//! corner cell and the two edge cells that touch that corner, and
//! [`CORNER_CELLS`] names the four cells whose shade and light are averaged.

/// Sample index of the voxel itself.
pub const CENTER: usize = 13;

/// Brightest light level.
pub const MAX_LIGHT: u8 = 15;

/// `[corner, edge1, edge2]` sample indices per face corner.
static CORNER_EDGES: [[[usize; 3]; 4]; 6] = [
    [[0, 1, 3], [2, 1, 5], [6, 3, 7], [8, 5, 7]],
    [[18, 19, 21], [20, 19, 23], [24, 21, 25], [26, 23, 25]],
    [[6, 7, 15], [8, 7, 17], [24, 15, 25], [26, 17, 25]],
    [[0, 1, 9], [2, 1, 11], [18, 9, 19], [20, 11, 19]],
    [[0, 3, 9], [6, 3, 15], [18, 9, 21], [24, 15, 21]],
    [[2, 5, 11], [8, 5, 17], [20, 11, 23], [26, 17, 23]],
];

/// The four sample indices averaged for shade and light per face corner.
static CORNER_CELLS: [[[usize; 4]; 4]; 6] = [
    [[0, 1, 3, 4], [1, 2, 4, 5], [3, 4, 6, 7], [4, 5, 7, 8]],
    [[18, 19, 21, 22], [19, 20, 22, 23], [21, 22, 24, 25], [22, 23, 25, 26]],
    [[6, 7, 15, 16], [7, 8, 16, 17], [15, 16, 24, 25], [16, 17, 25, 26]],
    [[0, 1, 9, 10], [1, 2, 10, 11], [9, 10, 18, 19], [10, 11, 19, 20]],
    [[0, 3, 9, 12], [3, 6, 12, 15], [9, 12, 18, 21], [12, 15, 21, 24]],
    [[2, 5, 11, 14], [5, 8, 14, 17], [11, 14, 20, 23], [14, 17, 23, 26]],
];

/// Occlusion by number of opaque cells around a corner.
static CURVE: [f32; 4] = [0.0, 0.25, 0.5, 0.75];

/// Sampled surroundings of one voxel.
#[derive(Copy, Clone, Debug, Default)]
pub struct Neighborhood {
    /// Opacity of each sample cell.
    pub opaque: [bool; 27],
    /// Light level of each sample cell.
    pub light: [u8; 27],
    /// Sky shade of each sample cell, `0` in open sky.
    pub shade: [f32; 27],
}

/// Per face corner results, in [`BlockSide`](crate::voxels::block::block_side::BlockSide) order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Occlusion {
    /// Ambient occlusion in `0..=1`.
    pub ao: [[f32; 4]; 6],
    /// Light, normally in `0..=1`. Emitters report `10` so they render fully lit.
    pub light: [[f32; 4]; 6],
}

impl Neighborhood {
    /// Computes ambient occlusion and light for every face corner.
    ///
    /// A corner whose two edge cells are both opaque is fully occluded no
    /// matter what the diagonal holds.
    pub fn occlusion(&self) -> Occlusion {
        let mut ao = [[0.0; 4]; 6];
        let mut light = [[0.0; 4]; 6];
        let is_emitter = self.light[CENTER] == MAX_LIGHT;
        for face in 0..6 {
            for corner in 0..4 {
                let [c, e1, e2] = CORNER_EDGES[face][corner];
                let value = if self.opaque[e1] && self.opaque[e2] {
                    3
                } else {
                    usize::from(self.opaque[c]) + usize::from(self.opaque[e1]) + usize::from(self.opaque[e2])
                };
                let mut shade_sum = 0.0;
                let mut light_sum = 0.0;
                for &cell in &CORNER_CELLS[face][corner] {
                    shade_sum += self.shade[cell];
                    light_sum += f32::from(self.light[cell]);
                }
                if is_emitter {
                    light_sum = f32::from(MAX_LIGHT) * 4.0 * 10.0;
                }
                ao[face][corner] = (CURVE[value] + shade_sum / 4.0).min(1.0);
                light[face][corner] = light_sum / f32::from(MAX_LIGHT) / 4.0;
            }
        }
        Occlusion { ao, light }
    }
}
