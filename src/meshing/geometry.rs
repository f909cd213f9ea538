//! # Cube and Plant Geometry
//!
//! Emits the triangles of a single voxel. Cubes get one quad per exposed face;
//! plants get two crossed double-sided quads rotated about the vertical axis.
//!
//! Each quad is written as two triangles (6 vertices). Per-corner ambient
//! occlusion and light come from the caller in [`BlockSide`] order.

use cgmath::{Deg, Matrix3, Point3, Vector3};

use crate::voxels::block::block_side::BlockSide;
use crate::voxels::block::{cube_tiles, plant_tile};
use crate::voxels::map::Voxel;

use super::vertex::BlockVertex;

/// Size of one atlas tile in texture coordinates (16 x 16 tiles).
pub const TILE_SIZE: f32 = 0.0625;

/// Tiles per atlas row.
const ATLAS_COLUMNS: i32 = 16;

/// Corner offsets of each cube face, in face corner order.
static CUBE_POSITIONS: [[[f32; 3]; 4]; 6] = [
    [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0]],
    [[1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]],
    [[-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]],
    [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0]],
    [[-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0]],
    [[-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0]],
];

/// Texture corner (0 = low edge, 1 = high edge) of each cube face corner.
static CUBE_UVS: [[[u8; 2]; 4]; 6] = [
    [[0, 0], [1, 0], [0, 1], [1, 1]],
    [[1, 0], [0, 0], [1, 1], [0, 1]],
    [[0, 1], [0, 0], [1, 1], [1, 0]],
    [[0, 0], [0, 1], [1, 0], [1, 1]],
    [[0, 0], [0, 1], [1, 0], [1, 1]],
    [[1, 0], [1, 1], [0, 0], [0, 1]],
];

/// Triangle corner order per face.
static CUBE_INDICES: [[usize; 6]; 6] = [
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
];

/// Triangle corner order per face with the quad diagonal flipped.
static CUBE_FLIPPED: [[usize; 6]; 6] = [
    [0, 1, 2, 1, 3, 2],
    [0, 2, 1, 2, 3, 1],
    [0, 1, 2, 1, 3, 2],
    [0, 2, 1, 2, 3, 1],
    [0, 1, 2, 1, 3, 2],
    [0, 2, 1, 2, 3, 1],
];

static PLANT_POSITIONS: [[[f32; 3]; 4]; 4] = [
    [[0.0, -1.0, -1.0], [0.0, -1.0, 1.0], [0.0, 1.0, -1.0], [0.0, 1.0, 1.0]],
    [[0.0, -1.0, -1.0], [0.0, -1.0, 1.0], [0.0, 1.0, -1.0], [0.0, 1.0, 1.0]],
    [[-1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]],
    [[-1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]],
];

static PLANT_NORMALS: [[f32; 3]; 4] = [
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
];

static PLANT_UVS: [[[u8; 2]; 4]; 4] = [
    [[0, 0], [1, 0], [0, 1], [1, 1]],
    [[1, 0], [0, 0], [1, 1], [0, 1]],
    [[0, 0], [0, 1], [1, 0], [1, 1]],
    [[1, 0], [1, 1], [0, 0], [0, 1]],
];

static PLANT_INDICES: [[usize; 6]; 4] = [
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
    [0, 3, 2, 0, 1, 3],
    [0, 3, 1, 0, 2, 3],
];

/// Quads emitted for every plant.
pub const PLANT_FACES: usize = 4;

fn tile_origin(tile: i32) -> (f32, f32) {
    (
        (tile % ATLAS_COLUMNS) as f32 * TILE_SIZE,
        (tile / ATLAS_COLUMNS) as f32 * TILE_SIZE,
    )
}

/// Emits the exposed faces of a cube voxel.
///
/// # Arguments
/// * `out` - Receives 6 vertices per exposed face
/// * `ao` - Ambient occlusion per face corner
/// * `light` - Light per face corner
/// * `exposed` - Which faces to emit, in [`BlockSide`] order
/// * `center` - Center of the voxel in world space
/// * `n` - Half the edge length
/// * `w` - Block value, selects the texture tiles
pub fn make_cube(
    out: &mut Vec<BlockVertex>,
    ao: &[[f32; 4]; 6],
    light: &[[f32; 4]; 6],
    exposed: [bool; 6],
    center: Point3<f32>,
    n: f32,
    w: Voxel,
) {
    // Inset by half a texel to keep neighbouring tiles from bleeding in.
    let lo = 1.0 / 2048.0;
    let hi = TILE_SIZE - 1.0 / 2048.0;
    let tiles = cube_tiles(w);
    for side in BlockSide::all() {
        let i = side as usize;
        if !exposed[i] {
            continue;
        }
        let (du, dv) = tile_origin(tiles[i]);
        let normal = side.normal();
        let flip = ao[i][0] + ao[i][3] > ao[i][1] + ao[i][2];
        let order = if flip { &CUBE_FLIPPED[i] } else { &CUBE_INDICES[i] };
        for &j in order {
            let corner = CUBE_POSITIONS[i][j];
            let uv = CUBE_UVS[i][j];
            out.push(BlockVertex {
                position: [
                    center.x + n * corner[0],
                    center.y + n * corner[1],
                    center.z + n * corner[2],
                ],
                normal: normal.into(),
                tex_coords: [
                    du + if uv[0] == 1 { hi } else { lo },
                    dv + if uv[1] == 1 { hi } else { lo },
                ],
                ao: ao[i][j],
                light: light[i][j],
            });
        }
    }
}

/// Emits a plant as two crossed quads, each visible from both sides.
///
/// # Arguments
/// * `out` - Receives [`PLANT_FACES`] x 6 vertices
/// * `ao` - Ambient occlusion shared by every corner
/// * `light` - Light shared by every corner
/// * `center` - Center of the voxel in world space
/// * `n` - Half the edge length
/// * `w` - Plant value, selects the sprite
/// * `rotation` - Rotation about the vertical axis, in degrees
pub fn make_plant(
    out: &mut Vec<BlockVertex>,
    ao: f32,
    light: f32,
    center: Point3<f32>,
    n: f32,
    w: Voxel,
    rotation: f32,
) {
    let (du, dv) = tile_origin(plant_tile(w));
    let rotate = Matrix3::from_angle_y(Deg(rotation));
    let offset = Vector3::new(center.x, center.y, center.z);
    for i in 0..PLANT_FACES {
        let normal = rotate * Vector3::from(PLANT_NORMALS[i]);
        for &j in &PLANT_INDICES[i] {
            let corner = Vector3::from(PLANT_POSITIONS[i][j]) * n;
            let position = rotate * corner + offset;
            let uv = PLANT_UVS[i][j];
            out.push(BlockVertex {
                position: position.into(),
                normal: normal.into(),
                tex_coords: [
                    du + if uv[0] == 1 { TILE_SIZE } else { 0.0 },
                    dv + if uv[1] == 1 { TILE_SIZE } else { 0.0 },
                ],
                ao,
                light,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::block::block_type::BlockType;

    const OPEN: [[f32; 4]; 6] = [[0.0; 4]; 6];

    #[test]
    fn only_exposed_faces_are_emitted() {
        let mut out = Vec::new();
        let exposed = [true, false, true, false, false, true];
        make_cube(&mut out, &OPEN, &OPEN, exposed, Point3::new(0.0, 0.0, 0.0), 0.5, 3);
        assert_eq!(out.len(), 3 * 6);
        assert!(out[..6].iter().all(|v| v.normal == [-1.0, 0.0, 0.0]));
        assert!(out[6..12].iter().all(|v| v.position[1] == 0.5));
    }

    #[test]
    fn diagonal_flips_toward_brighter_corners() {
        let mut ao = OPEN;
        ao[2] = [0.75, 0.0, 0.0, 0.75];
        let mut out = Vec::new();
        let mut exposed = [false; 6];
        exposed[BlockSide::TOP as usize] = true;
        make_cube(&mut out, &ao, &OPEN, exposed, Point3::new(0.0, 0.0, 0.0), 0.5, 1);
        let first_triangle_ao: Vec<f32> = out[..3].iter().map(|v| v.ao).collect();
        assert_eq!(first_triangle_ao, vec![0.75, 0.0, 0.0]);
    }

    #[test]
    fn textures_come_from_the_block_tiles() {
        let mut out = Vec::new();
        let mut exposed = [false; 6];
        exposed[BlockSide::TOP as usize] = true;
        make_cube(&mut out, &OPEN, &OPEN, exposed, Point3::new(0.0, 0.0, 0.0), 0.5, 1);
        // grass top is tile 32: column 0, row 2
        for v in &out {
            assert!(v.tex_coords[0] < TILE_SIZE);
            assert!(v.tex_coords[1] >= 2.0 * TILE_SIZE && v.tex_coords[1] <= 3.0 * TILE_SIZE);
        }
    }

    #[test]
    fn plants_are_rotated_about_their_center() {
        let mut out = Vec::new();
        let center = Point3::new(10.0, 5.0, -3.0);
        make_plant(&mut out, 0.25, 0.5, center, 0.5, BlockType::TALL_GRASS.value(), 45.0);
        assert_eq!(out.len(), PLANT_FACES * 6);
        for v in &out {
            let dx = v.position[0] - center.x;
            let dz = v.position[2] - center.z;
            assert!((dx * dx + dz * dz).sqrt() <= 0.5 + 1e-4);
            assert!((v.position[1] - center.y).abs() <= 0.5 + 1e-4);
            assert_eq!(v.ao, 0.25);
        }
    }
}
