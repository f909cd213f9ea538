//! # Chunk Meshing
//!
//! Turns the voxels of one chunk into triangles. The mesher needs the chunk's
//! eight neighbours as well: faces on the chunk border are culled against the
//! neighbour's voxels, light emitted in a neighbour bleeds into the chunk, and
//! ambient occlusion samples one voxel past every face.
//!
//! ## Pipeline
//! 1. Rasterize the opacity of all nine block maps into a dense scratch grid
//!    (see [`grid`]) and record the highest opaque cell of every column.
//! 2. Flood fill light from every entry of the nine light maps.
//! 3. Count the exposed faces of the center chunk and its vertical bounds.
//! 4. Emit cube faces or plant quads with per-corner occlusion and light.
//!
//! The scratch buffers live in the [`Mesher`] and are reused between chunks,
//! so every worker thread keeps one mesher for its whole life.

pub mod geometry;
pub mod grid;
pub mod light;
pub mod occlusion;
pub mod sign_mesh;
pub mod text;
pub mod vertex;

use bitvec::vec::BitVec;
use cgmath::Point3;

use crate::voxels::block::{is_plant, is_transparent};
use crate::voxels::chunk::{ChunkAddress, WORLD_HEIGHT};
use crate::voxels::map::VoxelMap;
use crate::voxels::worldgen::OctaveNoise;

use self::geometry::{make_cube, make_plant, PLANT_FACES};
use self::grid::{CELLS, COLUMNS};
use self::light::LightPropagator;
use self::occlusion::Neighborhood;
use self::vertex::{BlockVertex, VERTICES_PER_FACE};

/// Sky shade falls off over this many cells below an overhang.
const SHADE_DEPTH: i32 = 8;

/// The nine block and light maps around the chunk being meshed, indexed
/// `[dp + 1][dq + 1]`. Missing neighbours are `None`.
#[derive(Clone, Copy, Debug)]
pub struct MesherInput<'a> {
    /// Address of the center chunk.
    pub address: ChunkAddress,
    /// Block maps of the 3 x 3 neighbourhood.
    pub blocks: [[Option<&'a VoxelMap>; 3]; 3],
    /// Light maps of the 3 x 3 neighbourhood.
    pub lights: [[Option<&'a VoxelMap>; 3]; 3],
}

impl<'a> MesherInput<'a> {
    /// Input with no neighbours at all.
    pub fn new(address: ChunkAddress) -> Self {
        MesherInput {
            address,
            blocks: [[None; 3]; 3],
            lights: [[None; 3]; 3],
        }
    }

    fn center_blocks(&self) -> Option<&'a VoxelMap> {
        self.blocks[1][1]
    }
}

/// Geometry of one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkMesh {
    /// Six vertices per face.
    pub vertices: Vec<BlockVertex>,
    /// Number of faces in `vertices`.
    pub faces: usize,
    /// Lowest Y holding a visible voxel, [`WORLD_HEIGHT`] when there is none.
    pub miny: i32,
    /// Highest Y holding a visible voxel, `0` when there is none.
    pub maxy: i32,
}

impl Default for ChunkMesh {
    fn default() -> Self {
        ChunkMesh {
            vertices: Vec::new(),
            faces: 0,
            miny: WORLD_HEIGHT,
            maxy: 0,
        }
    }
}

/// Exposed faces of the voxel at a grid cell, in block side order.
struct Exposure {
    faces: [bool; 6],
    count: usize,
}

/// Reusable chunk mesher.
pub struct Mesher {
    opaque: BitVec,
    light: Vec<u8>,
    highest: Vec<u16>,
    propagator: LightPropagator,
    plant_rotation: OctaveNoise,
    show_lights: bool,
}

impl Mesher {
    /// Creates a mesher with freshly allocated scratch buffers.
    ///
    /// # Arguments
    /// * `seed` - Seed of the noise that rotates plants
    /// * `show_lights` - When `false`, light maps are ignored
    pub fn new(seed: u32, show_lights: bool) -> Self {
        Mesher {
            opaque: BitVec::repeat(false, CELLS),
            light: vec![0; CELLS],
            highest: vec![0; COLUMNS],
            propagator: LightPropagator::new(),
            plant_rotation: OctaveNoise::new(seed, 4, 0.5, 2.0),
            show_lights,
        }
    }

    /// Meshes the center chunk of `input`.
    ///
    /// Only positive values of the center block map produce geometry; ghost
    /// copies and the neighbours only ever cull, shade or light it.
    pub fn compute(&mut self, input: &MesherInput<'_>) -> ChunkMesh {
        let Some(center) = input.center_blocks() else {
            return ChunkMesh::default();
        };
        let origin = grid::origin(input.address);
        self.rasterize(input, origin);

        let to_grid = |x: i32, y: i32, z: i32| (x - origin.0, y - origin.1, z - origin.2);

        let mut mesh = ChunkMesh::default();
        for (ex, ey, ez, ew) in center.iter() {
            if ew <= 0 {
                continue;
            }
            let (x, y, z) = to_grid(ex, ey, ez);
            let exposure = self.exposure(x, y, z, ey);
            if exposure.count == 0 {
                continue;
            }
            mesh.faces += if is_plant(ew) { PLANT_FACES } else { exposure.count };
            mesh.miny = mesh.miny.min(ey);
            mesh.maxy = mesh.maxy.max(ey);
        }

        mesh.vertices.reserve(mesh.faces * VERTICES_PER_FACE);
        for (ex, ey, ez, ew) in center.iter() {
            if ew <= 0 {
                continue;
            }
            let (x, y, z) = to_grid(ex, ey, ez);
            let exposure = self.exposure(x, y, z, ey);
            if exposure.count == 0 {
                continue;
            }
            let occlusion = self.sample(x, y, z).occlusion();
            let position = Point3::new(ex as f32, ey as f32, ez as f32);
            if is_plant(ew) {
                let min_ao = occlusion.ao.iter().flatten().copied().fold(1.0, f32::min);
                let max_light = occlusion.light.iter().flatten().copied().fold(0.0, f32::max);
                let rotation = self.plant_rotation.sample2(f64::from(ex), f64::from(ez)) * 360.0;
                make_plant(&mut mesh.vertices, min_ao, max_light, position, 0.5, ew, rotation as f32);
            } else {
                make_cube(
                    &mut mesh.vertices,
                    &occlusion.ao,
                    &occlusion.light,
                    exposure.faces,
                    position,
                    0.5,
                    ew,
                );
            }
        }

        log::trace!(
            "Meshed chunk ({}, {}): {} faces, y {}..={}",
            input.address.p,
            input.address.q,
            mesh.faces,
            mesh.miny,
            mesh.maxy
        );
        mesh
    }

    fn rasterize(&mut self, input: &MesherInput<'_>, origin: (i32, i32, i32)) {
        self.opaque.fill(false);
        self.light.fill(0);
        self.highest.fill(0);

        for map in input.blocks.iter().flatten().flatten() {
            for (ex, ey, ez, ew) in map.iter() {
                let (x, y, z) = (ex - origin.0, ey - origin.1, ez - origin.2);
                let Some(index) = grid::index(x, y, z) else {
                    continue;
                };
                let opaque = !is_transparent(ew);
                self.opaque.set(index, opaque);
                if opaque {
                    if let Some(column) = grid::column(x, z) {
                        // y < Y_SIZE, which fits a u16
                        self.highest[column] = self.highest[column].max(y as u16);
                    }
                }
            }
        }

        if !self.show_lights {
            return;
        }
        let has_light = input.lights.iter().flatten().flatten().any(|map| !map.is_empty());
        if !has_light {
            return;
        }
        for map in input.lights.iter().flatten().flatten() {
            for (ex, ey, ez, ew) in map.iter() {
                let cell = (ex - origin.0, ey - origin.1, ez - origin.2);
                self.propagator.fill(&self.opaque, &mut self.light, cell, ew);
            }
        }
    }

    fn is_opaque(&self, x: i32, y: i32, z: i32) -> bool {
        grid::index(x, y, z).is_some_and(|index| self.opaque[index])
    }

    fn exposure(&self, x: i32, y: i32, z: i32, world_y: i32) -> Exposure {
        let faces = [
            !self.is_opaque(x - 1, y, z),
            !self.is_opaque(x + 1, y, z),
            !self.is_opaque(x, y + 1, z),
            !self.is_opaque(x, y - 1, z) && world_y > 0,
            !self.is_opaque(x, y, z - 1),
            !self.is_opaque(x, y, z + 1),
        ];
        let count = faces.iter().filter(|&&exposed| exposed).count();
        Exposure { faces, count }
    }

    /// Samples opacity, light and sky shade of the 27 cells around `(x, y, z)`.
    fn sample(&self, x: i32, y: i32, z: i32) -> Neighborhood {
        let mut neighborhood = Neighborhood::default();
        let mut index = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let (sx, sy, sz) = (x + dx, y + dy, z + dz);
                    neighborhood.opaque[index] = self.is_opaque(sx, sy, sz);
                    neighborhood.light[index] =
                        grid::index(sx, sy, sz).map_or(0, |cell| self.light[cell]);
                    neighborhood.shade[index] = self.shade(sx, sy, sz);
                    index += 1;
                }
            }
        }
        neighborhood
    }

    /// Darkness cast on a cell by the nearest opaque cell above it.
    fn shade(&self, x: i32, y: i32, z: i32) -> f32 {
        let Some(column) = grid::column(x, z) else {
            return 0.0;
        };
        if y > i32::from(self.highest[column]) {
            return 0.0;
        }
        (0..SHADE_DEPTH)
            .find(|&oy| self.is_opaque(x, y + oy, z))
            .map_or(0.0, |oy| 1.0 - oy as f32 * 0.125)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::block::block_type::BlockType;

    fn single(address: ChunkAddress, x: i32, y: i32, z: i32, w: i32) -> VoxelMap {
        let mut map = VoxelMap::new(address.map_origin());
        map.set(x, y, z, w);
        map
    }

    fn mesh_one(map: &VoxelMap, address: ChunkAddress) -> ChunkMesh {
        let mut input = MesherInput::new(address);
        input.blocks[1][1] = Some(map);
        Mesher::new(0, true).compute(&input)
    }

    #[test]
    fn lone_voxel_shows_every_face() {
        let address = ChunkAddress::new(0, 0);
        let map = single(address, 5, 10, 5, BlockType::STONE.value());
        let mesh = mesh_one(&map, address);
        assert_eq!(mesh.faces, 6);
        assert_eq!(mesh.vertices.len(), 6 * VERTICES_PER_FACE);
        assert_eq!((mesh.miny, mesh.maxy), (10, 10));
    }

    #[test]
    fn floor_voxel_hides_its_bottom() {
        let address = ChunkAddress::new(-1, 2);
        let map = single(address, -20, 0, 70, BlockType::STONE.value());
        assert_eq!(mesh_one(&map, address).faces, 5);
    }

    #[test]
    fn empty_chunk_has_default_bounds() {
        let address = ChunkAddress::new(0, 0);
        let map = VoxelMap::new(address.map_origin());
        let mesh = mesh_one(&map, address);
        assert_eq!(mesh, ChunkMesh::default());
        assert_eq!((mesh.miny, mesh.maxy), (WORLD_HEIGHT, 0));
    }

    #[test]
    fn touching_voxels_cull_shared_faces() {
        let address = ChunkAddress::new(0, 0);
        let mut map = single(address, 5, 10, 5, BlockType::STONE.value());
        map.set(6, 10, 5, BlockType::BRICK.value());
        map.set(6, 11, 5, BlockType::GLASS.value());
        // glass does not cull the brick below it, but the brick culls the glass
        assert_eq!(mesh_one(&map, address).faces, 5 + 5 + 5);
    }

    #[test]
    fn ghost_voxels_cull_without_emitting() {
        let address = ChunkAddress::new(0, 0);
        // x = 31 is the chunk's last column; x = 32 is the ghost border
        let mut map = single(address, 31, 10, 5, BlockType::STONE.value());
        map.set(32, 10, 5, -BlockType::STONE.value());
        let mesh = mesh_one(&map, address);
        assert_eq!(mesh.faces, 5);
    }

    #[test]
    fn neighbour_maps_cull_across_the_border() {
        let address = ChunkAddress::new(0, 0);
        let center = single(address, 31, 10, 5, BlockType::STONE.value());
        let east = single(address.offset(1, 0), 32, 10, 5, BlockType::STONE.value());
        let mut input = MesherInput::new(address);
        input.blocks[1][1] = Some(&center);
        input.blocks[2][1] = Some(&east);
        assert_eq!(Mesher::new(0, true).compute(&input).faces, 5);
    }

    #[test]
    fn plants_always_emit_four_faces() {
        let address = ChunkAddress::new(0, 0);
        let mut map = single(address, 5, 10, 5, BlockType::YELLOW_FLOWER.value());
        map.set(5, 9, 5, BlockType::GRASS.value());
        let mesh = mesh_one(&map, address);
        // the flower above does not cull the grass top
        assert_eq!(mesh.faces, 4 + 6);
    }

    #[test]
    fn meshing_is_deterministic() {
        let address = ChunkAddress::new(2, -3);
        let origin = address.map_origin();
        let mut blocks = VoxelMap::new(origin);
        let mut lights = VoxelMap::new(origin);
        for i in 0..20 {
            blocks.set(origin.x + 1 + i, 10 + i % 3, origin.z + 1 + (i * 7) % 32, 1 + i % 10);
        }
        blocks.set(origin.x + 4, 12, origin.z + 4, BlockType::TALL_GRASS.value());
        lights.set(origin.x + 3, 11, origin.z + 3, 15);
        let mut input = MesherInput::new(address);
        input.blocks[1][1] = Some(&blocks);
        input.lights[1][1] = Some(&lights);

        let mut mesher = Mesher::new(7, true);
        let first = mesher.compute(&input);
        let second = mesher.compute(&input);
        let fresh = Mesher::new(7, true).compute(&input);
        assert_eq!(first, second);
        assert_eq!(first, fresh);
    }

    #[test]
    fn emitters_render_fully_lit() {
        let address = ChunkAddress::new(0, 0);
        let blocks = single(address, 5, 10, 5, BlockType::STONE.value());
        let lights = single(address, 5, 10, 5, 15);
        let mut input = MesherInput::new(address);
        input.blocks[1][1] = Some(&blocks);
        input.lights[1][1] = Some(&lights);

        let lit = Mesher::new(0, true).compute(&input);
        assert!(lit.vertices.iter().all(|v| v.light == 10.0));

        let unlit = Mesher::new(0, false).compute(&input);
        assert!(unlit.vertices.iter().all(|v| v.light == 0.0));
    }

    #[test]
    fn neighbour_light_reaches_the_chunk() {
        let address = ChunkAddress::new(0, 0);
        let blocks = single(address, 0, 10, 5, BlockType::STONE.value());
        let west_lights = single(address.offset(-1, 0), -3, 10, 5, 15);
        let mut input = MesherInput::new(address);
        input.blocks[1][1] = Some(&blocks);
        input.lights[0][1] = Some(&west_lights);
        let mesh = Mesher::new(0, true).compute(&input);
        assert!(mesh.vertices.iter().any(|v| v.light > 0.0));
    }

    #[test]
    fn overhangs_shade_the_ground() {
        let address = ChunkAddress::new(0, 0);
        let mut map = single(address, 5, 10, 5, BlockType::STONE.value());
        let open = mesh_one(&map, address);
        map.set(5, 13, 5, BlockType::STONE.value());
        let covered = mesh_one(&map, address);
        let top_ao = |mesh: &ChunkMesh| {
            mesh.vertices
                .iter()
                .filter(|v| v.normal == [0.0, 1.0, 0.0] && v.position[1] == 10.5)
                .map(|v| v.ao)
                .fold(0.0, f32::max)
        };
        assert_eq!(top_ao(&open), 0.0);
        assert!(top_ao(&covered) > 0.0);
    }
}
