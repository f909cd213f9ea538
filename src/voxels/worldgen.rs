//! # Terrain Generation
//!
//! Procedural base terrain for freshly loaded chunks. A generator writes
//! voxels through a callback; the caller decides where they land (usually the
//! chunk's block map). Player edits recorded by the chunk store are applied
//! afterwards and take precedence.
//!
//! Generators also write the one-voxel border around the chunk, negated, so a
//! chunk culls the faces hidden by its neighbour's terrain before that
//! neighbour is ever loaded.

use noise::{Fbm, MultiFractal, NoiseFn, Simplex};

use crate::config::StreamConfig;

use super::block::block_type::BlockType;
use super::chunk::{ChunkAddress, CHUNK_SIZE};
use super::map::Voxel;

/// Produces base terrain for a chunk.
pub trait TerrainGenerator: Send + Sync {
    /// Writes the terrain of `address` (and its negated border) through `set`.
    ///
    /// # Arguments
    /// * `address` - The chunk being generated
    /// * `set` - Receives `(x, y, z, w)` in world coordinates
    fn generate(&self, address: ChunkAddress, set: &mut dyn FnMut(i32, i32, i32, Voxel));
}

/// Fractal simplex noise sampled in `[0, 1]`.
#[derive(Clone, Debug)]
pub struct OctaveNoise {
    fbm: Fbm<Simplex>,
}

impl OctaveNoise {
    /// Creates a noise source.
    ///
    /// # Arguments
    /// * `seed` - Seed of the first octave
    /// * `octaves` - Number of octaves summed
    /// * `persistence` - Amplitude factor between octaves
    /// * `lacunarity` - Frequency factor between octaves
    pub fn new(seed: u32, octaves: usize, persistence: f64, lacunarity: f64) -> Self {
        OctaveNoise {
            fbm: Fbm::<Simplex>::new(seed)
                .set_octaves(octaves)
                .set_frequency(1.0)
                .set_persistence(persistence)
                .set_lacunarity(lacunarity),
        }
    }

    /// Samples the 2-D field.
    pub fn sample2(&self, x: f64, z: f64) -> f64 {
        Self::normalize(self.fbm.get([x, z]))
    }

    /// Samples the 3-D field.
    pub fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        Self::normalize(self.fbm.get([x, y, z]))
    }

    fn normalize(value: f64) -> f64 {
        ((value + 1.0) / 2.0).clamp(0.0, 1.0)
    }
}

/// Lowest terrain height; columns below it are filled with sand up to here.
const SEA_LEVEL: i32 = 12;
/// Y range of the cloud layer.
const CLOUD_LAYER: std::ops::Range<i32> = 64..72;
/// Trees are only planted this far inside the chunk so their canopy stays in it.
const TREE_MARGIN: i32 = 4;

/// Rolling sand and grass hills with plants, trees and a cloud layer.
pub struct NoiseTerrain {
    height: OctaveNoise,
    roughness: OctaveNoise,
    plants: OctaveNoise,
    trees: OctaveNoise,
    clouds: OctaveNoise,
    show_plants: bool,
    show_trees: bool,
    show_clouds: bool,
}

impl NoiseTerrain {
    /// Creates the generator with every feature enabled.
    pub fn new(seed: u32) -> Self {
        NoiseTerrain {
            height: OctaveNoise::new(seed, 4, 0.5, 2.0),
            roughness: OctaveNoise::new(seed.wrapping_add(1), 2, 0.9, 2.0),
            plants: OctaveNoise::new(seed.wrapping_add(2), 4, 0.8, 2.0),
            trees: OctaveNoise::new(seed.wrapping_add(3), 6, 0.5, 2.0),
            clouds: OctaveNoise::new(seed.wrapping_add(4), 8, 0.5, 2.0),
            show_plants: true,
            show_trees: true,
            show_clouds: true,
        }
    }

    /// Creates the generator with the seed and feature switches of `config`.
    pub fn from_config(config: &StreamConfig) -> Self {
        NoiseTerrain {
            show_plants: config.show_plants,
            show_trees: config.show_trees,
            show_clouds: config.show_clouds,
            ..NoiseTerrain::new(config.seed)
        }
    }

    /// Terrain height of a column and the block its surface is made of.
    pub fn column(&self, x: i32, z: i32) -> (i32, BlockType) {
        let (fx, fz) = (x as f64, z as f64);
        let f = self.height.sample2(fx * 0.01, fz * 0.01);
        let g = self.roughness.sample2(-fx * 0.01, -fz * 0.01);
        let max_height = (g * 32.0 + 16.0) as i32;
        let h = (f * max_height as f64) as i32;
        if h <= SEA_LEVEL {
            (SEA_LEVEL, BlockType::SAND)
        } else {
            (h, BlockType::GRASS)
        }
    }

    fn plant_at(&self, x: f64, z: f64) -> Option<BlockType> {
        let mut plant = None;
        if self.plants.sample2(-x * 0.1, z * 0.1) > 0.6 {
            plant = Some(BlockType::TALL_GRASS);
        }
        if self.plants.sample2(x * 0.05, -z * 0.05) > 0.7 {
            let offset = (self.plants.sample2(x * 0.1, z * 0.1) * 7.0) as i32;
            let id = (BlockType::YELLOW_FLOWER.value() + offset).min(BlockType::BLUE_FLOWER.value());
            plant = BlockType::from_voxel(id);
        }
        plant
    }

    fn plant_tree(&self, x: i32, h: i32, z: i32, set: &mut dyn FnMut(i32, i32, i32, Voxel)) {
        for y in h + 3..h + 8 {
            for ox in -3..=3 {
                for oz in -3..=3 {
                    let dy = y - (h + 4);
                    if ox * ox + oz * oz + dy * dy < 11 {
                        set(x + ox, y, z + oz, BlockType::LEAVES.value());
                    }
                }
            }
        }
        for y in h..h + 7 {
            set(x, y, z, BlockType::WOOD.value());
        }
    }
}

impl TerrainGenerator for NoiseTerrain {
    fn generate(&self, address: ChunkAddress, set: &mut dyn FnMut(i32, i32, i32, Voxel)) {
        for dx in -1..=CHUNK_SIZE {
            for dz in -1..=CHUNK_SIZE {
                let border = !(0..CHUNK_SIZE).contains(&dx) || !(0..CHUNK_SIZE).contains(&dz);
                let flag = if border { -1 } else { 1 };
                let x = address.p * CHUNK_SIZE + dx;
                let z = address.q * CHUNK_SIZE + dz;

                let (h, surface) = self.column(x, z);
                for y in 0..h {
                    set(x, y, z, surface.value() * flag);
                }

                if surface == BlockType::GRASS {
                    if self.show_plants {
                        if let Some(plant) = self.plant_at(x as f64, z as f64) {
                            set(x, h, z, plant.value() * flag);
                        }
                    }
                    let inside = (TREE_MARGIN..CHUNK_SIZE - TREE_MARGIN).contains(&dx)
                        && (TREE_MARGIN..CHUNK_SIZE - TREE_MARGIN).contains(&dz);
                    if self.show_trees && inside && self.trees.sample2(x as f64, z as f64) > 0.84 {
                        self.plant_tree(x, h, z, set);
                    }
                }

                if self.show_clouds {
                    for y in CLOUD_LAYER {
                        let density = self
                            .clouds
                            .sample3(x as f64 * 0.01, y as f64 * 0.1, z as f64 * 0.01);
                        if density > 0.75 {
                            set(x, y, z, BlockType::CLOUD.value() * flag);
                        }
                    }
                }
            }
        }
    }
}

/// A flat slab of one block type, useful for tests and demos.
#[derive(Copy, Clone, Debug)]
pub struct FlatTerrain {
    /// Number of filled layers, starting at `y = 0`.
    pub height: i32,
    /// Block used for every layer.
    pub block: BlockType,
}

impl TerrainGenerator for FlatTerrain {
    fn generate(&self, address: ChunkAddress, set: &mut dyn FnMut(i32, i32, i32, Voxel)) {
        for dx in -1..=CHUNK_SIZE {
            for dz in -1..=CHUNK_SIZE {
                let border = !(0..CHUNK_SIZE).contains(&dx) || !(0..CHUNK_SIZE).contains(&dz);
                let w = if border { -self.block.value() } else { self.block.value() };
                let x = address.p * CHUNK_SIZE + dx;
                let z = address.q * CHUNK_SIZE + dz;
                for y in 0..self.height {
                    set(x, y, z, w);
                }
            }
        }
    }
}

/// Generates nothing; every chunk starts as air.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyTerrain;

impl TerrainGenerator for EmptyTerrain {
    fn generate(&self, _address: ChunkAddress, _set: &mut dyn FnMut(i32, i32, i32, Voxel)) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::map::VoxelMap;

    fn generate_into(generator: &dyn TerrainGenerator, address: ChunkAddress) -> VoxelMap {
        let mut map = VoxelMap::new(address.map_origin());
        generator.generate(address, &mut |x, y, z, w| {
            map.set(x, y, z, w);
        });
        map
    }

    #[test]
    fn noise_is_normalized() {
        let noise = OctaveNoise::new(7, 4, 0.5, 2.0);
        for i in -50..50 {
            let v = noise.sample2(i as f64 * 0.37, i as f64 * -1.3);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn terrain_is_deterministic() {
        let terrain = NoiseTerrain::new(3);
        let a = generate_into(&terrain, ChunkAddress::new(2, -1));
        let b = generate_into(&terrain, ChunkAddress::new(2, -1));
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn columns_never_dip_below_sea_level() {
        let terrain = NoiseTerrain::new(0);
        for x in (-200..200).step_by(13) {
            let (h, surface) = terrain.column(x, x * 3);
            assert!(h >= SEA_LEVEL);
            if h == SEA_LEVEL {
                assert_eq!(surface, BlockType::SAND);
            }
        }
    }

    #[test]
    fn border_voxels_are_ghosts() {
        let terrain = FlatTerrain {
            height: 2,
            block: BlockType::STONE,
        };
        let map = generate_into(&terrain, ChunkAddress::new(0, 0));
        assert_eq!(map.get(-1, 0, 5), -3);
        assert_eq!(map.get(32, 1, 32), -3);
        assert_eq!(map.get(0, 0, 0), 3);
        assert_eq!(map.get(31, 1, 31), 3);
        assert_eq!(map.get(5, 2, 5), 0);
    }

    #[test]
    fn ghost_flags_cover_every_border_voxel() {
        let config = StreamConfig {
            show_trees: false,
            ..StreamConfig::default()
        };
        let terrain = NoiseTerrain::from_config(&config);
        let map = generate_into(&terrain, ChunkAddress::new(-1, 4));
        for (x, _, z, w) in map.iter() {
            let local_x = x - (-CHUNK_SIZE);
            let local_z = z - 4 * CHUNK_SIZE;
            let border = !(0..CHUNK_SIZE).contains(&local_x) || !(0..CHUNK_SIZE).contains(&local_z);
            assert_eq!(border, w < 0, "voxel at ({x}, {z}) has value {w}");
        }
    }
}
