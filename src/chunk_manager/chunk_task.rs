//! # Chunk Task
//!
//! The unit of work a chunk worker runs: optionally populate a chunk's voxels
//! from the terrain generator and the store, then mesh it.
//!
//! A task carries owned copies of the 3 x 3 neighbourhood's maps, taken when
//! the task was dispatched, so the worker never touches the chunk table.

use std::sync::Arc;

use crate::meshing::{ChunkMesh, Mesher, MesherInput};
use crate::task_management::task::Task;
use crate::voxels::chunk::ChunkAddress;
use crate::voxels::map::VoxelMap;
use crate::voxels::store::ChunkStore;
use crate::voxels::worldgen::TerrainGenerator;

/// Owned block or light maps of a 3 x 3 neighbourhood, indexed `[dp + 1][dq + 1]`.
pub type MapGrid = [[Option<VoxelMap>; 3]; 3];

/// Private state of one chunk worker.
pub struct ChunkWorkerContext {
    generator: Arc<dyn TerrainGenerator>,
    store: Arc<dyn ChunkStore>,
    mesher: Mesher,
}

impl ChunkWorkerContext {
    /// Creates a worker context sharing the generator and store.
    pub fn new(
        generator: Arc<dyn TerrainGenerator>,
        store: Arc<dyn ChunkStore>,
        mesher: Mesher,
    ) -> Self {
        ChunkWorkerContext {
            generator,
            store,
            mesher,
        }
    }
}

/// Work sent to a chunk worker.
pub struct ChunkTask {
    /// Chunk to produce.
    pub address: ChunkAddress,
    /// Whether the center maps must be populated before meshing.
    pub load: bool,
    /// Block maps of the neighbourhood.
    pub blocks: MapGrid,
    /// Light maps of the neighbourhood.
    pub lights: MapGrid,
}

/// What a chunk worker sends back.
pub struct ChunkTaskOutput {
    /// Chunk that was produced.
    pub address: ChunkAddress,
    /// Freshly populated `(blocks, lights)`, present when the task loaded them.
    pub loaded: Option<(VoxelMap, VoxelMap)>,
    /// Geometry of the chunk.
    pub mesh: ChunkMesh,
}

/// Fills a chunk's maps with generated terrain, then replays stored edits.
///
/// Stored blocks are applied after the terrain so player edits win.
pub fn populate_chunk(
    generator: &dyn TerrainGenerator,
    store: &dyn ChunkStore,
    address: ChunkAddress,
    blocks: &mut VoxelMap,
    lights: &mut VoxelMap,
) {
    generator.generate(address, &mut |x, y, z, w| {
        blocks.set(x, y, z, w);
    });
    store.load_blocks(blocks, address);
    store.load_lights(lights, address);
}

/// Borrows every present map of a grid.
pub fn borrow_grid(grid: &MapGrid) -> [[Option<&VoxelMap>; 3]; 3] {
    let mut borrowed = [[None; 3]; 3];
    for (row, maps) in borrowed.iter_mut().zip(grid) {
        for (slot, map) in row.iter_mut().zip(maps) {
            *slot = map.as_ref();
        }
    }
    borrowed
}

impl Task for ChunkTask {
    type Context = ChunkWorkerContext;
    type Output = ChunkTaskOutput;

    fn process(mut self, context: &mut ChunkWorkerContext) -> ChunkTaskOutput {
        if self.load {
            let origin = self.address.map_origin();
            let mut blocks = self.blocks[1][1].take().unwrap_or_else(|| VoxelMap::new(origin));
            let mut lights = self.lights[1][1].take().unwrap_or_else(|| VoxelMap::new(origin));
            populate_chunk(
                context.generator.as_ref(),
                context.store.as_ref(),
                self.address,
                &mut blocks,
                &mut lights,
            );
            self.blocks[1][1] = Some(blocks);
            self.lights[1][1] = Some(lights);
        }

        let input = MesherInput {
            address: self.address,
            blocks: borrow_grid(&self.blocks),
            lights: borrow_grid(&self.lights),
        };
        let mesh = context.mesher.compute(&input);

        let loaded = if self.load {
            let [_, [_, blocks, _], _] = self.blocks;
            let [_, [_, lights, _], _] = self.lights;
            blocks.zip(lights)
        } else {
            None
        };

        ChunkTaskOutput {
            address: self.address,
            loaded,
            mesh,
        }
    }
}
