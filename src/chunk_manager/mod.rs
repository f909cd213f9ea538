//! # Chunk Manager
//!
//! Owns every resident chunk and keeps their geometry in step with their
//! voxels while the viewpoint moves.
//!
//! ## Responsibilities
//! - Creating chunks near the viewpoint and evicting distant ones
//! - Handing load-and-mesh work to the worker pool, one chunk per idle worker
//! - Merging finished work back into the table and uploading geometry
//! - Meshing the chunks right around the viewpoint synchronously, so the
//!   ground under the player never waits for a worker
//! - Applying block, light and sign edits, propagating dirtiness and
//!   recording the edits in the [`ChunkStore`]
//!
//! ## Threading
//! The manager is single threaded. It is the only code that touches the chunk
//! table; workers get owned copies of the maps they need, taken at dispatch.
//!
//! ## Frame Order
//! [`ChunkManager::update`] merges finished workers first, then forces the
//! 3 x 3 ring around the viewpoint, then gives each idle worker the best chunk
//! of its partition. Eviction runs separately through
//! [`ChunkManager::delete_distant`].

pub mod chunk_task;
mod query;
mod scheduling;

use std::sync::Arc;

use cgmath::Point3;
use log::{debug, info, warn};

use crate::config::StreamConfig;
use crate::error::Result;
use crate::meshing::sign_mesh::build_sign_mesh;
use crate::meshing::text::{GlyphEmitter, QuadGlyphs};
use crate::meshing::{ChunkMesh, Mesher, MesherInput};
use crate::render::Renderer;
use crate::task_management::WorkerPool;
use crate::view::ChunkVisibility;
use crate::voxels::block::is_valid_block;
use crate::voxels::chunk::chunk_table::{ChunkIter, ChunkTable};
use crate::voxels::chunk::{chunked_block, Chunk, ChunkAddress, WORLD_HEIGHT};
use crate::voxels::map::Voxel;
use crate::voxels::sign::{Sign, SIGN_FACES};
use crate::voxels::store::ChunkStore;
use crate::voxels::worldgen::TerrainGenerator;

use chunk_task::{populate_chunk, ChunkTask, ChunkTaskOutput, ChunkWorkerContext};

pub use query::BlockHit;

/// Brightest light a light toggle places.
const LIGHT_ON: Voxel = 15;

/// Counters describing what the manager has done so far.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Tasks handed to workers.
    pub dispatched: usize,
    /// Worker results merged into a resident chunk.
    pub merged: usize,
    /// Worker results whose chunk was evicted while they were in flight.
    pub dropped_results: usize,
    /// Chunks meshed synchronously around the viewpoint.
    pub forced_meshes: usize,
    /// Chunk creations refused because the table was full.
    pub rejected_creations: usize,
    /// Chunks evicted for being too far away.
    pub evicted: usize,
    /// Tasks lost to a worker thread that died while running them.
    pub lost_tasks: usize,
}

/// What a worker is running, so the chunk can be recovered if the worker dies.
#[derive(Copy, Clone, Debug)]
struct InFlight {
    address: ChunkAddress,
    load: bool,
}

/// Streams chunks around a viewpoint.
pub struct ChunkManager {
    config: StreamConfig,
    table: ChunkTable,
    pool: WorkerPool<ChunkTask>,
    generator: Arc<dyn TerrainGenerator>,
    store: Arc<dyn ChunkStore>,
    mesher: Mesher,
    glyphs: Box<dyn GlyphEmitter>,
    in_flight: Vec<Option<InFlight>>,
    stats: ManagerStats,
}

impl ChunkManager {
    /// Creates the manager and starts its workers.
    ///
    /// # Arguments
    /// * `config` - Radii, capacity and pool size; validated here
    /// * `generator` - Base terrain for freshly loaded chunks
    /// * `store` - Where edits are recorded and replayed from
    ///
    /// # Returns
    /// The manager, or an error if the configuration is invalid or a worker
    /// thread could not be started.
    pub fn new(
        config: StreamConfig,
        generator: Arc<dyn TerrainGenerator>,
        store: Arc<dyn ChunkStore>,
    ) -> Result<Self> {
        config.validate()?;

        let worker_generator = Arc::clone(&generator);
        let worker_store = Arc::clone(&store);
        let (seed, show_lights) = (config.seed, config.show_lights);
        let pool = WorkerPool::new(config.workers, move |_| {
            ChunkWorkerContext::new(
                Arc::clone(&worker_generator),
                Arc::clone(&worker_store),
                Mesher::new(seed, show_lights),
            )
        })?;

        info!(
            "Chunk manager ready: {} workers, {} chunk capacity, radii create {} render {} delete {}",
            config.workers,
            config.max_chunks,
            config.create_radius,
            config.render_radius,
            config.delete_radius
        );

        Ok(ChunkManager {
            table: ChunkTable::new(config.max_chunks),
            mesher: Mesher::new(config.seed, config.show_lights),
            glyphs: Box::new(QuadGlyphs),
            in_flight: vec![None; config.workers],
            stats: ManagerStats::default(),
            pool,
            generator,
            store,
            config,
        })
    }

    /// Replaces the glyph layout used for sign text.
    pub fn set_glyph_emitter(&mut self, glyphs: Box<dyn GlyphEmitter>) {
        self.glyphs = glyphs;
    }

    /// The configuration the manager runs with.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Counters of the work done so far.
    pub fn stats(&self) -> ManagerStats {
        self.stats
    }

    /// Number of resident chunks.
    pub fn chunk_count(&self) -> usize {
        self.table.len()
    }

    /// The resident chunk at `(p, q)`, if any.
    pub fn find_chunk(&self, p: i32, q: i32) -> Option<&Chunk> {
        self.table.find(ChunkAddress::new(p, q))
    }

    /// Every resident chunk. Order is unspecified and changes on eviction.
    pub fn chunks(&self) -> ChunkIter<'_> {
        self.table.iter()
    }

    /// Runs one frame of streaming work.
    ///
    /// # Arguments
    /// * `position` - The viewpoint
    /// * `visibility` - Used to favour chunks that are on screen
    /// * `renderer` - Receives geometry of merged and forced chunks
    pub fn update(
        &mut self,
        position: Point3<f32>,
        visibility: &dyn ChunkVisibility,
        renderer: &mut dyn Renderer,
    ) {
        self.merge_finished(renderer);
        self.force_around_point(position.x, position.z, renderer);
        let center = ChunkAddress::containing(position.x, position.z);
        for index in 0..self.pool.len() {
            if self.pool.is_idle(index) {
                self.schedule_worker(index, center, visibility);
            }
        }
    }

    /// Makes sure the 3 x 3 chunks around `(x, z)` exist and are meshed.
    ///
    /// Missing chunks are created and loaded on this thread, subject to the
    /// table's capacity; dirty ones are re-meshed.
    pub fn force_around_point(&mut self, x: f32, z: f32, renderer: &mut dyn Renderer) {
        let center = ChunkAddress::containing(x, z);
        for (_, address) in center.neighborhood() {
            match self.table.find(address).map(Chunk::is_dirty) {
                Some(true) => self.mesh_now(address, renderer),
                Some(false) => {}
                None => {
                    if self.create_chunk(address).is_some() {
                        if let Some(chunk) = self.table.find_mut(address) {
                            populate_chunk(
                                self.generator.as_ref(),
                                self.store.as_ref(),
                                address,
                                &mut chunk.blocks,
                                &mut chunk.lights,
                            );
                        }
                        self.mesh_now(address, renderer);
                    }
                }
            }
        }
    }

    /// Writes a block, keeping the neighbours' ghost copies in step.
    ///
    /// The owning chunk gets `w`; every neighbour whose border column covers
    /// the voxel gets `-w`. Writing `0` also removes the voxel's signs and
    /// clears its light. Edits are recorded even for chunks that are not
    /// resident. Positions outside the world's height and values that are not
    /// in the block catalogue are ignored.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, w: Voxel) {
        if !(0..WORLD_HEIGHT).contains(&y) {
            return;
        }
        if !is_valid_block(w) {
            debug!("Ignoring write of unknown block {w} at ({x}, {y}, {z})");
            return;
        }
        let owner = ChunkAddress::containing_block(x, z);
        self.set_block_in(owner, x, y, z, w);
        for dx in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                if dx != 0 && chunked_block(x + dx) == owner.p {
                    continue;
                }
                if dz != 0 && chunked_block(z + dz) == owner.q {
                    continue;
                }
                self.set_block_in(owner.offset(dx, dz), x, y, z, -w);
            }
        }
    }

    fn set_block_in(&mut self, address: ChunkAddress, x: i32, y: i32, z: i32, w: Voxel) {
        match self.table.find_mut(address) {
            Some(chunk) => {
                if chunk.blocks.set(x, y, z, w) {
                    self.mark_dirty(address);
                    self.store.insert_block(address, x, y, z, w);
                }
            }
            None => self.store.insert_block(address, x, y, z, w),
        }
        if w == 0 && ChunkAddress::containing_block(x, z) == address {
            self.unset_signs(x, y, z);
            self.set_light(address, x, y, z, 0);
        }
    }

    fn set_light(&mut self, address: ChunkAddress, x: i32, y: i32, z: i32, w: Voxel) {
        let had_lights = self.has_lights(address);
        match self.table.find_mut(address) {
            Some(chunk) => {
                if chunk.lights.set(x, y, z, w) {
                    self.mark_dirty(address);
                    if had_lights {
                        self.dirty_neighborhood(address);
                    }
                    self.store.insert_light(address, x, y, z, w);
                }
            }
            None => self.store.insert_light(address, x, y, z, w),
        }
    }

    /// Switches the light at a voxel between off and full brightness.
    ///
    /// Only resident chunks can be toggled. Positions outside the world's
    /// height are ignored.
    pub fn toggle_light(&mut self, x: i32, y: i32, z: i32) {
        if !(0..WORLD_HEIGHT).contains(&y) {
            return;
        }
        let address = ChunkAddress::containing_block(x, z);
        let had_lights = self.has_lights(address);
        let Some(chunk) = self.table.find_mut(address) else {
            return;
        };
        let w = if chunk.lights.get(x, y, z) != 0 { 0 } else { LIGHT_ON };
        chunk.lights.set(x, y, z, w);
        self.store.insert_light(address, x, y, z, w);
        self.mark_dirty(address);
        if had_lights {
            self.dirty_neighborhood(address);
        }
    }

    /// Places text on one face of a voxel. Empty text removes the sign on
    /// that face. Faces outside `0..8` and positions outside the world's
    /// height are ignored.
    pub fn set_sign(&mut self, x: i32, y: i32, z: i32, face: i32, text: &str) {
        if !(0..SIGN_FACES).contains(&face) || !(0..WORLD_HEIGHT).contains(&y) {
            return;
        }
        let address = ChunkAddress::containing_block(x, z);
        if text.is_empty() {
            match self.table.find_mut(address) {
                Some(chunk) => {
                    if chunk.signs.remove(x, y, z, face) > 0 {
                        chunk.dirty = true;
                        self.store.delete_sign(x, y, z, face);
                    }
                }
                None => self.store.delete_sign(x, y, z, face),
            }
            return;
        }
        let sign = Sign::new(x, y, z, face, text);
        if let Some(chunk) = self.table.find_mut(address) {
            chunk.signs.add(sign.clone());
            chunk.dirty = true;
        }
        self.store.insert_sign(address, &sign);
    }

    fn unset_signs(&mut self, x: i32, y: i32, z: i32) {
        let address = ChunkAddress::containing_block(x, z);
        match self.table.find_mut(address) {
            Some(chunk) => {
                if chunk.signs.remove_all(x, y, z) > 0 {
                    chunk.dirty = true;
                    self.store.delete_signs(x, y, z);
                }
            }
            None => self.store.delete_signs(x, y, z),
        }
    }

    /// Marks a chunk as needing a new mesh.
    ///
    /// When any chunk of its 3 x 3 neighbourhood holds lights, the whole
    /// neighbourhood is marked, since light crosses chunk borders.
    pub fn mark_dirty(&mut self, address: ChunkAddress) {
        let Some(chunk) = self.table.find_mut(address) else {
            return;
        };
        chunk.dirty = true;
        if self.has_lights(address) {
            self.dirty_neighborhood(address);
        }
    }

    fn has_lights(&self, address: ChunkAddress) -> bool {
        self.config.show_lights
            && address.neighborhood().any(|(_, other)| {
                self.table
                    .find(other)
                    .is_some_and(|chunk| !chunk.lights.is_empty())
            })
    }

    fn dirty_neighborhood(&mut self, address: ChunkAddress) {
        for (_, other) in address.neighborhood() {
            if let Some(chunk) = self.table.find_mut(other) {
                chunk.dirty = true;
            }
        }
    }

    /// Evicts every chunk at Chebyshev distance `delete_radius` or more from
    /// the chunk containing `(x, z)`, releasing its geometry.
    pub fn delete_distant(&mut self, x: f32, z: f32, renderer: &mut dyn Renderer) {
        let center = ChunkAddress::containing(x, z);
        let radius = self.config.delete_radius;
        let evicted = self
            .table
            .evict_where(|chunk| chunk.address().chebyshev(center) >= radius);
        for chunk in &evicted {
            if let Some(handle) = chunk.render_handle() {
                renderer.delete(handle);
            }
        }
        if !evicted.is_empty() {
            debug!(
                "Evicted {} chunks around ({}, {}), {} resident",
                evicted.len(),
                center.p,
                center.q,
                self.table.len()
            );
            self.stats.evicted += evicted.len();
        }
    }

    /// Drops every chunk and releases its geometry. Results still in flight
    /// are discarded when they arrive.
    pub fn reset(&mut self, renderer: &mut dyn Renderer) {
        let mut released = 0;
        for chunk in self.table.drain() {
            if let Some(handle) = chunk.render_handle() {
                renderer.delete(handle);
                released += 1;
            }
        }
        debug!("Reset chunk table, released {released} geometry handles");
    }

    /// Releases all geometry before the renderer goes away.
    pub fn shutdown(&mut self, renderer: &mut dyn Renderer) {
        info!("Shutting down chunk manager with {} resident chunks", self.table.len());
        self.reset(renderer);
    }

    /// Chunks to draw: within `render_radius` of the chunk containing
    /// `(x, z)`, holding geometry, and visible between their own bounds.
    pub fn renderable_chunks<'a>(
        &'a self,
        x: f32,
        z: f32,
        visibility: &'a dyn ChunkVisibility,
    ) -> impl Iterator<Item = &'a Chunk> + 'a {
        let center = ChunkAddress::containing(x, z);
        let radius = self.config.render_radius;
        self.table.iter().filter(move |chunk| {
            chunk.address().chebyshev(center) <= radius
                && chunk.render_handle().is_some()
                && visibility.is_chunk_visible(chunk.address(), chunk.miny(), chunk.maxy())
        })
    }

    /// Chunks whose signs should be drawn: within `sign_radius`, holding
    /// signs, and visible.
    pub fn sign_chunks<'a>(
        &'a self,
        x: f32,
        z: f32,
        visibility: &'a dyn ChunkVisibility,
    ) -> impl Iterator<Item = &'a Chunk> + 'a {
        let center = ChunkAddress::containing(x, z);
        let radius = self.config.sign_radius;
        self.table.iter().filter(move |chunk| {
            chunk.address().chebyshev(center) <= radius
                && !chunk.signs().is_empty()
                && visibility.is_chunk_visible(chunk.address(), chunk.miny(), chunk.maxy())
        })
    }

    /// Inserts a new chunk, loading its signs and propagating dirtiness.
    ///
    /// Returns `None` and counts the rejection when the table is full.
    fn create_chunk(&mut self, address: ChunkAddress) -> Option<usize> {
        let mut chunk = Chunk::new(address);
        self.store.load_signs(&mut chunk.signs, address);
        match self.table.insert(chunk) {
            Ok(index) => {
                self.mark_dirty(address);
                Some(index)
            }
            Err(full) => {
                self.stats.rejected_creations += 1;
                debug!("Not creating chunk ({}, {}): {}", address.p, address.q, full);
                None
            }
        }
    }

    /// Meshes a resident chunk on this thread from the live table.
    fn mesh_now(&mut self, address: ChunkAddress, renderer: &mut dyn Renderer) {
        let mut input = MesherInput::new(address);
        for ((a, b), other) in address.neighborhood() {
            if let Some(chunk) = self.table.find(other) {
                input.blocks[a][b] = Some(&chunk.blocks);
                input.lights[a][b] = Some(&chunk.lights);
            }
        }
        let mesh = self.mesher.compute(&input);
        self.stats.forced_meshes += 1;
        if let Some(chunk) = self.table.find_mut(address) {
            Self::apply_mesh(chunk, &mesh, self.glyphs.as_ref(), renderer);
            chunk.dirty = false;
        }
    }

    /// Collects finished work and merges it into the table.
    fn merge_finished(&mut self, renderer: &mut dyn Renderer) {
        for index in self.pool.poll() {
            self.recover_lost(index, renderer);
        }
        for index in 0..self.pool.len() {
            if let Some(output) = self.pool.take_done(index) {
                self.in_flight[index] = None;
                self.merge(output, renderer);
            }
        }
    }

    /// Puts the chunk worker `index` died on back in line.
    ///
    /// A chunk that was being loaded holds no data yet and is evicted so it
    /// is created afresh; a re-mesh only needs the chunk marked dirty again.
    fn recover_lost(&mut self, index: usize, renderer: &mut dyn Renderer) {
        let Some(InFlight { address, load }) = self.in_flight.get_mut(index).and_then(Option::take)
        else {
            return;
        };
        self.stats.lost_tasks += 1;
        warn!(
            "Worker {} died on chunk ({}, {}){}",
            index,
            address.p,
            address.q,
            if load { ", evicting it" } else { ", re-queueing it" }
        );
        if load {
            for chunk in self.table.evict_where(|chunk| chunk.address() == address) {
                if let Some(handle) = chunk.render_handle() {
                    renderer.delete(handle);
                }
            }
        } else if let Some(chunk) = self.table.find_mut(address) {
            chunk.dirty = true;
        }
    }

    fn merge(&mut self, output: ChunkTaskOutput, renderer: &mut dyn Renderer) {
        let ChunkTaskOutput {
            address,
            loaded,
            mesh,
        } = output;
        let Some(chunk) = self.table.find_mut(address) else {
            self.stats.dropped_results += 1;
            debug!("Dropping result for evicted chunk ({}, {})", address.p, address.q);
            return;
        };
        if let Some((blocks, lights)) = loaded {
            chunk.blocks = blocks;
            chunk.lights = lights;
        }
        Self::apply_mesh(chunk, &mesh, self.glyphs.as_ref(), renderer);
        self.stats.merged += 1;
        debug!(
            "Merged chunk ({}, {}): {} faces",
            address.p, address.q, mesh.faces
        );
    }

    fn apply_mesh(
        chunk: &mut Chunk,
        mesh: &ChunkMesh,
        glyphs: &dyn GlyphEmitter,
        renderer: &mut dyn Renderer,
    ) {
        chunk.miny = mesh.miny;
        chunk.maxy = mesh.maxy;
        let signs = build_sign_mesh(&chunk.signs, glyphs);
        renderer.upload(&mut chunk.render_handle, mesh, &signs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullRenderer;
    use crate::voxels::block::block_type::BlockType;
    use crate::voxels::store::MemoryStore;
    use crate::voxels::worldgen::{EmptyTerrain, FlatTerrain};

    fn manager_with(config: StreamConfig, store: Arc<MemoryStore>) -> ChunkManager {
        ChunkManager::new(config, Arc::new(EmptyTerrain), store).unwrap()
    }

    fn small_config() -> StreamConfig {
        StreamConfig {
            create_radius: 2,
            render_radius: 2,
            delete_radius: 4,
            sign_radius: 1,
            workers: 1,
            ..StreamConfig::default()
        }
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = StreamConfig {
            workers: 0,
            ..StreamConfig::default()
        };
        let result = ChunkManager::new(config, Arc::new(EmptyTerrain), Arc::new(MemoryStore::new()));
        assert!(result.is_err());
    }

    #[test]
    fn forcing_creates_and_meshes_the_ring() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(FlatTerrain {
            height: 2,
            block: BlockType::STONE,
        });
        let mut manager = ChunkManager::new(small_config(), generator, store).unwrap();
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);
        assert_eq!(manager.chunk_count(), 9);
        assert!(manager.chunks().all(|chunk| !chunk.is_dirty()));
        assert!(manager.chunks().all(|chunk| chunk.render_handle().is_some()));
        assert_eq!(manager.stats().forced_meshes, 9);
        assert_eq!(renderer.live_handles(), 9);
        // the bottom layer is buried under the top one and the floor
        let center = manager.find_chunk(0, 0).unwrap();
        assert_eq!((center.miny(), center.maxy()), (1, 1));
    }

    #[test]
    fn forcing_respects_capacity() {
        let config = StreamConfig {
            max_chunks: 4,
            ..small_config()
        };
        let mut manager = manager_with(config, Arc::new(MemoryStore::new()));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);
        assert_eq!(manager.chunk_count(), 4);
        assert_eq!(manager.stats().rejected_creations, 5);
    }

    #[test]
    fn edits_to_resident_chunks_mark_them_dirty_and_persist() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(small_config(), Arc::clone(&store));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);

        manager.set_block(5, 10, 5, BlockType::BRICK.value());
        let chunk = manager.find_chunk(0, 0).unwrap();
        assert!(chunk.is_dirty());
        assert_eq!(chunk.blocks().get(5, 10, 5), BlockType::BRICK.value());
        assert_eq!(
            store.recorded_block(ChunkAddress::new(0, 0), 5, 10, 5),
            Some(BlockType::BRICK.value())
        );
        // interior voxel: no neighbour is touched
        assert!(!manager.find_chunk(1, 0).unwrap().is_dirty());
    }

    #[test]
    fn unchanged_writes_do_nothing() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(small_config(), Arc::clone(&store));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);
        manager.set_block(5, 10, 5, 0);
        assert!(!manager.find_chunk(0, 0).unwrap().is_dirty());
        assert_eq!(store.recorded_block(ChunkAddress::new(0, 0), 5, 10, 5), None);
    }

    #[test]
    fn edits_to_absent_chunks_are_still_recorded() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(small_config(), Arc::clone(&store));
        manager.set_block(1000, 3, 1000, BlockType::SAND.value());
        assert_eq!(manager.chunk_count(), 0);
        assert_eq!(
            store.recorded_block(ChunkAddress::new(31, 31), 1000, 3, 1000),
            Some(BlockType::SAND.value())
        );
    }

    #[test]
    fn out_of_range_heights_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(small_config(), Arc::clone(&store));
        manager.set_block(0, -1, 0, 1);
        manager.set_block(0, WORLD_HEIGHT, 0, 1);
        assert_eq!(store.pending_writes(), 0);
    }

    #[test]
    fn unknown_block_values_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(small_config(), Arc::clone(&store));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);

        // a border voxel padded into three neighbours, then an interior one
        manager.set_block(31, 5, 0, i32::MIN);
        manager.set_block(6, 5, 5, i32::MIN);
        manager.set_block(6, 5, 6, -BlockType::STONE.value());
        manager.set_block(6, 5, 7, 9999);
        assert_eq!(store.pending_writes(), 0);
        assert!(manager.chunks().all(|chunk| !chunk.is_dirty()));
        assert_eq!(manager.get_block(31, 5, 0), 0);
        assert_eq!(manager.get_block(6, 5, 5), 0);

        manager.force_around_point(0.0, 0.0, &mut renderer);
        assert_eq!(manager.chunk_count(), 9);
    }

    #[test]
    fn extreme_recorded_values_still_mesh() {
        let store = Arc::new(MemoryStore::new());
        store.insert_block(ChunkAddress::new(0, 0), 6, 5, 5, i32::MIN);
        store.insert_block(ChunkAddress::new(0, 0), 6, 6, 5, i32::MAX);
        let mut manager = manager_with(small_config(), store);
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);
        assert!(manager.find_chunk(0, 0).unwrap().render_handle().is_some());
    }

    #[test]
    fn lights_and_signs_out_of_height_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(small_config(), Arc::clone(&store));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);

        manager.toggle_light(5, -1, 5);
        manager.toggle_light(5, WORLD_HEIGHT, 5);
        manager.set_sign(5, 300, 5, 0, "x");
        manager.set_sign(5, -4, 5, 1, "y");
        assert_eq!(store.pending_writes(), 0);
        assert_eq!(store.sign_count(), 0);
        assert!(manager.chunks().all(|chunk| !chunk.is_dirty()));
        assert!(manager.find_chunk(0, 0).unwrap().signs().is_empty());
    }

    #[test]
    fn clearing_a_block_removes_its_signs_and_light() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(small_config(), Arc::clone(&store));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);

        manager.set_block(5, 10, 5, BlockType::STONE.value());
        manager.set_sign(5, 10, 5, 2, "hello");
        manager.toggle_light(5, 10, 5);
        assert_eq!(manager.find_chunk(0, 0).unwrap().signs().len(), 1);
        assert_eq!(manager.find_chunk(0, 0).unwrap().lights().get(5, 10, 5), 15);

        manager.set_block(5, 10, 5, 0);
        let chunk = manager.find_chunk(0, 0).unwrap();
        assert!(chunk.signs().is_empty());
        assert_eq!(chunk.lights().get(5, 10, 5), 0);
        assert_eq!(store.sign_count(), 0);
        assert_eq!(store.recorded_light(ChunkAddress::new(0, 0), 5, 10, 5), Some(0));
    }

    #[test]
    fn toggling_lights_dirties_the_neighbourhood() {
        let mut manager = manager_with(small_config(), Arc::new(MemoryStore::new()));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);
        assert!(manager.chunks().all(|chunk| !chunk.is_dirty()));

        manager.toggle_light(5, 10, 5);
        assert!(manager.chunks().all(|chunk| chunk.is_dirty()));

        manager.force_around_point(0.0, 0.0, &mut renderer);
        manager.toggle_light(5, 10, 5);
        assert_eq!(manager.find_chunk(0, 0).unwrap().lights().get(5, 10, 5), 0);
        assert!(manager.chunks().all(|chunk| chunk.is_dirty()));
    }

    #[test]
    fn signs_replace_and_remove_per_face() {
        let store = Arc::new(MemoryStore::new());
        let mut manager = manager_with(small_config(), Arc::clone(&store));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);

        manager.set_sign(1, 5, 1, 0, "first");
        manager.set_sign(1, 5, 1, 0, "second");
        manager.set_sign(1, 5, 1, 4, "top");
        manager.set_sign(1, 5, 1, 9, "ignored");
        let chunk = manager.find_chunk(0, 0).unwrap();
        assert_eq!(chunk.signs().len(), 2);
        assert!(chunk.signs().iter().any(|sign| sign.text == "second"));
        assert!(chunk.is_dirty());

        manager.set_sign(1, 5, 1, 0, "");
        assert_eq!(manager.find_chunk(0, 0).unwrap().signs().len(), 1);
        assert_eq!(store.sign_count(), 1);
    }

    #[test]
    fn distant_chunks_are_evicted_with_their_geometry() {
        let mut manager = manager_with(small_config(), Arc::new(MemoryStore::new()));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);
        manager.force_around_point(32.0 * 10.0, 0.0, &mut renderer);
        assert_eq!(manager.chunk_count(), 18);

        manager.delete_distant(32.0 * 10.0, 0.0, &mut renderer);
        assert_eq!(manager.chunk_count(), 9);
        assert_eq!(manager.stats().evicted, 9);
        assert_eq!(renderer.deletes(), 9);
        assert!(manager.chunks().all(|chunk| chunk.address().p >= 9));
    }

    #[test]
    fn shutdown_releases_every_handle() {
        let mut manager = manager_with(small_config(), Arc::new(MemoryStore::new()));
        let mut renderer = NullRenderer::new();
        manager.force_around_point(0.0, 0.0, &mut renderer);
        manager.shutdown(&mut renderer);
        assert_eq!(manager.chunk_count(), 0);
        assert_eq!(renderer.live_handles(), 0);
    }
}
