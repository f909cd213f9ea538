#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Stream
//!
//! Chunk streaming and meshing for a block world: keeps the chunks around a
//! moving viewpoint resident, loads and meshes them on background workers,
//! and evicts them again once the viewpoint moves away.
//!
//! ## Key Modules
//!
//! * `chunk_manager` - The chunk table owner: scheduling, merging, edits and queries
//! * `task_management` - Fixed pool of worker threads with one work slot each
//! * `meshing` - Face culling, ambient occlusion, light propagation and sign text
//! * `voxels` - Block catalogue, sparse voxel maps, chunks, stores and terrain
//! * `session` - One player's session: start, per-frame tick, commit, finish
//! * `view` / `clock` / `render` - The seams to the camera, time and GPU
//!
//! ## Architecture
//!
//! The manager thread owns every chunk. Workers receive owned copies of a
//! chunk's 3 x 3 neighbourhood, populate and mesh it, and send the result
//! back; the manager merges results and hands geometry to a [`render::Renderer`].
//! The only state shared with workers is the terrain generator and the store.
//!
//! ## Usage
//!
//! ```no_run
//! // Headless demo
//! fn main() {
//!     if voxel_stream::run().is_err() {
//!         std::process::exit(1);
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use log::info;

pub mod chunk_manager;
pub mod clock;
pub mod config;
pub mod error;
pub mod meshing;
pub mod render;
pub mod session;
pub mod task_management;
pub mod view;
pub mod voxels;

use clock::SystemTime;
use config::StreamConfig;
use render::NullRenderer;
use session::StreamingSession;
use view::View;
use voxels::block::block_type::BUILDABLE;
use voxels::store::MemoryStore;
use voxels::worldgen::NoiseTerrain;

pub use error::{Result, StreamError};

/// Frames the headless demo runs for.
const DEMO_FRAMES: u32 = 600;

/// Voxels the demo viewpoint moves per frame.
const DEMO_SPEED: f32 = 0.5;

/// Frames between demo edits and stats lines.
const DEMO_EDIT_EVERY: u32 = 30;

/// Runs the headless streaming demo.
///
/// Reads an optional JSON configuration path from the first argument, then
/// flies a viewpoint along +X over generated terrain, placing a random block
/// in front of it now and then. Geometry goes to a [`NullRenderer`].
pub fn run() -> Result<()> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {path}");
            StreamConfig::from_path(path)?
        }
        None => StreamConfig::default(),
    };

    let generator = Arc::new(NoiseTerrain::from_config(&config));
    let store = Arc::new(MemoryStore::new());
    let render_radius = config.render_radius;
    let mut rng = fastrand::Rng::with_seed(u64::from(config.seed));
    let mut renderer = NullRenderer::new();

    let mut session = StreamingSession::new(config, generator, store, SystemTime::new())?;
    let pose = session.start(&mut renderer);
    let mut position = Point3::new(pose.x, pose.y + 20.0, pose.z);
    let (rx, ry) = (std::f32::consts::FRAC_PI_2, -0.6);

    for frame in 1..=DEMO_FRAMES {
        position.x += DEMO_SPEED;
        let view = View::new(position, rx, ry, render_radius);
        session.tick(&view, &mut renderer);

        if frame % DEMO_EDIT_EVERY == 0 {
            let block = BUILDABLE[rng.usize(..BUILDABLE.len())].value();
            let manager = session.manager_mut();
            if let Some(hit) = manager.hit_test(true, position, rx, ry) {
                manager.set_block(hit.x, hit.y, hit.z, block);
            } else {
                let x = position.x.round() as i32 + rng.i32(-8..=8);
                let z = position.z.round() as i32 + rng.i32(-8..=8);
                let y = manager.highest_block(x as f32, z as f32) + 1;
                manager.set_block(x, y, z, block);
            }

            let manager = session.manager();
            let drawn = manager
                .renderable_chunks(position.x, position.z, &view.frustum())
                .count();
            info!(
                "Frame {frame}: {} resident, {drawn} drawn, daylight {:.2}, {:?}",
                manager.chunk_count(),
                session.clock().daylight(),
                manager.stats()
            );
        }

        std::thread::sleep(Duration::from_millis(16));
    }

    session.finish(&mut renderer);
    info!(
        "Renderer saw {} uploads and {} deletes",
        renderer.uploads(),
        renderer.deletes()
    );
    Ok(())
}
