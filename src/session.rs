//! # Streaming Session
//!
//! Ties the chunk manager to a store, a clock and a player for the length of
//! one play session.
//!
//! ## Frame Order
//! Every [`StreamingSession::tick`]:
//! 1. Commits the store once `commit_interval_secs` have passed since the
//!    previous commit
//! 2. Evicts chunks that fell out of `delete_radius`
//! 3. Runs [`ChunkManager::update`] with the view's frustum
//!
//! [`StreamingSession::start`] and [`StreamingSession::finish`] bracket the
//! session: the first restores the saved pose and streams in the ground under
//! it, the second saves the pose, flushes the store and releases geometry.

use std::sync::Arc;

use log::{debug, info};

use crate::chunk_manager::ChunkManager;
use crate::clock::{GameClock, TimeSource};
use crate::config::StreamConfig;
use crate::error::Result;
use crate::render::Renderer;
use crate::view::View;
use crate::voxels::store::{ChunkStore, PlayerPose};
use crate::voxels::worldgen::TerrainGenerator;

/// Height above the highest block a player without a saved pose starts at.
const SPAWN_CLEARANCE: i32 = 2;

/// One player streaming through the world.
pub struct StreamingSession<C: TimeSource> {
    manager: ChunkManager,
    store: Arc<dyn ChunkStore>,
    clock: GameClock<C>,
    pose: PlayerPose,
    last_commit: f64,
    frames: u64,
}

impl<C: TimeSource> StreamingSession<C> {
    /// Builds the manager and the clock for a new session.
    pub fn new(
        config: StreamConfig,
        generator: Arc<dyn TerrainGenerator>,
        store: Arc<dyn ChunkStore>,
        time: C,
    ) -> Result<Self> {
        let clock = GameClock::new(config.day_length_secs, time);
        let manager = ChunkManager::new(config, generator, Arc::clone(&store))?;
        Ok(StreamingSession {
            last_commit: clock.now(),
            manager,
            store,
            clock,
            pose: PlayerPose::default(),
            frames: 0,
        })
    }

    /// Restores the saved pose and streams in the chunks around it.
    ///
    /// Without a saved pose the player starts at the origin, just above the
    /// highest block there.
    pub fn start(&mut self, renderer: &mut dyn Renderer) -> PlayerPose {
        let saved = self.store.load_pose();
        self.pose = saved.unwrap_or_default();
        self.manager
            .force_around_point(self.pose.x, self.pose.z, renderer);
        if saved.is_none() {
            let ground = self.manager.highest_block(self.pose.x, self.pose.z);
            self.pose.y = (ground + SPAWN_CLEARANCE) as f32;
        }
        info!(
            "Session started at ({:.1}, {:.1}, {:.1}){}",
            self.pose.x,
            self.pose.y,
            self.pose.z,
            if saved.is_some() { " from saved pose" } else { "" }
        );
        self.pose
    }

    /// Runs one frame of streaming for the viewpoint `view`.
    pub fn tick(&mut self, view: &View, renderer: &mut dyn Renderer) {
        self.pose = PlayerPose {
            x: view.position.x,
            y: view.position.y,
            z: view.position.z,
            rx: view.rx,
            ry: view.ry,
        };

        let now = self.clock.now();
        if now - self.last_commit > self.manager.config().commit_interval_secs {
            self.last_commit = now;
            self.store.commit();
            debug!("Committed store at {now:.2}s");
        }

        self.manager
            .delete_distant(view.position.x, view.position.z, renderer);
        let frustum = view.frustum();
        self.manager.update(view.position, &frustum, renderer);
        self.frames += 1;
    }

    /// Saves the pose, flushes the store and releases all geometry.
    pub fn finish(mut self, renderer: &mut dyn Renderer) -> PlayerPose {
        self.store.save_pose(self.pose);
        self.store.commit();
        self.manager.shutdown(renderer);
        info!(
            "Session finished after {} frames: {:?}",
            self.frames,
            self.manager.stats()
        );
        self.pose
    }

    /// The chunk manager, for queries and draw lists.
    pub fn manager(&self) -> &ChunkManager {
        &self.manager
    }

    /// The chunk manager, for edits.
    pub fn manager_mut(&mut self) -> &mut ChunkManager {
        &mut self.manager
    }

    /// The session's day/night clock.
    pub fn clock(&self) -> &GameClock<C> {
        &self.clock
    }

    /// Mutable access to the clock, to jump to a time of day.
    pub fn clock_mut(&mut self) -> &mut GameClock<C> {
        &mut self.clock
    }

    /// Pose as of the last tick.
    pub fn pose(&self) -> PlayerPose {
        self.pose
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
