//! # Chunk Store
//!
//! Persistence seam for player edits. The chunk manager records every block,
//! light and sign change here, and replays the recorded values over generated
//! terrain when a chunk is loaded. The storage format is up to the
//! implementation; [`MemoryStore`] keeps everything in process.
//!
//! Stores are shared between the manager thread and the chunk workers, so they
//! take `&self` and synchronize internally.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use super::chunk::ChunkAddress;
use super::map::{Voxel, VoxelMap};
use super::sign::{Sign, SignList};

/// Saved position and orientation of the player.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PlayerPose {
    /// World X.
    pub x: f32,
    /// World Y.
    pub y: f32,
    /// World Z.
    pub z: f32,
    /// Yaw in radians.
    pub rx: f32,
    /// Pitch in radians.
    pub ry: f32,
}

/// Records edits keyed by chunk address and replays them on load.
///
/// A recorded value of `0` is meaningful: it removes whatever the terrain
/// generator placed at that position.
pub trait ChunkStore: Send + Sync {
    /// Records the block value at a world position, under the chunk that stores it.
    fn insert_block(&self, address: ChunkAddress, x: i32, y: i32, z: i32, w: Voxel);

    /// Records the light level at a world position.
    fn insert_light(&self, address: ChunkAddress, x: i32, y: i32, z: i32, w: Voxel);

    /// Records a sign, replacing any sign on the same voxel face.
    fn insert_sign(&self, address: ChunkAddress, sign: &Sign);

    /// Forgets the sign on one face of a voxel.
    fn delete_sign(&self, x: i32, y: i32, z: i32, face: i32);

    /// Forgets every sign attached to a voxel.
    fn delete_signs(&self, x: i32, y: i32, z: i32);

    /// Writes every recorded block of a chunk into `map`.
    fn load_blocks(&self, map: &mut VoxelMap, address: ChunkAddress);

    /// Writes every recorded light of a chunk into `map`.
    fn load_lights(&self, map: &mut VoxelMap, address: ChunkAddress);

    /// Adds every recorded sign of a chunk to `signs`.
    fn load_signs(&self, signs: &mut SignList, address: ChunkAddress);

    /// The last saved player pose, if any.
    fn load_pose(&self) -> Option<PlayerPose>;

    /// Saves the player pose.
    fn save_pose(&self, pose: PlayerPose);

    /// Flushes pending writes.
    fn commit(&self);
}

type Column = BTreeMap<(i32, i32, i32), Voxel>;

#[derive(Default)]
struct MemoryStoreInner {
    blocks: HashMap<ChunkAddress, Column>,
    lights: HashMap<ChunkAddress, Column>,
    signs: HashMap<(i32, i32, i32, i32), (ChunkAddress, Sign)>,
    pose: Option<PlayerPose>,
    pending: usize,
    commits: usize,
}

/// In-process [`ChunkStore`] backed by hash maps behind a mutex.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes recorded since the last commit.
    pub fn pending_writes(&self) -> usize {
        self.inner.lock().pending
    }

    /// Number of commits performed.
    pub fn commit_count(&self) -> usize {
        self.inner.lock().commits
    }

    /// The recorded block value at a position, if one was recorded.
    pub fn recorded_block(&self, address: ChunkAddress, x: i32, y: i32, z: i32) -> Option<Voxel> {
        self.inner
            .lock()
            .blocks
            .get(&address)
            .and_then(|column| column.get(&(x, y, z)).copied())
    }

    /// The recorded light level at a position, if one was recorded.
    pub fn recorded_light(&self, address: ChunkAddress, x: i32, y: i32, z: i32) -> Option<Voxel> {
        self.inner
            .lock()
            .lights
            .get(&address)
            .and_then(|column| column.get(&(x, y, z)).copied())
    }

    /// Number of recorded signs.
    pub fn sign_count(&self) -> usize {
        self.inner.lock().signs.len()
    }
}

impl ChunkStore for MemoryStore {
    fn insert_block(&self, address: ChunkAddress, x: i32, y: i32, z: i32, w: Voxel) {
        let mut inner = self.inner.lock();
        inner.blocks.entry(address).or_default().insert((x, y, z), w);
        inner.pending += 1;
    }

    fn insert_light(&self, address: ChunkAddress, x: i32, y: i32, z: i32, w: Voxel) {
        let mut inner = self.inner.lock();
        inner.lights.entry(address).or_default().insert((x, y, z), w);
        inner.pending += 1;
    }

    fn insert_sign(&self, address: ChunkAddress, sign: &Sign) {
        let mut inner = self.inner.lock();
        inner
            .signs
            .insert((sign.x, sign.y, sign.z, sign.face), (address, sign.clone()));
        inner.pending += 1;
    }

    fn delete_sign(&self, x: i32, y: i32, z: i32, face: i32) {
        let mut inner = self.inner.lock();
        if inner.signs.remove(&(x, y, z, face)).is_some() {
            inner.pending += 1;
        }
    }

    fn delete_signs(&self, x: i32, y: i32, z: i32) {
        let mut inner = self.inner.lock();
        let before = inner.signs.len();
        inner
            .signs
            .retain(|&(sx, sy, sz, _), _| (sx, sy, sz) != (x, y, z));
        inner.pending += before - inner.signs.len();
    }

    fn load_blocks(&self, map: &mut VoxelMap, address: ChunkAddress) {
        let inner = self.inner.lock();
        if let Some(column) = inner.blocks.get(&address) {
            for (&(x, y, z), &w) in column {
                map.set(x, y, z, w);
            }
        }
    }

    fn load_lights(&self, map: &mut VoxelMap, address: ChunkAddress) {
        let inner = self.inner.lock();
        if let Some(column) = inner.lights.get(&address) {
            for (&(x, y, z), &w) in column {
                map.set(x, y, z, w);
            }
        }
    }

    fn load_signs(&self, signs: &mut SignList, address: ChunkAddress) {
        let inner = self.inner.lock();
        signs.extend(
            inner
                .signs
                .values()
                .filter(|(owner, _)| *owner == address)
                .map(|(_, sign)| sign.clone()),
        );
    }

    fn load_pose(&self) -> Option<PlayerPose> {
        self.inner.lock().pose
    }

    fn save_pose(&self, pose: PlayerPose) {
        let mut inner = self.inner.lock();
        inner.pose = Some(pose);
        inner.pending += 1;
    }

    fn commit(&self) {
        let mut inner = self.inner.lock();
        inner.pending = 0;
        inner.commits += 1;
    }
}
