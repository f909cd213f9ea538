//! # Renderer Seam
//!
//! The chunk manager hands finished geometry to a [`Renderer`] and keeps only
//! the opaque [`GeometryHandle`] it gets back. Upload always happens on the
//! manager thread.

use crate::meshing::sign_mesh::SignMesh;
use crate::meshing::ChunkMesh;

/// Opaque identifier of geometry owned by a [`Renderer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u64);

/// Receives chunk geometry.
pub trait Renderer {
    /// Uploads a chunk's block and sign geometry.
    ///
    /// If `handle` already holds a handle the renderer may reuse it; otherwise
    /// it stores a fresh one there.
    fn upload(&mut self, handle: &mut Option<GeometryHandle>, mesh: &ChunkMesh, signs: &SignMesh);

    /// Releases geometry previously returned through [`Renderer::upload`].
    fn delete(&mut self, handle: GeometryHandle);
}

/// Renderer that keeps nothing but counters. Used headless and in tests.
#[derive(Debug, Default)]
pub struct NullRenderer {
    next_handle: u64,
    live: usize,
    uploads: usize,
    deletes: usize,
    faces: usize,
}

impl NullRenderer {
    /// Creates a renderer with no live geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles handed out and not yet deleted.
    pub fn live_handles(&self) -> usize {
        self.live
    }

    /// Number of uploads received.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    /// Number of deletes received.
    pub fn deletes(&self) -> usize {
        self.deletes
    }

    /// Faces contained in the most recent upload.
    pub fn last_upload_faces(&self) -> usize {
        self.faces
    }
}

impl Renderer for NullRenderer {
    fn upload(&mut self, handle: &mut Option<GeometryHandle>, mesh: &ChunkMesh, signs: &SignMesh) {
        if handle.is_none() {
            *handle = Some(GeometryHandle(self.next_handle));
            self.next_handle += 1;
            self.live += 1;
        }
        self.uploads += 1;
        self.faces = mesh.faces + signs.faces;
    }

    fn delete(&mut self, _handle: GeometryHandle) {
        self.live = self.live.saturating_sub(1);
        self.deletes += 1;
    }
}
