//! # View and Visibility
//!
//! The viewpoint the chunk manager streams around, and the frustum test used
//! to decide which chunks are worth meshing first and drawing at all.
//!
//! Orientation follows the usual first-person convention: `rx` turns around
//! the vertical axis, `ry` tilts up and down, both in radians. With both at
//! zero the view looks down the negative Z axis.

use cgmath::{perspective, Deg, Matrix, Matrix4, Point3, Rad, Vector3, Vector4};

use crate::voxels::chunk::{ChunkAddress, CHUNK_SIZE};

/// Decides whether a chunk can be seen.
pub trait ChunkVisibility {
    /// Returns `true` if any part of the column `address` between `miny`
    /// and `maxy` may be on screen.
    fn is_chunk_visible(&self, address: ChunkAddress, miny: i32, maxy: i32) -> bool;
}

/// Treats every chunk as visible.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysVisible;

impl ChunkVisibility for AlwaysVisible {
    fn is_chunk_visible(&self, _address: ChunkAddress, _miny: i32, _maxy: i32) -> bool {
        true
    }
}

/// Unit vector of the direction a viewer with yaw `rx` and pitch `ry` looks in.
pub fn sight_vector(rx: f32, ry: f32) -> Vector3<f32> {
    let m = ry.cos();
    let yaw = rx - std::f32::consts::FRAC_PI_2;
    Vector3::new(yaw.cos() * m, ry.sin(), yaw.sin() * m)
}

/// A camera position and projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    /// Eye position in world space
    pub position: Point3<f32>,
    /// Rotation around the vertical axis, in radians
    pub rx: f32,
    /// Tilt above the horizon, in radians
    pub ry: f32,
    /// Vertical field of view
    pub fovy: Deg<f32>,
    /// Width over height of the viewport
    pub aspect: f32,
    /// Near clip distance
    pub znear: f32,
    /// Far clip distance
    pub zfar: f32,
    /// Half height of an orthographic view; `None` for perspective
    pub ortho: Option<f32>,
}

impl View {
    /// Perspective view at `position`, with a far plane just past
    /// `render_radius` chunks.
    pub fn new(position: Point3<f32>, rx: f32, ry: f32, render_radius: i32) -> Self {
        View {
            position,
            rx,
            ry,
            fovy: Deg(65.0),
            aspect: 16.0 / 9.0,
            znear: 0.125,
            zfar: (render_radius * CHUNK_SIZE + 64) as f32,
            ortho: None,
        }
    }

    /// Direction the view looks in.
    pub fn direction(&self) -> Vector3<f32> {
        sight_vector(self.rx, self.ry)
    }

    /// Chunk the eye is in.
    pub fn chunk(&self) -> ChunkAddress {
        ChunkAddress::containing(self.position.x, self.position.z)
    }

    /// Combined projection and view matrix.
    pub fn view_projection(&self) -> Matrix4<f32> {
        let view = Matrix4::look_to_rh(self.position, self.direction(), Vector3::unit_y());
        let projection = match self.ortho {
            Some(size) => cgmath::ortho(
                -size * self.aspect,
                size * self.aspect,
                -size,
                size,
                -self.zfar,
                self.zfar,
            ),
            None => perspective(Rad::from(self.fovy), self.aspect, self.znear, self.zfar),
        };
        projection * view
    }

    /// Frustum of this view.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.view_projection(), self.ortho.is_some())
    }
}

/// Clip planes extracted from a view-projection matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    planes: [Vector4<f32>; 6],
    count: usize,
}

impl Frustum {
    /// Extracts the left, right, bottom, top, near and far planes of `matrix`.
    ///
    /// Orthographic views only test the four side planes, so nothing behind
    /// the eye is culled.
    pub fn from_matrix(matrix: &Matrix4<f32>, ortho: bool) -> Self {
        let [r0, r1, r2, r3] = [matrix.row(0), matrix.row(1), matrix.row(2), matrix.row(3)];
        Frustum {
            planes: [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2],
            count: if ortho { 4 } else { 6 },
        }
    }
}

impl ChunkVisibility for Frustum {
    /// Tests the chunk's box, padded by its ghost border, against every plane.
    fn is_chunk_visible(&self, address: ChunkAddress, miny: i32, maxy: i32) -> bool {
        let x = (address.p * CHUNK_SIZE - 1) as f32;
        let z = (address.q * CHUNK_SIZE - 1) as f32;
        let d = (CHUNK_SIZE + 1) as f32;
        let (lo, hi) = (miny as f32, maxy as f32);
        let corners = [
            [x, lo, z],
            [x + d, lo, z],
            [x, lo, z + d],
            [x + d, lo, z + d],
            [x, hi, z],
            [x + d, hi, z],
            [x, hi, z + d],
            [x + d, hi, z + d],
        ];
        self.planes[..self.count].iter().all(|plane| {
            corners
                .iter()
                .any(|c| plane.x * c[0] + plane.y * c[1] + plane.z * c[2] + plane.w >= 0.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn zero_rotation_looks_down_negative_z() {
        let v = sight_vector(0.0, 0.0);
        assert!(v.x.abs() < 1e-6 && v.y.abs() < 1e-6);
        assert!((v.z + 1.0).abs() < 1e-6);
        let up = sight_vector(0.3, std::f32::consts::FRAC_PI_2);
        assert!((up.y - 1.0).abs() < 1e-6);
        assert!((sight_vector(1.2, 0.4).magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn chunks_ahead_are_visible_and_behind_are_not() {
        let view = View::new(Point3::new(16.0, 40.0, 16.0), 0.0, 0.0, 10);
        let frustum = view.frustum();
        assert!(frustum.is_chunk_visible(ChunkAddress::new(0, -3), 0, 256));
        assert!(frustum.is_chunk_visible(view.chunk(), 0, 256));
        assert!(!frustum.is_chunk_visible(ChunkAddress::new(0, 4), 0, 256));
    }

    #[test]
    fn chunks_past_the_far_plane_are_culled() {
        let view = View::new(Point3::new(16.0, 40.0, 16.0), 0.0, 0.0, 2);
        assert!(!view.frustum().is_chunk_visible(ChunkAddress::new(0, -12), 0, 256));
    }

    #[test]
    fn orthographic_views_keep_what_is_behind() {
        let mut view = View::new(Point3::new(16.0, 40.0, 16.0), 0.0, 0.0, 10);
        view.ortho = Some(64.0);
        let frustum = view.frustum();
        assert!(frustum.is_chunk_visible(ChunkAddress::new(0, 2), 0, 256));
        assert!(!frustum.is_chunk_visible(ChunkAddress::new(20, 0), 0, 256));
    }

    #[test]
    fn always_visible_accepts_everything() {
        assert!(AlwaysVisible.is_chunk_visible(ChunkAddress::new(1000, -1000), 256, 0));
    }
}
