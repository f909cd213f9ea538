//! Vertex formats produced by the mesher.
//!
//! Both formats are plain `#[repr(C)]` structs so a renderer can upload the
//! vertex slices directly with `bytemuck::cast_slice`.

/// A vertex of block or plant geometry.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Normal: 3x f32 (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Ambient occlusion: f32 (4 bytes)
/// - Light: f32 (4 bytes)
///
/// Total size: 40 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlockVertex {
    /// Position in world space
    pub position: [f32; 3],
    /// Outward facing normal
    pub normal: [f32; 3],
    /// Atlas texture coordinates
    pub tex_coords: [f32; 2],
    /// Ambient occlusion factor, `0` is fully open and `1` fully occluded
    pub ao: f32,
    /// Block light at this corner, `0..=1` (values above 1 mark emitters)
    pub light: f32,
}

/// A vertex of sign text geometry.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
///
/// Total size: 20 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlyphVertex {
    /// Position in world space
    pub position: [f32; 3],
    /// Font atlas texture coordinates
    pub tex_coords: [f32; 2],
}

/// Vertices emitted per quad (two triangles).
pub const VERTICES_PER_FACE: usize = 6;

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[test]
    fn layouts_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<BlockVertex>(), 40);
        assert_eq!(std::mem::size_of::<GlyphVertex>(), 20);
        let vertices = [BlockVertex::zeroed(); 2];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 80);
    }
}
