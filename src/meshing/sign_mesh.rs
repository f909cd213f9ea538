//! Geometry of the signs in a chunk.

use cgmath::{Point3, Vector3};

use crate::voxels::sign::{Sign, SignList, SIGN_FACES};

use super::text::{wrap, GlyphEmitter};
use super::vertex::{GlyphVertex, VERTICES_PER_FACE};

/// Width of a sign line in font pixels.
const MAX_WIDTH: i32 = 64;
/// Distance between baselines, in glyph heights.
const LINE_HEIGHT: f32 = 1.25;
/// Lines drawn per sign; the rest of the text is dropped.
const MAX_ROWS: usize = 5;

/// Direction glyphs advance along, per face.
static GLYPH_DIRECTION: [[f32; 3]; 8] = [
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, -1.0],
    [-1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Direction successive lines advance along, per face.
static LINE_DIRECTION: [[f32; 3]; 8] = [
    [0.0, -1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, -1.0],
    [-1.0, 0.0, 0.0],
];

/// Glyph quads of every sign in a chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignMesh {
    /// Six vertices per glyph.
    pub vertices: Vec<GlyphVertex>,
    /// Number of glyphs in `vertices`.
    pub faces: usize,
}

/// Lays out the text of every sign in `signs`.
///
/// Signs on an invalid face are skipped.
pub fn build_sign_mesh(signs: &SignList, glyphs: &dyn GlyphEmitter) -> SignMesh {
    let mut vertices = Vec::new();
    for sign in signs {
        layout_sign(&mut vertices, sign, glyphs);
    }
    let faces = vertices.len() / VERTICES_PER_FACE;
    SignMesh { vertices, faces }
}

fn layout_sign(out: &mut Vec<GlyphVertex>, sign: &Sign, glyphs: &dyn GlyphEmitter) {
    if !(0..SIGN_FACES).contains(&sign.face) {
        return;
    }
    let face = sign.face as usize;
    let lines = wrap(&sign.text, MAX_WIDTH, glyphs);
    let rows = lines.len().min(MAX_ROWS);
    if rows == 0 {
        return;
    }

    let glyph_dir = Vector3::from(GLYPH_DIRECTION[face]);
    let line_dir = Vector3::from(LINE_DIRECTION[face]);
    let max_width = MAX_WIDTH as f32;
    let n = 1.0 / (max_width / 10.0);

    // center the block of lines on the voxel
    let mut start = Point3::new(sign.x as f32, sign.y as f32, sign.z as f32)
        - line_dir * (n * (rows - 1) as f32 * (LINE_HEIGHT / 2.0));

    for line in lines.iter().take(rows) {
        let mut line_width = glyphs.string_width(line).min(MAX_WIDTH);
        let mut cursor = start - glyph_dir * (line_width as f32 / max_width / 2.0);
        for c in line.chars() {
            let width = glyphs.char_width(c);
            line_width -= width;
            if line_width < 0 {
                break;
            }
            let half_advance = glyph_dir * (width as f32 / max_width / 2.0);
            cursor += half_advance;
            if c != ' ' {
                glyphs.emit(out, cursor, n / 2.0, sign.face, c);
            }
            cursor += half_advance;
        }
        start += line_dir * (n * LINE_HEIGHT);
    }
}
