//! # Sign Text
//!
//! Proportional glyph metrics, word wrapping and per-character quads for the
//! text drawn on signs. Glyphs come from a 16 x 16 font atlas whose first cell
//! is the space character.

use cgmath::{Point3, Vector3};

use super::vertex::GlyphVertex;

/// Lays out single characters of sign text.
pub trait GlyphEmitter {
    /// Advance width of `c` in font pixels.
    fn char_width(&self, c: char) -> i32;

    /// Appends the quad of one character.
    ///
    /// # Arguments
    /// * `out` - Receives 6 vertices, or none for characters without a glyph
    /// * `position` - Center of the glyph in world space
    /// * `n` - Half the glyph's nominal size
    /// * `face` - Sign face in `0..8`
    /// * `c` - The character
    fn emit(&self, out: &mut Vec<GlyphVertex>, position: Point3<f32>, n: f32, face: i32, c: char);

    /// Width of a whole string in font pixels.
    fn string_width(&self, text: &str) -> i32 {
        text.chars().map(|c| self.char_width(c)).sum()
    }
}

/// Advance widths of the printable ASCII range, starting at the space.
static CHAR_WIDTHS: [i32; 96] = [
    4, 2, 4, 7, 6, 9, 7, 2, 3, 3, 4, 6, 3, 5, 2, 7, //
    6, 3, 6, 6, 6, 6, 6, 6, 6, 6, 2, 3, 5, 6, 5, 7, //
    8, 6, 6, 6, 6, 6, 6, 6, 6, 4, 6, 6, 5, 8, 8, 6, //
    6, 7, 6, 6, 6, 6, 8, 10, 8, 6, 6, 3, 6, 3, 6, 6, //
    4, 7, 6, 6, 6, 6, 5, 6, 6, 2, 5, 5, 2, 9, 6, 6, //
    6, 6, 6, 6, 5, 6, 6, 6, 6, 6, 6, 4, 2, 5, 7, 0, //
];

/// Glyph corner offsets per face.
static GLYPH_POSITIONS: [[[f32; 3]; 6]; 8] = [
    [[0.0, -2.0, -1.0], [0.0, 2.0, 1.0], [0.0, 2.0, -1.0], [0.0, -2.0, -1.0], [0.0, -2.0, 1.0], [0.0, 2.0, 1.0]],
    [[0.0, -2.0, -1.0], [0.0, 2.0, 1.0], [0.0, -2.0, 1.0], [0.0, -2.0, -1.0], [0.0, 2.0, -1.0], [0.0, 2.0, 1.0]],
    [[-1.0, -2.0, 0.0], [1.0, 2.0, 0.0], [1.0, -2.0, 0.0], [-1.0, -2.0, 0.0], [-1.0, 2.0, 0.0], [1.0, 2.0, 0.0]],
    [[-1.0, -2.0, 0.0], [1.0, -2.0, 0.0], [1.0, 2.0, 0.0], [-1.0, -2.0, 0.0], [1.0, 2.0, 0.0], [-1.0, 2.0, 0.0]],
    [[-1.0, 0.0, 2.0], [1.0, 0.0, 2.0], [1.0, 0.0, -2.0], [-1.0, 0.0, 2.0], [1.0, 0.0, -2.0], [-1.0, 0.0, -2.0]],
    [[-2.0, 0.0, 1.0], [2.0, 0.0, -1.0], [-2.0, 0.0, -1.0], [-2.0, 0.0, 1.0], [2.0, 0.0, 1.0], [2.0, 0.0, -1.0]],
    [[1.0, 0.0, 2.0], [-1.0, 0.0, -2.0], [-1.0, 0.0, 2.0], [1.0, 0.0, 2.0], [1.0, 0.0, -2.0], [-1.0, 0.0, -2.0]],
    [[2.0, 0.0, -1.0], [-2.0, 0.0, 1.0], [2.0, 0.0, 1.0], [2.0, 0.0, -1.0], [-2.0, 0.0, -1.0], [-2.0, 0.0, 1.0]],
];

/// Glyph texture corner (0 = low edge, 1 = high edge) per face.
static GLYPH_UVS: [[[u8; 2]; 6]; 8] = [
    [[0, 0], [1, 1], [0, 1], [0, 0], [1, 0], [1, 1]],
    [[1, 0], [0, 1], [0, 0], [1, 0], [1, 1], [0, 1]],
    [[1, 0], [0, 1], [0, 0], [1, 0], [1, 1], [0, 1]],
    [[0, 0], [1, 0], [1, 1], [0, 0], [1, 1], [0, 1]],
    [[0, 0], [1, 0], [1, 1], [0, 0], [1, 1], [0, 1]],
    [[0, 1], [1, 0], [1, 1], [0, 1], [0, 0], [1, 0]],
    [[0, 1], [1, 0], [1, 1], [0, 1], [0, 0], [1, 0]],
    [[0, 1], [1, 0], [1, 1], [0, 1], [0, 0], [1, 0]],
];

/// Direction each face is pushed off the block surface.
static FACE_OFFSETS: [[f32; 3]; 8] = [
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];

const GLYPH_CELL: f32 = 0.0625;

/// Flat quads textured from the ASCII font atlas.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuadGlyphs;

impl QuadGlyphs {
    fn atlas_cell(c: char) -> Option<usize> {
        let code = u32::from(c);
        if !(32..128).contains(&code) {
            return None;
        }
        usize::try_from(code - 32).ok()
    }
}

impl GlyphEmitter for QuadGlyphs {
    fn char_width(&self, c: char) -> i32 {
        Self::atlas_cell(c).map_or(0, |cell| CHAR_WIDTHS[cell])
    }

    fn emit(&self, out: &mut Vec<GlyphVertex>, position: Point3<f32>, n: f32, face: i32, c: char) {
        let Some(cell) = Self::atlas_cell(c) else {
            return;
        };
        let Some(face) = usize::try_from(face).ok().filter(|&face| face < FACE_OFFSETS.len()) else {
            return;
        };
        // Keep a margin inside the atlas cell so neighbouring glyphs don't bleed.
        let pu = GLYPH_CELL / 5.0;
        let pv = GLYPH_CELL / 2.5;
        let du = (cell % 16) as f32 * GLYPH_CELL;
        let dv = 1.0 - (cell / 16) as f32 * GLYPH_CELL - GLYPH_CELL;
        let center = position + Vector3::from(FACE_OFFSETS[face]) * 0.5;
        for (corner, uv) in GLYPH_POSITIONS[face].iter().zip(&GLYPH_UVS[face]) {
            out.push(GlyphVertex {
                position: [
                    center.x + n * corner[0],
                    center.y + n * corner[1],
                    center.z + n * corner[2],
                ],
                tex_coords: [
                    du + if uv[0] == 1 { GLYPH_CELL - pu } else { pu },
                    dv + if uv[1] == 1 { GLYPH_CELL - pv } else { pv },
                ],
            });
        }
    }
}

/// Word-wraps `text` into lines no wider than `max_width` font pixels.
///
/// Explicit line breaks are kept and blank lines dropped. A word wider than
/// the limit gets a line of its own rather than being split.
pub fn wrap(text: &str, max_width: i32, glyphs: &dyn GlyphEmitter) -> Vec<String> {
    let space_width = glyphs.char_width(' ');
    let mut lines = Vec::new();
    for input_line in text.split(&['\r', '\n'][..]).filter(|line| !line.is_empty()) {
        let mut line = String::new();
        let mut line_width = 0;
        for token in input_line.split(' ').filter(|token| !token.is_empty()) {
            let token_width = glyphs.string_width(token);
            if line_width > 0 {
                if line_width + token_width > max_width {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                } else {
                    line.push(' ');
                }
            }
            line.push_str(token);
            line_width += token_width + space_width;
        }
        lines.push(line);
    }
    lines
}
