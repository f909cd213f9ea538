//! # Light Propagation
//!
//! Flood fill of block light through the mesher's scratch grid. Light spreads
//! from each emitter to its six neighbours, losing one level per step, and
//! stops at opaque cells (the emitter's own cell excepted), at cells that are
//! already at least as bright, at the vertical ends of the grid, and as soon as
//! the remaining intensity can no longer reach the center chunk.
//!
//! The fill runs on an explicit worklist, so its stack use does not depend on
//! how far light travels.

use std::collections::VecDeque;

use bitvec::slice::BitSlice;

use super::grid::{self, XZ_HI, XZ_LO};
use super::occlusion::MAX_LIGHT;

#[derive(Copy, Clone, Debug)]
struct Step {
    x: i32,
    y: i32,
    z: i32,
    level: u8,
    force: bool,
}

/// Worklist-driven light flood fill. The queue is kept between fills to
/// avoid reallocating it for every emitter.
#[derive(Debug, Default)]
pub struct LightPropagator {
    queue: VecDeque<Step>,
}

impl LightPropagator {
    /// Creates a propagator with an empty worklist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spreads light from one emitter at grid position `(x, y, z)`.
    ///
    /// # Arguments
    /// * `opaque` - Opacity per grid cell
    /// * `light` - Light level per grid cell, raised in place
    /// * `level` - Emitter intensity; values above [`MAX_LIGHT`] are clamped
    pub fn fill(
        &mut self,
        opaque: &BitSlice,
        light: &mut [u8],
        (x, y, z): (i32, i32, i32),
        level: i32,
    ) {
        let level = level.clamp(0, i32::from(MAX_LIGHT)) as u8;
        self.queue.clear();
        self.queue.push_back(Step {
            x,
            y,
            z,
            level,
            force: true,
        });

        while let Some(step) = self.queue.pop_front() {
            let w = i32::from(step.level);
            if step.x + w < XZ_LO || step.z + w < XZ_LO {
                continue;
            }
            if step.x - w > XZ_HI || step.z - w > XZ_HI {
                continue;
            }
            let Some(index) = grid::index(step.x, step.y, step.z) else {
                continue;
            };
            if light[index] >= step.level {
                continue;
            }
            if !step.force && opaque[index] {
                continue;
            }
            light[index] = step.level;

            let level = step.level - 1;
            for (dx, dy, dz) in [(-1, 0, 0), (1, 0, 0), (0, -1, 0), (0, 1, 0), (0, 0, -1), (0, 0, 1)] {
                self.queue.push_back(Step {
                    x: step.x + dx,
                    y: step.y + dy,
                    z: step.z + dz,
                    level,
                    force: false,
                });
            }
        }
    }
}
