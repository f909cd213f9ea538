//! # Streaming Configuration
//!
//! Tunables for chunk streaming. Every field has a default matching the values
//! the engine ships with, so a configuration file only needs to name the fields
//! it wants to change.
//!
//! ## Example
//! ```json
//! { "create_radius": 6, "delete_radius": 9, "workers": 2 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};

/// Radii, pool size and world-generation switches for a streaming session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Chebyshev radius (in chunks) inside which missing chunks are created.
    pub create_radius: i32,
    /// Chebyshev radius (in chunks) inside which chunks are drawn.
    pub render_radius: i32,
    /// Chunks at this Chebyshev distance or further are evicted.
    pub delete_radius: i32,
    /// Chebyshev radius (in chunks) inside which sign text is drawn.
    pub sign_radius: i32,
    /// Number of background chunk workers.
    pub workers: usize,
    /// Hard ceiling on resident chunks.
    pub max_chunks: usize,
    /// Seconds between store commits.
    pub commit_interval_secs: f64,
    /// Length of a full day/night cycle in seconds. Zero or less freezes the clock at noon.
    pub day_length_secs: i32,
    /// Seed for procedural terrain.
    pub seed: u32,
    /// Enables light propagation while meshing.
    pub show_lights: bool,
    /// Enables grass and flowers in generated terrain.
    pub show_plants: bool,
    /// Enables trees in generated terrain.
    pub show_trees: bool,
    /// Enables the cloud layer in generated terrain.
    pub show_clouds: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            create_radius: 10,
            render_radius: 10,
            delete_radius: 14,
            sign_radius: 4,
            workers: 4,
            max_chunks: 8192,
            commit_interval_secs: 5.0,
            day_length_secs: 30,
            seed: 0,
            show_lights: true,
            show_plants: true,
            show_trees: true,
            show_clouds: true,
        }
    }
}

impl StreamConfig {
    /// Parses a configuration from JSON and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StreamConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks the invariants the chunk manager relies on.
    ///
    /// # Errors
    /// Returns [`StreamError::InvalidConfig`] when the pool or table would be
    /// empty, a radius is negative, or chunks would be evicted inside the
    /// creation radius (which makes streaming thrash).
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(StreamError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.max_chunks == 0 {
            return Err(StreamError::InvalidConfig("max_chunks must be at least 1".into()));
        }
        if self.create_radius < 0 || self.render_radius < 0 || self.sign_radius < 0 {
            return Err(StreamError::InvalidConfig("radii must not be negative".into()));
        }
        if self.delete_radius <= self.create_radius {
            return Err(StreamError::InvalidConfig(format!(
                "delete_radius ({}) must be larger than create_radius ({})",
                self.delete_radius, self.create_radius
            )));
        }
        if self.commit_interval_secs.is_nan() || self.commit_interval_secs < 0.0 {
            return Err(StreamError::InvalidConfig(
                "commit_interval_secs must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}
