//! # Voxels Module
//!
//! World data: the block catalogue, sparse voxel maps, chunks and the chunk
//! table, signs, terrain generation and the persistence seam.

pub mod block;
pub mod chunk;
pub mod map;
pub mod sign;
pub mod store;
pub mod worldgen;
