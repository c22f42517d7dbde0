//! Voxfill - generative fill of voxel selections through a streaming inference service

pub mod core;
pub mod math;
pub mod selection;
pub mod tiling;
pub mod world;
pub mod transport;
pub mod generation;

pub use crate::core::{Error, Result};
