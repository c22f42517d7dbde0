//! Generation geometry configuration

use crate::core::types::{IVec3, Result};
use crate::tiling::{TubeLayout, WindowTiler};
use crate::world::GameVersion;

/// Window size the inference model was trained on
pub const GENERATION_SIZE: IVec3 = IVec3::splat(16);
/// Steady-state context length per axis
pub const GENERATION_CONTEXT_SIZE: IVec3 = IVec3::splat(8);
/// Voxels per streamed tube
pub const TUBE_LENGTH: usize = 8;

/// Geometry shared by the structure and color fill operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Size of every generation window, context included.
    pub generation_size: IVec3,
    /// Context length used away from cluster boundaries.
    pub context_size: IVec3,
    /// Length of the runs the structure stream is decoded in.
    pub tube_length: usize,
    /// Version tag attached to world writes.
    pub version: GameVersion,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            generation_size: GENERATION_SIZE,
            context_size: GENERATION_CONTEXT_SIZE,
            tube_length: TUBE_LENGTH,
            version: GameVersion::default(),
        }
    }
}

impl GenerationConfig {
    /// Check that windows can be tiled and split into tubes
    pub fn validate(&self) -> Result<()> {
        self.tiler(-self.context_size)?;
        self.tube_layout()?;
        Ok(())
    }

    /// Tiler for this geometry with the requested boundary context
    pub fn tiler(&self, context_offset: IVec3) -> Result<WindowTiler> {
        Ok(WindowTiler::new(self.generation_size, self.context_size)?.with_context_offset(context_offset))
    }

    pub fn tube_layout(&self) -> Result<TubeLayout> {
        TubeLayout::new(self.generation_size, self.tube_length)
    }
}
