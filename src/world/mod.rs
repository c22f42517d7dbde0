//! World access used by generative fill operations
//!
//! The host editor owns the world; operations only read and write single
//! voxels through [`World`].

pub mod block;
pub mod memory;

pub use block::{Block, GameVersion};
pub use memory::MemoryWorld;

use crate::core::types::{IVec3, Result};

/// Voxel-level access to an editor world.
pub trait World {
    /// Block at `position` in `dimension`.
    fn get_block(&self, position: IVec3, dimension: &str) -> Result<Block>;

    /// Replace the block at `position`; `version` names the block format.
    fn set_block(
        &mut self,
        position: IVec3,
        dimension: &str,
        version: &GameVersion,
        block: Block,
    ) -> Result<()>;
}
