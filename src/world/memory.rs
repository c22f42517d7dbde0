//! In-memory world

use std::collections::HashMap;

use super::{Block, GameVersion, World};
use crate::core::types::{IVec3, Result};

/// Sparse world backed by a hash map; unset voxels read as air.
///
/// Every write is also appended to a log so callers can inspect exactly
/// what an operation touched.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    blocks: HashMap<(String, IVec3), Block>,
    writes: Vec<(IVec3, Block)>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a block without recording a write
    pub fn insert(&mut self, position: IVec3, dimension: &str, block: Block) {
        self.blocks.insert((dimension.to_string(), position), block);
    }

    /// Block at `position`, air when unset
    pub fn block(&self, position: IVec3, dimension: &str) -> Block {
        self.blocks
            .get(&(dimension.to_string(), position))
            .cloned()
            .unwrap_or_else(Block::air)
    }

    /// Writes performed through [`World::set_block`], in order
    pub fn writes(&self) -> &[(IVec3, Block)] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl World for MemoryWorld {
    fn get_block(&self, position: IVec3, dimension: &str) -> Result<Block> {
        Ok(self.block(position, dimension))
    }

    fn set_block(
        &mut self,
        position: IVec3,
        dimension: &str,
        _version: &GameVersion,
        block: Block,
    ) -> Result<()> {
        self.writes.push((position, block.clone()));
        self.insert(position, dimension, block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_reads_air() {
        let world = MemoryWorld::new();
        assert!(world.get_block(IVec3::ZERO, "overworld").unwrap().is_air());
    }

    #[test]
    fn test_set_and_get() {
        let mut world = MemoryWorld::new();
        let pos = IVec3::new(1, 2, 3);
        world
            .set_block(pos, "overworld", &GameVersion::default(), Block::new("stone"))
            .unwrap();

        assert_eq!(world.get_block(pos, "overworld").unwrap(), Block::new("stone"));
        assert!(world.get_block(pos, "the_nether").unwrap().is_air());
        assert_eq!(world.writes(), &[(pos, Block::new("stone"))]);
    }

    #[test]
    fn test_insert_is_not_logged() {
        let mut world = MemoryWorld::new();
        world.insert(IVec3::ONE, "overworld", Block::new("dirt"));
        assert!(world.writes().is_empty());
        assert_eq!(world.block(IVec3::ONE, "overworld"), Block::new("dirt"));
    }
}
