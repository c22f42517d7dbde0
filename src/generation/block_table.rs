//! Block name <-> model id lookup for the color model

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::types::Result;
use crate::core::Error;
use crate::world::Block;

/// Id the color model uses for air
pub const AIR_ID: i64 = 0;

/// Immutable mapping between block names and the ids the color model was
/// trained on.
#[derive(Clone, Debug, Default)]
pub struct BlockIdTable {
    ids: HashMap<String, i64>,
    blockstates: HashMap<i64, String>,
}

impl BlockIdTable {
    /// Build a table from `name -> id` and `id -> blockstate` maps.
    ///
    /// Names containing spaces are also registered with the spaces replaced
    /// by underscores, which is how editor base names spell them.
    pub fn from_maps(
        ids: impl IntoIterator<Item = (String, i64)>,
        blockstates: impl IntoIterator<Item = (i64, String)>,
    ) -> Self {
        let mut table = Self {
            ids: HashMap::new(),
            blockstates: blockstates.into_iter().collect(),
        };
        let mut aliases = Vec::new();
        for (name, id) in ids {
            if name.contains(' ') {
                aliases.push((name.replace(' ', "_"), id));
            }
            table.ids.insert(name, id);
        }
        // Aliases win over literal names, matching the order they were added in
        table.ids.extend(aliases);
        table
    }

    /// Load from a `{"name": id}` file and an `{"id": "blockstate"}` file.
    pub fn load(block_map: &Path, block_ids: &Path) -> Result<Self> {
        let ids: HashMap<String, i64> = serde_json::from_str(&fs::read_to_string(block_map)?)?;
        let raw: HashMap<String, String> = serde_json::from_str(&fs::read_to_string(block_ids)?)?;

        let mut blockstates = HashMap::with_capacity(raw.len());
        for (key, blockstate) in raw {
            let id = key.trim().parse::<i64>().map_err(|_| {
                Error::InvalidConfig(format!(
                    "block id {:?} in {} is not an integer",
                    key,
                    block_ids.display()
                ))
            })?;
            blockstates.insert(id, blockstate);
        }

        let table = Self::from_maps(ids, blockstates);
        log::info!(
            "Loaded block table: {} names, {} ids",
            table.ids.len(),
            table.blockstates.len()
        );
        Ok(table)
    }

    pub fn name_to_id(&self, name: &str) -> Result<i64> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownBlock(name.to_string()))
    }

    /// Model id of a world block, keyed by its base name
    pub fn block_id(&self, block: &Block) -> Result<i64> {
        self.name_to_id(&block.base_name)
    }

    pub fn id_to_block(&self, id: i64) -> Result<Block> {
        let blockstate = self
            .blockstates
            .get(&id)
            .ok_or(Error::UnknownBlockId(id))?;
        Block::from_blockstate(blockstate)
    }

    pub fn name_count(&self) -> usize {
        self.ids.len()
    }

    pub fn id_count(&self) -> usize {
        self.blockstates.len()
    }
}
