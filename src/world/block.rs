//! Block identities

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::Error;

/// Namespace assumed when a blockstate string has none
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A block identity: `namespace:base_name[key=value,...]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub namespace: String,
    pub base_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Block {
    /// Block in the default namespace without properties
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            base_name: base_name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn air() -> Self {
        Self::new("air")
    }

    /// Parse a blockstate string such as `minecraft:oak_stairs[facing=east]`.
    pub fn from_blockstate(blockstate: &str) -> Result<Self, Error> {
        let invalid = || Error::UnknownBlock(blockstate.to_string());
        let blockstate = blockstate.trim();

        let (name, properties) = match blockstate.split_once('[') {
            Some((name, rest)) => {
                let body = rest.strip_suffix(']').ok_or_else(invalid)?;
                let mut properties = BTreeMap::new();
                for pair in body.split(',').filter(|p| !p.trim().is_empty()) {
                    let (key, value) = pair.split_once('=').ok_or_else(invalid)?;
                    properties.insert(key.trim().to_string(), value.trim().to_string());
                }
                (name, properties)
            }
            None => (blockstate, BTreeMap::new()),
        };

        let (namespace, base_name) = name.split_once(':').unwrap_or((DEFAULT_NAMESPACE, name));
        if base_name.is_empty() || namespace.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            namespace: namespace.to_string(),
            base_name: base_name.to_string(),
            properties,
        })
    }

    /// `namespace:base_name`
    pub fn namespaced_name(&self) -> String {
        format!("{}:{}", self.namespace, self.base_name)
    }

    pub fn is_air(&self) -> bool {
        self.base_name == "air"
    }

    /// Structure encoding of a block: anything but air counts as solid.
    pub fn is_solid(&self) -> bool {
        !self.is_air()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.base_name)?;
        if !self.properties.is_empty() {
            let props: Vec<String> = self
                .properties
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "[{}]", props.join(","))?;
        }
        Ok(())
    }
}

impl FromStr for Block {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Block::from_blockstate(s)
    }
}

/// Platform and version tag attached to every world write
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameVersion {
    pub platform: String,
    pub version: [u32; 3],
}

impl Default for GameVersion {
    fn default() -> Self {
        Self {
            platform: "java".to_string(),
            version: [1, 16, 2],
        }
    }
}
