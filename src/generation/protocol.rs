//! Wire format of the inference service
//!
//! Requests are single JSON objects. Responses stream one JSON array per line:
//! the structure route answers one tube per line, the color route one
//! denoising step per line.

use serde::{Deserialize, Serialize};

use super::options::SamplingStrategy;
use crate::core::types::{IVec3, Result};
use crate::core::Error;

/// Body of a `structure` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRequest {
    /// Tubes to complete; `None` marks a voxel the model should generate.
    pub data: Vec<Vec<Option<u8>>>,
    pub y: i32,
    pub sampling: SamplingStrategy,
}

/// Body of a `color` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRequest {
    /// One window of block ids in `[y][z][x]` order, wrapped in a batch of one.
    /// `-1` marks a voxel to repaint.
    pub data: Vec<Vec<Vec<Vec<i64>>>>,
    pub y: i32,
    pub steps: u32,
    pub strength: f64,
}

/// One decoded entry of a streamed structure tube
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TubeValue {
    Solid,
    Empty,
    /// Nothing from here on is generated.
    Stop,
}

impl TryFrom<i64> for TubeValue {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(TubeValue::Solid),
            0 => Ok(TubeValue::Empty),
            -1 => Ok(TubeValue::Stop),
            other => Err(Error::Transport(format!("unexpected tube value {}", other))),
        }
    }
}

/// Decode one structure line, `[[v, v, ...]]`, into `tube_length` values.
pub fn parse_structure_line(line: &str, tube_length: usize) -> Result<Vec<TubeValue>> {
    let batch: Vec<Vec<i64>> = serde_json::from_str(line)
        .map_err(|e| Error::Transport(format!("malformed structure line {:?}: {}", line, e)))?;
    let tube = batch
        .into_iter()
        .next()
        .ok_or_else(|| Error::Transport("empty structure line".to_string()))?;
    if tube.len() != tube_length {
        return Err(Error::Transport(format!(
            "structure line has {} values, expected {}",
            tube.len(),
            tube_length
        )));
    }
    tube.into_iter().map(TubeValue::try_from).collect()
}

/// One voxel of a streamed color step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorVoxel {
    /// Position relative to the window's minimum corner
    pub local: IVec3,
    pub block_id: i64,
}

/// Decode one color line, a list of `[[_, _, y, z, x], block_id]` pairs.
pub fn parse_color_line(line: &str) -> Result<Vec<ColorVoxel>> {
    let entries: Vec<([i64; 5], i64)> = serde_json::from_str(line)
        .map_err(|e| Error::Transport(format!("malformed color line: {}", e)))?;

    entries
        .into_iter()
        .map(|(c, block_id)| {
            let axis = |v: i64| {
                i32::try_from(v)
                    .map_err(|_| Error::Invariant(format!("local coordinate {} out of range", v)))
            };
            Ok(ColorVoxel {
                local: IVec3::new(axis(c[4])?, axis(c[2])?, axis(c[3])?),
                block_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structure_line() {
        let values = parse_structure_line("[[1, 0, -1, 1]]", 4).unwrap();
        assert_eq!(
            values,
            vec![TubeValue::Solid, TubeValue::Empty, TubeValue::Stop, TubeValue::Solid]
        );
    }

    #[test]
    fn test_malformed_structure_lines() {
        for line in ["", "[[1,0]", "[]", "[[1,0,1]]", "[[1,0,2,0]]", "[[1,0,null,0]]", "{\"a\":1}"] {
            assert!(
                matches!(parse_structure_line(line, 4), Err(Error::Transport(_))),
                "{:?} accepted",
                line
            );
        }
    }

    #[test]
    fn test_color_line() {
        let voxels = parse_color_line("[[[0, 0, 3, 2, 1], 17], [[0, 0, 0, 0, 15], 0]]").unwrap();
        assert_eq!(
            voxels,
            vec![
                ColorVoxel { local: IVec3::new(1, 3, 2), block_id: 17 },
                ColorVoxel { local: IVec3::new(15, 0, 0), block_id: 0 },
            ]
        );
        assert!(parse_color_line("[]").unwrap().is_empty());
        assert!(matches!(parse_color_line("[[[0, 0, 1], 3]]"), Err(Error::Transport(_))));
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(StructureRequest {
            data: vec![vec![Some(1), None]],
            y: 0,
            sampling: SamplingStrategy::Topk { k: 8 },
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"data": [[1, null]], "y": 0, "sampling": {"strategy": "topk", "k": 8}})
        );

        let body = serde_json::to_value(ColorRequest {
            data: vec![vec![vec![vec![3, -1]]]],
            y: 0,
            steps: 64,
            strength: 0.5,
        })
        .unwrap();
        assert_eq!(body, json!({"data": [[[[3, -1]]]], "y": 0, "steps": 64, "strength": 0.5}));
    }
}
