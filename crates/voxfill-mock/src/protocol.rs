//! Request bodies and the deterministic models answering them

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::MockError;

/// Body of `POST /structure`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureRequest {
    pub data: Vec<Vec<Option<i64>>>,
    pub y: i32,
    pub sampling: serde_json::Value,
}

/// Body of `POST /color`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorRequest {
    /// Batch of windows in `[y][z][x]` order; `-1` marks voxels to repaint.
    pub data: Vec<Vec<Vec<Vec<i64>>>>,
    pub y: i32,
    pub steps: u32,
    pub strength: f64,
}

/// How the mock answers requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockModel {
    /// Every unknown voxel is solid; color requests repaint with id 1.
    Solid,
    /// Every unknown voxel is empty; color requests stream no voxels.
    Empty,
    /// The first N unknown voxels are solid, then a stop value is sent.
    /// Color requests stop streaming after N steps.
    StopAfter(usize),
    /// Color requests repaint every voxel with the given id.
    /// Structure requests behave like `Solid`.
    Recolor(i64),
}

impl FromStr for MockModel {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MockError::InvalidModel(s.to_string());
        match s.split_once(':') {
            None if s == "solid" => Ok(MockModel::Solid),
            None if s == "empty" => Ok(MockModel::Empty),
            Some(("stop", n)) => n.parse().map(MockModel::StopAfter).map_err(|_| invalid()),
            Some(("recolor", id)) => id.parse().map(MockModel::Recolor).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl MockModel {
    /// One line per submitted tube holding an unknown voxel, each
    /// `[[v, ...]]` with v in {1, 0, -1}. Fully known tubes are skipped.
    pub fn structure_lines(&self, request: &StructureRequest) -> Vec<String> {
        let mut generated = 0usize;
        let mut stopped = false;
        request
            .data
            .iter()
            .filter(|tube| tube.contains(&None))
            .map(|tube| {
                let values: Vec<i64> = tube
                    .iter()
                    .map(|v| match v {
                        Some(known) => *known,
                        None => {
                            let value = match *self {
                                _ if stopped => 0,
                                MockModel::StopAfter(n) if generated >= n => {
                                    stopped = true;
                                    -1
                                }
                                MockModel::Empty => 0,
                                _ => 1,
                            };
                            generated += 1;
                            value
                        }
                    })
                    .collect();
                json!([values]).to_string()
            })
            .collect()
    }

    /// One line per denoising step, each a list of `[[0, 0, y, z, x], id]`
    /// entries covering the voxels marked for repainting.
    pub fn color_lines(&self, request: &ColorRequest) -> Vec<String> {
        let id = match *self {
            MockModel::Recolor(id) => id,
            _ => 1,
        };
        let steps = match *self {
            MockModel::StopAfter(n) => (request.steps as usize).min(n),
            _ => request.steps as usize,
        };

        let mut entries = Vec::new();
        if *self != MockModel::Empty {
            for (b, window) in request.data.iter().enumerate() {
                for (y, plane) in window.iter().enumerate() {
                    for (z, row) in plane.iter().enumerate() {
                        for (x, value) in row.iter().enumerate() {
                            if *value == -1 {
                                entries.push(json!([[b, 0, y, z, x], id]));
                            }
                        }
                    }
                }
            }
        }

        let line = serde_json::Value::Array(entries).to_string();
        vec![line; steps]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(data: Vec<Vec<Option<i64>>>) -> StructureRequest {
        StructureRequest {
            data,
            y: 0,
            sampling: json!({"strategy": "sample"}),
        }
    }

    #[test]
    fn test_parse_model() {
        assert_eq!("solid".parse::<MockModel>().unwrap(), MockModel::Solid);
        assert_eq!("empty".parse::<MockModel>().unwrap(), MockModel::Empty);
        assert_eq!("stop:3".parse::<MockModel>().unwrap(), MockModel::StopAfter(3));
        assert_eq!("recolor:42".parse::<MockModel>().unwrap(), MockModel::Recolor(42));
        assert!("stop:x".parse::<MockModel>().is_err());
        assert!("loud".parse::<MockModel>().is_err());
    }

    #[test]
    fn test_structure_keeps_known_values() {
        let request = structure(vec![vec![Some(1), Some(1), Some(1), Some(1)], vec![Some(1), Some(0), None, None]]);
        assert_eq!(MockModel::Solid.structure_lines(&request), vec!["[[1,0,1,1]]"]);
        assert_eq!(MockModel::Empty.structure_lines(&request), vec!["[[1,0,0,0]]"]);
    }

    #[test]
    fn test_structure_stop() {
        let request = structure(vec![vec![None, None], vec![None, None]]);
        assert_eq!(
            MockModel::StopAfter(1).structure_lines(&request),
            vec!["[[1,-1]]", "[[0,0]]"]
        );
    }

    #[test]
    fn test_color_lines() {
        let request = ColorRequest {
            data: vec![vec![vec![vec![3, -1], vec![-1, 0]]]],
            y: 0,
            steps: 2,
            strength: 1.0,
        };
        let lines = MockModel::Recolor(9).color_lines(&request);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[[[0,0,0,0,1],9],[[0,0,0,1,0],9]]");
        assert_eq!(MockModel::StopAfter(1).color_lines(&request).len(), 1);
        assert_eq!(MockModel::Empty.color_lines(&request), vec!["[]", "[]"]);
    }
}
