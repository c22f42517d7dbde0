//! Editor option parsing
//!
//! The editor hands operations a flat map of labelled values. Everything is
//! validated here, before any world read or network call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::config::GENERATION_CONTEXT_SIZE;
use crate::core::types::{IVec3, Result};
use crate::core::Error;
use crate::world::Block;

pub const X_CONTEXT_LENGTH: &str = "X Context Length";
pub const Y_CONTEXT_LENGTH: &str = "Y Context Length";
pub const Z_CONTEXT_LENGTH: &str = "Z Context Length";
pub const STRUCTURE_BLOCK_TYPE: &str = "Structure Block Type";
pub const SAMPLING_STRATEGY: &str = "Sampling Strategy";
pub const TOP_K: &str = "Top K";
pub const TOP_P: &str = "Top P";
pub const STEPS: &str = "Steps";
pub const INPAINT_STRENGTH: &str = "Inpaint Strength";
pub const ENDPOINT: &str = "Endpoint";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8001";
pub const DEFAULT_FILL_BLOCK: &str = "oak_planks";
pub const DEFAULT_TOP_K: u32 = 8;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_STEPS: u32 = 64;
pub const MAX_TOP_K: u32 = 256;
pub const MAX_STEPS: u32 = 256;

/// One editor option value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

/// Options keyed by their editor label
pub type OptionMap = BTreeMap<String, OptionValue>;

fn get_int(options: &OptionMap, key: &str, default: i64) -> Result<i64> {
    let bad = || Error::UserInput(format!("{} must be an integer", key));
    match options.get(key) {
        None => Ok(default),
        Some(OptionValue::Int(v)) => Ok(*v),
        Some(OptionValue::Float(v)) if v.fract() == 0.0 && v.is_finite() => Ok(*v as i64),
        Some(OptionValue::Str(s)) => s.trim().parse().map_err(|_| bad()),
        Some(_) => Err(bad()),
    }
}

fn get_int_in(options: &OptionMap, key: &str, default: i64, min: i64, max: i64) -> Result<i64> {
    let value = get_int(options, key, default)?;
    if !(min..=max).contains(&value) {
        return Err(Error::UserInput(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )));
    }
    Ok(value)
}

fn get_float(options: &OptionMap, key: &str, default: f64) -> Result<f64> {
    let value = match options.get(key) {
        None => default,
        Some(OptionValue::Float(v)) => *v,
        Some(OptionValue::Int(v)) => *v as f64,
        Some(OptionValue::Str(s)) => s
            .trim()
            .parse()
            .map_err(|_| Error::UserInput(format!("{} must be a number, got {:?}", key, s)))?,
        Some(OptionValue::Bool(_)) => {
            return Err(Error::UserInput(format!("{} must be a number", key)));
        }
    };
    if value.is_nan() {
        return Err(Error::UserInput(format!("{} must be a number", key)));
    }
    Ok(value)
}

fn get_str<'a>(options: &'a OptionMap, key: &str, default: &'a str) -> Result<&'a str> {
    match options.get(key) {
        None => Ok(default),
        Some(OptionValue::Str(s)) => Ok(s.as_str()),
        Some(_) => Err(Error::UserInput(format!("{} must be text", key))),
    }
}

fn context_offset(options: &OptionMap) -> Result<IVec3> {
    let axis = |key: &str, default: i32| -> Result<i32> {
        get_int_in(options, key, default as i64, i32::MIN as i64 + 1, i32::MAX as i64)
            .map(|v| v as i32)
    };
    Ok(IVec3::new(
        axis(X_CONTEXT_LENGTH, -GENERATION_CONTEXT_SIZE.x)?,
        axis(Y_CONTEXT_LENGTH, -GENERATION_CONTEXT_SIZE.y)?,
        axis(Z_CONTEXT_LENGTH, -GENERATION_CONTEXT_SIZE.z)?,
    ))
}

fn endpoint(options: &OptionMap) -> Result<String> {
    let endpoint = get_str(options, ENDPOINT, DEFAULT_ENDPOINT)?.trim();
    if endpoint.is_empty() {
        return Err(Error::UserInput(format!("{} must not be empty", ENDPOINT)));
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}

/// How the structure model picks each voxel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum SamplingStrategy {
    Sample,
    Greedy,
    Topk { k: u32 },
    Nucleus { p: f64 },
}

impl SamplingStrategy {
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        let name = get_str(options, SAMPLING_STRATEGY, "sample")?;
        match name.trim().to_ascii_lowercase().as_str() {
            "sample" => Ok(SamplingStrategy::Sample),
            "greedy" => Ok(SamplingStrategy::Greedy),
            "topk" => {
                let k = get_int_in(options, TOP_K, DEFAULT_TOP_K as i64, 1, MAX_TOP_K as i64)?;
                Ok(SamplingStrategy::Topk { k: k as u32 })
            }
            "nucleus" => {
                let p = get_float(options, TOP_P, DEFAULT_TOP_P)?;
                if !(p > 0.0 && p <= 1.0) {
                    return Err(Error::UserInput(format!(
                        "{} must be a float between 0 and 1",
                        TOP_P
                    )));
                }
                Ok(SamplingStrategy::Nucleus { p })
            }
            other => Err(Error::UserInput(format!(
                "{} must be one of sample, greedy, topk, nucleus; got {:?}",
                SAMPLING_STRATEGY, other
            ))),
        }
    }
}

/// Parsed options of the structure fill operation
#[derive(Clone, Debug, PartialEq)]
pub struct StructureOptions {
    pub context_offset: IVec3,
    pub fill_block: Block,
    pub sampling: SamplingStrategy,
    pub endpoint: String,
}

impl Default for StructureOptions {
    fn default() -> Self {
        Self {
            context_offset: -GENERATION_CONTEXT_SIZE,
            fill_block: Block::new(DEFAULT_FILL_BLOCK),
            sampling: SamplingStrategy::Sample,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl StructureOptions {
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        let block_name = get_str(options, STRUCTURE_BLOCK_TYPE, DEFAULT_FILL_BLOCK)?;
        let fill_block = Block::from_blockstate(block_name).map_err(|_| {
            Error::UserInput(format!("{} {:?} is not a valid block", STRUCTURE_BLOCK_TYPE, block_name))
        })?;

        Ok(Self {
            context_offset: context_offset(options)?,
            fill_block,
            sampling: SamplingStrategy::from_options(options)?,
            endpoint: endpoint(options)?,
        })
    }
}

/// Parsed options of the color fill operation
#[derive(Clone, Debug, PartialEq)]
pub struct ColorOptions {
    pub context_offset: IVec3,
    pub steps: u32,
    pub strength: f64,
    pub endpoint: String,
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self {
            context_offset: -GENERATION_CONTEXT_SIZE,
            steps: DEFAULT_STEPS,
            strength: 1.0,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl ColorOptions {
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        let strength = get_float(options, INPAINT_STRENGTH, 1.0).map_err(|_| strength_error())?;
        if !(0.0..=1.0).contains(&strength) {
            return Err(strength_error());
        }
        let steps = get_int_in(options, STEPS, DEFAULT_STEPS as i64, 1, MAX_STEPS as i64)?;

        Ok(Self {
            context_offset: context_offset(options)?,
            steps: steps as u32,
            strength,
            endpoint: endpoint(options)?,
        })
    }
}

fn strength_error() -> Error {
    Error::UserInput(format!("{} must be a float between 0 and 1", INPAINT_STRENGTH))
}
