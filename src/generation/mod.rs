//! Generative fill operations
//!
//! Both operations share one pipeline:
//! 1. Plan: cluster the selection and tile every cluster with windows
//! 2. Per window: snapshot the world, encode it and post it to the model
//! 3. Stream the answer back, writing only voxels inside the selection
//!
//! The operations are lazy iterators of progress values in `[0, 1]`; every
//! step performs at most one blocking read from the response stream.

pub mod config;
pub mod options;
pub mod block_table;
pub mod protocol;
pub mod structure;
pub mod color;

pub use config::GenerationConfig;
pub use options::{ColorOptions, OptionMap, OptionValue, SamplingStrategy, StructureOptions};
pub use block_table::BlockIdTable;
pub use structure::StructureFill;
pub use color::ColorFill;

use crate::core::types::{IVec3, Result};
use crate::core::Error;
use crate::selection::SelectionGroup;
use crate::tiling::{GenerationWindow, TubeLayout};
use crate::transport::HttpTransport;
use crate::world::World;

/// Windows and geometry of one operation invocation.
#[derive(Clone, Debug)]
pub struct FillPlan {
    selection: SelectionGroup,
    config: GenerationConfig,
    layout: TubeLayout,
    windows: Vec<GenerationWindow>,
}

impl FillPlan {
    pub fn new(selection: &SelectionGroup, config: GenerationConfig, context_offset: IVec3) -> Result<Self> {
        if selection.is_empty() {
            return Err(Error::EmptySelection);
        }
        config.validate()?;
        let layout = config.tube_layout()?;
        let windows = config.tiler(context_offset)?.plan(selection);

        Ok(Self {
            selection: selection.clone(),
            config,
            layout,
            windows,
        })
    }

    pub fn selection(&self) -> &SelectionGroup {
        &self.selection
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn layout(&self) -> &TubeLayout {
        &self.layout
    }

    pub fn windows(&self) -> &[GenerationWindow] {
        &self.windows
    }

    /// Overall progress once `fraction` of window `window_index` is done.
    pub fn progress(&self, window_index: usize, fraction: f64) -> f64 {
        progress(window_index, fraction, self.windows.len())
    }
}

/// `(window_index + fraction) / window_count`, clamped to `[0, 1]`.
pub fn progress(window_index: usize, fraction: f64, window_count: usize) -> f64 {
    if window_count == 0 {
        return 1.0;
    }
    ((window_index as f64 + fraction.clamp(0.0, 1.0)) / window_count as f64).clamp(0.0, 1.0)
}

/// Drive an operation to the end, stopping at the first error.
///
/// Returns the last progress value reported.
pub fn run_to_completion(operation: impl Iterator<Item = Result<f64>>) -> Result<f64> {
    let mut last = 0.0;
    for step in operation {
        last = step?;
    }
    Ok(last)
}

fn endpoint_transport(endpoint: &str) -> Result<HttpTransport> {
    HttpTransport::new(endpoint).map_err(|e| match e {
        Error::InvalidConfig(msg) => Error::UserInput(msg),
        other => other,
    })
}

/// Structure fill driven by editor options, talking HTTP to the configured endpoint.
pub fn generate_structure<'w, W: World + ?Sized>(
    world: &'w mut W,
    dimension: &str,
    selection: &SelectionGroup,
    options: &OptionMap,
) -> Result<StructureFill<'w, W, HttpTransport>> {
    let options = StructureOptions::from_options(options)?;
    let transport = endpoint_transport(&options.endpoint)?;
    StructureFill::new(world, dimension, selection, options, GenerationConfig::default(), transport)
}

/// Color fill driven by editor options, talking HTTP to the configured endpoint.
pub fn generate_color<'w, W: World + ?Sized>(
    world: &'w mut W,
    dimension: &str,
    selection: &SelectionGroup,
    table: &'w BlockIdTable,
    options: &OptionMap,
) -> Result<ColorFill<'w, W, HttpTransport>> {
    let options = ColorOptions::from_options(options)?;
    let transport = endpoint_transport(&options.endpoint)?;
    ColorFill::new(world, dimension, selection, table, options, GenerationConfig::default(), transport)
}
