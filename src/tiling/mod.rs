//! Generation window tiling and tube linearization

pub mod window;
pub mod tube;

pub use window::{create_generation_windows, GenerationWindow, WindowTiler};
pub use tube::TubeLayout;

use crate::core::types::{IVec3, Result};

/// World coordinates covered by tube `tube_index` of `window`.
pub fn tube_index_to_coordinates(
    window: &GenerationWindow,
    layout: &TubeLayout,
    tube_index: usize,
) -> Result<Vec<IVec3>> {
    layout.tube_coordinates(window.min(), tube_index)
}
