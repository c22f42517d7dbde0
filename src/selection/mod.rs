//! Selection groups, contiguity clustering and redundant box removal

pub mod group;
pub mod reduce;
pub mod cluster;

pub use group::{volume, SelectionGroup};
pub use reduce::merge_boxes;
pub use cluster::contiguous_selections;
