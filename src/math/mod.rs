//! Integer box algebra and occupancy grids

pub mod aabb;
pub mod grid;

pub use aabb::Aabb;
pub use grid::OccupancyGrid;
