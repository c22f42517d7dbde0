//! Selection groups: ordered, possibly overlapping sets of boxes

use serde::{Deserialize, Serialize};

use crate::core::types::IVec3;
use crate::math::{Aabb, OccupancyGrid};

/// One logical selection made of an ordered list of boxes.
///
/// Boxes may overlap, so the covered volume is the union of the boxes,
/// not the sum of their volumes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionGroup {
    boxes: Vec<Aabb>,
}

impl SelectionGroup {
    /// Create a group from boxes, dropping degenerate ones.
    pub fn new(boxes: impl IntoIterator<Item = Aabb>) -> Self {
        let boxes = boxes
            .into_iter()
            .filter(|b| {
                let valid = b.is_valid();
                if !valid {
                    log::debug!("Dropping degenerate selection box {:?}", b);
                }
                valid
            })
            .collect();
        Self { boxes }
    }

    pub fn boxes(&self) -> &[Aabb] {
        &self.boxes
    }

    pub fn into_boxes(self) -> Vec<Aabb> {
        self.boxes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Aabb> {
        self.boxes.iter()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Append the boxes of `other` after this group's boxes
    pub fn extended(mut self, other: &SelectionGroup) -> Self {
        self.boxes.extend_from_slice(&other.boxes);
        self
    }

    /// Copy of this group without the box at `index`
    pub fn without(&self, index: usize) -> Self {
        let mut boxes = self.boxes.clone();
        boxes.remove(index);
        Self { boxes }
    }

    /// Smallest box enclosing every box of the group
    pub fn bounds(&self) -> Option<Aabb> {
        let (first, rest) = self.boxes.split_first()?;
        Some(rest.iter().fold(*first, |acc, b| acc.merged(b)))
    }

    /// Minimum corner of the bounds
    pub fn min(&self) -> Option<IVec3> {
        self.bounds().map(|b| b.min)
    }

    /// Maximum (exclusive) corner of the bounds
    pub fn max(&self) -> Option<IVec3> {
        self.bounds().map(|b| b.max)
    }

    /// Whether any box of the group contains the voxel
    pub fn contains(&self, p: IVec3) -> bool {
        self.boxes.iter().any(|b| b.contains_point(p))
    }

    /// Occupancy grid over the group's bounds with every covered voxel set
    pub fn occupancy(&self) -> Option<OccupancyGrid> {
        let bounds = self.bounds()?;
        let mut grid = OccupancyGrid::new(bounds);
        for b in &self.boxes {
            grid.fill(b);
        }
        Some(grid)
    }

    /// Number of distinct voxels covered by the union of the boxes
    pub fn volume(&self) -> usize {
        self.occupancy().map_or(0, |grid| grid.count())
    }

    /// True if any box of this group touches or intersects any box of `other`
    pub fn touches_or_intersects(&self, other: &SelectionGroup) -> bool {
        self.boxes
            .iter()
            .any(|a| other.boxes.iter().any(|b| a.touches_or_intersects(b)))
    }
}

impl From<Vec<Aabb>> for SelectionGroup {
    fn from(boxes: Vec<Aabb>) -> Self {
        Self::new(boxes)
    }
}

impl<'a> IntoIterator for &'a SelectionGroup {
    type Item = &'a Aabb;
    type IntoIter = std::slice::Iter<'a, Aabb>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.iter()
    }
}

/// Number of distinct voxels covered by `group`
pub fn volume(group: &SelectionGroup) -> usize {
    group.volume()
}
