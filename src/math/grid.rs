//! Dense boolean occupancy grid over a bounding box
//!
//! Cells are stored x-major, then z, then y, so walking the storage front
//! to back visits voxels in tiling scan order: ascending x, then z, then y.

use crate::core::types::IVec3;
use crate::math::aabb::Aabb;

/// Boolean voxel grid covering `bounds`.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    bounds: Aabb,
    cells: Vec<bool>,
    /// Storage index before which no cell is set.
    scan_cursor: usize,
}

impl OccupancyGrid {
    /// Create an all-false grid; degenerate bounds produce an empty grid.
    pub fn new(bounds: Aabb) -> Self {
        let len = bounds.volume() as usize;
        Self {
            bounds,
            cells: vec![false; len],
            scan_cursor: len,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn index(&self, p: IVec3) -> usize {
        let size = self.bounds.size();
        let local = p - self.bounds.min;
        ((local.x as usize * size.z as usize) + local.z as usize) * size.y as usize + local.y as usize
    }

    fn point(&self, index: usize) -> IVec3 {
        let size = self.bounds.size();
        let y = index % size.y as usize;
        let rest = index / size.y as usize;
        let z = rest % size.z as usize;
        let x = rest / size.z as usize;
        self.bounds.min + IVec3::new(x as i32, y as i32, z as i32)
    }

    /// Cell value, `false` outside the grid
    pub fn get(&self, p: IVec3) -> bool {
        self.bounds.contains_point(p) && self.cells[self.index(p)]
    }

    fn set_region(&mut self, region: &Aabb, value: bool) {
        let Some(clipped) = self.bounds.intersection(region) else {
            return;
        };
        let mut first = usize::MAX;
        for x in clipped.min.x..clipped.max.x {
            for z in clipped.min.z..clipped.max.z {
                let start = self.index(IVec3::new(x, clipped.min.y, z));
                let end = start + (clipped.max.y - clipped.min.y) as usize;
                self.cells[start..end].fill(value);
                first = first.min(start);
            }
        }
        if value {
            self.scan_cursor = self.scan_cursor.min(first);
        }
    }

    /// Mark every cell of `region` (clipped to the grid) as set
    pub fn fill(&mut self, region: &Aabb) {
        self.set_region(region, true);
    }

    /// Clear every cell of `region` (clipped to the grid)
    pub fn clear(&mut self, region: &Aabb) {
        self.set_region(region, false);
    }

    /// Number of set cells
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn any(&self) -> bool {
        self.cells[self.scan_cursor.min(self.cells.len())..].iter().any(|&c| c)
    }

    /// First set cell in scan order (ascending x, then z, then y).
    pub fn first_set(&mut self) -> Option<IVec3> {
        let offset = self.cells[self.scan_cursor.min(self.cells.len())..]
            .iter()
            .position(|&c| c)?;
        self.scan_cursor += offset;
        Some(self.point(self.scan_cursor))
    }
}
