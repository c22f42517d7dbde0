//! Tube linearization of a generation window
//!
//! Window voxels are laid out y-major, then z, then x. That sequence is cut
//! into tubes of `tube_length` consecutive voxels. The window width along x
//! must be a multiple of the tube length, so every tube is a straight run
//! along x.

use crate::core::types::{IVec3, Result};
use crate::core::Error;

/// Maps between window-local voxels and (tube, offset) pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TubeLayout {
    window_size: IVec3,
    tube_length: usize,
}

impl TubeLayout {
    pub fn new(window_size: IVec3, tube_length: usize) -> Result<Self> {
        if !window_size.cmpgt(IVec3::ZERO).all() {
            return Err(Error::InvalidConfig(format!(
                "window size must be positive on every axis, got {}",
                window_size
            )));
        }
        if tube_length == 0 || window_size.x as usize % tube_length != 0 {
            return Err(Error::InvalidConfig(format!(
                "window width {} is not a multiple of tube length {}",
                window_size.x, tube_length
            )));
        }
        Ok(Self {
            window_size,
            tube_length,
        })
    }

    pub fn window_size(&self) -> IVec3 {
        self.window_size
    }

    pub fn tube_length(&self) -> usize {
        self.tube_length
    }

    pub fn voxel_count(&self) -> usize {
        let s = self.window_size;
        s.x as usize * s.y as usize * s.z as usize
    }

    pub fn tube_count(&self) -> usize {
        self.voxel_count() / self.tube_length
    }

    /// Position of a window-local voxel in the y, z, x layout
    pub fn flat_index(&self, local: IVec3) -> usize {
        let s = self.window_size;
        (local.y as usize * s.z as usize + local.z as usize) * s.x as usize + local.x as usize
    }

    /// Window-local voxel at a position of the y, z, x layout
    pub fn local_position(&self, flat: usize) -> IVec3 {
        let s = self.window_size;
        let x = flat % s.x as usize;
        let rest = flat / s.x as usize;
        let z = rest % s.z as usize;
        let y = rest / s.z as usize;
        IVec3::new(x as i32, y as i32, z as i32)
    }

    /// Tube index and offset within the tube of a window-local voxel
    pub fn tube_of(&self, local: IVec3) -> (usize, usize) {
        let flat = self.flat_index(local);
        (flat / self.tube_length, flat % self.tube_length)
    }

    /// World coordinates covered by tube `tube_index` of a window whose
    /// minimum corner is `origin`, ascending along x.
    pub fn tube_coordinates(&self, origin: IVec3, tube_index: usize) -> Result<Vec<IVec3>> {
        if tube_index >= self.tube_count() {
            return Err(Error::Invariant(format!(
                "tube {} out of range for {} tubes",
                tube_index,
                self.tube_count()
            )));
        }
        let start = tube_index * self.tube_length;
        Ok((start..start + self.tube_length)
            .map(|flat| origin + self.local_position(flat))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_counts() {
        let layout = TubeLayout::new(IVec3::splat(16), 8).unwrap();
        assert_eq!(layout.voxel_count(), 4096);
        assert_eq!(layout.tube_count(), 512);
    }

    #[test]
    fn test_tubes_run_along_x() {
        let layout = TubeLayout::new(IVec3::splat(16), 8).unwrap();
        let origin = IVec3::new(-8, 64, 100);

        let first = layout.tube_coordinates(origin, 0).unwrap();
        assert_eq!(first.len(), 8);
        assert_eq!(first[0], origin);
        assert_eq!(first[7], origin + IVec3::new(7, 0, 0));

        let second = layout.tube_coordinates(origin, 1).unwrap();
        assert_eq!(second[0], origin + IVec3::new(8, 0, 0));

        // Third tube starts the next z row
        let third = layout.tube_coordinates(origin, 2).unwrap();
        assert_eq!(third[0], origin + IVec3::new(0, 0, 1));

        // 32 tubes per y layer
        let layer = layout.tube_coordinates(origin, 32).unwrap();
        assert_eq!(layer[0], origin + IVec3::new(0, 1, 0));
    }

    #[test]
    fn test_bijection() {
        let layout = TubeLayout::new(IVec3::new(4, 3, 2), 2).unwrap();
        let origin = IVec3::new(10, -5, 3);
        let mut seen = HashSet::new();

        for tube in 0..layout.tube_count() {
            for (offset, p) in layout.tube_coordinates(origin, tube).unwrap().into_iter().enumerate() {
                assert_eq!(layout.tube_of(p - origin), (tube, offset));
                assert!(seen.insert(p));
            }
        }

        assert_eq!(seen.len(), layout.voxel_count());
        for x in 0..4 {
            for y in 0..3 {
                for z in 0..2 {
                    assert!(seen.contains(&(origin + IVec3::new(x, y, z))));
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_tube() {
        let layout = TubeLayout::new(IVec3::splat(4), 4).unwrap();
        assert!(matches!(layout.tube_coordinates(IVec3::ZERO, 16), Err(Error::Invariant(_))));
    }

    #[test]
    fn test_invalid_layouts() {
        assert!(TubeLayout::new(IVec3::splat(16), 0).is_err());
        assert!(TubeLayout::new(IVec3::new(12, 16, 16), 8).is_err());
        assert!(TubeLayout::new(IVec3::new(16, 0, 16), 8).is_err());
    }
}
