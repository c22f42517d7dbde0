//! Integer axis-aligned box

use serde::{Deserialize, Serialize};

use crate::core::types::IVec3;

/// Half-open voxel box: `min` is inclusive, `max` is exclusive on every axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aabb {
    pub min: IVec3,
    pub max: IVec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Create AABB from `[x, y, z]` corner arrays
    pub fn from_corners(min: [i32; 3], max: [i32; 3]) -> Self {
        Self {
            min: IVec3::from_array(min),
            max: IVec3::from_array(max),
        }
    }

    /// Get size (max - min)
    pub fn size(&self) -> IVec3 {
        self.max - self.min
    }

    /// Every axis spans at least one voxel.
    pub fn is_valid(&self) -> bool {
        self.min.cmplt(self.max).all()
    }

    /// Number of voxels covered, zero for degenerate boxes
    pub fn volume(&self) -> i64 {
        if !self.is_valid() {
            return 0;
        }
        let size = self.size().as_i64vec3();
        size.x * size.y * size.z
    }

    /// Check if a voxel coordinate is inside the box
    pub fn contains_point(&self, p: IVec3) -> bool {
        p.cmpge(self.min).all() && p.cmplt(self.max).all()
    }

    /// Check if `other` lies entirely inside this box
    pub fn contains_box(&self, other: &Aabb) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }

    /// True when the boxes share volume, a face, an edge or a corner.
    pub fn touches_or_intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// True when the boxes share at least one voxel.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmplt(other.max).all() && self.max.cmpgt(other.min).all()
    }

    /// Overlapping region, if any
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let clipped = Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        };
        clipped.is_valid().then_some(clipped)
    }

    /// Return merged AABB containing both
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Shift both corners by `offset`
    pub fn translated(&self, offset: IVec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}
