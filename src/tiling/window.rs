//! Generation window tiling
//!
//! A contiguous cluster is covered by fixed-size windows. Each window is
//! split into a context margin, which the model conditions on, and a target
//! region, which the model fills. Every voxel of a cluster is generated by
//! exactly one window.

use serde::{Deserialize, Serialize};

use crate::core::types::{IVec3, Result};
use crate::core::Error;
use crate::math::{Aabb, OccupancyGrid};
use crate::selection::{contiguous_selections, SelectionGroup};

/// One fixed-size window and the part of it the model should fill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationWindow {
    /// Whole window, context included. Always `generation_size` voxels wide.
    pub bounds: Aabb,
    /// Box to generate, in world coordinates. Only voxels of `cluster`
    /// inside it are generated.
    pub target: Aabb,
    /// Effective context length per axis for this window.
    pub context: IVec3,
    /// Cluster voxels inside `target` that an earlier window already generated.
    /// Only non-box clusters produce these; they are treated as context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub already_generated: Vec<IVec3>,
    /// Cluster this window belongs to. Voxels of other clusters inside the
    /// window are context only. Not serialized.
    #[serde(skip)]
    pub cluster: SelectionGroup,
}

impl GenerationWindow {
    pub fn min(&self) -> IVec3 {
        self.bounds.min
    }

    pub fn max(&self) -> IVec3 {
        self.bounds.max
    }

    pub fn size(&self) -> IVec3 {
        self.bounds.size()
    }

    /// Whether a world voxel is generated by this window
    pub fn is_target(&self, p: IVec3) -> bool {
        self.target.contains_point(p)
            && self.cluster.contains(p)
            && !self.already_generated.contains(&p)
    }

    /// Whether a world voxel belongs to this window's cluster
    pub fn in_cluster(&self, p: IVec3) -> bool {
        self.cluster.contains(p)
    }

    /// Target region relative to the window's minimum corner
    pub fn local_target(&self) -> Aabb {
        self.target.translated(-self.bounds.min)
    }
}

/// Covers clusters with generation windows in a fixed scan order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowTiler {
    generation_size: IVec3,
    context_size: IVec3,
    context_offset: IVec3,
}

impl WindowTiler {
    /// Tiler with steady-state context `context_size` placed on the low side of
    /// every axis.
    pub fn new(generation_size: IVec3, context_size: IVec3) -> Result<Self> {
        if !generation_size.cmpgt(IVec3::ZERO).all() {
            return Err(Error::InvalidConfig(format!(
                "generation size must be positive on every axis, got {}",
                generation_size
            )));
        }
        if !context_size.cmpge(IVec3::ZERO).all() || !context_size.cmplt(generation_size).all() {
            return Err(Error::InvalidConfig(format!(
                "context size {} must be in [0, {})",
                context_size, generation_size
            )));
        }
        Ok(Self {
            generation_size,
            context_size,
            context_offset: -context_size,
        })
    }

    /// Requested context length for windows starting on the cluster's low face.
    ///
    /// The magnitude is clamped so at least one voxel per axis is generated.
    /// The sign picks the side of the window the context sits on: negative
    /// values put it below the target region, others above.
    pub fn with_context_offset(mut self, context_offset: IVec3) -> Self {
        self.context_offset = context_offset;
        self
    }

    pub fn generation_size(&self) -> IVec3 {
        self.generation_size
    }

    pub fn context_size(&self) -> IVec3 {
        self.context_size
    }

    pub fn context_offset(&self) -> IVec3 {
        self.context_offset
    }

    /// Context used on axes where a window starts at the cluster boundary
    pub fn initial_context(&self) -> IVec3 {
        let o = self.context_offset;
        IVec3::new(o.x.saturating_abs(), o.y.saturating_abs(), o.z.saturating_abs())
            .min(self.generation_size - IVec3::ONE)
    }

    /// Windows covering every cluster of `selection`, cluster by cluster.
    pub fn plan(&self, selection: &SelectionGroup) -> Vec<GenerationWindow> {
        let clusters = contiguous_selections(selection);
        let windows: Vec<GenerationWindow> = clusters
            .iter()
            .flat_map(|cluster| self.plan_cluster(cluster))
            .collect();
        log::info!(
            "Planned {} generation windows for {} contiguous groups",
            windows.len(),
            clusters.len()
        );
        windows
    }

    /// Windows covering one contiguous cluster, in scan order of their
    /// starting corners (ascending x, then z, then y).
    pub fn plan_cluster(&self, cluster: &SelectionGroup) -> Vec<GenerationWindow> {
        let Some(mut remaining) = cluster.occupancy() else {
            return Vec::new();
        };
        let origin = remaining.bounds().min;
        let initial_context = self.initial_context();
        let context_below = self.context_offset.cmplt(IVec3::ZERO);

        let mut windows = Vec::new();
        while let Some(corner) = remaining.first_set() {
            let on_boundary = corner.cmpeq(origin);
            let context = IVec3::select(on_boundary, initial_context, self.context_size);
            let target_size = self.generation_size - context;
            let target = Aabb::new(corner, corner + target_size);

            let bounds = Aabb::new(
                IVec3::select(context_below, corner - context, corner),
                IVec3::select(context_below, target.max, target.max + context),
            );

            let already_generated = claimed_earlier(cluster, &remaining, &target);
            remaining.clear(&target);
            windows.push(GenerationWindow {
                bounds,
                target,
                context,
                already_generated,
                cluster: cluster.clone(),
            });
        }

        log::debug!(
            "Cluster {:?} covered by {} windows",
            cluster.bounds(),
            windows.len()
        );
        windows
    }
}

/// Cluster voxels of `target` no longer pending in `remaining`
fn claimed_earlier(cluster: &SelectionGroup, remaining: &OccupancyGrid, target: &Aabb) -> Vec<IVec3> {
    let Some(region) = remaining.bounds().intersection(target) else {
        return Vec::new();
    };
    let mut claimed = Vec::new();
    for x in region.min.x..region.max.x {
        for z in region.min.z..region.max.z {
            for y in region.min.y..region.max.y {
                let p = IVec3::new(x, y, z);
                if !remaining.get(p) && cluster.contains(p) {
                    claimed.push(p);
                }
            }
        }
    }
    claimed
}

/// Windows for `selection` with the given window and context sizes, using
/// the default low-side context.
pub fn create_generation_windows(
    selection: &SelectionGroup,
    generation_size: IVec3,
    context_size: IVec3,
) -> Result<Vec<GenerationWindow>> {
    Ok(WindowTiler::new(generation_size, context_size)?.plan(selection))
}
