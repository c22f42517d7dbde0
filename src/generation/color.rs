//! Color fill: repaint the blocks of a selection with ids from the color model

use super::block_table::{BlockIdTable, AIR_ID};
use super::options::ColorOptions;
use super::protocol::{parse_color_line, ColorRequest, ColorVoxel};
use super::{FillPlan, GenerationConfig};
use crate::core::types::{IVec3, Result};
use crate::core::Error;
use crate::math::Aabb;
use crate::selection::SelectionGroup;
use crate::transport::{InferenceTransport, ResponseLines, COLOR_ROUTE};
use crate::world::World;

/// Response stream of the window being repainted
#[derive(Debug)]
struct WindowStream {
    window: usize,
    /// Voxels that held a non-air block when the window was read, in y, z, x order
    mask: Vec<bool>,
    lines: ResponseLines,
    step: usize,
}

/// Lazy color fill over a selection.
///
/// Every streamed line is one denoising step over the whole window; each
/// call to `next` applies one step and yields the overall progress. Air is
/// never replaced, so the shape of the selection is kept.
pub struct ColorFill<'w, W: World + ?Sized, T: InferenceTransport> {
    world: &'w mut W,
    table: &'w BlockIdTable,
    transport: T,
    dimension: String,
    options: ColorOptions,
    plan: FillPlan,
    next_window: usize,
    current: Option<WindowStream>,
    fused: bool,
}

impl<'w, W: World + ?Sized, T: InferenceTransport> ColorFill<'w, W, T> {
    pub fn new(
        world: &'w mut W,
        dimension: &str,
        selection: &SelectionGroup,
        table: &'w BlockIdTable,
        options: ColorOptions,
        config: GenerationConfig,
        transport: T,
    ) -> Result<Self> {
        let plan = FillPlan::new(selection, config, options.context_offset)?;
        log::info!(
            "Color fill: {} voxels in {} windows, {} steps at strength {}",
            selection.volume(),
            plan.windows().len(),
            options.steps,
            options.strength
        );

        Ok(Self {
            world,
            table,
            transport,
            dimension: dimension.to_string(),
            options,
            plan,
            next_window: 0,
            current: None,
            fused: false,
        })
    }

    pub fn plan(&self) -> &FillPlan {
        &self.plan
    }

    /// Read window `index` as block ids, post it and open its response stream.
    fn start_window(&mut self, index: usize) -> Result<WindowStream> {
        let window = &self.plan.windows()[index];
        let layout = self.plan.layout();
        let size = window.size();

        let mut ids = Vec::with_capacity(layout.voxel_count());
        let mut mask = Vec::with_capacity(layout.voxel_count());
        for flat in 0..layout.voxel_count() {
            let p = window.min() + layout.local_position(flat);
            let id = self.table.block_id(&self.world.get_block(p, &self.dimension)?)?;
            mask.push(id > AIR_ID);
            ids.push(if window.is_target(p) { -1 } else { id });
        }

        let rows: Vec<Vec<i64>> = ids.chunks(size.x as usize).map(<[i64]>::to_vec).collect();
        let planes: Vec<Vec<Vec<i64>>> = rows.chunks(size.z as usize).map(<[Vec<i64>]>::to_vec).collect();

        log::debug!(
            "Window {}/{}: bounds {:?}, target {:?}, context {}, {} masked voxels",
            index + 1,
            self.plan.windows().len(),
            window.bounds,
            window.target,
            window.context,
            mask.iter().filter(|m| **m).count()
        );

        let request = ColorRequest {
            data: vec![planes],
            y: 0,
            steps: self.options.steps,
            strength: self.options.strength,
        };
        let lines = self
            .transport
            .post_lines(COLOR_ROUTE, &serde_json::to_value(&request)?)?;

        Ok(WindowStream {
            window: index,
            mask,
            lines,
            step: 0,
        })
    }

    fn apply_voxel(&mut self, stream: &WindowStream, voxel: ColorVoxel) -> Result<()> {
        let window = &self.plan.windows()[stream.window];
        let local_bounds = Aabb::new(IVec3::ZERO, window.size());
        if !local_bounds.contains_point(voxel.local) {
            return Err(Error::Invariant(format!(
                "color voxel {} outside window of size {}",
                voxel.local,
                window.size()
            )));
        }
        if !stream.mask[self.plan.layout().flat_index(voxel.local)] {
            return Ok(());
        }
        let p = window.min() + voxel.local;
        if !self.plan.selection().contains(p) || !window.in_cluster(p) {
            return Ok(());
        }
        let block = self.table.id_to_block(voxel.block_id)?;
        self.world
            .set_block(p, &self.dimension, &self.plan.config().version, block)
    }

    fn step(&mut self) -> Result<Option<f64>> {
        let mut stream = match self.current.take() {
            Some(stream) => stream,
            None => {
                let index = self.next_window;
                if index >= self.plan.windows().len() {
                    log::info!("Color fill complete");
                    return Ok(None);
                }
                self.next_window += 1;
                self.start_window(index)?
            }
        };

        let Some(line) = stream.lines.next() else {
            log::debug!("Window {} finished after {} steps", stream.window, stream.step);
            return Ok(Some(self.plan.progress(stream.window, 1.0)));
        };
        let line = line?;
        log::trace!("step {}: {} bytes", stream.step, line.len());

        for voxel in parse_color_line(&line)? {
            self.apply_voxel(&stream, voxel)?;
        }

        stream.step += 1;
        let steps = self.options.steps.max(1) as usize;
        let progress = self
            .plan
            .progress(stream.window, stream.step.min(steps) as f64 / steps as f64);
        self.current = Some(stream);
        Ok(Some(progress))
    }
}

impl<W: World + ?Sized, T: InferenceTransport> Iterator for ColorFill<'_, W, T> {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.step() {
            Ok(Some(progress)) => Some(Ok(progress)),
            Ok(None) => {
                self.fused = true;
                None
            }
            Err(e) => {
                log::error!("Color fill aborted: {}", e);
                self.fused = true;
                self.current = None;
                Some(Err(e))
            }
        }
    }
}

impl<W: World + ?Sized, T: InferenceTransport> std::iter::FusedIterator for ColorFill<'_, W, T> {}
