//! Structure fill: generate solid/empty voxels inside the selection

use super::options::StructureOptions;
use super::protocol::{parse_structure_line, StructureRequest, TubeValue};
use super::{FillPlan, GenerationConfig};
use crate::core::types::Result;
use crate::selection::SelectionGroup;
use crate::transport::{InferenceTransport, ResponseLines, STRUCTURE_ROUTE};
use crate::world::{Block, World};

/// A tube sent to the model, with the voxels it was asked to generate
#[derive(Debug)]
struct PendingTube {
    index: usize,
    unknown: Vec<bool>,
}

/// Response stream of the window being written
#[derive(Debug)]
struct WindowStream {
    window: usize,
    tubes: Vec<PendingTube>,
    next_tube: usize,
    lines: ResponseLines,
    /// Set once a stop value or the end of the stream was seen
    finished: bool,
}

/// Lazy structure fill over a selection.
///
/// Each call to `next` decodes one tube, writes its voxels and yields the
/// overall progress. Windows are processed strictly in order; each window's
/// world reads happen before any of its writes. After an error the iterator
/// yields `None`. Dropping it closes the open response stream.
pub struct StructureFill<'w, W: World + ?Sized, T: InferenceTransport> {
    world: &'w mut W,
    transport: T,
    dimension: String,
    options: StructureOptions,
    plan: FillPlan,
    next_window: usize,
    current: Option<WindowStream>,
    fused: bool,
}

impl<'w, W: World + ?Sized, T: InferenceTransport> StructureFill<'w, W, T> {
    pub fn new(
        world: &'w mut W,
        dimension: &str,
        selection: &SelectionGroup,
        options: StructureOptions,
        config: GenerationConfig,
        transport: T,
    ) -> Result<Self> {
        let plan = FillPlan::new(selection, config, options.context_offset)?;
        log::info!(
            "Structure fill: {} voxels in {} windows, fill block {}, sampling {:?}",
            selection.volume(),
            plan.windows().len(),
            options.fill_block,
            options.sampling
        );

        Ok(Self {
            world,
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

    /// Snapshot window `index`, post it and open its response stream.
    ///
    /// Every tube is sent so the model sees the context; the response holds
    /// one line per tube with an unknown voxel. Returns `None` when the
    /// window has nothing left to generate.
    fn start_window(&mut self, index: usize) -> Result<Option<WindowStream>> {
        let window = &self.plan.windows()[index];
        let layout = self.plan.layout();
        let tube_length = layout.tube_length();

        let mut data = Vec::new();
        let mut tubes = Vec::new();
        for tube in 0..layout.tube_count() {
            let mut values = Vec::with_capacity(tube_length);
            let mut unknown = Vec::with_capacity(tube_length);
            for p in layout.tube_coordinates(window.min(), tube)? {
                if window.is_target(p) {
                    values.push(None);
                    unknown.push(true);
                } else {
                    let solid = self.world.get_block(p, &self.dimension)?.is_solid();
                    values.push(Some(solid as u8));
                    unknown.push(false);
                }
            }
            if unknown.contains(&true) {
                tubes.push(PendingTube { index: tube, unknown });
            }
            data.push(values);
        }

        log::debug!(
            "Window {}/{}: bounds {:?}, target {:?}, context {}, {} tubes",
            index + 1,
            self.plan.windows().len(),
            window.bounds,
            window.target,
            window.context,
            tubes.len()
        );

        if tubes.is_empty() {
            return Ok(None);
        }

        let request = StructureRequest {
            data,
            y: 0,
            sampling: self.options.sampling.clone(),
        };
        let lines = self
            .transport
            .post_lines(STRUCTURE_ROUTE, &serde_json::to_value(&request)?)?;

        Ok(Some(WindowStream {
            window: index,
            tubes,
            next_tube: 0,
            lines,
            finished: false,
        }))
    }

    /// Decode the next tube of `stream`, write it and return the progress.
    fn apply_next_tube(&mut self, stream: &mut WindowStream) -> Result<f64> {
        let tube_length = self.plan.layout().tube_length();
        let values = if stream.finished {
            None
        } else {
            match stream.lines.next() {
                Some(line) => {
                    let line = line?;
                    log::trace!("tube {}: {}", stream.next_tube, line);
                    Some(parse_structure_line(&line, tube_length)?)
                }
                None => {
                    log::warn!(
                        "Stream for window {} ended after {} of {} tubes, leaving the rest empty",
                        stream.window,
                        stream.next_tube,
                        stream.tubes.len()
                    );
                    stream.finished = true;
                    None
                }
            }
        };

        let j = stream.next_tube;
        stream.next_tube += 1;
        let tube = &stream.tubes[j];
        let origin = self.plan.windows()[stream.window].min();
        let coords = self.plan.layout().tube_coordinates(origin, tube.index)?;

        for (k, p) in coords.into_iter().enumerate() {
            let value = match &values {
                Some(values) if !stream.finished => values[k],
                _ => TubeValue::Empty,
            };
            if value == TubeValue::Stop {
                log::debug!("Stop value in window {} at tube {} offset {}", stream.window, j, k);
                stream.finished = true;
            }
            if !tube.unknown[k] || !self.plan.selection().contains(p) {
                continue;
            }
            let block = if value == TubeValue::Solid {
                self.options.fill_block.clone()
            } else {
                Block::air()
            };
            self.world
                .set_block(p, &self.dimension, &self.plan.config().version, block)?;
        }

        Ok(self
            .plan
            .progress(stream.window, (j + 1) as f64 / stream.tubes.len() as f64))
    }

    fn step(&mut self) -> Result<Option<f64>> {
        loop {
            let mut stream = match self.current.take() {
                Some(stream) => stream,
                None => {
                    let index = self.next_window;
                    if index >= self.plan.windows().len() {
                        log::info!("Structure fill complete");
                        return Ok(None);
                    }
                    self.next_window += 1;
                    match self.start_window(index)? {
                        Some(stream) => stream,
                        None => return Ok(Some(self.plan.progress(index, 1.0))),
                    }
                }
            };

            if stream.next_tube >= stream.tubes.len() {
                continue;
            }
            let progress = self.apply_next_tube(&mut stream)?;
            if stream.next_tube < stream.tubes.len() {
                self.current = Some(stream);
            }
            return Ok(Some(progress));
        }
    }
}

impl<W: World + ?Sized, T: InferenceTransport> Iterator for StructureFill<'_, W, T> {
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
                log::error!("Structure fill aborted: {}", e);
                self.fused = true;
                self.current = None;
                Some(Err(e))
            }
        }
    }
}

impl<W: World + ?Sized, T: InferenceTransport> std::iter::FusedIterator for StructureFill<'_, W, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::IVec3;
    use crate::core::Error;
    use crate::math::Aabb;
    use crate::transport::ScriptedTransport;
    use crate::world::MemoryWorld;

    const DIM: &str = "overworld";

    /// Small geometry: 8^3 windows, 4-voxel context, tubes of 8 along x
    fn small_config() -> GenerationConfig {
        GenerationConfig {
            generation_size: IVec3::splat(8),
            context_size: IVec3::splat(4),
            ..Default::default()
        }
    }

    fn small_options() -> StructureOptions {
        StructureOptions {
            context_offset: IVec3::splat(-4),
            ..Default::default()
        }
    }

    fn solid_line() -> String {
        "[[1,1,1,1,1,1,1,1]]".to_string()
    }

    #[test]
    fn test_request_carries_context_tubes() {
        let mut world = MemoryWorld::new();
        world.insert(IVec3::new(-2, 0, 0), DIM, Block::new("stone"));
        let selection = SelectionGroup::new([Aabb::from_corners([0, 0, 0], [2, 1, 1])]);
        let transport = ScriptedTransport::new();
        transport.push_lines([solid_line()]);

        let fill = StructureFill::new(&mut world, DIM, &selection, small_options(), small_config(), &transport).unwrap();
        assert_eq!(fill.plan().windows().len(), 1);
        let progress: Vec<f64> = fill.collect::<Result<_>>().unwrap();
        // Window (-4,-4,-4)..(4,4,4); only the two selected voxels are
        // unknown and both sit in the tube of row y=4, z=4
        assert_eq!(progress, vec![1.0]);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, STRUCTURE_ROUTE);
        let data = requests[0].1["data"].as_array().unwrap();
        assert_eq!(data.len(), 64);
        // Row y=4, z=4 holds the stone at local x=2 and the target at x=4..6
        assert_eq!(data[36], serde_json::json!([0, 0, 1, 0, null, null, 0, 0]));
        assert_eq!(data[44], serde_json::json!([0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(data[0], serde_json::json!([0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(requests[0].1["y"], 0);
        assert_eq!(requests[0].1["sampling"]["strategy"], "sample");
    }

    #[test]
    fn test_writes_stay_inside_selection() {
        let mut world = MemoryWorld::new();
        let selection = SelectionGroup::new([Aabb::from_corners([0, 0, 0], [2, 1, 1])]);
        let transport = ScriptedTransport::new();
        transport.push_lines([solid_line()]);

        let fill = StructureFill::new(&mut world, DIM, &selection, small_options(), small_config(), &transport).unwrap();
        let last = super::super::run_to_completion(fill).unwrap();
        assert_eq!(last, 1.0);

        let written: Vec<IVec3> = world.writes().iter().map(|(p, _)| *p).collect();
        assert_eq!(written, vec![IVec3::new(0, 0, 0), IVec3::new(1, 0, 0)]);
        assert!(world.writes().iter().all(|(_, b)| *b == Block::new("oak_planks")));
    }

    #[test]
    fn test_stop_value_empties_rest() {
        let mut world = MemoryWorld::new();
        // Pre-existing blocks inside the selection get overwritten with air after a stop
        for x in 0..4 {
            world.insert(IVec3::new(x, 0, 0), DIM, Block::new("dirt"));
        }
        let selection = SelectionGroup::new([Aabb::from_corners([0, 0, 0], [4, 2, 1])]);
        let transport = ScriptedTransport::new();
        transport.push_lines(["[[1,1,1,1,1,-1,1,1]]", "[[1,1,1,1,1,1,1,1]]"]);

        let fill = StructureFill::new(&mut world, DIM, &selection, small_options(), small_config(), &transport).unwrap();
        let progress: Vec<f64> = fill.collect::<Result<_>>().unwrap();
        assert_eq!(progress, vec![0.5, 1.0]);

        // Row y=0: offsets 4..8 are x=0..4; the stop sits at x=1
        assert_eq!(world.block(IVec3::new(0, 0, 0), DIM), Block::new("oak_planks"));
        for x in 1..4 {
            assert!(world.block(IVec3::new(x, 0, 0), DIM).is_air());
        }
        // Row y=1 is streamed after the stop
        for x in 0..4 {
            assert!(world.block(IVec3::new(x, 1, 0), DIM).is_air());
        }
        assert_eq!(world.writes().len(), 8);
    }

    #[test]
    fn test_early_end_of_stream_is_a_stop() {
        let mut world = MemoryWorld::new();
        let selection = SelectionGroup::new([Aabb::from_corners([0, 0, 0], [4, 2, 1])]);
        let transport = ScriptedTransport::new();
        transport.push_lines([solid_line()]);

        let fill = StructureFill::new(&mut world, DIM, &selection, small_options(), small_config(), &transport).unwrap();
        let progress: Vec<f64> = fill.collect::<Result<_>>().unwrap();
        assert_eq!(progress, vec![0.5, 1.0]);

        assert_eq!(world.block(IVec3::new(3, 0, 0), DIM), Block::new("oak_planks"));
        assert!(world.block(IVec3::new(3, 1, 0), DIM).is_air());
    }

    #[test]
    fn test_transport_failure_aborts() {
        let mut world = MemoryWorld::new();
        let selection = SelectionGroup::new([Aabb::from_corners([0, 0, 0], [4, 2, 1])]);
        let transport = ScriptedTransport::new();
        transport.push_broken_stream([solid_line()], "connection reset");

        let mut fill = StructureFill::new(&mut world, DIM, &selection, small_options(), small_config(), &transport).unwrap();
        assert!(fill.next().unwrap().is_ok());
        let err = fill.next().unwrap().unwrap_err();
        assert!(err.is_transport_error());
        assert!(!err.is_user_error());
        assert!(fill.next().is_none());
        drop(fill);

        // The first tube was applied and is not rolled back
        assert_eq!(world.writes().len(), 4);
    }

    #[test]
    fn test_malformed_line_is_transport_error() {
        let mut world = MemoryWorld::new();
        let selection = SelectionGroup::new([Aabb::from_corners([0, 0, 0], [1, 1, 1])]);
        let transport = ScriptedTransport::new();
        transport.push_lines(["[[1,1,1]]"]);

        let fill = StructureFill::new(&mut world, DIM, &selection, small_options(), small_config(), &transport).unwrap();
        let results: Vec<Result<f64>> = fill.collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::Transport(_))));
        assert!(world.writes().is_empty());
    }

    #[test]
    fn test_refused_request() {
        let mut world = MemoryWorld::new();
        let selection = SelectionGroup::new([Aabb::from_corners([0, 0, 0], [1, 1, 1])]);
        let transport = ScriptedTransport::new();
        transport.push_refused("connection refused");

        let mut fill = StructureFill::new(&mut world, DIM, &selection, small_options(), small_config(), &transport).unwrap();
        assert!(fill.next().unwrap().unwrap_err().is_transport_error());
        assert!(fill.next().is_none());
    }

    #[test]
    fn test_empty_selection() {
        let mut world = MemoryWorld::new();
        let transport = ScriptedTransport::new();
        let result = StructureFill::new(
            &mut world,
            DIM,
            &SelectionGroup::default(),
            small_options(),
            small_config(),
            &transport,
        );
        assert!(matches!(result, Err(Error::EmptySelection)));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_windows_processed_in_order() {
        let mut world = MemoryWorld::new();
        // Two disjoint clusters, one window each
        let selection = SelectionGroup::new([
            Aabb::from_corners([0, 0, 0], [1, 1, 1]),
            Aabb::from_corners([20, 0, 0], [21, 1, 1]),
        ]);
        let transport = ScriptedTransport::new();
        transport.push_lines([solid_line()]).push_lines(["[[0,0,0,0,0,0,0,0]]"]);

        let fill = StructureFill::new(&mut world, DIM, &selection, small_options(), small_config(), &transport).unwrap();
        let progress: Vec<f64> = fill.collect::<Result<_>>().unwrap();
        assert_eq!(progress, vec![0.5, 1.0]);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(world.block(IVec3::new(0, 0, 0), DIM), Block::new("oak_planks"));
        assert!(world.block(IVec3::new(20, 0, 0), DIM).is_air());
        assert_eq!(world.writes().len(), 2);
    }
}
