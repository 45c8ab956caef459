//! Terrain surface that owns a spline graph.

use bevy::log::debug;
use bevy::prelude::*;

use crate::graph::SplineGraph;
use crate::transaction::{GraphDiff, LandscapeChange};

/// Identifies a landscape to ray-cast filters and transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LandscapeId(pub u64);

#[derive(Debug, Clone, Copy, Default)]
struct Recording {
    depth: u32,
    /// Set on the first `modify`; `None` means untouched so far.
    had_graph: Option<bool>,
}

/// A terrain surface with an optional attached [`SplineGraph`].
///
/// The graph lives in graph-local space: it is attached to the landscape's
/// transform with its own relative [`SplineGraph::scale`].
#[derive(Component, Debug, Clone)]
pub struct Landscape {
    id: LandscapeId,
    transform: Transform,
    spline_graph: Option<SplineGraph>,
    modified: bool,
    recording: Option<Recording>,
}

impl Landscape {
    pub fn new(id: LandscapeId, transform: Transform) -> Self {
        Self {
            id,
            transform,
            spline_graph: None,
            modified: false,
            recording: None,
        }
    }

    pub fn id(&self) -> LandscapeId {
        self.id
    }

    /// Landscape to world transform.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Graph to world transform, or the landscape transform scaled by
    /// `scale` when no graph exists yet.
    pub fn graph_to_world(&self, scale: Vec3) -> Transform {
        self.transform * Transform::from_scale(scale)
    }

    pub fn spline_graph(&self) -> Option<&SplineGraph> {
        self.spline_graph.as_ref()
    }

    /// Mutable access to the graph; marks the landscape modified first.
    pub fn spline_graph_mut(&mut self) -> Option<&mut SplineGraph> {
        self.modify();
        self.spline_graph.as_mut()
    }

    /// Returns the attached graph, creating it with `scale` if absent, and
    /// turns on its editor mesh. Marks the landscape modified first.
    pub fn ensure_spline_graph(&mut self, scale: Vec3) -> &mut SplineGraph {
        self.modify();
        let id = self.id;
        let graph = self.spline_graph.get_or_insert_with(|| {
            debug!("attaching spline graph to landscape {id:?} with scale {scale}");
            SplineGraph::new(scale)
        });
        graph.show_editor_mesh(true);
        graph
    }

    /// Marks the landscape as modified and, inside a transaction, records
    /// its state the first time.
    pub fn modify(&mut self) {
        self.modified = true;
        let Some(recording) = self.recording.as_mut() else {
            return;
        };
        if recording.had_graph.is_some() {
            return;
        }
        recording.had_graph = Some(self.spline_graph.is_some());
        if let Some(graph) = self.spline_graph.as_mut() {
            graph.begin_journal();
        }
    }

    /// True once anything changed since the last [`clear_modified`].
    ///
    /// [`clear_modified`]: Landscape::clear_modified
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub(crate) fn begin_recording(&mut self) {
        self.recording.get_or_insert_with(Recording::default).depth += 1;
    }

    /// Closes one recording level. The outermost level returns what changed.
    pub(crate) fn end_recording(&mut self) -> Option<LandscapeChange> {
        let recording = self.recording.as_mut()?;
        recording.depth = recording.depth.saturating_sub(1);
        if recording.depth > 0 {
            return None;
        }
        let recording = self.recording.take()?;

        if recording.had_graph? {
            let graph = self.spline_graph.as_mut()?;
            let journal = graph.take_journal()?;
            let diff: GraphDiff = journal.finish(graph);
            (!diff.is_empty()).then_some(LandscapeChange::EditedGraph(diff))
        } else {
            self.spline_graph
                .as_ref()
                .map(|graph| LandscapeChange::CreatedGraph(Box::new(graph.snapshot())))
        }
    }

    pub(crate) fn replace_spline_graph(&mut self, graph: Option<SplineGraph>) {
        self.modified = true;
        self.spline_graph = graph;
    }

    /// Graph access for undo/redo, which must not be recorded.
    pub(crate) fn spline_graph_slot_mut(&mut self) -> Option<&mut SplineGraph> {
        self.modified = true;
        self.spline_graph.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_spline_graph_is_idempotent() {
        let mut landscape = Landscape::new(LandscapeId(1), Transform::default());
        landscape.ensure_spline_graph(Vec3::splat(0.5));
        landscape.ensure_spline_graph(Vec3::ONE);

        let graph = landscape.spline_graph().unwrap();
        assert_eq!(graph.scale(), Vec3::splat(0.5));
        assert!(graph.editor_mesh_visible());
        assert!(landscape.is_modified());
    }
}
