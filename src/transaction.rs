//! Undoable edit transactions.
//!
//! A [`ScopedTransaction`] starts recording on a [`Landscape`] and finalizes
//! when it is dropped, on every exit path. While it is open, the first touch
//! of the landscape records whether it had a spline graph, and the first
//! touch of every graph object records that object's previous state. The
//! finished [`Transaction`] holds before/after snapshots of exactly those
//! objects and can be undone or redone as one unit through [`UndoHistory`].
//!
//! # Example
//!
//! ```ignore
//! let mut history = UndoHistory::default();
//! {
//!     let mut transaction = ScopedTransaction::new(&mut history, &mut landscape, "Move point");
//!     transaction.spline_graph_mut().unwrap().control_point_mut(id)?.location.y += 1.0;
//! }
//! history.undo(&mut landscape)?;
//! ```

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use bevy::log::debug;
use bevy::prelude::*;

use crate::control_point::ControlPoint;
use crate::error::{RailwayError, Result};
use crate::graph::{ControlPointId, GraphMeta, SegmentId, SplineGraph};
use crate::landscape::{Landscape, LandscapeId};
use crate::segment::Segment;

/// Previous states of graph objects touched during a transaction.
#[derive(Debug, Clone, Default)]
pub(crate) struct GraphJournal {
    meta: Option<GraphMeta>,
    control_points: BTreeMap<ControlPointId, Option<ControlPoint>>,
    segments: BTreeMap<SegmentId, Option<Segment>>,
}

impl GraphJournal {
    pub(crate) fn record_meta(&mut self, meta: &GraphMeta) {
        self.meta.get_or_insert_with(|| meta.clone());
    }

    pub(crate) fn record_control_point(&mut self, id: ControlPointId, current: Option<&ControlPoint>) {
        self.control_points.entry(id).or_insert_with(|| current.cloned());
    }

    pub(crate) fn record_segment(&mut self, id: SegmentId, current: Option<&Segment>) {
        self.segments.entry(id).or_insert_with(|| current.cloned());
    }

    /// Pairs every recorded state with the graph's current one, dropping
    /// objects that ended up unchanged.
    pub(crate) fn finish(self, graph: &SplineGraph) -> GraphDiff {
        let meta = self
            .meta
            .map(|before| (before, graph.meta().clone()))
            .filter(|(before, after)| before != after);

        let control_points = self
            .control_points
            .into_iter()
            .map(|(id, before)| Change {
                id,
                before,
                after: graph.control_point(id).cloned(),
            })
            .filter(Change::is_effective)
            .collect();

        let segments = self
            .segments
            .into_iter()
            .map(|(id, before)| Change {
                id,
                before,
                after: graph.segment(id).cloned(),
            })
            .filter(Change::is_effective)
            .collect();

        GraphDiff {
            meta,
            control_points,
            segments,
        }
    }
}

#[derive(Debug, Clone)]
struct Change<I, T> {
    id: I,
    before: Option<T>,
    after: Option<T>,
}

impl<I, T: PartialEq> Change<I, T> {
    fn is_effective(&self) -> bool {
        self.before != self.after
    }

    fn state(&self, side: Side) -> Option<&T> {
        match side {
            Side::Before => self.before.as_ref(),
            Side::After => self.after.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Before,
    After,
}

/// Before/after states of every graph object a transaction touched.
#[derive(Debug, Clone)]
pub struct GraphDiff {
    meta: Option<(GraphMeta, GraphMeta)>,
    control_points: Vec<Change<ControlPointId, ControlPoint>>,
    segments: Vec<Change<SegmentId, Segment>>,
}

impl GraphDiff {
    pub fn is_empty(&self) -> bool {
        self.meta.is_none() && self.control_points.is_empty() && self.segments.is_empty()
    }

    /// Number of control points and segments this diff changes.
    pub fn len(&self) -> usize {
        self.control_points.len() + self.segments.len()
    }

    fn apply(&self, graph: &mut SplineGraph, side: Side) {
        if let Some((before, after)) = &self.meta {
            graph.restore_meta(match side {
                Side::Before => before,
                Side::After => after,
            });
        }
        for change in &self.control_points {
            graph.restore_control_point(change.id, change.state(side));
        }
        for change in &self.segments {
            graph.restore_segment(change.id, change.state(side));
        }
    }
}

/// What a transaction did to a landscape's spline slot.
#[derive(Debug, Clone)]
pub enum LandscapeChange {
    /// The graph did not exist before; holds its final state.
    CreatedGraph(Box<SplineGraph>),
    /// The graph existed and some of its objects changed.
    EditedGraph(GraphDiff),
}

impl LandscapeChange {
    fn apply(&self, landscape: &mut Landscape, side: Side) {
        match (self, side) {
            (LandscapeChange::CreatedGraph(_), Side::Before) => {
                landscape.replace_spline_graph(None);
            }
            (LandscapeChange::CreatedGraph(graph), Side::After) => {
                landscape.replace_spline_graph(Some(graph.snapshot()));
            }
            (LandscapeChange::EditedGraph(diff), side) => {
                if let Some(graph) = landscape.spline_graph_slot_mut() {
                    diff.apply(graph, side);
                }
            }
        }
    }
}

/// A finished, undoable edit of one landscape.
#[derive(Debug, Clone)]
pub struct Transaction {
    description: String,
    landscape: LandscapeId,
    change: LandscapeChange,
}

impl Transaction {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn landscape(&self) -> LandscapeId {
        self.landscape
    }

    pub fn change(&self) -> &LandscapeChange {
        &self.change
    }

    fn check_target(&self, landscape: &Landscape) -> Result<()> {
        if landscape.id() != self.landscape {
            return Err(RailwayError::LandscapeMismatch {
                expected: self.landscape,
                actual: landscape.id(),
            });
        }
        Ok(())
    }

    /// Restores the states recorded before the transaction.
    pub fn undo(&self, landscape: &mut Landscape) -> Result<()> {
        self.check_target(landscape)?;
        self.change.apply(landscape, Side::Before);
        Ok(())
    }

    /// Re-applies the states recorded when the transaction finished.
    pub fn redo(&self, landscape: &mut Landscape) -> Result<()> {
        self.check_target(landscape)?;
        self.change.apply(landscape, Side::After);
        Ok(())
    }
}

/// Undo and redo stacks of finished transactions.
#[derive(Resource, Debug, Default)]
pub struct UndoHistory {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
}

impl UndoHistory {
    /// Pushes a finished transaction and clears the redo stack.
    pub fn push(&mut self, transaction: Transaction) {
        self.undo_stack.push(transaction);
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// The most recent undoable transaction.
    pub fn last(&self) -> Option<&Transaction> {
        self.undo_stack.last()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Undoes the most recent transaction. Returns `false` when there is none.
    pub fn undo(&mut self, landscape: &mut Landscape) -> Result<bool> {
        let Some(transaction) = self.undo_stack.last() else {
            return Ok(false);
        };
        transaction.undo(landscape)?;
        if let Some(transaction) = self.undo_stack.pop() {
            debug!("undid '{}'", transaction.description);
            self.redo_stack.push(transaction);
        }
        Ok(true)
    }

    /// Redoes the most recently undone transaction.
    pub fn redo(&mut self, landscape: &mut Landscape) -> Result<bool> {
        let Some(transaction) = self.redo_stack.last() else {
            return Ok(false);
        };
        transaction.redo(landscape)?;
        if let Some(transaction) = self.redo_stack.pop() {
            debug!("redid '{}'", transaction.description);
            self.undo_stack.push(transaction);
        }
        Ok(true)
    }
}

/// Records every change made to a landscape while it is alive.
///
/// Dereferences to the [`Landscape`]. Dropping it pushes the recorded
/// [`Transaction`] onto the [`UndoHistory`] (nothing is pushed if nothing
/// changed). Transactions opened while another one records the same
/// landscape fold into the outer one.
pub struct ScopedTransaction<'a> {
    landscape: &'a mut Landscape,
    history: &'a mut UndoHistory,
    description: String,
    finished: bool,
}

impl<'a> ScopedTransaction<'a> {
    pub fn new(
        history: &'a mut UndoHistory,
        landscape: &'a mut Landscape,
        description: impl Into<String>,
    ) -> Self {
        landscape.begin_recording();
        Self {
            landscape,
            history,
            description: description.into(),
            finished: false,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Reverts everything recorded so far and records nothing.
    ///
    /// Inside a nested transaction the outer one still owns the recording,
    /// so nothing is reverted until it finishes.
    pub fn cancel(mut self) {
        self.finished = true;
        if let Some(change) = self.landscape.end_recording() {
            debug!("cancelled '{}'", self.description);
            change.apply(self.landscape, Side::Before);
        }
    }
}

impl Deref for ScopedTransaction<'_> {
    type Target = Landscape;

    fn deref(&self) -> &Landscape {
        self.landscape
    }
}

impl DerefMut for ScopedTransaction<'_> {
    fn deref_mut(&mut self) -> &mut Landscape {
        self.landscape
    }
}

impl Drop for ScopedTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(change) = self.landscape.end_recording() {
            self.history.push(Transaction {
                description: std::mem::take(&mut self.description),
                landscape: self.landscape.id(),
                change,
            });
        }
    }
}
