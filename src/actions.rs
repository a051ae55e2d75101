//! Action history: the tagged action union and the undo/redo log.
//!
//! DESIGN
//! ======
//! An [`ActionBatch`] is the unit of history, of undo and of network
//! transmission. Applying an action returns an undo record built from the
//! state it displaced, so reverting never recomputes anything: adds, removes
//! and fog cuts restore the exact entities that were there before, and edits
//! write back the prior field values.
//!
//! Redo re-applies the recorded batch. Fog geometry is deterministic and ids
//! of cut pieces are derived from their parent, so a redo lands on the same
//! state the original application produced.
//!
//! Soft failures (an edit addressing a missing id, a shape the clipper
//! rejects) are skipped and reported in [`BatchReport`]; they never abort the
//! rest of a batch.

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::doc::{EditError, EntityEdit, EntityId, FogShape, Layer, LayerEntities, MapState};
use crate::error::ErrorCode;
use crate::fog::{self, CutNotice, FogDelta, GeometryError};

// =============================================================================
// ACTIONS
// =============================================================================

/// One invertible change to a [`MapState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Insert entities, replacing any with the same id.
    AddStates { states: LayerEntities },
    /// Remove entities by id. Unknown ids are ignored.
    RemoveStates { layer: Layer, ids: Vec<EntityId> },
    /// Sparse field updates.
    EditStates { layer: Layer, edits: Vec<EntityEdit> },
    /// Cut the shapes out of the fog layer, keeping the overlap as hidden fog.
    CutFog { shapes: Vec<FogShape> },
    /// Cut the shapes out of the fog layer, discarding the overlap.
    SubtractFog { shapes: Vec<FogShape> },
}

/// Actions applied and undone together.
pub type ActionBatch = Vec<Action>;

/// A skipped part of an action.
#[derive(Debug, thiserror::Error)]
pub enum ActionWarning {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl ErrorCode for ActionWarning {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Edit(e) => e.error_code(),
            Self::Geometry(e) => e.error_code(),
        }
    }
}

/// What happened while applying batches, beyond the state change itself.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub warnings: Vec<ActionWarning>,
    /// One entry per fog action that changed nothing.
    pub notices: Vec<CutNotice>,
    /// Batches applied or reverted.
    pub moved: usize,
}

impl BatchReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Inverse of one applied action.
#[derive(Debug, Clone)]
enum Undo {
    /// Drop `remove` from the layer, then put `insert` back.
    Restore { layer: Layer, remove: Vec<EntityId>, insert: LayerEntities },
    /// Write prior field values back, already in reverse order.
    Edit { layer: Layer, edits: Vec<EntityEdit> },
}

/// Swap `incoming` into its layer after taking out `outgoing`, recording
/// everything displaced so the swap can be reverted exactly.
fn replace(state: &mut MapState, incoming: LayerEntities, outgoing: &[EntityId]) -> Undo {
    let layer = incoming.layer();
    let added = incoming.ids();
    let mut displaced_ids = outgoing.to_vec();
    displaced_ids.extend(added.iter().filter(|id| !outgoing.contains(*id)).cloned());

    let displaced = state.remove_entities(layer, &displaced_ids);
    state.insert_entities(incoming);
    Undo::Restore { layer, remove: added, insert: displaced }
}

fn apply_fog_delta(state: &mut MapState, delta: FogDelta, report: &mut BatchReport) -> Undo {
    if let Some(notice) = delta.notice() {
        report.notices.push(notice);
    }
    for e in delta.warnings {
        warn!(error = %e, "actions: fog shape skipped");
        report.warnings.push(e.into());
    }
    let removed: Vec<EntityId> = delta.removed.iter().map(|s| s.id.clone()).collect();
    replace(state, LayerEntities::Fog(delta.added), &removed)
}

impl Action {
    fn apply(&self, state: &mut MapState, report: &mut BatchReport) -> Undo {
        match self {
            Self::AddStates { states } => replace(state, states.clone(), &[]),
            Self::RemoveStates { layer, ids } => replace(state, LayerEntities::empty(*layer), ids),
            Self::EditStates { layer, edits } => {
                let mut inverse = Vec::with_capacity(edits.len());
                for edit in edits {
                    match state.edit_entity(*layer, edit) {
                        Ok(prior) => inverse.push(prior),
                        Err(e) => {
                            warn!(layer = ?layer, id = %edit.id, error = %e, "actions: edit skipped");
                            report.warnings.push(e.into());
                        }
                    }
                }
                inverse.reverse();
                Undo::Edit { layer: *layer, edits: inverse }
            }
            Self::CutFog { shapes } => {
                let delta = fog::cut(shapes, &state.fog_list());
                apply_fog_delta(state, delta, report)
            }
            Self::SubtractFog { shapes } => {
                let delta = fog::subtract(shapes, &state.fog_list());
                apply_fog_delta(state, delta, report)
            }
        }
    }
}

impl Undo {
    /// The same reversal as [`Undo::revert`], as actions a peer can apply.
    fn to_actions(&self) -> Vec<Action> {
        match self {
            Self::Restore { layer, remove, insert } => {
                let mut actions = Vec::with_capacity(2);
                if !remove.is_empty() {
                    actions.push(Action::RemoveStates { layer: *layer, ids: remove.clone() });
                }
                if !insert.is_empty() {
                    actions.push(Action::AddStates { states: insert.clone() });
                }
                actions
            }
            Self::Edit { edits, .. } if edits.is_empty() => Vec::new(),
            Self::Edit { layer, edits } => vec![Action::EditStates { layer: *layer, edits: edits.clone() }],
        }
    }

    fn revert(&self, state: &mut MapState) {
        match self {
            Self::Restore { layer, remove, insert } => {
                state.remove_entities(*layer, remove);
                state.insert_entities(insert.clone());
            }
            Self::Edit { layer, edits } => {
                for edit in edits {
                    if let Err(e) = state.edit_entity(*layer, edit) {
                        warn!(layer = ?layer, id = %edit.id, error = %e, "actions: undo edit failed");
                    }
                }
            }
        }
    }
}

fn apply_batch(state: &mut MapState, batch: &[Action], report: &mut BatchReport) -> Vec<Undo> {
    batch.iter().map(|action| action.apply(state, report)).collect()
}

fn revert_batch(state: &mut MapState, undo: &[Undo]) {
    for step in undo.iter().rev() {
        step.revert(state);
    }
}

/// Recompute state from `base` by applying `batches` in order.
///
/// Two peers replaying the same batches over the same base reach identical
/// states.
#[must_use]
pub fn replay(base: MapState, batches: &[ActionBatch]) -> (MapState, BatchReport) {
    let mut state = base;
    let mut report = BatchReport::default();
    for batch in batches {
        apply_batch(&mut state, batch, &mut report);
        report.moved += 1;
    }
    (state, report)
}

// =============================================================================
// LOG
// =============================================================================

struct Entry {
    batch: ActionBatch,
    undo: Vec<Undo>,
}

/// Owner of the live map state and its linear undo/redo history.
///
/// `applied` counts the batches currently reflected in `state`; everything
/// past it is the redo future.
#[derive(Default)]
pub struct ActionLog {
    state: MapState,
    entries: Vec<Entry>,
    applied: usize,
}

impl ActionLog {
    #[must_use]
    pub fn new(state: MapState) -> Self {
        Self { state, entries: Vec::new(), applied: 0 }
    }

    #[must_use]
    pub fn state(&self) -> &MapState {
        &self.state
    }

    /// Position of the last applied batch, `None` when nothing is applied.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    /// Number of recorded batches, applied or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    /// Apply `batch` and record it. Any redo future is discarded first.
    pub fn add_actions(&mut self, batch: ActionBatch) -> BatchReport {
        if self.entries.len() > self.applied {
            debug!(dropped = self.entries.len() - self.applied, "actions: redo future discarded");
            self.entries.truncate(self.applied);
        }
        let mut report = BatchReport::default();
        let undo = apply_batch(&mut self.state, &batch, &mut report);
        debug!(actions = batch.len(), index = self.entries.len(), "actions: batch applied");
        self.entries.push(Entry { batch, undo });
        self.applied = self.entries.len();
        report.moved = 1;
        report
    }

    /// Apply a batch made by another peer to the live state.
    ///
    /// Local history is left alone: remote batches are not undoable here.
    /// Undoing a local batch later still restores exactly what that batch
    /// displaced, which may overwrite a peer's later change to the same entity.
    pub fn apply_remote(&mut self, batch: &[Action]) -> BatchReport {
        let mut report = BatchReport::default();
        apply_batch(&mut self.state, batch, &mut report);
        report.moved = 1;
        debug!(actions = batch.len(), "actions: remote batch applied");
        report
    }

    /// Move through history by `delta` batches, clamped to the valid range.
    ///
    /// Forward moves re-apply batches in order; backward moves revert them
    /// newest first.
    pub fn update_action_index(&mut self, delta: isize) -> BatchReport {
        let target = self.applied.saturating_add_signed(delta).min(self.entries.len());
        let mut report = BatchReport::default();

        while self.applied < target {
            let entry = &mut self.entries[self.applied];
            entry.undo = apply_batch(&mut self.state, &entry.batch, &mut report);
            self.applied += 1;
            report.moved += 1;
        }
        while self.applied > target {
            self.applied -= 1;
            revert_batch(&mut self.state, &self.entries[self.applied].undo);
            report.moved += 1;
        }
        if report.moved > 0 {
            debug!(index = ?self.index(), moved = report.moved, "actions: history moved");
        }
        report
    }

    pub fn undo(&mut self) -> BatchReport {
        self.update_action_index(-1)
    }

    /// What [`undo`](Self::undo) would do next, as a batch peers can pass to
    /// [`apply_remote`](Self::apply_remote). `None` when there is nothing to undo.
    #[must_use]
    pub fn undo_actions(&self) -> Option<ActionBatch> {
        let entry = self.entries.get(self.applied.checked_sub(1)?)?;
        Some(entry.undo.iter().rev().flat_map(Undo::to_actions).collect())
    }

    /// The batch [`redo`](Self::redo) would re-apply next.
    #[must_use]
    pub fn redo_actions(&self) -> Option<&ActionBatch> {
        self.entries.get(self.applied).map(|e| &e.batch)
    }

    pub fn redo(&mut self) -> BatchReport {
        self.update_action_index(1)
    }

    /// Forget all history. The live state is kept as is.
    pub fn reset_actions(&mut self) {
        self.entries.clear();
        self.applied = 0;
    }

    /// Replace the live state with a full snapshot and forget all history.
    pub fn load_snapshot(&mut self, state: MapState) {
        self.state = state;
        self.reset_actions();
    }

    /// Batches currently applied, oldest first.
    pub fn applied_batches(&self) -> impl Iterator<Item = &ActionBatch> {
        self.entries[..self.applied].iter().map(|e| &e.batch)
    }
}
