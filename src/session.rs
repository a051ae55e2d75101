//! One open map: configuration, grid, map size and the action log together.
//!
//! DESIGN
//! ======
//! `MapSession` is the surface a host drives. Local tool output goes through
//! [`MapSession::commit`], which applies the batch and hands back the payload
//! to broadcast; undo and redo hand back a payload the same way. Peer
//! payloads come in through [`MapSession::receive`]. The
//! renderer and tools read derived values (cell size, guides, snapped
//! positions, the merged player fog) from the same session.
//!
//! Fog geometry is stored normalized to the map; guides and snapping work in
//! map pixels. The session does the scaling between the two.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use tracing::{info, warn};

use crate::actions::{ActionBatch, ActionLog, BatchReport};
use crate::config::{ConfigError, EngineConfig};
use crate::doc::{FogShape, MapState};
use crate::error::ErrorCode;
use crate::fog;
use crate::grid::{Grid, cell_pixel_size, grid_pixel_offset, grid_pixel_size};
use crate::guides::{Guide, find_best_guides, guides_from_bounding_boxes, guides_from_grid_cell, snap_to_grid};
use crate::math::{Size, Vector2};
use crate::wire::{self, CodecError, MapStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("batch for map {got} received by session for map {expected}")]
    WrongMap { expected: String, got: String },
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Codec(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::WrongMap { .. } => "E_WRONG_MAP",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            _ => false,
        }
    }
}

pub struct MapSession {
    config: EngineConfig,
    grid: Grid,
    /// Map image size in pixels.
    map_size: Vector2,
    log: ActionLog,
}

impl MapSession {
    /// # Errors
    ///
    /// `Config` when `config` fails validation.
    pub fn new(config: EngineConfig, grid: Grid, map_size: Vector2, state: MapState) -> Result<Self, SessionError> {
        config.validate()?;
        info!(map_id = %state.map_id, "session: map opened");
        Ok(Self { config, grid, map_size, log: ActionLog::new(state) })
    }

    /// Open `map_id` from `store`, or start it empty when nothing is stored.
    ///
    /// # Errors
    ///
    /// `Config` for an invalid config, `Store` when the backend fails.
    pub fn open(
        store: &impl MapStore,
        map_id: &str,
        config: EngineConfig,
        grid: Grid,
        map_size: Vector2,
    ) -> Result<Self, SessionError> {
        let state = store.get(map_id)?.unwrap_or_else(|| MapState::new(map_id));
        Self::new(config, grid, map_size, state)
    }

    /// Write the live state to `store`.
    ///
    /// # Errors
    ///
    /// `Store` when encoding or the backend fails.
    pub fn save(&self, store: &mut impl MapStore) -> Result<(), SessionError> {
        store.put(self.log.state())?;
        Ok(())
    }

    #[must_use]
    pub fn map_id(&self) -> &str {
        &self.log.state().map_id
    }

    #[must_use]
    pub fn state(&self) -> &MapState {
        self.log.state()
    }

    #[must_use]
    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn set_grid(&mut self, grid: Grid) {
        self.grid = grid;
    }

    pub fn set_map_size(&mut self, map_size: Vector2) {
        self.map_size = map_size;
    }

    // --- History ---

    /// Apply a local batch and return it encoded for broadcast.
    ///
    /// The batch is encoded before it is applied, so a batch that cannot be
    /// sent never reaches the live state.
    ///
    /// # Errors
    ///
    /// `Codec` when the batch cannot be encoded.
    pub fn commit(&mut self, batch: ActionBatch) -> Result<(String, BatchReport), SessionError> {
        let payload = wire::encode_batch(self.map_id(), &batch)?;
        let report = self.log.add_actions(batch);
        Ok((payload, report))
    }

    /// Decode and apply a batch broadcast by a peer.
    ///
    /// # Errors
    ///
    /// `Codec` for undecodable payloads, `WrongMap` for batches addressed to
    /// another map. Neither changes the state.
    pub fn receive(&mut self, payload: &str) -> Result<BatchReport, SessionError> {
        let batch = wire::decode_batch(payload)?;
        if batch.map_id != self.map_id() {
            warn!(expected = %self.map_id(), got = %batch.map_id, "session: batch for another map dropped");
            return Err(SessionError::WrongMap { expected: self.map_id().to_string(), got: batch.map_id });
        }
        Ok(self.log.apply_remote(&batch.actions))
    }

    /// Replace the live state with a full snapshot. History is cleared.
    pub fn load_snapshot(&mut self, state: MapState) {
        info!(map_id = %state.map_id, "session: snapshot loaded");
        self.log.load_snapshot(state);
    }

    /// Undo the last local batch and return the payload that makes peers follow.
    ///
    /// The payload carries the reversal as plain actions, so peers apply it
    /// through [`MapSession::receive`] like any other batch. `None` when there
    /// is nothing to undo.
    ///
    /// # Errors
    ///
    /// `Codec` when the reversal cannot be encoded; the state is unchanged.
    pub fn undo(&mut self) -> Result<Option<(String, BatchReport)>, SessionError> {
        let Some(reversal) = self.log.undo_actions() else {
            return Ok(None);
        };
        let payload = wire::encode_batch(self.map_id(), &reversal)?;
        Ok(Some((payload, self.log.undo())))
    }

    /// Redo the next local batch and return the payload that makes peers follow.
    ///
    /// # Errors
    ///
    /// `Codec` when the batch cannot be encoded; the state is unchanged.
    pub fn redo(&mut self) -> Result<Option<(String, BatchReport)>, SessionError> {
        let Some(batch) = self.log.redo_actions() else {
            return Ok(None);
        };
        let payload = wire::encode_batch(self.map_id(), batch)?;
        Ok(Some((payload, self.log.redo())))
    }

    // --- Derived values ---

    /// Pixel size of one grid cell.
    #[must_use]
    pub fn cell_size(&self) -> Size {
        let area = grid_pixel_size(&self.grid, self.map_size.x, self.map_size.y);
        cell_pixel_size(&self.grid, area.width, area.height)
    }

    #[must_use]
    pub fn grid_offset(&self) -> Vector2 {
        grid_pixel_offset(&self.grid, self.map_size.x, self.map_size.y)
    }

    /// The best guides for a brush at `brush` (map pixels), drawn from the map
    /// bounds, the grid cell under the brush and the bounds of fog shapes.
    #[must_use]
    pub fn guides_at(&self, brush: Vector2) -> Vec<Guide> {
        let cell_size = self.cell_size();
        let sensitivity = self.config.snap_sensitivity;
        let mut guides =
            guides_from_grid_cell(brush, &self.grid, cell_size, self.grid_offset(), sensitivity, self.map_size);

        let fog_boxes: Vec<_> = fog::bounding_boxes(&self.log.state().fog_list(), self.config.guide_max_points)
            .iter()
            .map(|b| b.scaled(self.map_size))
            .collect();
        guides.extend(guides_from_bounding_boxes(brush, &fog_boxes, cell_size, sensitivity));
        find_best_guides(brush, &guides)
    }

    /// Snap a map-pixel position onto the grid.
    #[must_use]
    pub fn snap(&self, position: Vector2) -> Vector2 {
        snap_to_grid(position, &self.grid, self.cell_size(), self.grid_offset(), self.config.snap_sensitivity)
    }

    /// Simplify a normalized brush stroke with the configured tolerance.
    #[must_use]
    pub fn simplify_stroke(&self, points: &[Vector2]) -> Vec<Vector2> {
        fog::simplify_points(points, self.config.simplify_tolerance)
    }

    /// Fog as players see it: the configured shapes merged into non-overlapping regions.
    #[must_use]
    pub fn player_fog(&self) -> Vec<FogShape> {
        fog::merge(&self.log.state().fog_list(), self.config.merge_ignore_hidden)
    }
}
