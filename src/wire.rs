//! JSON codec for action batches and map snapshots, and the persistence contract.
//!
//! Batches travel as `{"mapId": ..., "actions": [...]}` so a receiver can drop
//! traffic for a map it is not showing. Snapshots are the [`MapState`] JSON
//! as is.

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::actions::{Action, ActionBatch};
use crate::doc::MapState;
use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("payload has no map id")]
    MissingMapId,
}

impl ErrorCode for CodecError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_MALFORMED_PAYLOAD",
            Self::MissingMapId => "E_MISSING_MAP_ID",
        }
    }
}

/// An action batch addressed to one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBatch {
    pub map_id: String,
    pub actions: ActionBatch,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBatchRef<'a> {
    map_id: &'a str,
    actions: &'a [Action],
}

/// Serialize `actions` for transmission to peers of `map_id`.
///
/// # Errors
///
/// `MissingMapId` for an empty id; `Malformed` if serialization fails.
pub fn encode_batch(map_id: &str, actions: &[Action]) -> Result<String, CodecError> {
    if map_id.is_empty() {
        return Err(CodecError::MissingMapId);
    }
    Ok(serde_json::to_string(&WireBatchRef { map_id, actions })?)
}

/// Parse a batch received from a peer.
///
/// # Errors
///
/// `Malformed` for invalid JSON or unknown action types; `MissingMapId` for
/// an empty id.
pub fn decode_batch(text: &str) -> Result<WireBatch, CodecError> {
    let batch: WireBatch = serde_json::from_str(text)?;
    if batch.map_id.is_empty() {
        return Err(CodecError::MissingMapId);
    }
    Ok(batch)
}

/// # Errors
///
/// `MissingMapId` when the snapshot has no id; `Malformed` if serialization fails.
pub fn encode_state(state: &MapState) -> Result<String, CodecError> {
    if state.map_id.is_empty() {
        return Err(CodecError::MissingMapId);
    }
    Ok(serde_json::to_string(state)?)
}

/// # Errors
///
/// `Malformed` for invalid JSON; `MissingMapId` when the snapshot has no id.
pub fn decode_state(text: &str) -> Result<MapState, CodecError> {
    let state: MapState = serde_json::from_str(text)?;
    if state.map_id.is_empty() {
        return Err(CodecError::MissingMapId);
    }
    Ok(state)
}

// =============================================================================
// PERSISTENCE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Codec(e) => e.error_code(),
            Self::Backend(_) => "E_STORE_BACKEND",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

/// Snapshot storage keyed by map id.
pub trait MapStore {
    /// # Errors
    ///
    /// Backend or decoding failures.
    fn get(&self, map_id: &str) -> Result<Option<MapState>, StoreError>;

    /// Store `state` under its own map id, replacing any previous snapshot.
    ///
    /// # Errors
    ///
    /// Backend or encoding failures.
    fn put(&mut self, state: &MapState) -> Result<(), StoreError>;
}

/// In-process store holding encoded snapshots.
#[derive(Debug, Default)]
pub struct MemoryMapStore {
    maps: HashMap<String, String>,
}

impl MemoryMapStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl MapStore for MemoryMapStore {
    fn get(&self, map_id: &str) -> Result<Option<MapState>, StoreError> {
        self.maps.get(map_id).map(String::as_str).map(decode_state).transpose().map_err(StoreError::from)
    }

    fn put(&mut self, state: &MapState) -> Result<(), StoreError> {
        let text = encode_state(state)?;
        self.maps.insert(state.map_id.clone(), text);
        Ok(())
    }
}
