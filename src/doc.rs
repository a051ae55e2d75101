//! Document model: map entities, the per-map state snapshot, and sparse edits.
//!
//! A map carries four keyed layers: drawings, fog, tokens and notes. Every
//! layer is an ordered map from entity id to entity so iteration order, and
//! therefore every derived result, is identical on every peer.
//!
//! Data flows into this layer from the network (full snapshots and action
//! batches) and from local tools via [`crate::actions::ActionLog`], which is
//! the only writer of live state.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::math::Vector2;

/// Unique identifier for a map entity.
pub type EntityId = String;

/// Fresh random id for an entity created by a local tool.
#[must_use]
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4().to_string()
}

/// Ordered id → entity map backing each layer.
pub type EntityMap<E> = BTreeMap<EntityId, E>;

/// Anything stored in a layer.
pub trait Entity: Clone + PartialEq + Serialize + DeserializeOwned {
    fn id(&self) -> &str;
}

// =============================================================================
// ENTITIES
// =============================================================================

/// Polygon geometry in normalized map space: one outer ring plus holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonData {
    pub points: Vec<Vector2>,
    #[serde(default)]
    pub holes: Vec<Vec<Vector2>>,
}

/// A hidden (`visible == false`) or revealed (`visible == true`) fog region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FogShape {
    pub id: EntityId,
    pub color: String,
    pub stroke_width: f64,
    pub visible: bool,
    pub data: PolygonData,
}

impl FogShape {
    /// A hole-free shape with the default fog styling.
    #[must_use]
    pub fn polygon(id: impl Into<EntityId>, points: Vec<Vector2>, visible: bool) -> Self {
        Self {
            id: id.into(),
            color: "black".into(),
            stroke_width: 0.5,
            visible,
            data: PolygonData { points, holes: Vec::new() },
        }
    }
}

impl Entity for FogShape {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawShapeKind {
    Path,
    Line,
    Rectangle,
    Circle,
    Triangle,
}

/// A freehand or primitive drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawShape {
    pub id: EntityId,
    #[serde(rename = "shapeType")]
    pub kind: DrawShapeKind,
    pub color: String,
    pub stroke_width: f64,
    /// Render with multiply blending.
    pub blend: bool,
    /// Filled rather than stroked.
    #[serde(default)]
    pub filled: bool,
    pub points: Vec<Vector2>,
}

impl Entity for DrawShape {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A token placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenState {
    pub id: EntityId,
    /// Asset the token is drawn from.
    pub token_id: String,
    pub owner: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub rotation: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub locked: bool,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
}

impl Entity for TokenState {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A sticky note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: EntityId,
    pub owner: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub text: String,
    pub color: String,
    #[serde(default)]
    pub text_only: bool,
    #[serde(default)]
    pub locked: bool,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    /// Milliseconds since the Unix epoch, supplied by the editing client.
    #[serde(default)]
    pub last_modified: i64,
}

impl Entity for Note {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Layers that players other than the map owner may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditFlag {
    Drawing,
    Tokens,
    Notes,
    Fog,
}

/// Which keyed map of [`MapState`] an action addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    Drawings,
    Fog,
    Tokens,
    Notes,
}

/// A batch of entities tagged with the layer they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layer", content = "entities", rename_all = "camelCase")]
pub enum LayerEntities {
    Drawings(Vec<DrawShape>),
    Fog(Vec<FogShape>),
    Tokens(Vec<TokenState>),
    Notes(Vec<Note>),
}

impl LayerEntities {
    #[must_use]
    pub fn empty(layer: Layer) -> Self {
        match layer {
            Layer::Drawings => Self::Drawings(Vec::new()),
            Layer::Fog => Self::Fog(Vec::new()),
            Layer::Tokens => Self::Tokens(Vec::new()),
            Layer::Notes => Self::Notes(Vec::new()),
        }
    }

    #[must_use]
    pub fn layer(&self) -> Layer {
        match self {
            Self::Drawings(_) => Layer::Drawings,
            Self::Fog(_) => Layer::Fog,
            Self::Tokens(_) => Layer::Tokens,
            Self::Notes(_) => Layer::Notes,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Drawings(v) => v.len(),
            Self::Fog(v) => v.len(),
            Self::Tokens(v) => v.len(),
            Self::Notes(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the carried entities, in order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        fn collect<E: Entity>(items: &[E]) -> Vec<EntityId> {
            items.iter().map(|e| e.id().to_string()).collect()
        }
        match self {
            Self::Drawings(v) => collect(v),
            Self::Fog(v) => collect(v),
            Self::Tokens(v) => collect(v),
            Self::Notes(v) => collect(v),
        }
    }
}

// =============================================================================
// SPARSE EDITS
// =============================================================================

/// Sparse update for one entity. Only the listed fields change; a `null`
/// value clears an optional field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEdit {
    pub id: EntityId,
    pub changes: Map<String, Value>,
}

impl EntityEdit {
    #[must_use]
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self { id: id.into(), changes: Map::new() }
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.changes.insert(field.to_string(), value.into());
        self
    }
}

/// Why a sparse edit could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("entity not found: {0}")]
    NotFound(EntityId),
    #[error("field '{0}' cannot be edited")]
    ImmutableField(String),
    #[error("edit produced an invalid entity: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Apply `edit` to the matching entity in `map`, returning the edit that undoes it.
///
/// The entity is round-tripped through JSON so one code path serves every
/// layer. On error the entity is left untouched.
///
/// # Errors
///
/// `NotFound` when the id is absent, `ImmutableField` when the edit touches
/// `id`, `Invalid` when the merged fields no longer describe a valid entity.
pub fn apply_edit<E: Entity>(map: &mut EntityMap<E>, edit: &EntityEdit) -> Result<EntityEdit, EditError> {
    let Some(current) = map.get(&edit.id) else {
        return Err(EditError::NotFound(edit.id.clone()));
    };
    if edit.changes.contains_key("id") {
        return Err(EditError::ImmutableField("id".into()));
    }

    let mut fields = match serde_json::to_value(current)? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    let mut prior = Map::new();
    for (key, value) in &edit.changes {
        prior.insert(key.clone(), fields.get(key).cloned().unwrap_or(Value::Null));
        if value.is_null() {
            fields.remove(key);
        } else {
            fields.insert(key.clone(), value.clone());
        }
    }

    let updated: E = serde_json::from_value(Value::Object(fields))?;
    map.insert(edit.id.clone(), updated);
    Ok(EntityEdit { id: edit.id.clone(), changes: prior })
}

// =============================================================================
// MAP STATE
// =============================================================================

/// Full state of one map, as persisted and as sent in full-sync snapshots.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapState {
    pub map_id: String,
    #[serde(default)]
    pub tokens: EntityMap<TokenState>,
    #[serde(default)]
    pub draw_shapes: EntityMap<DrawShape>,
    #[serde(default)]
    pub fog_shapes: EntityMap<FogShape>,
    #[serde(default)]
    pub notes: EntityMap<Note>,
    #[serde(default)]
    pub edit_flags: Vec<EditFlag>,
}

impl MapState {
    #[must_use]
    pub fn new(map_id: impl Into<String>) -> Self {
        Self { map_id: map_id.into(), ..Self::default() }
    }

    /// Insert or replace every carried entity in its layer.
    pub fn insert_entities(&mut self, entities: LayerEntities) {
        fn insert_all<E: Entity>(map: &mut EntityMap<E>, items: Vec<E>) {
            for item in items {
                map.insert(item.id().to_string(), item);
            }
        }
        match entities {
            LayerEntities::Drawings(v) => insert_all(&mut self.draw_shapes, v),
            LayerEntities::Fog(v) => insert_all(&mut self.fog_shapes, v),
            LayerEntities::Tokens(v) => insert_all(&mut self.tokens, v),
            LayerEntities::Notes(v) => insert_all(&mut self.notes, v),
        }
    }

    /// Remove the given ids from a layer, returning the entities that were present.
    pub fn remove_entities(&mut self, layer: Layer, ids: &[EntityId]) -> LayerEntities {
        fn remove_all<E: Entity>(map: &mut EntityMap<E>, ids: &[EntityId]) -> Vec<E> {
            ids.iter().filter_map(|id| map.remove(id)).collect()
        }
        match layer {
            Layer::Drawings => LayerEntities::Drawings(remove_all(&mut self.draw_shapes, ids)),
            Layer::Fog => LayerEntities::Fog(remove_all(&mut self.fog_shapes, ids)),
            Layer::Tokens => LayerEntities::Tokens(remove_all(&mut self.tokens, ids)),
            Layer::Notes => LayerEntities::Notes(remove_all(&mut self.notes, ids)),
        }
    }

    /// Apply a sparse edit to one entity of a layer. See [`apply_edit`].
    ///
    /// # Errors
    ///
    /// Propagates [`EditError`] from [`apply_edit`].
    pub fn edit_entity(&mut self, layer: Layer, edit: &EntityEdit) -> Result<EntityEdit, EditError> {
        match layer {
            Layer::Drawings => apply_edit(&mut self.draw_shapes, edit),
            Layer::Fog => apply_edit(&mut self.fog_shapes, edit),
            Layer::Tokens => apply_edit(&mut self.tokens, edit),
            Layer::Notes => apply_edit(&mut self.notes, edit),
        }
    }

    /// True when `id` exists in `layer`.
    #[must_use]
    pub fn contains(&self, layer: Layer, id: &str) -> bool {
        match layer {
            Layer::Drawings => self.draw_shapes.contains_key(id),
            Layer::Fog => self.fog_shapes.contains_key(id),
            Layer::Tokens => self.tokens.contains_key(id),
            Layer::Notes => self.notes.contains_key(id),
        }
    }

    /// Fog shapes in id order.
    #[must_use]
    pub fn fog_list(&self) -> Vec<FogShape> {
        self.fog_shapes.values().cloned().collect()
    }
}
