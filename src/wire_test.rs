use serde_json::json;

use super::*;
use crate::doc::{EntityEdit, Layer, LayerEntities, TokenState};

fn token(id: &str) -> TokenState {
    TokenState {
        id: id.into(),
        token_id: "knight".into(),
        owner: "player-1".into(),
        x: 0.3,
        y: 0.4,
        size: 1.0,
        rotation: 90.0,
        label: "Sir Reginald".into(),
        statuses: vec!["blessed".into()],
        locked: false,
        visible: true,
        last_modified_by: None,
    }
}

#[test]
fn batch_survives_encode_and_decode() {
    let actions = vec![
        Action::AddStates { states: LayerEntities::Tokens(vec![token("t1")]) },
        Action::EditStates { layer: Layer::Tokens, edits: vec![EntityEdit::new("t1").set("x", 0.5)] },
    ];
    let text = encode_batch("map-1", &actions).unwrap();
    let decoded = decode_batch(&text).unwrap();
    assert_eq!(decoded.map_id, "map-1");
    assert_eq!(decoded.actions, actions);
}

#[test]
fn batch_envelope_uses_camel_case() {
    let text = encode_batch("map-1", &[]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value, json!({ "mapId": "map-1", "actions": [] }));
}

#[test]
fn encode_batch_requires_map_id() {
    let err = encode_batch("", &[]).unwrap_err();
    assert_eq!(err.error_code(), "E_MISSING_MAP_ID");
}

#[test]
fn decode_batch_rejects_unknown_action_type() {
    let text = r#"{"mapId":"m","actions":[{"type":"teleport"}]}"#;
    let err = decode_batch(text).unwrap_err();
    assert!(matches!(err, CodecError::Malformed(_)));
    assert_eq!(err.error_code(), "E_MALFORMED_PAYLOAD");
}

#[test]
fn decode_batch_rejects_empty_map_id() {
    let err = decode_batch(r#"{"mapId":"","actions":[]}"#).unwrap_err();
    assert!(matches!(err, CodecError::MissingMapId));
}

#[test]
fn state_survives_encode_and_decode() {
    let mut state = MapState::new("map-9");
    state.insert_entities(LayerEntities::Tokens(vec![token("t1"), token("t2")]));
    let decoded = decode_state(&encode_state(&state).unwrap()).unwrap();
    assert_eq!(decoded, state);
}

#[test]
fn decode_state_accepts_sparse_snapshot() {
    let state = decode_state(r#"{"mapId":"map-3"}"#).unwrap();
    assert_eq!(state, MapState::new("map-3"));
}

#[test]
fn decode_state_rejects_garbage() {
    assert!(decode_state("not json").is_err());
}

#[test]
fn memory_store_put_then_get() {
    let mut store = MemoryMapStore::new();
    assert!(store.get("map-1").unwrap().is_none());

    let mut state = MapState::new("map-1");
    state.insert_entities(LayerEntities::Tokens(vec![token("t1")]));
    store.put(&state).unwrap();
    assert_eq!(store.get("map-1").unwrap(), Some(state.clone()));

    state.remove_entities(Layer::Tokens, &["t1".into()]);
    store.put(&state).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.get("map-1").unwrap().unwrap().tokens.is_empty());
}

#[test]
fn memory_store_rejects_state_without_id() {
    let mut store = MemoryMapStore::new();
    let err = store.put(&MapState::default()).unwrap_err();
    assert_eq!(err.error_code(), "E_MISSING_MAP_ID");
    assert!(!err.retryable());
    assert!(store.is_empty());
}

#[test]
fn backend_errors_are_retryable() {
    let err = StoreError::Backend("disk full".into());
    assert_eq!(err.error_code(), "E_STORE_BACKEND");
    assert!(err.retryable());
}
