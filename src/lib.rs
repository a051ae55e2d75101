//! Core of a virtual tabletop: grid math, fog of war geometry, drawing guides
//! and the undoable action history for a shared map.
//!
//! The crate is host-agnostic. It never renders, never touches the network
//! and never reads the environment. A host feeds it pointer positions, peer
//! payloads and snapshots, and reads back shapes, guides and encoded batches
//! to draw and broadcast. Every entry point runs to completion on the calling
//! thread.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | [`session::MapSession`]: one open map, the surface a host drives |
//! | [`actions`] | Tagged action union, [`actions::ActionLog`] undo/redo, replay |
//! | [`doc`] | Map entities, [`doc::MapState`] snapshots and sparse edits |
//! | [`fog`] | Fog polygon cut, subtract, merge and simplification |
//! | [`guides`] | Alignment guides and grid snapping |
//! | [`grid`] | Square and hex grid math, distances, scale parsing |
//! | [`math`] | `Vector2`, `Size` and `BoundingBox` value types |
//! | [`wire`] | JSON codec for batches and snapshots, `MapStore` contract |
//! | [`config`] | [`config::EngineConfig`] from host-supplied JSON |
//! | [`telemetry`] | `tracing` subscriber bootstrap |
//! | [`error`] | Stable error codes |
//! | [`consts`] | Shared numeric constants |

pub mod actions;
pub mod config;
pub mod consts;
pub mod doc;
pub mod error;
pub mod fog;
pub mod grid;
pub mod guides;
pub mod math;
pub mod session;
pub mod telemetry;
pub mod wire;
