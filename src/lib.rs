//! `mudcore`: the world-simulation core for a multi-user text adventure
//! server — containment graph, spatial grid, movement, mob state and
//! combat/threat, effects, resets, and the process-wide registries that tie
//! them together. See `spec.md`/`SPEC_FULL.md` for the full component
//! breakdown and `DESIGN.md` for how each module grounds in the rest of this
//! exercise's reference pack.
//!
//! This crate is a library only: no socket, no CLI, no file-backed config,
//! no command parser. Everything external — time, scheduling, outgoing
//! text, content catalogues, object construction — is a trait in
//! `ports`, supplied by the embedder.

pub mod attributes;
pub mod combat;
pub mod config;
pub mod containment;
pub mod direction;
pub mod effects;
pub mod error;
pub mod grid;
pub mod ids;
pub mod logging;
pub mod mob;
pub mod model;
pub mod movement;
pub mod ports;
pub mod regen;
pub mod registry;
pub mod resets;
pub mod serialize;
pub mod testkit;

pub use error::{WorldError, WorldResult};
pub use ids::{Coordinate, Oid, RoomRef, TemplateRef};
pub use registry::{Dungeon, RoomLink, World};
