//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by node and body handle)
//! - No rendering or platform dependencies

pub mod collision;
pub mod contact;
pub mod formation;
pub mod launch;
pub mod physics;
pub mod projector;
pub mod snow;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, collide};
pub use contact::{ContactNotifier, SoundCue, SoundIntent, classify, dispatch};
pub use formation::{formation_positions, reset_formation, slot_count};
pub use launch::{LaunchConfig, LaunchController};
pub use physics::{BodyDesc, BodyHandle, BodyKind, Collider, Contact, PhysicsEngine, PhysicsWorld};
pub use projector::{PointerKind, TouchSample, launch_vector, project_touch, tilt_to_angles};
pub use snow::{Flake, SnowField};
pub use state::{GameEvent, Playground};
pub use tick::{TickInput, TouchEvent, TouchPhase, handle_touch, tick};
