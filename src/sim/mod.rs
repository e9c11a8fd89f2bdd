//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by actor ID)
//! - Input arrives through `InputIntent`, read once per tick
//! - No rendering or platform dependencies

pub mod actor;
pub mod collision;
pub mod input;
pub mod spawn;
pub mod state;
pub mod step;

pub use actor::{Aabb, Actor, ActorId, ActorKind, Shape};
pub use collision::{Contact, detect_contacts, overlaps};
pub use input::{InputController, InputIntent, Key, KeyRouting, RawInput, route_key};
pub use spawn::{SpawnConfig, spawn_due};
pub use state::{EdgePolicy, GameConfig, SimulationState};
pub use step::{Effects, ExitOutcome, GameRules, StepReport, new_state, new_state_with, step};
