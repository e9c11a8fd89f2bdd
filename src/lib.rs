//! Mini Arcade - canvas mini-games on a shared game loop
//!
//! Core modules:
//! - `sim`: Deterministic simulation (actors, input intent, collisions, step)
//! - `games`: Per-game rules (car racing, bubble shooter, snake)
//! - `renderer`: Drawing surface abstraction and frame composition
//! - `driver`: Frame-driven loop state machine (Idle / Running / Terminal)
//! - `highscores`: Best score per game in a key-value store
//! - `platform`: Browser bindings (canvas, requestAnimationFrame, LocalStorage)

pub mod driver;
pub mod error;
pub mod games;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use driver::{
    Driver, DriverStats, FrameHandle, FrameScheduler, FrameSlot, LoopPhase, ManualScheduler,
};
pub use error::{ArcadeError, Result};
pub use highscores::{HighScores, MemoryStore, ScoreStore};
pub use settings::{DifficultyPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal frame timestep (60 Hz display)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Longest frame delta fed to a single step (tab switches, hitches)
    pub const MAX_FRAME_DT: f32 = 1.0 / 20.0;

    /// Default playfield dimensions (CSS pixels)
    pub const PLAYFIELD_WIDTH: f32 = 400.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;

    /// Difficulty starts at 1.0 and never exceeds this
    pub const MAX_DIFFICULTY: f32 = 4.0;
}

/// Keep a point inside `[0, size.x] x [0, size.y]`
#[inline]
pub fn clamp_to_field(pos: Vec2, size: Vec2) -> Vec2 {
    pos.clamp(Vec2::ZERO, size)
}

/// Wrap a point around the playfield edges (torus)
#[inline]
pub fn wrap_to_field(pos: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(pos.x.rem_euclid(size.x), pos.y.rem_euclid(size.y))
}

/// Unit vector for an angle measured from +x, with y pointing down the screen
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
