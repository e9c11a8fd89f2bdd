//! Simulation state and per-game configuration
//!
//! One `SimulationState` per running game. It is created on mount (or
//! restart), mutated once per tick by `step`, and simply dropped afterwards.

use std::collections::HashSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, ActorId, ActorKind, Shape};
use super::spawn::SpawnConfig;
use crate::consts::{MAX_DIFFICULTY, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};

/// What happens to the player at the playfield edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgePolicy {
    #[default]
    Clamp,
    Wrap,
}

/// Tuning for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Playfield size in pixels
    pub playfield: Vec2,
    /// Player speed (pixels per second)
    pub player_speed: f32,
    pub edge_policy: EdgePolicy,
    /// Difficulty added per tick
    pub difficulty_ramp: f32,
    /// Upper bound for the difficulty scalar
    pub max_difficulty: f32,
    pub spawn: SpawnConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            playfield: Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
            player_speed: 300.0,
            edge_policy: EdgePolicy::Clamp,
            difficulty_ramp: 0.002,
            max_difficulty: MAX_DIFFICULTY,
            spawn: SpawnConfig::default(),
        }
    }
}

/// Complete state of one game instance
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub config: GameConfig,
    /// Live actors (sorted by id)
    pub actors: Vec<Actor>,
    /// Never decremented
    pub score: u64,
    /// Speed multiplier, starts at 1.0 and only grows
    pub difficulty: f32,
    /// Once set, `step` no longer touches the state
    pub terminal: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Ticks left until the next spawn roll
    pub spawn_cooldown: u32,
    /// Ticks left until the player may act again (fire, grid move)
    pub action_cooldown: u32,
    /// Travel direction for grid games (one cell per move)
    pub heading: Vec2,
    /// Trailing segments still to be added
    pub pending_growth: u32,
    pub rng: Pcg32,
    next_id: u32,
}

impl SimulationState {
    /// Empty state; games add their initial actors in `GameRules::init`
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let spawn_cooldown = config.spawn.base_interval_ticks;
        Self {
            seed,
            config,
            actors: Vec::new(),
            score: 0,
            difficulty: 1.0,
            terminal: false,
            time_ticks: 0,
            spawn_cooldown,
            action_cooldown: 0,
            heading: Vec2::ZERO,
            pending_growth: 0,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    pub fn playfield(&self) -> Vec2 {
        self.config.playfield
    }

    /// Allocate a new actor ID
    pub fn next_actor_id(&mut self) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add an actor; ids increase so `actors` stays sorted
    pub fn spawn(&mut self, kind: ActorKind, pos: Vec2, shape: Shape, vel: Vec2) -> ActorId {
        let id = self.next_actor_id();
        self.actors.push(Actor::new(id, kind, pos, shape).with_velocity(vel));
        id
    }

    /// The (first) player actor
    pub fn player(&self) -> Option<&Actor> {
        self.actors.iter().find(|a| a.kind == ActorKind::Player)
    }

    pub fn player_mut(&mut self) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.kind == ActorKind::Player)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn count_kind(&self, kind: ActorKind) -> usize {
        self.actors.iter().filter(|a| a.kind == kind).count()
    }

    /// Remove the given actors, returning the ids actually removed (in order)
    pub fn remove_ids(&mut self, ids: &HashSet<ActorId>) -> Vec<ActorId> {
        if ids.is_empty() {
            return Vec::new();
        }
        let mut removed = Vec::with_capacity(ids.len());
        self.actors.retain(|a| {
            if ids.contains(&a.id) {
                removed.push(a.id);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Score only ever goes up
    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Set the terminal flag (first call wins)
    pub fn finish(&mut self) {
        if !self.terminal {
            self.terminal = true;
            log::info!(
                "Run over after {} ticks, score {}",
                self.time_ticks,
                self.score
            );
        }
    }

    /// Ensure actors are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.actors.sort_by_key(|a| a.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = SimulationState::new(GameConfig::default(), 7);
        assert!(state.actors.is_empty());
        assert_eq!(state.score, 0);
        assert_eq!(state.difficulty, 1.0);
        assert!(!state.terminal);
    }

    #[test]
    fn test_ids_increase() {
        let mut state = SimulationState::new(GameConfig::default(), 7);
        let shape = Shape::Circle { radius: 4.0 };
        let a = state.spawn(ActorKind::Obstacle, Vec2::ZERO, shape, Vec2::ZERO);
        let b = state.spawn(ActorKind::Obstacle, Vec2::ZERO, shape, Vec2::ZERO);
        assert!(a < b);
    }

    #[test]
    fn test_remove_ids() {
        let mut state = SimulationState::new(GameConfig::default(), 7);
        let shape = Shape::Circle { radius: 4.0 };
        let a = state.spawn(ActorKind::Obstacle, Vec2::ZERO, shape, Vec2::ZERO);
        let b = state.spawn(ActorKind::Pickup, Vec2::ZERO, shape, Vec2::ZERO);
        let removed = state.remove_ids(&HashSet::from([a]));
        assert_eq!(removed, vec![a]);
        assert_eq!(state.actors.len(), 1);
        assert_eq!(state.actors[0].id, b);
    }

    #[test]
    fn test_score_saturates() {
        let mut state = SimulationState::new(GameConfig::default(), 7);
        state.score = u64::MAX - 1;
        state.add_score(5);
        assert_eq!(state.score, u64::MAX);
    }
}
