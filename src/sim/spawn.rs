//! Timed, probabilistic spawning
//!
//! A cooldown counts down once per tick. The tick it reaches zero it is
//! refilled with the current interval (which shrinks as the run goes on) and, if the
//! live count for the spawn kind is under its cap, a seeded roll decides
//! whether something appears this time.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::actor::ActorKind;
use super::state::SimulationState;

/// Spawn timing for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Kind counted against `max_live`
    pub kind: ActorKind,
    /// Ticks from one spawn roll to the next at tick 0
    pub base_interval_ticks: u32,
    /// Interval never drops below this
    pub min_interval_ticks: u32,
    /// Interval reduction per elapsed tick
    pub interval_decay_per_tick: f32,
    /// Probability a due spawn actually happens (0..=1)
    pub chance: f32,
    /// Maximum concurrent actors of `kind`
    pub max_live: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            kind: ActorKind::Obstacle,
            base_interval_ticks: 60,
            min_interval_ticks: 20,
            interval_decay_per_tick: 0.01,
            chance: 1.0,
            max_live: 8,
        }
    }
}

impl SpawnConfig {
    /// Interval in ticks after `time_ticks` ticks of play
    pub fn interval_at(&self, time_ticks: u64) -> u32 {
        let decayed =
            self.base_interval_ticks as f32 - self.interval_decay_per_tick * time_ticks as f32;
        let floor = self.min_interval_ticks.min(self.base_interval_ticks) as f32;
        decayed.max(floor).round() as u32
    }
}

/// Advance the spawn cooldown by one tick; true when a spawn should happen now
pub fn spawn_due(state: &mut SimulationState) -> bool {
    state.spawn_cooldown = state.spawn_cooldown.saturating_sub(1);
    if state.spawn_cooldown > 0 {
        return false;
    }

    let cfg = &state.config.spawn;
    state.spawn_cooldown = cfg.interval_at(state.time_ticks);

    if state.count_kind(cfg.kind) >= cfg.max_live {
        return false;
    }

    let chance = cfg.chance.clamp(0.0, 1.0);
    chance >= 1.0 || state.rng.random::<f32>() < chance
}
