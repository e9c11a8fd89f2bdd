//! Car racing: dodge the traffic
//!
//! The player's car slides along the bottom of a four-lane road. Traffic
//! spawns at the top in a random lane and drives down. Every car that gets
//! past scores a point; touching one ends the run.

use glam::Vec2;
use rand::Rng;

use crate::consts::{MAX_DIFFICULTY, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::sim::{
    Actor, ActorId, ActorKind, Contact, EdgePolicy, Effects, ExitOutcome, GameConfig, GameRules,
    InputIntent, Shape, SimulationState, SpawnConfig,
};

pub const NAME: &str = "car-racing";

pub const LANES: u32 = 4;
pub const CAR_WIDTH: f32 = 40.0;
pub const CAR_HEIGHT: f32 = 70.0;
/// Traffic speed at difficulty 1.0 (pixels per second)
pub const TRAFFIC_SPEED: f32 = 240.0;
/// A lane stays blocked for new traffic while its last car is above this line
const LANE_CLEARANCE: f32 = 2.0 * CAR_HEIGHT;

#[derive(Debug, Clone, Copy, Default)]
pub struct CarRacing;

impl CarRacing {
    fn lane_center(field: Vec2, lane: u32) -> f32 {
        let lane_width = field.x / LANES as f32;
        lane_width * (lane as f32 + 0.5)
    }

    fn car_shape() -> Shape {
        Shape::Rect {
            width: CAR_WIDTH,
            height: CAR_HEIGHT,
        }
    }
}

impl GameRules for CarRacing {
    fn name(&self) -> &'static str {
        NAME
    }

    fn config(&self) -> GameConfig {
        GameConfig {
            playfield: Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
            player_speed: 300.0,
            edge_policy: EdgePolicy::Clamp,
            difficulty_ramp: 0.002,
            max_difficulty: MAX_DIFFICULTY,
            spawn: SpawnConfig {
                kind: ActorKind::Obstacle,
                base_interval_ticks: 60,
                min_interval_ticks: 20,
                interval_decay_per_tick: 0.02,
                chance: 0.85,
                max_live: 6,
            },
        }
    }

    fn init(&self, state: &mut SimulationState) {
        let field = state.playfield();
        let start = Vec2::new(field.x / 2.0, field.y - CAR_HEIGHT);
        state.spawn(ActorKind::Player, start, Self::car_shape(), Vec2::ZERO);
    }

    fn apply_input(&self, state: &mut SimulationState, intent: &InputIntent, dt: f32) {
        let step = state.config.player_speed * dt;
        let Some(player) = state.player_mut() else {
            return;
        };
        if intent.horizontal != 0.0 {
            player.pos.x += intent.horizontal.clamp(-1.0, 1.0) * step;
        } else if let Some(pointer) = intent.pointer {
            // Steer toward the pointer, no faster than keyboard speed
            let delta = pointer.x - player.pos.x;
            player.pos.x += delta.clamp(-step, step);
        }
    }

    fn interacts(&self, a: ActorKind, b: ActorKind) -> bool {
        a == ActorKind::Player && b == ActorKind::Obstacle
    }

    fn spawn_actor(&self, state: &mut SimulationState) -> Option<ActorId> {
        let field = state.playfield();
        let lane = state.rng.random_range(0..LANES);
        let x = Self::lane_center(field, lane);
        let blocked = state.actors.iter().any(|a| {
            a.kind == ActorKind::Obstacle && (a.pos.x - x).abs() < 1.0 && a.pos.y < LANE_CLEARANCE
        });
        if blocked {
            return None;
        }
        let pos = Vec2::new(x, -CAR_HEIGHT / 2.0);
        Some(state.spawn(
            ActorKind::Obstacle,
            pos,
            Self::car_shape(),
            Vec2::new(0.0, TRAFFIC_SPEED),
        ))
    }

    fn resolve_contact(&self, contact: &Contact, effects: &mut Effects) {
        if contact.a_kind == ActorKind::Player && contact.b_kind == ActorKind::Obstacle {
            effects.end_run();
        }
    }

    fn on_exit(&self, actor: &Actor) -> ExitOutcome {
        match actor.kind {
            // Past the bottom edge: dodged
            ActorKind::Obstacle if actor.vel.y > 0.0 && actor.pos.y > 0.0 => ExitOutcome::Score(1),
            ActorKind::Obstacle => ExitOutcome::Keep,
            _ => ExitOutcome::Discard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::{new_state, step};

    fn quiet_state() -> SimulationState {
        let mut state = new_state(&CarRacing, 99);
        state.spawn_cooldown = u32::MAX;
        state
    }

    #[test]
    fn test_initial_actor_set() {
        let state = new_state(&CarRacing, 1);
        assert_eq!(state.actors.len(), 1);
        assert_eq!(state.count_kind(ActorKind::Player), 1);
        assert_eq!(state.count_kind(ActorKind::Obstacle), 0);
    }

    #[test]
    fn test_keyboard_steering_clamped() {
        let mut state = quiet_state();
        if let Some(p) = state.player_mut() {
            p.pos.x = 100.0;
        }
        let intent = InputIntent {
            horizontal: -1.0,
            ..Default::default()
        };
        for _ in 0..20 {
            step(&CarRacing, &mut state, &intent, SIM_DT);
        }
        assert_eq!(state.player().map(|p| p.pos.x), Some(0.0));
    }

    #[test]
    fn test_pointer_steering_limited_by_speed() {
        let mut state = quiet_state();
        let start = state.player().map(|p| p.pos.x).unwrap_or_default();
        let intent = InputIntent {
            pointer: Some(Vec2::new(start + 100.0, 10.0)),
            ..Default::default()
        };
        step(&CarRacing, &mut state, &intent, SIM_DT);
        let x = state.player().map(|p| p.pos.x).unwrap_or_default();
        assert!((x - start - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_crash_ends_run() {
        let mut state = quiet_state();
        let pos = state.player().map(|p| p.pos).unwrap_or_default();
        state.spawn(
            ActorKind::Obstacle,
            pos - Vec2::new(0.0, CAR_HEIGHT - 5.0),
            CarRacing::car_shape(),
            Vec2::new(0.0, TRAFFIC_SPEED),
        );
        let report = step(&CarRacing, &mut state, &InputIntent::default(), SIM_DT);
        assert!(report.terminal);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_dodged_car_scores() {
        let mut state = quiet_state();
        if let Some(p) = state.player_mut() {
            p.pos.x = CarRacing::lane_center(Vec2::new(400.0, 600.0), 0);
        }
        let x = CarRacing::lane_center(Vec2::new(400.0, 600.0), 3);
        state.spawn(
            ActorKind::Obstacle,
            Vec2::new(x, 500.0),
            CarRacing::car_shape(),
            Vec2::new(0.0, TRAFFIC_SPEED),
        );
        for _ in 0..60 {
            step(&CarRacing, &mut state, &InputIntent::default(), SIM_DT);
        }
        assert_eq!(state.score, 1);
        assert_eq!(state.count_kind(ActorKind::Obstacle), 0);
        assert!(!state.terminal);
    }

    #[test]
    fn test_traffic_is_seeded() {
        let run = |seed: u64| {
            let mut state = new_state(&CarRacing, seed);
            state.actors.retain(|a| a.kind != ActorKind::Player);
            let mut spawned = 0;
            let mut lanes = Vec::new();
            for _ in 0..600 {
                let report = step(&CarRacing, &mut state, &InputIntent::default(), SIM_DT);
                spawned += report.spawned;
            }
            for a in &state.actors {
                lanes.push(a.pos.x as i32);
            }
            (spawned, lanes, state.score)
        };
        assert_eq!(run(5), run(5));
    }
}
