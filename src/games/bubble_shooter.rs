//! Bubble shooter: pop the bubbles before they reach the floor
//!
//! A launcher sits at the bottom centre and fires along its aim angle.
//! Bubbles drift down from the top. A shot that touches bubbles pops every
//! one of them (a point each) and is spent. A bubble that reaches the floor
//! or the launcher ends the run.

use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use crate::consts::{MAX_DIFFICULTY, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::direction_from_angle;
use crate::sim::{
    Actor, ActorId, ActorKind, Contact, EdgePolicy, Effects, ExitOutcome, GameConfig, GameRules,
    InputIntent, Shape, SimulationState, SpawnConfig,
};

pub const NAME: &str = "bubble-shooter";

pub const LAUNCHER_RADIUS: f32 = 18.0;
pub const SHOT_RADIUS: f32 = 6.0;
pub const SHOT_SPEED: f32 = 520.0;
pub const MAX_SHOTS: usize = 3;
/// Ticks between shots
pub const FIRE_COOLDOWN_TICKS: u32 = 12;
pub const BUBBLE_MIN_RADIUS: f32 = 12.0;
pub const BUBBLE_MAX_RADIUS: f32 = 20.0;
pub const BUBBLE_SPEED: f32 = 45.0;
/// Aim rotation speed for keyboard play (radians per second)
const AIM_TURN_RATE: f32 = 2.5;
/// Keep the aim away from horizontal
const AIM_MARGIN: f32 = 0.15;

#[derive(Debug, Clone, Copy, Default)]
pub struct BubbleShooter;

impl BubbleShooter {
    /// Launcher centre for a playfield
    pub fn launcher_pos(field: Vec2) -> Vec2 {
        Vec2::new(field.x / 2.0, field.y - LAUNCHER_RADIUS - 12.0)
    }

    /// Clamp an angle to the upper half-plane (y grows downward)
    fn clamp_aim(theta: f32) -> f32 {
        let theta = if theta > 0.0 {
            // Pointer below the launcher: pick the nearer horizontal side
            if theta < PI / 2.0 { -AIM_MARGIN } else { -PI + AIM_MARGIN }
        } else {
            theta
        };
        theta.clamp(-PI + AIM_MARGIN, -AIM_MARGIN)
    }

    fn aim_angle(state: &SimulationState) -> f32 {
        if state.heading == Vec2::ZERO {
            -PI / 2.0
        } else {
            state.heading.y.atan2(state.heading.x)
        }
    }
}

impl GameRules for BubbleShooter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn config(&self) -> GameConfig {
        GameConfig {
            playfield: Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
            player_speed: 0.0,
            edge_policy: EdgePolicy::Clamp,
            difficulty_ramp: 0.001,
            max_difficulty: MAX_DIFFICULTY,
            spawn: SpawnConfig {
                kind: ActorKind::Obstacle,
                base_interval_ticks: 90,
                min_interval_ticks: 30,
                interval_decay_per_tick: 0.01,
                chance: 0.9,
                max_live: 10,
            },
        }
    }

    fn init(&self, state: &mut SimulationState) {
        let pos = Self::launcher_pos(state.playfield());
        state.spawn(
            ActorKind::Player,
            pos,
            Shape::Circle {
                radius: LAUNCHER_RADIUS,
            },
            Vec2::ZERO,
        );
        state.heading = direction_from_angle(-PI / 2.0);
    }

    fn apply_input(&self, state: &mut SimulationState, intent: &InputIntent, dt: f32) {
        let mut aim = Self::aim_angle(state);
        if intent.horizontal != 0.0 {
            aim += intent.horizontal.clamp(-1.0, 1.0) * AIM_TURN_RATE * dt;
        } else if let Some(theta) = intent.aim.filter(|t| t.is_finite()) {
            aim = theta;
        }
        let aim = Self::clamp_aim(aim);
        state.heading = direction_from_angle(aim);

        state.action_cooldown = state.action_cooldown.saturating_sub(1);
        if state.action_cooldown > 0 {
            return;
        }
        if !intent.fire || state.count_kind(ActorKind::Projectile) >= MAX_SHOTS {
            return;
        }
        let Some(origin) = state.player().map(|p| p.pos) else {
            return;
        };
        let dir = state.heading;
        state.spawn(
            ActorKind::Projectile,
            origin + dir * (LAUNCHER_RADIUS + SHOT_RADIUS),
            Shape::Circle {
                radius: SHOT_RADIUS,
            },
            dir * SHOT_SPEED,
        );
        state.action_cooldown = FIRE_COOLDOWN_TICKS;
    }

    fn interacts(&self, a: ActorKind, b: ActorKind) -> bool {
        matches!(
            (a, b),
            (ActorKind::Projectile, ActorKind::Obstacle) | (ActorKind::Player, ActorKind::Obstacle)
        )
    }

    fn spawn_actor(&self, state: &mut SimulationState) -> Option<ActorId> {
        let field = state.playfield();
        let radius = state.rng.random_range(BUBBLE_MIN_RADIUS..=BUBBLE_MAX_RADIUS);
        let x = state.rng.random_range(radius..=field.x - radius);
        Some(state.spawn(
            ActorKind::Obstacle,
            Vec2::new(x, -radius),
            Shape::Circle { radius },
            Vec2::new(0.0, BUBBLE_SPEED),
        ))
    }

    fn resolve_contact(&self, contact: &Contact, effects: &mut Effects) {
        match (contact.a_kind, contact.b_kind) {
            (ActorKind::Projectile, ActorKind::Obstacle) => {
                effects.consume(contact.a);
                // A bubble hit by two shots still pops once
                if effects.consume(contact.b) {
                    effects.score(1);
                }
            }
            (ActorKind::Obstacle, ActorKind::Player) => effects.end_run(),
            _ => {}
        }
    }

    fn on_exit(&self, actor: &Actor) -> ExitOutcome {
        match actor.kind {
            ActorKind::Obstacle if actor.pos.y > 0.0 => ExitOutcome::Terminal,
            ActorKind::Obstacle => ExitOutcome::Keep,
            _ => ExitOutcome::Discard,
        }
    }
}
