//! Snake on a wrapping grid
//!
//! The head moves one cell at a time, faster as difficulty rises, and
//! wraps around the playfield edges. Food appears on a free cell whenever
//! there is none; eating it scores and grows the tail by one segment.
//! Running into your own body ends the run.

use glam::Vec2;
use rand::Rng;

use crate::consts::{MAX_DIFFICULTY, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::sim::{
    Actor, ActorId, ActorKind, Contact, EdgePolicy, Effects, ExitOutcome, GameConfig, GameRules,
    InputIntent, Shape, SimulationState, SpawnConfig,
};
use crate::wrap_to_field;

pub const NAME: &str = "snake";

/// Grid cell size in pixels
pub const CELL: f32 = 20.0;
/// Segments behind the head at the start
pub const START_LENGTH: u32 = 2;
/// Ticks per move at difficulty 1.0
pub const BASE_MOVE_TICKS: f32 = 8.0;
pub const MIN_MOVE_TICKS: u32 = 3;
/// Free-cell attempts before food placement gives up for this tick
const FOOD_ATTEMPTS: u32 = 32;

#[derive(Debug, Clone, Copy, Default)]
pub struct Snake;

impl Snake {
    fn body_shape() -> Shape {
        // Slightly smaller than a cell so neighbours never touch
        Shape::Rect {
            width: CELL - 2.0,
            height: CELL - 2.0,
        }
    }

    fn food_shape() -> Shape {
        Shape::Circle {
            radius: CELL / 2.0 - 3.0,
        }
    }

    /// Centre of grid cell (col, row)
    pub fn cell_center(col: u32, row: u32) -> Vec2 {
        Vec2::new((col as f32 + 0.5) * CELL, (row as f32 + 0.5) * CELL)
    }

    fn grid_size(field: Vec2) -> (u32, u32) {
        (
            ((field.x / CELL).floor() as u32).max(1),
            ((field.y / CELL).floor() as u32).max(1),
        )
    }

    /// Ticks between moves at a given difficulty
    pub fn move_interval(difficulty: f32) -> u32 {
        let ticks = (BASE_MOVE_TICKS / difficulty.max(1.0)).round() as u32;
        ticks.max(MIN_MOVE_TICKS)
    }

    /// Direction requested by the intent, if any
    fn requested_heading(intent: &InputIntent, head: Vec2) -> Option<Vec2> {
        if intent.horizontal != 0.0 {
            return Some(Vec2::new(intent.horizontal.signum(), 0.0));
        }
        if intent.vertical != 0.0 {
            return Some(Vec2::new(0.0, intent.vertical.signum()));
        }
        let delta = intent.pointer? - head;
        if delta.x.abs() < CELL / 2.0 && delta.y.abs() < CELL / 2.0 {
            return None;
        }
        if delta.x.abs() >= delta.y.abs() {
            Some(Vec2::new(delta.x.signum(), 0.0))
        } else {
            Some(Vec2::new(0.0, delta.y.signum()))
        }
    }

    /// Shift the body one cell along the heading
    fn advance(state: &mut SimulationState) {
        let field = state.playfield();
        let heading = state.heading;
        // Head first, then segments in the order they were added
        let mut body: Vec<usize> = state
            .actors
            .iter()
            .enumerate()
            .filter(|(_, a)| matches!(a.kind, ActorKind::Player | ActorKind::Segment))
            .map(|(i, _)| i)
            .collect();
        body.sort_by_key(|&i| state.actors[i].id);
        let Some(&head) = body.first() else {
            return;
        };
        if state.actors[head].kind != ActorKind::Player {
            return;
        }

        let tail = state.actors[body[body.len() - 1]].pos;
        let mut previous = state.actors[head].pos;
        state.actors[head].pos = wrap_to_field(previous + heading * CELL, field);
        state.actors[head].vel = heading * CELL;
        for &i in &body[1..] {
            std::mem::swap(&mut state.actors[i].pos, &mut previous);
        }

        if state.pending_growth > 0 {
            state.pending_growth -= 1;
            state.spawn(ActorKind::Segment, tail, Self::body_shape(), Vec2::ZERO);
        }
    }
}

impl GameRules for Snake {
    fn name(&self) -> &'static str {
        NAME
    }

    fn config(&self) -> GameConfig {
        GameConfig {
            playfield: Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT),
            player_speed: CELL,
            edge_policy: EdgePolicy::Wrap,
            difficulty_ramp: 0.0005,
            max_difficulty: MAX_DIFFICULTY,
            spawn: SpawnConfig {
                kind: ActorKind::Pickup,
                base_interval_ticks: 0,
                min_interval_ticks: 0,
                interval_decay_per_tick: 0.0,
                chance: 1.0,
                max_live: 1,
            },
        }
    }

    fn init(&self, state: &mut SimulationState) {
        let (cols, rows) = Self::grid_size(state.playfield());
        let (col, row) = (cols / 2, rows / 2);
        state.heading = Vec2::X;
        state.spawn(
            ActorKind::Player,
            Self::cell_center(col, row),
            Self::body_shape(),
            Vec2::X * CELL,
        );
        for i in 1..=START_LENGTH {
            let pos = Self::cell_center((col + cols - i % cols) % cols, row);
            state.spawn(ActorKind::Segment, pos, Self::body_shape(), Vec2::ZERO);
        }
        state.action_cooldown = Self::move_interval(state.difficulty);
    }

    fn apply_input(&self, state: &mut SimulationState, intent: &InputIntent, _dt: f32) {
        let Some(head) = state.player().map(|p| (p.pos, p.vel)) else {
            return;
        };
        let (head_pos, last_move) = head;
        if let Some(wanted) = Self::requested_heading(intent, head_pos) {
            // No turning back onto the neck
            if wanted.dot(last_move.normalize_or_zero()) > -0.5 {
                state.heading = wanted;
            }
        }

        state.action_cooldown = state.action_cooldown.saturating_sub(1);
        if state.action_cooldown > 0 {
            return;
        }
        Self::advance(state);
        state.action_cooldown = Self::move_interval(state.difficulty);
    }

    fn interacts(&self, a: ActorKind, b: ActorKind) -> bool {
        a == ActorKind::Player && matches!(b, ActorKind::Pickup | ActorKind::Segment)
    }

    fn spawn_actor(&self, state: &mut SimulationState) -> Option<ActorId> {
        let (cols, rows) = Self::grid_size(state.playfield());
        for _ in 0..FOOD_ATTEMPTS {
            let pos = Self::cell_center(
                state.rng.random_range(0..cols),
                state.rng.random_range(0..rows),
            );
            let occupied = state
                .actors
                .iter()
                .any(|a| a.pos.distance_squared(pos) < 1.0);
            if !occupied {
                return Some(state.spawn(ActorKind::Pickup, pos, Self::food_shape(), Vec2::ZERO));
            }
        }
        None
    }

    fn resolve_contact(&self, contact: &Contact, effects: &mut Effects) {
        match (contact.a_kind, contact.b_kind) {
            (ActorKind::Player, ActorKind::Pickup) => {
                if effects.consume(contact.b) {
                    effects.score(1);
                    effects.grow(1);
                }
            }
            (ActorKind::Player, ActorKind::Segment) => effects.end_run(),
            _ => {}
        }
    }

    fn on_exit(&self, _actor: &Actor) -> ExitOutcome {
        // Nothing but the head moves, and the head wraps
        ExitOutcome::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::{new_state, step};

    fn no_food(state: &mut SimulationState) {
        state.actors.retain(|a| a.kind != ActorKind::Pickup);
        state.config.spawn.max_live = 0;
    }

    fn run_moves(state: &mut SimulationState, intent: &InputIntent, moves: u32) {
        for _ in 0..moves {
            state.action_cooldown = 0;
            step(&Snake, state, intent, SIM_DT);
        }
    }

    fn head(state: &SimulationState) -> Vec2 {
        state.player().map(|p| p.pos).unwrap_or(Vec2::NAN)
    }

    #[test]
    fn test_initial_actor_set() {
        let state = new_state(&Snake, 1);
        assert_eq!(state.count_kind(ActorKind::Player), 1);
        assert_eq!(state.count_kind(ActorKind::Segment), START_LENGTH as usize);
        assert_eq!(state.count_kind(ActorKind::Pickup), 0);
    }

    #[test]
    fn test_moves_one_cell_and_body_follows() {
        let mut state = new_state(&Snake, 1);
        no_food(&mut state);
        let start = head(&state);
        run_moves(&mut state, &InputIntent::default(), 1);
        assert_eq!(head(&state), start + Vec2::new(CELL, 0.0));
        let first_segment = state
            .actors
            .iter()
            .find(|a| a.kind == ActorKind::Segment)
            .map(|a| a.pos);
        assert_eq!(first_segment, Some(start));
    }

    #[test]
    fn test_reverse_ignored() {
        let mut state = new_state(&Snake, 1);
        no_food(&mut state);
        let start = head(&state);
        let back = InputIntent {
            horizontal: -1.0,
            ..Default::default()
        };
        run_moves(&mut state, &back, 1);
        assert_eq!(head(&state), start + Vec2::new(CELL, 0.0));
        assert!(!state.terminal);
    }

    #[test]
    fn test_wraps_at_edge() {
        let mut state = new_state(&Snake, 1);
        no_food(&mut state);
        let up = InputIntent {
            vertical: -1.0,
            ..Default::default()
        };
        let rows = (PLAYFIELD_HEIGHT / CELL) as u32;
        run_moves(&mut state, &up, rows);
        assert!(!state.terminal);
        let h = head(&state);
        assert!(h.y >= 0.0 && h.y <= PLAYFIELD_HEIGHT);
    }

    #[test]
    fn test_eating_scores_and_grows() {
        let mut state = new_state(&Snake, 1);
        no_food(&mut state);
        let target = head(&state) + Vec2::new(CELL, 0.0);
        state.spawn(ActorKind::Pickup, target, Snake::food_shape(), Vec2::ZERO);
        let before = state.count_kind(ActorKind::Segment);
        run_moves(&mut state, &InputIntent::default(), 1);
        assert_eq!(state.score, 1);
        assert_eq!(state.count_kind(ActorKind::Pickup), 0);
        run_moves(&mut state, &InputIntent::default(), 1);
        assert_eq!(state.count_kind(ActorKind::Segment), before + 1);
    }

    #[test]
    fn test_biting_tail_ends_run() {
        let mut state = new_state(&Snake, 1);
        no_food(&mut state);
        state.pending_growth = 4;
        run_moves(&mut state, &InputIntent::default(), 4);
        let turns = [
            InputIntent {
                vertical: 1.0,
                ..Default::default()
            },
            InputIntent {
                horizontal: -1.0,
                ..Default::default()
            },
            InputIntent {
                vertical: -1.0,
                ..Default::default()
            },
        ];
        for intent in &turns {
            run_moves(&mut state, intent, 1);
        }
        assert!(state.terminal);
    }

    #[test]
    fn test_food_spawns_when_missing() {
        let mut state = new_state(&Snake, 11);
        let report = step(&Snake, &mut state, &InputIntent::default(), SIM_DT);
        assert_eq!(report.spawned, 1);
        assert_eq!(state.count_kind(ActorKind::Pickup), 1);
    }

    #[test]
    fn test_moves_once_per_interval() {
        let mut state = new_state(&Snake, 1);
        no_food(&mut state);
        let start = head(&state);
        let interval = Snake::move_interval(state.difficulty);
        for _ in 1..interval {
            step(&Snake, &mut state, &InputIntent::default(), SIM_DT);
        }
        assert_eq!(head(&state), start);
        step(&Snake, &mut state, &InputIntent::default(), SIM_DT);
        assert_eq!(head(&state), start + Vec2::new(CELL, 0.0));
    }

    #[test]
    fn test_move_interval_shrinks() {
        assert_eq!(Snake::move_interval(1.0), 8);
        assert_eq!(Snake::move_interval(2.0), 4);
        assert_eq!(Snake::move_interval(4.0), MIN_MOVE_TICKS);
    }
}
