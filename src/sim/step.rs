//! Per-tick simulation step
//!
//! `step` advances one game by one tick. Order within a tick:
//! input, edge policy, spawning, movement, contacts, exits, then removals
//! and scoring. Nothing is removed until every contact and exit of the tick
//! has been evaluated.

use std::collections::HashSet;

use glam::Vec2;

use super::actor::{Actor, ActorId, ActorKind};
use super::collision::{Contact, detect_contacts};
use super::input::InputIntent;
use super::spawn::spawn_due;
use super::state::{EdgePolicy, GameConfig, SimulationState};
use crate::{clamp_to_field, wrap_to_field};

/// What happens to an actor that left the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Leave it alone (it may come back)
    Keep,
    /// Remove without scoring
    Discard,
    /// Remove and award points (dodged, cleared)
    Score(u64),
    /// Remove and end the run (missed defense)
    Terminal,
}

/// Effects collected while resolving the contacts of one tick
#[derive(Debug, Clone, Default)]
pub struct Effects {
    consumed: HashSet<ActorId>,
    score: u64,
    growth: u32,
    terminal: bool,
}

impl Effects {
    /// Mark an actor for removal; false if it was already marked this tick
    pub fn consume(&mut self, id: ActorId) -> bool {
        self.consumed.insert(id)
    }

    pub fn is_consumed(&self, id: ActorId) -> bool {
        self.consumed.contains(&id)
    }

    pub fn score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Add trailing segments to the player
    pub fn grow(&mut self, segments: u32) {
        self.growth = self.growth.saturating_add(segments);
    }

    pub fn end_run(&mut self) {
        self.terminal = true;
    }
}

/// The rules of one game
pub trait GameRules {
    /// Stable name, also used as the high-score key
    fn name(&self) -> &'static str;

    /// Tuning for a fresh run
    fn config(&self) -> GameConfig;

    /// Populate the initial actor set
    fn init(&self, state: &mut SimulationState);

    /// Move the player and perform actions for this tick
    fn apply_input(&self, state: &mut SimulationState, intent: &InputIntent, dt: f32);

    /// Whether contacts between these kinds matter (asked for both orders)
    fn interacts(&self, a: ActorKind, b: ActorKind) -> bool;

    /// Create one actor when the spawn timer fires; None if no room
    fn spawn_actor(&self, state: &mut SimulationState) -> Option<ActorId>;

    /// React to one side of a contact. Called for `(a, b)` and `(b, a)`.
    fn resolve_contact(&self, contact: &Contact, effects: &mut Effects);

    /// Fate of a non-player actor that is fully outside the playfield
    fn on_exit(&self, actor: &Actor) -> ExitOutcome;
}

impl<R: GameRules + ?Sized> GameRules for Box<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn config(&self) -> GameConfig {
        (**self).config()
    }
    fn init(&self, state: &mut SimulationState) {
        (**self).init(state)
    }
    fn apply_input(&self, state: &mut SimulationState, intent: &InputIntent, dt: f32) {
        (**self).apply_input(state, intent, dt)
    }
    fn interacts(&self, a: ActorKind, b: ActorKind) -> bool {
        (**self).interacts(a, b)
    }
    fn spawn_actor(&self, state: &mut SimulationState) -> Option<ActorId> {
        (**self).spawn_actor(state)
    }
    fn resolve_contact(&self, contact: &Contact, effects: &mut Effects) {
        (**self).resolve_contact(contact, effects)
    }
    fn on_exit(&self, actor: &Actor) -> ExitOutcome {
        (**self).on_exit(actor)
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Every contact, both orders
    pub contacts: Vec<Contact>,
    pub spawned: u32,
    pub removed: Vec<ActorId>,
    pub score_gained: u64,
    /// The run ended during this tick
    pub terminal: bool,
}

impl StepReport {
    /// Contact reported from `a`'s side against `b`
    pub fn collided(&self, a: ActorId, b: ActorId) -> bool {
        self.contacts.iter().any(|c| c.a == a && c.b == b)
    }
}

/// Fresh state for a game: configuration, seed and initial actors
pub fn new_state<R: GameRules + ?Sized>(rules: &R, seed: u64) -> SimulationState {
    new_state_with(rules, rules.config(), seed)
}

/// Fresh state with adjusted tuning (difficulty presets)
pub fn new_state_with<R: GameRules + ?Sized>(
    rules: &R,
    config: GameConfig,
    seed: u64,
) -> SimulationState {
    let mut state = SimulationState::new(config, seed);
    rules.init(&mut state);
    state.normalize_order();
    state
}

/// Advance the simulation by one tick of `dt` seconds
pub fn step<R: GameRules + ?Sized>(
    rules: &R,
    state: &mut SimulationState,
    intent: &InputIntent,
    dt: f32,
) -> StepReport {
    let mut report = StepReport::default();
    if state.terminal {
        return report;
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    state.time_ticks += 1;
    let ramped = state.difficulty + state.config.difficulty_ramp;
    state.difficulty = if ramped.is_finite() {
        ramped.min(state.config.max_difficulty).max(state.difficulty)
    } else {
        state.difficulty
    };

    // Player movement
    let before: Vec<(ActorId, Vec2)> = state
        .actors
        .iter()
        .filter(|a| a.kind == ActorKind::Player)
        .map(|a| (a.id, a.pos))
        .collect();
    rules.apply_input(state, intent, dt);
    keep_players_in_field(state, &before);

    // Spawning
    if spawn_due(state) && rules.spawn_actor(state).is_some() {
        report.spawned += 1;
    }

    // Movement
    let scale = state.difficulty * dt;
    for actor in state.actors.iter_mut() {
        if actor.kind != ActorKind::Player {
            actor.pos += actor.vel * scale;
        }
    }
    let mut effects = Effects::default();
    for actor in &state.actors {
        if actor.kind != ActorKind::Player && !actor.is_finite() {
            log::warn!("Dropping actor {:?} with non-finite state", actor.id);
            effects.consume(actor.id);
        }
    }

    // Contacts: all pairs evaluated before anything is removed
    report.contacts = detect_contacts(&state.actors, |a, b| rules.interacts(a, b));
    for contact in &report.contacts {
        rules.resolve_contact(contact, &mut effects);
    }

    // Exits
    let field = state.playfield();
    for actor in &state.actors {
        if actor.kind == ActorKind::Player
            || effects.is_consumed(actor.id)
            || !actor.is_outside(field)
        {
            continue;
        }
        match rules.on_exit(actor) {
            ExitOutcome::Keep => {}
            ExitOutcome::Discard => {
                effects.consume(actor.id);
            }
            ExitOutcome::Score(points) => {
                effects.consume(actor.id);
                effects.score(points);
            }
            ExitOutcome::Terminal => {
                effects.consume(actor.id);
                effects.end_run();
            }
        }
    }

    // Apply
    report.removed = state.remove_ids(&effects.consumed);
    state.add_score(effects.score);
    state.pending_growth = state.pending_growth.saturating_add(effects.growth);
    report.score_gained = effects.score;
    if effects.terminal {
        state.finish();
        report.terminal = true;
    }

    report
}

fn keep_players_in_field(state: &mut SimulationState, before: &[(ActorId, Vec2)]) {
    let field = state.playfield();
    let policy = state.config.edge_policy;
    for actor in state.actors.iter_mut() {
        if actor.kind != ActorKind::Player {
            continue;
        }
        if !actor.pos.is_finite() {
            let previous = before
                .iter()
                .find(|(id, _)| *id == actor.id)
                .map(|(_, pos)| *pos)
                .unwrap_or(field * 0.5);
            log::warn!("Player {:?} produced a non-finite position, restoring", actor.id);
            actor.pos = previous;
        }
        actor.pos = match policy {
            EdgePolicy::Clamp => clamp_to_field(actor.pos, field),
            EdgePolicy::Wrap => wrap_to_field(actor.pos, field),
        };
    }
}
