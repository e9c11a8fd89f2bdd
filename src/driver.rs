//! Game loop driver
//!
//! Idle -> Running -> Terminal, one step and one render per frame callback.
//!
//! The driver owns the simulation state and the drawing surface. The
//! platform owns the actual frame callback and calls `on_frame` with the
//! handle it was scheduled under; stale or cancelled handles are ignored,
//! so nothing runs after `stop`.

use std::cell::Cell;
use std::rc::Rc;

use crate::consts::{MAX_FRAME_DT, SIM_DT};
use crate::error::{ArcadeError, Result};
use crate::highscores::{HighScores, ScoreStore};
use crate::renderer::{Backdrop, Hud, Palette, Surface, render};
use crate::settings::Settings;
use crate::sim::{
    GameRules, InputController, RawInput, Shape, SimulationState, StepReport, new_state_with, step,
};

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Not scheduled (before start, after stop)
    Idle,
    /// A frame callback is pending
    Running,
    /// The run ended; waiting for restart
    Terminal,
}

/// Identifier of a scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Per-frame callback scheduling (requestAnimationFrame in the browser)
pub trait FrameScheduler {
    /// Ask for one callback on the next frame
    fn request(&mut self) -> Option<FrameHandle>;
    /// Withdraw a pending callback
    fn cancel(&mut self, handle: FrameHandle);
}

/// Outstanding frame request, shared between a scheduler and teardown code.
///
/// Teardown can cancel through the slot while the driver (and the scheduler
/// it is handed) is still borrowed by a running callback.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot(Rc<Cell<Option<FrameHandle>>>);

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<FrameHandle> {
        self.0.get()
    }

    pub fn set(&self, handle: Option<FrameHandle>) {
        self.0.set(handle);
    }

    /// Clear the slot if it still holds `handle`
    pub fn release(&self, handle: FrameHandle) -> bool {
        if self.0.get() == Some(handle) {
            self.0.set(None);
            true
        } else {
            false
        }
    }

    pub fn take(&self) -> Option<FrameHandle> {
        self.0.take()
    }
}

/// Scheduler driven by hand: `fire` plays the platform's part
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    next: i32,
    pending: FrameSlot,
    pub requested: u32,
    pub cancelled: u32,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending callback, as the platform would when a frame arrives
    pub fn fire(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending.get()
    }

    /// Shared view of the pending callback
    pub fn slot(&self) -> FrameSlot {
        self.pending.clone()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request(&mut self) -> Option<FrameHandle> {
        self.next += 1;
        self.requested += 1;
        let handle = FrameHandle(self.next);
        self.pending.set(Some(handle));
        Some(handle)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.pending.release(handle) {
            self.cancelled += 1;
        }
    }
}

/// Invocation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub steps: u64,
    pub renders: u64,
    pub restarts: u32,
}

/// Runs one game on one surface
pub struct Driver<R: GameRules, S: Surface> {
    rules: R,
    surface: S,
    palette: Palette,
    backdrop: Backdrop<S::Image>,
    settings: Settings,
    store: Box<dyn ScoreStore>,
    high_scores: HighScores,
    state: SimulationState,
    input: InputController,
    phase: LoopPhase,
    pending: Option<FrameHandle>,
    last_time: Option<f64>,
    last_report: StepReport,
    stats: DriverStats,
}

impl<R: GameRules, S: Surface> Driver<R, S> {
    /// Set up a game on a surface. Fails if the surface cannot be drawn on;
    /// in that case nothing is scheduled and no state is created.
    pub fn new(
        rules: R,
        surface: S,
        settings: Settings,
        store: Box<dyn ScoreStore>,
        seed: u64,
    ) -> Result<Self> {
        if !surface.is_ready() {
            log::error!("Cannot start {}: drawing surface unavailable", rules.name());
            return Err(ArcadeError::SurfaceUnavailable);
        }

        let seed = settings.fixed_seed.unwrap_or(seed);
        let mut config = rules.config();
        settings.apply_to(&mut config);
        let state = new_state_with(&rules, config, seed);
        let high_scores = HighScores::load(store.as_ref(), rules.name());
        let palette = Palette::for_game(rules.name());

        let mut driver = Self {
            rules,
            surface,
            backdrop: Backdrop::solid(palette.background),
            palette,
            settings,
            store,
            high_scores,
            state,
            input: InputController::new(),
            phase: LoopPhase::Idle,
            pending: None,
            last_time: None,
            last_report: StepReport::default(),
            stats: DriverStats::default(),
        };
        driver.sync_aim_origin();
        log::info!(
            "{} ready (seed {}, {})",
            driver.rules.name(),
            seed,
            driver.settings.difficulty.as_str()
        );
        Ok(driver)
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn best_score(&self) -> Option<u64> {
        self.high_scores.best()
    }

    /// Report of the most recent step
    pub fn last_report(&self) -> &StepReport {
        &self.last_report
    }

    /// Frame callback currently scheduled, if any
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Replace the backdrop (e.g. when a background image starts loading)
    pub fn set_backdrop(&mut self, backdrop: Backdrop<S::Image>) {
        self.backdrop = backdrop;
    }

    pub fn backdrop_mut(&mut self) -> &mut Backdrop<S::Image> {
        &mut self.backdrop
    }

    /// Idle -> Running
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.phase != LoopPhase::Idle {
            log::debug!("start ignored in {:?}", self.phase);
            return;
        }
        self.phase = LoopPhase::Running;
        self.last_time = None;
        log::info!("{} started", self.rules.name());
        self.schedule(scheduler);
    }

    /// Feed one input event. Only the intent buffer changes, except that a
    /// restart request while Terminal restarts the run.
    pub fn handle_input(&mut self, event: &RawInput, scheduler: &mut dyn FrameScheduler) {
        self.input.handle(event);
        if self.phase == LoopPhase::Terminal && self.input.intent().restart {
            self.restart(scheduler);
        }
    }

    /// One frame: step, render, reschedule. Returns the phase afterwards.
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        time_ms: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> LoopPhase {
        if self.phase != LoopPhase::Running || self.pending != Some(handle) {
            return self.phase;
        }
        self.pending = None;

        let dt = match self.last_time {
            Some(last) if time_ms.is_finite() => {
                (((time_ms - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT)
            }
            _ => SIM_DT,
        };
        if time_ms.is_finite() {
            self.last_time = Some(time_ms);
        }

        let intent = self.input.take();
        self.last_report = step(&self.rules, &mut self.state, &intent, dt);
        self.stats.steps += 1;

        if self.state.terminal {
            self.high_scores.record(self.store.as_mut(), self.state.score);
            self.phase = LoopPhase::Terminal;
            log::info!(
                "{} over: score {} (best {:?})",
                self.rules.name(),
                self.state.score,
                self.high_scores.best()
            );
        }

        self.draw();

        if self.phase == LoopPhase::Running {
            self.schedule(scheduler);
        }
        self.phase
    }

    /// Fresh state and back to Running (from any phase)
    pub fn restart(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        let seed = self.settings.fixed_seed.unwrap_or_else(|| next_seed(self.state.seed));
        let mut config = self.rules.config();
        self.settings.apply_to(&mut config);
        self.state = new_state_with(&self.rules, config, seed);
        self.input.reset();
        self.sync_aim_origin();
        self.last_report = StepReport::default();
        self.stats.restarts += 1;
        self.phase = LoopPhase::Running;
        self.last_time = None;
        log::info!("{} restarted with seed {}", self.rules.name(), seed);
        self.schedule(scheduler);
    }

    /// Cancel the pending frame and go Idle. No step or render runs after this.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        if self.phase != LoopPhase::Idle {
            log::info!("{} stopped", self.rules.name());
        }
        self.phase = LoopPhase::Idle;
        self.input.reset();
    }

    fn schedule(&mut self, scheduler: &mut dyn FrameScheduler) {
        match scheduler.request() {
            Some(handle) => self.pending = Some(handle),
            None => {
                log::error!("Frame callback could not be scheduled, stopping");
                self.phase = LoopPhase::Idle;
            }
        }
    }

    fn draw(&mut self) {
        let hud = Hud {
            visible: self.settings.show_hud,
            best: self.high_scores.best(),
        };
        render(
            &self.state,
            &self.palette,
            &self.backdrop,
            &hud,
            &mut self.surface,
        );
        self.stats.renders += 1;
    }

    /// Aim angles are measured from a circular player (launcher)
    fn sync_aim_origin(&mut self) {
        if let Some(player) = self.state.player() {
            if matches!(player.shape, Shape::Circle { .. }) {
                self.input.set_aim_origin(player.pos);
            }
        }
    }
}

/// Seed for the run after one with `seed`
fn next_seed(seed: u64) -> u64 {
    seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{BubbleShooter, CarRacing};
    use crate::highscores::MemoryStore;
    use crate::renderer::RecordingSurface;
    use crate::sim::{ActorKind, Key};
    use glam::Vec2;

    type TestDriver = Driver<CarRacing, RecordingSurface>;

    fn driver() -> TestDriver {
        let settings = Settings {
            fixed_seed: Some(77),
            ..Default::default()
        };
        match Driver::new(
            CarRacing,
            RecordingSurface::new(400.0, 600.0),
            settings,
            Box::new(MemoryStore::new()),
            1,
        ) {
            Ok(d) => d,
            Err(e) => panic!("driver setup failed: {e}"),
        }
    }

    /// Run frames until terminal or `max` frames, 60 Hz timestamps
    fn pump(driver: &mut TestDriver, scheduler: &mut ManualScheduler, max: u32) -> u32 {
        let mut frames = 0;
        let mut time = 0.0;
        while frames < max {
            let Some(handle) = scheduler.fire() else {
                break;
            };
            time += 1000.0 / 60.0;
            driver.on_frame(handle, time, scheduler);
            frames += 1;
        }
        frames
    }

    fn crash(driver: &mut TestDriver) {
        let pos = driver.state().player().map(|p| p.pos).unwrap_or_default();
        driver.state.spawn(
            ActorKind::Obstacle,
            pos,
            Shape::Rect {
                width: 10.0,
                height: 10.0,
            },
            Vec2::ZERO,
        );
    }

    #[test]
    fn test_missing_surface_is_fatal() {
        let result = Driver::new(
            CarRacing,
            RecordingSurface::new(0.0, 0.0),
            Settings::default(),
            Box::new(MemoryStore::new()),
            1,
        );
        assert!(matches!(result, Err(ArcadeError::SurfaceUnavailable)));
    }

    #[test]
    fn test_start_schedules_one_frame() {
        let mut d = driver();
        let mut s = ManualScheduler::new();
        assert_eq!(d.phase(), LoopPhase::Idle);
        d.start(&mut s);
        assert_eq!(d.phase(), LoopPhase::Running);
        assert_eq!(s.requested, 1);
        d.start(&mut s);
        assert_eq!(s.requested, 1);
    }

    #[test]
    fn test_each_frame_steps_then_renders() {
        let mut d = driver();
        let mut s = ManualScheduler::new();
        d.start(&mut s);
        let frames = pump(&mut d, &mut s, 10);
        assert_eq!(frames, 10);
        assert_eq!(d.stats().steps, 10);
        assert_eq!(d.stats().renders, 10);
        assert_eq!(d.surface().frames, 10);
        assert_eq!(d.state().time_ticks, 10);
    }

    #[test]
    fn test_terminal_stops_rescheduling() {
        let mut d = driver();
        let mut s = ManualScheduler::new();
        d.start(&mut s);
        crash(&mut d);
        pump(&mut d, &mut s, 100);
        assert_eq!(d.phase(), LoopPhase::Terminal);
        assert_eq!(d.stats().steps, 1);
        // Final frame is still drawn
        assert_eq!(d.stats().renders, 1);
        assert!(d.surface().texts().any(|t| t == "Game over"));
        assert!(s.pending().is_none());
    }

    #[test]
    fn test_stop_mid_run_prevents_further_work() {
        let mut d = driver();
        let mut s = ManualScheduler::new();
        d.start(&mut s);
        pump(&mut d, &mut s, 5);
        let stale = d.pending_frame();
        d.stop(&mut s);
        let before = d.stats();
        assert_eq!(s.cancelled, 1);
        assert!(s.pending().is_none());

        // A late callback for the cancelled handle does nothing
        if let Some(handle) = stale {
            d.on_frame(handle, 10_000.0, &mut s);
        }
        assert_eq!(pump(&mut d, &mut s, 10), 0);
        assert_eq!(d.stats(), before);
        assert_eq!(d.phase(), LoopPhase::Idle);
    }

    #[test]
    fn test_cancel_through_slot_without_driver() {
        let mut d = driver();
        let mut s = ManualScheduler::new();
        let slot = s.slot();
        d.start(&mut s);
        pump(&mut d, &mut s, 3);
        assert_eq!(slot.get(), d.pending_frame());

        // Driver still borrowed elsewhere: cancel through the shared slot
        let stale = slot.take();
        assert!(stale.is_some());
        let before = d.stats();
        assert_eq!(pump(&mut d, &mut s, 10), 0);
        assert_eq!(d.stats(), before);
        // Releasing a handle that is no longer pending is a no-op
        if let Some(handle) = stale {
            assert!(!slot.release(handle));
        }
    }

    #[test]
    fn test_restart_resets_state() {
        let mut d = driver();
        let mut s = ManualScheduler::new();
        d.start(&mut s);
        d.state.score = 9;
        crash(&mut d);
        pump(&mut d, &mut s, 5);
        assert_eq!(d.phase(), LoopPhase::Terminal);

        d.handle_input(&RawInput::KeyDown(Key::Restart), &mut s);
        assert_eq!(d.phase(), LoopPhase::Running);
        assert_eq!(d.state().score, 0);
        assert!(!d.state().terminal);
        assert_eq!(d.state().actors.len(), 1);
        assert_eq!(d.state().count_kind(ActorKind::Player), 1);
        assert_eq!(d.stats().restarts, 1);
        assert!(s.pending().is_some());
    }

    #[test]
    fn test_high_score_written_on_terminal() {
        let mut d = driver();
        let mut s = ManualScheduler::new();
        d.start(&mut s);
        d.state.score = 5;
        crash(&mut d);
        pump(&mut d, &mut s, 5);
        assert_eq!(d.best_score(), Some(5));
        assert_eq!(d.store.read(&HighScores::key_for("car-racing")).as_deref(), Some("5"));
    }

    #[test]
    fn test_input_between_frames_is_last_write_wins() {
        let mut d = driver();
        let mut s = ManualScheduler::new();
        d.start(&mut s);
        let x0 = d.state().player().map(|p| p.pos.x).unwrap_or_default();
        d.handle_input(&RawInput::KeyDown(Key::Left), &mut s);
        d.handle_input(&RawInput::KeyUp(Key::Left), &mut s);
        d.handle_input(&RawInput::KeyDown(Key::Right), &mut s);
        // Nothing moves until the next frame
        assert_eq!(d.state().player().map(|p| p.pos.x), Some(x0));
        pump(&mut d, &mut s, 1);
        let x1 = d.state().player().map(|p| p.pos.x).unwrap_or_default();
        assert!(x1 > x0);
    }

    #[test]
    fn test_long_frame_gap_is_clamped() {
        let mut d = driver();
        let mut s = ManualScheduler::new();
        d.start(&mut s);
        d.handle_input(&RawInput::KeyDown(Key::Right), &mut s);
        let x0 = d.state().player().map(|p| p.pos.x).unwrap_or_default();
        if let Some(h) = s.fire() {
            d.on_frame(h, 0.0, &mut s);
        }
        if let Some(h) = s.fire() {
            // Five seconds later (tab was hidden)
            d.on_frame(h, 5000.0, &mut s);
        }
        let x1 = d.state().player().map(|p| p.pos.x).unwrap_or_default();
        let max_travel = 300.0 * (SIM_DT + MAX_FRAME_DT);
        assert!(x1 - x0 <= max_travel + 1e-3);
    }

    #[test]
    fn test_aim_origin_follows_launcher() {
        let mut d = match Driver::new(
            BubbleShooter,
            RecordingSurface::new(400.0, 600.0),
            Settings::default(),
            Box::new(MemoryStore::new()),
            3,
        ) {
            Ok(d) => d,
            Err(e) => panic!("driver setup failed: {e}"),
        };
        let mut s = ManualScheduler::new();
        d.start(&mut s);
        let launcher = d.state().player().map(|p| p.pos).unwrap_or_default();
        d.handle_input(
            &RawInput::PointerDown {
                x: launcher.x,
                y: launcher.y - 100.0,
            },
            &mut s,
        );
        if let Some(h) = s.fire() {
            d.on_frame(h, 16.0, &mut s);
        }
        assert_eq!(d.state().count_kind(ActorKind::Projectile), 1);
        assert!(d.state().heading.y < -0.99);
    }
}
