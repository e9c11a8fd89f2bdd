//! Mini Arcade entry point
//!
//! The browser build is driven from JavaScript through `platform::mount`.
//! Natively this runs a game headless with a simple autopilot:
//!
//! ```text
//! mini-arcade [game] [seed] [frames]
//! ```

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let game = args.next().unwrap_or_else(|| "car-racing".to_string());
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let frames = args.next().and_then(|s| s.parse().ok()).unwrap_or(3600);

    if let Err(e) = headless::run(&game, seed, frames) {
        log::error!("{}", e);
        eprintln!("error: {e} (games: {})", mini_arcade::games::ALL.join(", "));
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::mount, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use mini_arcade::consts::SIM_DT;
    use mini_arcade::games::{self, bubble_shooter, car_racing, snake};
    use mini_arcade::renderer::RecordingSurface;
    use mini_arcade::sim::{ActorKind, RawInput, SimulationState};
    use mini_arcade::{Driver, LoopPhase, ManualScheduler, MemoryStore, Result, Settings};

    /// Ticks between autopilot shots
    const SHOT_EVERY: u32 = 15;

    pub fn run(game: &str, seed: u64, frames: u32) -> Result<()> {
        let rules = games::by_name(game)?;
        let field = rules.config().playfield;
        let settings = Settings {
            fixed_seed: Some(seed),
            ..Settings::default()
        };
        let mut driver = Driver::new(
            rules,
            RecordingSurface::new(field.x, field.y),
            settings,
            Box::new(MemoryStore::new()),
            seed,
        )?;
        let mut scheduler = ManualScheduler::new();
        driver.start(&mut scheduler);

        let mut time_ms = 0.0;
        let mut frame = 0;
        while frame < frames {
            let Some(handle) = scheduler.fire() else {
                break;
            };
            if let Some(event) = autopilot(game, driver.state(), frame) {
                driver.handle_input(&event, &mut scheduler);
            }
            time_ms += SIM_DT as f64 * 1000.0;
            if driver.on_frame(handle, time_ms, &mut scheduler) == LoopPhase::Terminal {
                break;
            }
            frame += 1;
        }

        let state = driver.state();
        let stats = driver.stats();
        println!(
            "{game}: score {} after {} ticks (difficulty {:.2}, {} actors){}",
            state.score,
            state.time_ticks,
            state.difficulty,
            state.actors.len(),
            if state.terminal { ", game over" } else { "" }
        );
        println!("frames stepped {}, rendered {}", stats.steps, stats.renders);
        if let Some(best) = driver.best_score() {
            println!("best {best}");
        }
        Ok(())
    }

    /// One input event per frame, chosen from the visible state
    fn autopilot(game: &str, state: &SimulationState, frame: u32) -> Option<RawInput> {
        let player = state.player()?.pos;
        match game {
            car_racing::NAME => {
                let x = safest_lane(state, player);
                Some(RawInput::PointerMove { x, y: player.y })
            }
            bubble_shooter::NAME => {
                let target = state
                    .actors
                    .iter()
                    .filter(|a| a.kind == ActorKind::Obstacle)
                    .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))?;
                let lead = target.pos + target.vel * 0.3;
                if frame % SHOT_EVERY == 0 {
                    Some(RawInput::PointerDown { x: lead.x, y: lead.y })
                } else {
                    Some(RawInput::PointerMove { x: lead.x, y: lead.y })
                }
            }
            snake::NAME => {
                let food = state
                    .actors
                    .iter()
                    .find(|a| a.kind == ActorKind::Pickup)?;
                Some(RawInput::PointerMove {
                    x: food.pos.x,
                    y: food.pos.y,
                })
            }
            _ => None,
        }
    }

    /// Lane centre with the most room ahead, preferring lanes near the car
    fn safest_lane(state: &SimulationState, player: Vec2) -> f32 {
        let field = state.playfield();
        let lane_width = field.x / car_racing::LANES as f32;
        (0..car_racing::LANES)
            .map(|lane| {
                let x = (lane as f32 + 0.5) * lane_width;
                let gap = state
                    .actors
                    .iter()
                    .filter(|a| a.kind == ActorKind::Obstacle)
                    .filter(|a| (a.pos.x - x).abs() < lane_width / 2.0 && a.pos.y < player.y + 40.0)
                    .map(|a| player.y - a.pos.y)
                    .fold(f32::INFINITY, f32::min);
                (x, gap.min(field.y) - (x - player.x).abs() * 0.5)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(x, _)| x)
            .unwrap_or(player.x)
    }
}
