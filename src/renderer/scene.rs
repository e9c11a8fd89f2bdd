//! Frame composition
//!
//! `render` draws a full frame from the simulation state. It only reads the
//! state and always starts by clearing the whole surface.

use glam::Vec2;

use super::backdrop::Backdrop;
use super::surface::{Color, Surface};
use crate::games::{bubble_shooter, car_racing, snake};
use crate::sim::{ActorKind, Shape, SimulationState};

/// Colors for one game
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub player: Color,
    pub obstacle: Color,
    pub projectile: Color,
    pub pickup: Color,
    pub segment: Color,
    pub text: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::rgb(18, 18, 28),
            player: Color::rgb(80, 200, 255),
            obstacle: Color::rgb(240, 90, 90),
            projectile: Color::rgb(255, 230, 120),
            pickup: Color::rgb(120, 230, 120),
            segment: Color::rgb(60, 160, 220),
            text: Color::rgb(240, 240, 240),
        }
    }
}

impl Palette {
    /// Palette for a game name; unknown names get the default
    pub fn for_game(name: &str) -> Self {
        match name {
            car_racing::NAME => Self {
                background: Color::rgb(60, 60, 66),
                player: Color::rgb(250, 200, 40),
                obstacle: Color::rgb(220, 50, 60),
                ..Self::default()
            },
            bubble_shooter::NAME => Self {
                background: Color::rgb(20, 24, 60),
                player: Color::rgb(200, 200, 220),
                obstacle: Color::rgb(120, 180, 255),
                ..Self::default()
            },
            snake::NAME => Self {
                background: Color::rgb(16, 40, 20),
                player: Color::rgb(150, 240, 90),
                segment: Color::rgb(90, 190, 60),
                pickup: Color::rgb(240, 70, 70),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    fn for_kind(&self, kind: ActorKind) -> Color {
        match kind {
            ActorKind::Player => self.player,
            ActorKind::Obstacle => self.obstacle,
            ActorKind::Projectile => self.projectile,
            ActorKind::Pickup => self.pickup,
            ActorKind::Segment => self.segment,
        }
    }
}

/// Heads-up display options
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hud {
    pub visible: bool,
    /// Best score on record for this game
    pub best: Option<u64>,
}

const HUD_TEXT_PX: f32 = 18.0;
const BANNER_TEXT_PX: f32 = 32.0;
/// Distance of the aim marker from the player centre
const AIM_MARKER_DISTANCE: f32 = 34.0;

/// Draw one frame
pub fn render<S: Surface>(
    state: &SimulationState,
    palette: &Palette,
    backdrop: &Backdrop<S::Image>,
    hud: &Hud,
    surface: &mut S,
) {
    surface.clear(backdrop.fallback());
    if let Some(image) = backdrop.image() {
        surface.draw_image(image);
    }

    for actor in &state.actors {
        let color = palette.for_kind(actor.kind);
        match actor.shape {
            Shape::Circle { radius } => surface.fill_circle(actor.pos, radius, color),
            Shape::Rect { width, height } => {
                surface.fill_rect(actor.pos, Vec2::new(width, height), color)
            }
        }
    }

    // Aim marker for launcher-style players
    if let Some(player) = state.player() {
        if matches!(player.shape, Shape::Circle { .. }) && state.heading != Vec2::ZERO {
            let marker = player.pos + state.heading * AIM_MARKER_DISTANCE;
            surface.fill_circle(marker, 3.0, palette.projectile);
        }
    }

    let field = state.playfield();
    if hud.visible {
        surface.fill_text(
            Vec2::new(10.0, 24.0),
            &format!("Score: {}", state.score),
            HUD_TEXT_PX,
            palette.text,
        );
        if let Some(best) = hud.best {
            surface.fill_text(
                Vec2::new(field.x - 110.0, 24.0),
                &format!("Best: {best}"),
                HUD_TEXT_PX,
                palette.text,
            );
        }
    }

    if state.terminal {
        let center = field * 0.5;
        surface.fill_rect(
            center,
            Vec2::new(field.x, 110.0),
            Color::rgba(0, 0, 0, 170),
        );
        surface.fill_text(
            center - Vec2::new(80.0, 10.0),
            "Game over",
            BANNER_TEXT_PX,
            palette.text,
        );
        surface.fill_text(
            center + Vec2::new(-95.0, 30.0),
            &format!("Score {} - press R", state.score),
            HUD_TEXT_PX,
            palette.text,
        );
    }
}
