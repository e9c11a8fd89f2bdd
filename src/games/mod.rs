//! Game rules
//!
//! Each game is a `GameRules` implementation plugged into the shared
//! simulation step and loop driver.

pub mod bubble_shooter;
pub mod car_racing;
pub mod snake;

pub use bubble_shooter::BubbleShooter;
pub use car_racing::CarRacing;
pub use snake::Snake;

use crate::error::{ArcadeError, Result};
use crate::sim::GameRules;

/// Names accepted by `by_name`
pub const ALL: [&str; 3] = [car_racing::NAME, bubble_shooter::NAME, snake::NAME];

/// Look up a game by its name
pub fn by_name(name: &str) -> Result<Box<dyn GameRules>> {
    match name {
        car_racing::NAME => Ok(Box::new(CarRacing)),
        bubble_shooter::NAME => Ok(Box::new(BubbleShooter)),
        snake::NAME => Ok(Box::new(Snake)),
        other => Err(ArcadeError::UnknownGame(other.to_string())),
    }
}
