//! Simulated entities
//!
//! Every moving thing in a game is an `Actor`: the player, whatever it must
//! dodge or shoot, projectiles, food and snake body segments.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable entity identifier (allocated in increasing order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// What an actor is, used by game rules to decide interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Player,
    Obstacle,
    Projectile,
    /// Collectible (snake food)
    Pickup,
    /// Trailing body piece that follows the player
    Segment,
}

/// Bounding geometry, centred on the actor position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

impl Shape {
    /// Half extents of the axis-aligned box enclosing the shape
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rect { width, height } => Vec2::new(width, height) * 0.5,
        }
    }
}

/// Axis-aligned box (min corner, max corner)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// A simulated entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub pos: Vec2,
    /// Velocity in pixels per second at difficulty 1.0
    pub vel: Vec2,
    pub shape: Shape,
}

impl Actor {
    pub fn new(id: ActorId, kind: ActorKind, pos: Vec2, shape: Shape) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            shape,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn bounds(&self) -> Aabb {
        let half = self.shape.half_extents();
        Aabb {
            min: self.pos - half,
            max: self.pos + half,
        }
    }

    /// Position and velocity hold no NaN/Infinity
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }

    /// True once the bounding box lies completely outside `[0, size]`
    pub fn is_outside(&self, size: Vec2) -> bool {
        let b = self.bounds();
        b.max.x < 0.0 || b.min.x > size.x || b.max.y < 0.0 || b.min.y > size.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_bounds_are_centred() {
        let actor = Actor::new(
            ActorId(1),
            ActorKind::Obstacle,
            Vec2::new(50.0, 50.0),
            Shape::Rect {
                width: 20.0,
                height: 40.0,
            },
        );
        let b = actor.bounds();
        assert_eq!(b.min, Vec2::new(40.0, 30.0));
        assert_eq!(b.max, Vec2::new(60.0, 70.0));
    }

    #[test]
    fn test_is_outside() {
        let size = Vec2::new(100.0, 100.0);
        let mut actor = Actor::new(
            ActorId(1),
            ActorKind::Obstacle,
            Vec2::new(50.0, 105.0),
            Shape::Circle { radius: 10.0 },
        );
        // Still overlapping the bottom edge
        assert!(!actor.is_outside(size));
        actor.pos.y = 111.0;
        assert!(actor.is_outside(size));
    }

    #[test]
    fn test_non_finite_detected() {
        let mut actor = Actor::new(
            ActorId(1),
            ActorKind::Projectile,
            Vec2::ZERO,
            Shape::Circle { radius: 1.0 },
        );
        assert!(actor.is_finite());
        actor.vel.x = f32::INFINITY;
        assert!(!actor.is_finite());
    }
}
