//! Collision detection between actors
//!
//! Circles, centred rectangles and the mixed case. Every test is written so
//! that `overlaps(a, b) == overlaps(b, a)`; touching exactly at the boundary
//! is not a hit.
//!
//! Pairs are found with a plain nested loop. A game holds a handful of
//! actors, so there is no broad phase.

use glam::Vec2;

use super::actor::{Actor, ActorId, ActorKind, Shape};

/// One side of a detected overlap. Each hit is reported twice, once from
/// each actor's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Contact {
    pub a: ActorId,
    pub a_kind: ActorKind,
    pub b: ActorId,
    pub b_kind: ActorKind,
}

impl Contact {
    /// The same contact seen from the other actor
    pub fn mirrored(&self) -> Self {
        Self {
            a: self.b,
            a_kind: self.b_kind,
            b: self.a,
            b_kind: self.a_kind,
        }
    }
}

/// Circle vs circle: strictly closer than the sum of radii
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

/// Circle vs centred rectangle, via the nearest point on the rectangle
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect_center: Vec2, half: Vec2) -> bool {
    let nearest = center.clamp(rect_center - half, rect_center + half);
    center.distance_squared(nearest) < radius * radius
}

/// Shape overlap test for two actors
pub fn overlaps(a: &Actor, b: &Actor) -> bool {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circles_overlap(a.pos, ra, b.pos, rb)
        }
        (Shape::Rect { .. }, Shape::Rect { .. }) => a.bounds().overlaps(&b.bounds()),
        (Shape::Circle { radius }, Shape::Rect { .. }) => {
            circle_rect_overlap(a.pos, radius, b.pos, b.shape.half_extents())
        }
        (Shape::Rect { .. }, Shape::Circle { radius }) => {
            circle_rect_overlap(b.pos, radius, a.pos, a.shape.half_extents())
        }
    }
}

/// Find every overlapping pair whose kinds `interacts` accepts.
///
/// Each unordered pair is tested once; a hit yields both `(a, b)` and
/// `(b, a)`. The actors are not modified, so callers can process the whole
/// list before removing anything.
pub fn detect_contacts<F>(actors: &[Actor], interacts: F) -> Vec<Contact>
where
    F: Fn(ActorKind, ActorKind) -> bool,
{
    let mut contacts = Vec::new();
    for (i, a) in actors.iter().enumerate() {
        for b in &actors[i + 1..] {
            if !interacts(a.kind, b.kind) && !interacts(b.kind, a.kind) {
                continue;
            }
            if overlaps(a, b) {
                let contact = Contact {
                    a: a.id,
                    a_kind: a.kind,
                    b: b.id,
                    b_kind: b.kind,
                };
                contacts.push(contact);
                contacts.push(contact.mirrored());
            }
        }
    }
    contacts
}
