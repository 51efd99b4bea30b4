// Sphere collision between the local craft and everything else in the scene.

use super::body::Body;
use glam::Vec3;
use std::{collections::HashMap, fmt, time::Duration};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Globe,
    Sun,
    Moon,
}

/// Anything that can own a collider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BodyId {
    Local,
    Peer(String),
    Landmark(Landmark),
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyId::Local => write!(f, "local"),
            BodyId::Peer(id) => write!(f, "peer:{id}"),
            BodyId::Landmark(landmark) => write!(f, "{landmark:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    // Center follows the owning body, refreshed on every check.
    Tracked,
    // Center only changes through `move_landmark`.
    Fixed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub id: BodyId,
    pub radius: f32,
    pub center: Vec3,
    pub anchor: Anchor,
}

/// One resolved contact, as seen from the focal body.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    pub focal: BodyId,
    pub other: BodyId,
    // Focal position after push-out.
    pub point: Vec3,
    // Unit vector from the other collider toward the focal body.
    pub normal: Vec3,
    pub at: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColliderError {
    InvalidRadius { id: BodyId, radius: f32 },
}

impl fmt::Display for ColliderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColliderError::InvalidRadius { id, radius } => {
                write!(f, "collider {id} needs a positive radius, got {radius}")
            }
        }
    }
}

impl std::error::Error for ColliderError {}

/// Gameplay tuning for collision response.
#[derive(Debug, Clone, Copy)]
pub struct CollisionTuning {
    /// Velocity multiplier applied after reflection.
    pub damping: f32,

    /// Distance the focal body is moved along the contact normal.
    pub push_out: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            damping: 0.5,
            push_out: 5.0,
        }
    }
}

// Source of current positions for tracked colliders.
pub trait BodyPositions {
    fn position_of(&self, id: &BodyId) -> Option<Vec3>;
}

impl BodyPositions for HashMap<BodyId, Vec3> {
    fn position_of(&self, id: &BodyId) -> Option<Vec3> {
        self.get(id).copied()
    }
}

/// Registry of colliders plus the resolution step for one focal body.
///
/// Colliders are kept in registration order; that order decides which pair
/// is resolved first when a body overlaps several others in one check.
pub struct CollisionEngine {
    colliders: Vec<Collider>,
    tuning: CollisionTuning,
    events: mpsc::UnboundedSender<CollisionEvent>,
}

impl CollisionEngine {
    pub fn new(tuning: CollisionTuning, events: mpsc::UnboundedSender<CollisionEvent>) -> Self {
        Self {
            colliders: Vec::new(),
            tuning,
            events,
        }
    }

    /// Registers a tracked collider. Re-registering replaces the radius and
    /// keeps the original slot.
    pub fn register(&mut self, id: BodyId, radius: f32) -> Result<(), ColliderError> {
        self.insert(id, radius, Vec3::ZERO, Anchor::Tracked)
    }

    /// Registers an immovable collider centred at `position`.
    pub fn register_landmark(
        &mut self,
        id: BodyId,
        radius: f32,
        position: Vec3,
    ) -> Result<(), ColliderError> {
        self.insert(id, radius, position, Anchor::Fixed)
    }

    fn insert(
        &mut self,
        id: BodyId,
        radius: f32,
        center: Vec3,
        anchor: Anchor,
    ) -> Result<(), ColliderError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ColliderError::InvalidRadius { id, radius });
        }

        if let Some(existing) = self.colliders.iter_mut().find(|c| c.id == id) {
            existing.radius = radius;
            if anchor == Anchor::Fixed {
                existing.center = center;
            }
            existing.anchor = anchor;
            return Ok(());
        }

        self.colliders.push(Collider {
            id,
            radius,
            center,
            anchor,
        });
        Ok(())
    }

    pub fn unregister(&mut self, id: &BodyId) -> bool {
        let before = self.colliders.len();
        self.colliders.retain(|c| &c.id != id);
        before != self.colliders.len()
    }

    /// Repositions a fixed collider. Returns false if `id` is not one.
    pub fn move_landmark(&mut self, id: &BodyId, position: Vec3) -> bool {
        match self
            .colliders
            .iter_mut()
            .find(|c| &c.id == id && c.anchor == Anchor::Fixed)
        {
            Some(collider) => {
                collider.center = position;
                true
            }
            None => false,
        }
    }

    pub fn collider(&self, id: &BodyId) -> Option<&Collider> {
        self.colliders.iter().find(|c| &c.id == id)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Tests `focal` against every other collider and resolves overlaps.
    ///
    /// Each resolved pair reflects and damps the body's velocity, pushes the
    /// body out along the contact normal and publishes one event. Later pairs
    /// see the corrected position. Returns the number of resolved pairs; an
    /// unregistered focal resolves nothing.
    pub fn check(
        &mut self,
        focal: &BodyId,
        body: &mut Body,
        positions: &impl BodyPositions,
        at: Duration,
    ) -> usize {
        let Some(focal_radius) = self.collider(focal).map(|c| c.radius) else {
            return 0;
        };

        let mut resolved = 0;
        for collider in self.colliders.iter_mut() {
            if &collider.id == focal {
                continue;
            }
            if collider.anchor == Anchor::Tracked {
                match positions.position_of(&collider.id) {
                    Some(position) => collider.center = position,
                    None => {
                        debug!(id = %collider.id, "tracked collider has no body; skipped");
                        continue;
                    }
                }
            }

            let separation = body.position - collider.center;
            if separation.length() >= focal_radius + collider.radius {
                continue;
            }
            let Some(normal) = separation.try_normalize() else {
                debug!(focal = %focal, other = %collider.id, "coincident colliders; skipped");
                continue;
            };

            body.velocity =
                (body.velocity - 2.0 * body.velocity.dot(normal) * normal) * self.tuning.damping;
            body.position += normal * self.tuning.push_out;
            resolved += 1;

            let event = CollisionEvent {
                focal: focal.clone(),
                other: collider.id.clone(),
                point: body.position,
                normal,
                at,
            };
            if self.events.send(event).is_err() {
                debug!("collision listener gone; event dropped");
            }
        }

        if let Some(own) = self.colliders.iter_mut().find(|c| &c.id == focal) {
            own.center = body.position;
        }
        resolved
    }
}
