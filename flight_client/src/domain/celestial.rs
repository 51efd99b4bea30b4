use super::collision::{BodyId, CollisionEngine, ColliderError, Landmark};
use glam::Vec3;
use std::f64::consts::TAU;

pub const GLOBE_RADIUS: f32 = 95.0;
pub const SUN_RADIUS: f32 = 800.0;
pub const MOON_RADIUS: f32 = 50.0;

const START_ANGLE: f64 = 70.0;
const ANGULAR_SPEED: f64 = 0.0005;
const ORBIT_RADIUS: f64 = 10_000.0;

/// Sun and moon positions on their shared, deliberately non-physical orbit.
#[derive(Debug, Clone)]
pub struct CelestialOrbit {
    // Radians; kept in f64 so the per-tick step does not drift.
    angle: f64,
}

impl Default for CelestialOrbit {
    fn default() -> Self {
        Self { angle: START_ANGLE }
    }
}

impl CelestialOrbit {
    pub fn advance(&mut self) {
        self.angle += ANGULAR_SPEED;
    }

    pub fn sun(&self) -> Vec3 {
        let (sin, cos) = self.angle.sin_cos();
        Vec3::new(
            (ORBIT_RADIUS * cos) as f32,
            (ORBIT_RADIUS * sin) as f32,
            (ORBIT_RADIUS * sin) as f32,
        )
    }

    // Always opposite the sun, ten times closer.
    pub fn moon(&self) -> Vec3 {
        -self.sun() / 10.0
    }

    /// Time of day in hours, derived from the orbit angle.
    pub fn hour_of_day(&self) -> f64 {
        self.angle.rem_euclid(TAU) / TAU * 24.0
    }

    /// Registers the globe, sun and moon as fixed colliders.
    pub fn register(&self, engine: &mut CollisionEngine) -> Result<(), ColliderError> {
        engine.register_landmark(BodyId::Landmark(Landmark::Globe), GLOBE_RADIUS, Vec3::ZERO)?;
        engine.register_landmark(BodyId::Landmark(Landmark::Sun), SUN_RADIUS, self.sun())?;
        engine.register_landmark(BodyId::Landmark(Landmark::Moon), MOON_RADIUS, self.moon())?;
        Ok(())
    }

    pub fn sync(&self, engine: &mut CollisionEngine) {
        engine.move_landmark(&BodyId::Landmark(Landmark::Sun), self.sun());
        engine.move_landmark(&BodyId::Landmark(Landmark::Moon), self.moon());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collision::CollisionTuning;
    use tokio::sync::mpsc;

    #[test]
    fn when_orbit_advances_then_sun_stays_on_its_path_and_moon_mirrors_it() {
        let mut orbit = CelestialOrbit::default();
        for _ in 0..1000 {
            orbit.advance();
        }

        let sun = orbit.sun();
        let angle = START_ANGLE + 1000.0 * ANGULAR_SPEED;
        assert!((sun.x as f64 - ORBIT_RADIUS * angle.cos()).abs() < 1e-2);
        assert_eq!(sun.y, sun.z);
        assert!((orbit.moon() + sun / 10.0).length() < 1e-3);
    }

    #[test]
    fn when_hour_is_read_then_it_falls_within_a_day() {
        let hour = CelestialOrbit::default().hour_of_day();

        assert!((0.0..24.0).contains(&hour));
    }

    #[test]
    fn when_landmarks_are_synced_then_engine_follows_the_orbit() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut engine = CollisionEngine::new(CollisionTuning::default(), tx);
        let mut orbit = CelestialOrbit::default();
        orbit.register(&mut engine).expect("landmark radii are positive");

        orbit.advance();
        orbit.sync(&mut engine);

        let sun = engine
            .collider(&BodyId::Landmark(Landmark::Sun))
            .expect("sun is registered");
        assert_eq!(sun.center, orbit.sun());
        assert_eq!(sun.radius, SUN_RADIUS);
        assert_eq!(engine.len(), 3);
    }
}
