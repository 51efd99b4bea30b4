// Per-tick integration of the local craft.

use super::body::Body;
use flight_protocol::BodyState;
use glam::Vec3;

const GLOBE_RADIUS: f32 = 100.0;

/// Owns the local [`Body`] and advances it one tick at a time.
///
/// Integration is deterministic: the same forces applied to the same state
/// always yield the same result. Callers must not feed NaN or infinite forces.
#[derive(Debug, Clone, Default)]
pub struct FlightModel {
    body: Body,
}

impl FlightModel {
    pub fn new(body: Body) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Accumulates a force for the current tick. No clamping happens here.
    pub fn apply_force(&mut self, force: Vec3) {
        self.body.acceleration += force;
    }

    /// Advances the body by exactly one tick.
    pub fn integrate(&mut self) {
        let body = &mut self.body;
        body.velocity += body.acceleration;
        body.velocity *= body.drag;
        body.velocity = body.velocity.clamp_length_max(body.max_speed);
        body.position += body.velocity;
        body.acceleration = Vec3::ZERO;
    }

    pub fn state(&self) -> BodyState {
        self.body.state()
    }

    pub fn telemetry(&self) -> FlightTelemetry {
        FlightTelemetry::of(&self.body)
    }
}

/// Readouts derived from the body, in display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightTelemetry {
    pub speed: f32,
    pub altitude: f32,
    // Degrees.
    pub latitude: f32,
    pub longitude: f32,
}

impl FlightTelemetry {
    pub fn of(body: &Body) -> Self {
        let up = body.position.normalize_or_zero();
        Self {
            speed: body.velocity.length() * 100.0,
            altitude: (body.position.length() - GLOBE_RADIUS) * 100.0,
            latitude: up.y.clamp(-1.0, 1.0).asin().to_degrees(),
            longitude: up.x.atan2(up.z).to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::body::LOCAL_START;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn when_single_forward_force_is_integrated_then_drag_applies_once() {
        let mut model = FlightModel::new(Body::at(LOCAL_START));

        model.apply_force(Vec3::new(0.0, 0.0, -0.1));
        model.integrate();

        let body = model.body();
        assert!(approx(body.velocity, Vec3::new(0.0, 0.0, -0.098)));
        assert!(approx(body.position, Vec3::new(0.0, 0.0, 119.902)));
        assert_eq!(body.acceleration, Vec3::ZERO);
    }

    #[test]
    fn when_forces_keep_pushing_then_speed_never_exceeds_max() {
        let mut model = FlightModel::default();
        let max_speed = model.body().max_speed;

        for i in 0..500 {
            let angle = i as f32 * 0.37;
            let force = Vec3::new(angle.cos(), (angle * 0.5).sin(), angle.sin()) * 0.9;
            model.apply_force(force);
            model.integrate();
            assert!(model.body().velocity.length() <= max_speed + 1e-5);
        }
    }

    #[test]
    fn when_speed_is_clamped_then_direction_is_preserved() {
        let mut model = FlightModel::default();

        model.apply_force(Vec3::new(30.0, 40.0, 0.0));
        model.integrate();

        let v = model.body().velocity;
        assert!((v.length() - 2.0).abs() < 1e-5);
        assert!(approx(v.normalize(), Vec3::new(0.6, 0.8, 0.0)));
    }

    #[test]
    fn when_no_force_is_applied_then_velocity_decays_by_drag() {
        let mut body = Body::default();
        body.velocity = Vec3::new(1.0, 0.0, 0.0);
        let mut model = FlightModel::new(body);

        model.integrate();

        assert!(approx(model.body().velocity, Vec3::new(0.98, 0.0, 0.0)));
    }

    #[test]
    fn when_body_is_at_start_then_telemetry_reports_altitude_and_zero_latitude() {
        let telemetry = FlightModel::default().telemetry();

        assert_eq!(telemetry.speed, 0.0);
        assert!((telemetry.altitude - 2000.0).abs() < 1e-2);
        assert!(telemetry.latitude.abs() < 1e-5);
        assert!(telemetry.longitude.abs() < 1e-5);
    }
}
