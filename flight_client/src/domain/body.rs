use flight_protocol::BodyState;
use glam::{EulerRot, Quat, Vec3};

/// Where the local craft starts before it has ever moved.
pub const LOCAL_START: Vec3 = Vec3::new(0.0, 0.0, 120.0);

/// Simulated craft: the only thing the flight model integrates.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    // Accumulated force for the current tick; zeroed after integration.
    pub acceleration: Vec3,
    pub rotation: Quat,
    pub max_speed: f32,
    // Per-tick velocity multiplier in (0, 1].
    pub drag: f32,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: LOCAL_START,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            max_speed: 2.0,
            drag: 0.98,
        }
    }
}

impl Body {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    // Nose direction: local -Z.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Snapshot for replication, rotation expressed as XYZ Euler angles.
    pub fn state(&self) -> BodyState {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        BodyState {
            position: self.position,
            rotation: Vec3::new(x, y, z),
            velocity: self.velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_body_is_unrotated_then_forward_is_negative_z_and_right_is_x() {
        let body = Body::default();

        assert_eq!(body.forward(), Vec3::NEG_Z);
        assert_eq!(body.right(), Vec3::X);
    }

    #[test]
    fn when_state_is_taken_then_rotation_round_trips_through_euler_angles() {
        let mut body = Body::at(Vec3::new(1.0, 2.0, 3.0));
        body.rotation = Quat::from_euler(EulerRot::XYZ, 0.2, -0.4, 0.1);
        body.velocity = Vec3::new(0.5, 0.0, 0.0);

        let state = body.state();

        assert_eq!(state.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.velocity, Vec3::new(0.5, 0.0, 0.0));
        assert!((state.rotation - Vec3::new(0.2, -0.4, 0.1)).length() < 1e-5);
    }
}
